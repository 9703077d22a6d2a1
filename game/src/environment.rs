//! Black-box game interface the gameplay session talks to.

use crate::{action::Action, board::Board};
use std::fmt::Debug;

/// Outcome of a single move.
#[derive(Clone, PartialEq, Debug)]
pub struct Step<I> {
  pub board: Board,
  pub reward: f64,
  pub terminal: bool,
  pub info: I,
}

pub trait Environment {
  /// Auxiliary data reported with every step.
  type Info: Debug;

  type Error;

  /// Reseed the environment randomness. `None` means seeding from entropy.
  fn seed(&mut self, seed: Option<u64>);

  /// Start a new game and return its first board.
  fn reset(&mut self) -> Board;

  /// Apply a move. A move that doesn't change anything returns the same board.
  fn step(&mut self, action: Action) -> Result<Step<Self::Info>, Self::Error>;
}
