//! Move selection: a policy suggests, a driver decides.

use crate::{features::board_features, model::Model};
use either::Either;
use ndarray::Axis;
use num_traits::Float;
use q2048_game::{
  action::{ACTIONS, Action},
  board::Board,
};
use rand::{Rng, seq::IndexedRandom};
use std::{cmp::Ordering, convert::Infallible, marker::PhantomData};

/// Predicted value of every action.
#[derive(Clone, PartialEq, Debug)]
pub struct Suggestion {
  pub values: [f64; ACTIONS],
}

impl Suggestion {
  #[inline]
  pub fn value(&self, action: Action) -> f64 {
    self.values[action.index()]
  }

  /// Actions ordered from the most valuable one.
  pub fn ranked(&self) -> Vec<(Action, f64)> {
    let mut ranked = Action::ALL.map(|action| (action, self.value(action))).to_vec();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked
  }

  pub fn best(&self) -> Action {
    self.ranked()[0].0
  }

  /// The most valuable action not listed in `rejected`.
  pub fn best_except(&self, rejected: &[Action]) -> Option<Action> {
    self
      .ranked()
      .into_iter()
      .map(|(action, _)| action)
      .find(|action| !rejected.contains(action))
  }
}

pub trait Policy {
  type E;

  fn suggest(&mut self, board: &Board) -> Result<Option<Suggestion>, Self::E>;
}

/// Absence of a policy.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct NoPolicy;

impl Policy for NoPolicy {
  type E = Infallible;

  fn suggest(&mut self, _board: &Board) -> Result<Option<Suggestion>, Self::E> {
    Ok(None)
  }
}

/// Suggestions from a value network. Boards are normalized here, callers pass
/// raw tiles.
pub struct ModelPolicy<M, N> {
  pub model: M,
  _number: PhantomData<N>,
}

impl<M, N> ModelPolicy<M, N> {
  pub fn new(model: M) -> Self {
    Self {
      model,
      _number: PhantomData,
    }
  }
}

impl<N: Float, M: Model<N>> Policy for ModelPolicy<M, N> {
  type E = M::E;

  fn suggest(&mut self, board: &Board) -> Result<Option<Suggestion>, Self::E> {
    let boards = board_features::<N>(board).insert_axis(Axis(0));
    let values = self.model.predict(boards)?;
    Ok(Some(Suggestion {
      values: Action::ALL.map(|action| values[(0, action.index())].to_f64().unwrap_or(f64::NAN)),
    }))
  }
}

impl<L: Policy, R: Policy> Policy for Either<L, R> {
  type E = Either<L::E, R::E>;

  fn suggest(&mut self, board: &Board) -> Result<Option<Suggestion>, Self::E> {
    match self {
      Either::Left(policy) => policy.suggest(board).map_err(Either::Left),
      Either::Right(policy) => policy.suggest(board).map_err(Either::Right),
    }
  }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Choice {
  Move(Action),
  Cancel,
}

/// The acting agent of a gameplay session.
pub trait Driver {
  type E;

  /// Pick the next move. `rejected` lists moves that didn't change the
  /// current board.
  fn choose(&mut self, board: &Board, suggestion: Option<&Suggestion>, rejected: &[Action]) -> Result<Choice, Self::E>;
}

/// Always follows the suggestion. Without one prefers moves in the order of
/// their codes.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct GreedyDriver;

impl Driver for GreedyDriver {
  type E = Infallible;

  fn choose(&mut self, _board: &Board, suggestion: Option<&Suggestion>, rejected: &[Action]) -> Result<Choice, Self::E> {
    let action = match suggestion {
      Some(suggestion) => suggestion.best_except(rejected),
      None => Action::ALL.into_iter().find(|action| !rejected.contains(action)),
    };
    Ok(action.map_or(Choice::Cancel, Choice::Move))
  }
}

/// Uniformly random moves.
pub struct RandomDriver<R>(pub R);

impl<R: Rng> Driver for RandomDriver<R> {
  type E = Infallible;

  fn choose(&mut self, _board: &Board, _suggestion: Option<&Suggestion>, rejected: &[Action]) -> Result<Choice, Self::E> {
    let candidates = Action::ALL
      .into_iter()
      .filter(|action| !rejected.contains(action))
      .collect::<Vec<_>>();
    Ok(candidates.choose(&mut self.0).copied().map_or(Choice::Cancel, Choice::Move))
  }
}

impl<L: Driver, R: Driver> Driver for Either<L, R> {
  type E = Either<L::E, R::E>;

  fn choose(&mut self, board: &Board, suggestion: Option<&Suggestion>, rejected: &[Action]) -> Result<Choice, Self::E> {
    match self {
      Either::Left(driver) => driver.choose(board, suggestion, rejected).map_err(Either::Left),
      Either::Right(driver) => driver.choose(board, suggestion, rejected).map_err(Either::Right),
    }
  }
}
