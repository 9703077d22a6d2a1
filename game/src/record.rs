use crate::{action::Action, board::Board};

/// One accepted move: the board before it, the move, the reward the
/// environment paid for it, the board after it and whether the game ended.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Record {
  pub board: Board,
  pub action: Action,
  pub reward: f64,
  pub next_board: Board,
  pub terminal: bool,
}

impl Record {
  #[inline]
  pub fn new(board: Board, action: Action, reward: f64, next_board: Board, terminal: bool) -> Self {
    Self {
      board,
      action,
      reward,
      next_board,
      terminal,
    }
  }
}
