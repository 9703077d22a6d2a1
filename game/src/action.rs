use strum::{Display, EnumString, FromRepr};
use thiserror::Error;

/// Number of possible moves.
pub const ACTIONS: usize = 4;

/// Move direction. The numeric codes are fixed: they are stored in record
/// files and used as indices into the network output.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display, EnumString, FromRepr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[repr(u8)]
pub enum Action {
  Up = 0,
  Right = 1,
  Down = 2,
  Left = 3,
}

#[derive(Error, Clone, Copy, PartialEq, Eq, Debug)]
#[error("invalid action code: {0}")]
pub struct InvalidAction(pub i64);

impl Action {
  /// All actions ordered by their codes.
  pub const ALL: [Action; ACTIONS] = [Action::Up, Action::Right, Action::Down, Action::Left];

  #[inline]
  pub fn index(self) -> usize {
    self as usize
  }

  pub fn from_index(index: i64) -> Result<Self, InvalidAction> {
    u8::try_from(index)
      .ok()
      .and_then(Action::from_repr)
      .ok_or(InvalidAction(index))
  }

  /// Direction after turning the board clockwise `turns` quarter turns.
  #[inline]
  pub fn rotate(self, turns: u8) -> Self {
    Self::ALL[(self.index() + turns as usize) % ACTIONS]
  }

  /// Direction after mirroring the board left to right.
  #[inline]
  pub fn flip(self) -> Self {
    match self {
      Action::Right => Action::Left,
      Action::Left => Action::Right,
      action => action,
    }
  }
}
