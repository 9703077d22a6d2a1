//! Symmetries of the square board.
//!
//! Every symmetry is a horizontal flip (optional) followed by a number of
//! clockwise quarter turns. A quarter turn moves the cell `(row, col)` to
//! `(col, 3 - row)` and turns every move direction clockwise: up becomes
//! right. A flip moves `(row, col)` to `(row, 3 - col)` and swaps left and
//! right. Boards and actions are always transformed with the same symmetry so
//! a record stays a valid transition after the transformation.

use q2048_game::{
  action::Action,
  board::{Board, CELLS, SIZE, to_index},
  record::Record,
};

/// Number of quarter turns that bring the board back.
pub const TURNS: u8 = 4;

/// Total number of symmetries.
pub const ROTATIONS: usize = 8;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Symmetry {
  flip: bool,
  turns: u8,
}

/// All symmetries: identity, the three turns, then the flip followed by
/// zero to three turns.
pub const SYMMETRIES: [Symmetry; ROTATIONS] = [
  Symmetry::new(false, 0),
  Symmetry::new(false, 1),
  Symmetry::new(false, 2),
  Symmetry::new(false, 3),
  Symmetry::new(true, 0),
  Symmetry::new(true, 1),
  Symmetry::new(true, 2),
  Symmetry::new(true, 3),
];

impl Symmetry {
  pub const IDENTITY: Symmetry = Symmetry::new(false, 0);

  pub const fn new(flip: bool, turns: u8) -> Self {
    assert!(turns < TURNS, "invalid number of quarter turns");
    Self { flip, turns }
  }

  #[inline]
  pub fn flip(self) -> bool {
    self.flip
  }

  #[inline]
  pub fn turns(self) -> u8 {
    self.turns
  }

  /// Position in `SYMMETRIES`.
  #[inline]
  pub fn index(self) -> usize {
    self.flip as usize * TURNS as usize + self.turns as usize
  }

  /// Symmetry equal to applying `self` first and `next` second.
  pub fn then(self, next: Symmetry) -> Symmetry {
    // A flip reverses the direction of the turns made before it.
    let turns = if next.flip { TURNS - self.turns } else { self.turns };
    Symmetry::new(self.flip ^ next.flip, (next.turns + turns) % TURNS)
  }

  pub fn inverse(self) -> Symmetry {
    if self.flip {
      self
    } else {
      Symmetry::new(false, (TURNS - self.turns) % TURNS)
    }
  }

  /// Coordinates the cell `(row, col)` moves to.
  pub fn rotate(self, row: usize, col: usize) -> (usize, usize) {
    let mut row = row;
    let mut col = if self.flip { SIZE - 1 - col } else { col };
    for _ in 0..self.turns {
      (row, col) = (col, SIZE - 1 - row);
    }
    (row, col)
  }

  pub fn permute_board(self, board: &Board) -> Board {
    let mut cells = [0; CELLS];
    for row in 0..SIZE {
      for col in 0..SIZE {
        let (r, c) = self.rotate(row, col);
        cells[to_index(r, c)] = board.cell(row, col);
      }
    }
    Board(cells)
  }

  pub fn relabel_action(self, action: Action) -> Action {
    let action = if self.flip { action.flip() } else { action };
    action.rotate(self.turns)
  }

  /// Image of a record. Reward and terminal flag don't depend on orientation.
  pub fn apply(self, record: &Record) -> Record {
    Record::new(
      self.permute_board(&record.board),
      self.relabel_action(record.action),
      record.reward,
      self.permute_board(&record.next_board),
      record.terminal,
    )
  }
}
