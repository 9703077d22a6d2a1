use std::fmt;

pub const SIZE: usize = 4;
pub const CELLS: usize = SIZE * SIZE;

#[inline]
pub const fn to_index(row: usize, col: usize) -> usize {
  row * SIZE + col
}

/// 4x4 grid of raw tile values in row-major order, 0 for an empty cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct Board(pub [u32; CELLS]);

impl Board {
  pub const EMPTY: Board = Board([0; CELLS]);

  pub fn from_rows(rows: [[u32; SIZE]; SIZE]) -> Self {
    let mut cells = [0; CELLS];
    for (row, values) in rows.iter().enumerate() {
      cells[to_index(row, 0)..to_index(row + 1, 0)].copy_from_slice(values);
    }
    Board(cells)
  }

  #[inline]
  pub fn cells(&self) -> &[u32; CELLS] {
    &self.0
  }

  #[inline]
  pub fn cell(&self, row: usize, col: usize) -> u32 {
    self.0[to_index(row, col)]
  }

  #[inline]
  pub fn set_cell(&mut self, row: usize, col: usize, value: u32) {
    self.0[to_index(row, col)] = value;
  }

  pub fn count_empty(&self) -> usize {
    self.0.iter().filter(|&&value| value == 0).count()
  }

  pub fn highest(&self) -> u32 {
    self.0.iter().copied().max().unwrap_or_default()
  }
}

impl From<[u32; CELLS]> for Board {
  fn from(cells: [u32; CELLS]) -> Self {
    Board(cells)
  }
}

impl fmt::Display for Board {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for row in 0..SIZE {
      for col in 0..SIZE {
        match self.cell(row, col) {
          0 => write!(f, "{:>6}", ".")?,
          value => write!(f, "{:>6}", value)?,
        }
      }
      if row + 1 < SIZE {
        writeln!(f)?;
      }
    }
    Ok(())
  }
}
