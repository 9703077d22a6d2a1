use ndarray::{Array2, Array3};
use num_traits::Float;
use q2048_game::board::{Board, SIZE};

/// Tile value mapped to zero.
const CENTER: f64 = 64.0;
/// Tile distance from the center mapped to one.
const SCALE: f64 = 188.0;

#[inline]
pub fn cast<N: Float>(value: f64) -> N {
  N::from(value).unwrap_or_else(N::nan)
}

#[inline]
pub fn normalize<N: Float>(value: u32) -> N {
  cast((value as f64 - CENTER) / SCALE)
}

/// Network input for a single board: `SIZE × SIZE` normalized tiles.
pub fn board_features<N: Float>(board: &Board) -> Array2<N> {
  Array2::from_shape_fn((SIZE, SIZE), |(row, col)| normalize(board.cell(row, col)))
}

/// Network input for several boards: `boards × SIZE × SIZE`.
pub fn boards_features<'a, N, I>(boards: I) -> Array3<N>
where
  N: Float,
  I: ExactSizeIterator<Item = &'a Board>,
{
  let len = boards.len();
  let mut features = Array3::zeros((len, SIZE, SIZE));
  for (mut slice, board) in features.outer_iter_mut().zip(boards) {
    slice.assign(&board_features(board));
  }
  features
}
