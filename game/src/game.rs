use crate::{
  action::Action,
  board::{Board, CELLS, SIZE, to_index},
  environment::{Environment, Step},
};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use std::array;
use thiserror::Error;

/// Probability of spawning a 2 rather than a 4.
const TWO_PROBABILITY: f64 = 0.9;

#[derive(Error, Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameError {
  #[error("the game is over, reset it first")]
  GameOver,
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct GameInfo {
  pub score: u64,
  pub highest: u32,
}

/// Cell indices of the `i`-th line for a move, starting from the edge the
/// tiles slide towards.
fn line(action: Action, i: usize) -> [usize; SIZE] {
  array::from_fn(|j| match action {
    Action::Up => to_index(j, i),
    Action::Right => to_index(i, SIZE - 1 - j),
    Action::Down => to_index(SIZE - 1 - j, i),
    Action::Left => to_index(i, j),
  })
}

/// Slide a line towards its start merging equal neighbours once.
/// Returns the new line and the sum of merged tiles.
pub fn slide(tiles: [u32; SIZE]) -> ([u32; SIZE], u64) {
  let mut result = [0; SIZE];
  let mut len = 0;
  let mut merged = false;
  let mut reward = 0;
  for tile in tiles.into_iter().filter(|&tile| tile != 0) {
    if len > 0 && !merged && result[len - 1] == tile {
      result[len - 1] *= 2;
      reward += result[len - 1] as u64;
      merged = true;
    } else {
      result[len] = tile;
      len += 1;
      merged = false;
    }
  }
  (result, reward)
}

/// Board after a move without spawning a new tile.
pub fn shift(board: &Board, action: Action) -> (Board, u64) {
  let mut cells = [0; CELLS];
  let mut reward = 0;
  for i in 0..SIZE {
    let indices = line(action, i);
    let (tiles, line_reward) = slide(indices.map(|index| board.0[index]));
    for (index, tile) in indices.into_iter().zip(tiles) {
      cells[index] = tile;
    }
    reward += line_reward;
  }
  (Board(cells), reward)
}

pub fn is_game_over(board: &Board) -> bool {
  Action::ALL.iter().all(|&action| shift(board, action).0 == *board)
}

/// Plain 2048 game.
pub struct Game {
  board: Board,
  score: u64,
  over: bool,
  rng: SmallRng,
}

impl Default for Game {
  fn default() -> Self {
    Self::new()
  }
}

impl Game {
  pub fn new() -> Self {
    Self {
      board: Board::EMPTY,
      score: 0,
      over: true,
      rng: SmallRng::from_os_rng(),
    }
  }

  /// Continue a game from an arbitrary position.
  pub fn from_board(board: Board, seed: u64) -> Self {
    Self {
      board,
      score: 0,
      over: is_game_over(&board),
      rng: SmallRng::seed_from_u64(seed),
    }
  }

  #[inline]
  pub fn board(&self) -> Board {
    self.board
  }

  #[inline]
  pub fn score(&self) -> u64 {
    self.score
  }

  #[inline]
  pub fn is_over(&self) -> bool {
    self.over
  }

  fn info(&self) -> GameInfo {
    GameInfo {
      score: self.score,
      highest: self.board.highest(),
    }
  }

  fn spawn(&mut self) {
    let empty = self.board.count_empty();
    if empty == 0 {
      return;
    }
    let n = self.rng.random_range(0..empty);
    let value = if self.rng.random_bool(TWO_PROBABILITY) { 2 } else { 4 };
    if let Some(cell) = self.board.0.iter_mut().filter(|cell| **cell == 0).nth(n) {
      *cell = value;
    }
  }
}

impl Environment for Game {
  type Info = GameInfo;
  type Error = GameError;

  fn seed(&mut self, seed: Option<u64>) {
    self.rng = seed.map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64);
  }

  fn reset(&mut self) -> Board {
    self.board = Board::EMPTY;
    self.score = 0;
    self.spawn();
    self.spawn();
    self.over = is_game_over(&self.board);
    self.board
  }

  fn step(&mut self, action: Action) -> Result<Step<GameInfo>, GameError> {
    if self.over {
      return Err(GameError::GameOver);
    }

    let (board, reward) = shift(&self.board, action);
    if board != self.board {
      self.board = board;
      self.score += reward;
      self.spawn();
      self.over = is_game_over(&self.board);
    } else {
      log::debug!("Move {} doesn't change the board", action);
    }

    Ok(Step {
      board: self.board,
      reward: reward as f64,
      terminal: self.over,
      info: self.info(),
    })
  }
}
