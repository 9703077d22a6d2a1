//! Turning a record stream into training batches.
//!
//! The pipeline is: optional windowed shuffle, repetition, grouping into
//! batches. `Batches` is lazy and single-pass: a batch is assembled only when
//! requested and the iterator can't be restarted. The source itself must be
//! cloneable since every repetition starts from a fresh clone of it.

use crate::features::{boards_features, cast};
use either::Either;
use ndarray::{Array1, Array3};
use num_traits::Float;
use q2048_game::record::Record;
use rand::Rng;
use std::{iter::Fuse, mem};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BatchConfig {
  pub shuffle: bool,
  /// Number of records kept in memory for shuffling.
  pub shuffle_window: usize,
  pub repeat_count: usize,
  pub batch_size: usize,
}

impl Default for BatchConfig {
  fn default() -> Self {
    Self {
      shuffle: true,
      shuffle_window: 256,
      repeat_count: 1,
      batch_size: 32,
    }
  }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Batch {
  pub records: Vec<Record>,
}

impl Batch {
  #[inline]
  pub fn len(&self) -> usize {
    self.records.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  /// Normalized boards, `len × 4 × 4`.
  pub fn boards<N: Float>(&self) -> Array3<N> {
    boards_features(self.records.iter().map(|record| &record.board))
  }

  pub fn actions(&self) -> Array1<usize> {
    self.records.iter().map(|record| record.action.index()).collect()
  }

  pub fn rewards<N: Float>(&self) -> Array1<N> {
    self.records.iter().map(|record| cast(record.reward)).collect()
  }
}

/// Approximate shuffle through a bounded window.
///
/// The window is filled first. Every next element is taken from a random
/// position of the window and replaced by the next element of the source.
pub struct WindowShuffle<I: Iterator, R> {
  source: Fuse<I>,
  window: Vec<I::Item>,
  capacity: usize,
  rng: R,
}

impl<I: Iterator, R: Rng> WindowShuffle<I, R> {
  pub fn new(source: I, capacity: usize, rng: R) -> Self {
    let capacity = capacity.max(1);
    let window = Vec::with_capacity(capacity.min(source.size_hint().0));
    Self {
      source: source.fuse(),
      window,
      capacity,
      rng,
    }
  }

  pub fn into_rng(self) -> R {
    self.rng
  }
}

impl<I: Iterator, R: Rng> Iterator for WindowShuffle<I, R> {
  type Item = I::Item;

  fn next(&mut self) -> Option<Self::Item> {
    while self.window.len() < self.capacity {
      match self.source.next() {
        Some(item) => self.window.push(item),
        None => break,
      }
    }
    if self.window.is_empty() {
      return None;
    }
    let i = self.rng.random_range(0..self.window.len());
    Some(match self.source.next() {
      Some(item) => mem::replace(&mut self.window[i], item),
      None => self.window.swap_remove(i),
    })
  }
}

pub struct Batches<I: Iterator, R> {
  source: I,
  config: BatchConfig,
  repetition: usize,
  pass: Option<Either<I, WindowShuffle<I, R>>>,
  rng: Option<R>,
}

/// Batches of `records` repeated `config.repeat_count` times. The last batch
/// of every repetition may be short.
pub fn batches<I, R>(records: I, config: BatchConfig, rng: R) -> Batches<I::IntoIter, R>
where
  I: IntoIterator<Item = Record>,
  I::IntoIter: Clone,
  R: Rng,
{
  assert!(config.batch_size > 0, "batch size must be positive");
  assert!(config.repeat_count > 0, "repeat count must be positive");
  Batches {
    source: records.into_iter(),
    config,
    repetition: 0,
    pass: None,
    rng: Some(rng),
  }
}

impl<I, R> Batches<I, R>
where
  I: Iterator<Item = Record> + Clone,
  R: Rng,
{
  /// Number of the current repetition, starting from 1.
  #[inline]
  pub fn repetition(&self) -> usize {
    self.repetition
  }

  fn start_pass(&mut self) {
    let source = self.source.clone();
    self.pass = Some(match self.rng.take() {
      Some(rng) if self.config.shuffle => Either::Right(WindowShuffle::new(source, self.config.shuffle_window, rng)),
      rng => {
        self.rng = rng;
        Either::Left(source)
      }
    });
    self.repetition += 1;
  }

  fn finish_pass(&mut self) {
    if let Some(Either::Right(shuffle)) = self.pass.take() {
      self.rng = Some(shuffle.into_rng());
    }
  }
}

impl<I, R> Iterator for Batches<I, R>
where
  I: Iterator<Item = Record> + Clone,
  R: Rng,
{
  type Item = Batch;

  fn next(&mut self) -> Option<Batch> {
    loop {
      if self.pass.is_none() {
        if self.repetition == self.config.repeat_count {
          return None;
        }
        self.start_pass();
      }
      let records = match self.pass.as_mut() {
        Some(pass) => pass.take(self.config.batch_size).collect::<Vec<_>>(),
        None => Vec::new(),
      };
      if records.len() < self.config.batch_size {
        self.finish_pass();
      }
      if !records.is_empty() {
        return Some(Batch { records });
      }
    }
  }
}
