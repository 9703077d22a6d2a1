//! Playing a game and recording its moves.
//!
//! A session waits for a move, applies it and either records the transition
//! or, when the board didn't change, suppresses it and waits for another move
//! on the same board. It ends when the environment reports the end of the
//! game or when the driver cancels. Records made before a cancellation are
//! kept.

use crate::policy::{Choice, Driver, Policy};
use q2048_game::{
  action::Action,
  board::Board,
  environment::{Environment, Step},
  record::Record,
};
use std::fmt::Debug;
use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum State {
  AwaitingAction,
  Done,
  Aborted,
}

/// What happened to an applied move.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Applied {
  Recorded,
  Suppressed,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
  Done,
  Aborted,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Trace {
  pub records: Vec<Record>,
  pub outcome: Outcome,
}

#[derive(Error, Debug)]
pub enum SessionError<E: Debug, P: Debug, D: Debug> {
  #[error("environment failure: {0:?}")]
  Environment(E),
  #[error("policy failure: {0:?}")]
  Policy(P),
  #[error("driver failure: {0:?}")]
  Driver(D),
}

pub struct Session<'a, E> {
  env: &'a mut E,
  board: Board,
  state: State,
  rejected: Vec<Action>,
  records: Vec<Record>,
}

impl<'a, E: Environment> Session<'a, E> {
  pub fn new(env: &'a mut E, seed: Option<u64>) -> Self {
    env.seed(seed);
    let board = env.reset();
    Self {
      env,
      board,
      state: State::AwaitingAction,
      rejected: Vec::new(),
      records: Vec::new(),
    }
  }

  #[inline]
  pub fn state(&self) -> State {
    self.state
  }

  #[inline]
  pub fn board(&self) -> &Board {
    &self.board
  }

  /// Moves already found illegal on the current board.
  #[inline]
  pub fn rejected(&self) -> &[Action] {
    &self.rejected
  }

  #[inline]
  pub fn records(&self) -> &[Record] {
    &self.records
  }

  pub fn apply(&mut self, action: Action) -> Result<Applied, E::Error> {
    assert_eq!(self.state, State::AwaitingAction, "the session is finished");

    let Step {
      board,
      reward,
      terminal,
      info,
    } = self.env.step(action)?;
    log::debug!("Move {}, reward {}, info {:?}", action, reward, info);

    let applied = if board == self.board {
      log::info!("Suppressing recording of illegal move {}", action);
      if !self.rejected.contains(&action) {
        self.rejected.push(action);
      }
      Applied::Suppressed
    } else {
      self
        .records
        .push(Record::new(self.board, action, reward, board, terminal));
      self.board = board;
      self.rejected.clear();
      Applied::Recorded
    };

    if terminal {
      log::info!("End of game after {} moves", self.records.len());
      self.state = State::Done;
    }

    Ok(applied)
  }

  pub fn cancel(&mut self) {
    if self.state == State::AwaitingAction {
      log::info!("Session cancelled after {} moves", self.records.len());
      self.state = State::Aborted;
    }
  }

  pub fn into_trace(self) -> Trace {
    let outcome = match self.state {
      State::Done => Outcome::Done,
      State::AwaitingAction | State::Aborted => Outcome::Aborted,
    };
    Trace {
      records: self.records,
      outcome,
    }
  }
}

/// Play one game from a fresh `reset`, asking `policy` for a suggestion
/// before every move and `driver` for the move itself.
pub fn play<E, P, D>(
  env: &mut E,
  policy: &mut P,
  driver: &mut D,
  seed: Option<u64>,
) -> Result<Trace, SessionError<E::Error, P::E, D::E>>
where
  E: Environment,
  P: Policy,
  D: Driver,
  E::Error: Debug,
  P::E: Debug,
  D::E: Debug,
{
  let mut session = Session::new(env, seed);

  while session.state() == State::AwaitingAction {
    let suggestion = policy.suggest(session.board()).map_err(SessionError::Policy)?;
    if let Some(suggestion) = &suggestion {
      for (action, value) in suggestion.ranked() {
        log::debug!("{}: {:.3}", action, value);
      }
    }

    let choice = driver
      .choose(session.board(), suggestion.as_ref(), session.rejected())
      .map_err(SessionError::Driver)?;
    match choice {
      Choice::Move(action) => {
        session.apply(action).map_err(SessionError::Environment)?;
      }
      Choice::Cancel => session.cancel(),
    }
  }

  Ok(session.into_trace())
}
