use crate::policy::{Choice, Driver, GreedyDriver, NoPolicy, Suggestion};
use crate::session::{Applied, Outcome, Session, SessionError, State, play};
use q2048_game::{
  action::Action,
  board::Board,
  environment::{Environment, Step},
  game::Game,
};
use std::{collections::VecDeque, convert::Infallible};

const SEED: u64 = 7;

/// Counts moves in the first cell. Blocked actions don't change the board.
struct CountingEnv {
  board: Board,
  blocked: Vec<Action>,
  moves_to_end: u32,
  seeds: Vec<Option<u64>>,
  fail_on: Option<Action>,
}

impl CountingEnv {
  fn new(blocked: Vec<Action>, moves_to_end: u32) -> Self {
    Self {
      board: Board::EMPTY,
      blocked,
      moves_to_end,
      seeds: Vec::new(),
      fail_on: None,
    }
  }
}

impl Environment for CountingEnv {
  type Info = ();
  type Error = String;

  fn seed(&mut self, seed: Option<u64>) {
    self.seeds.push(seed);
  }

  fn reset(&mut self) -> Board {
    self.board = Board::EMPTY;
    self.board
  }

  fn step(&mut self, action: Action) -> Result<Step<()>, String> {
    if self.fail_on == Some(action) {
      return Err(format!("broken on {}", action));
    }
    if !self.blocked.contains(&action) {
      self.board.0[0] += 1;
      self.board.0[1 + action.index()] += 1;
    }
    Ok(Step {
      board: self.board,
      reward: action.index() as f64,
      terminal: self.board.0[0] >= self.moves_to_end,
      info: (),
    })
  }
}

/// Replays prepared choices and remembers what it was shown.
struct ScriptedDriver {
  choices: VecDeque<Choice>,
  seen_rejected: Vec<Vec<Action>>,
  seen_boards: Vec<Board>,
}

impl ScriptedDriver {
  fn new(choices: Vec<Choice>) -> Self {
    Self {
      choices: choices.into(),
      seen_rejected: Vec::new(),
      seen_boards: Vec::new(),
    }
  }
}

impl Driver for ScriptedDriver {
  type E = Infallible;

  fn choose(&mut self, board: &Board, _suggestion: Option<&Suggestion>, rejected: &[Action]) -> Result<Choice, Self::E> {
    self.seen_rejected.push(rejected.to_vec());
    self.seen_boards.push(*board);
    Ok(self.choices.pop_front().unwrap_or(Choice::Cancel))
  }
}

#[test]
fn records_until_terminal() {
  let mut env = CountingEnv::new(Vec::new(), 3);
  let mut driver = ScriptedDriver::new(vec![
    Choice::Move(Action::Up),
    Choice::Move(Action::Left),
    Choice::Move(Action::Down),
  ]);
  let trace = play(&mut env, &mut NoPolicy, &mut driver, Some(SEED)).unwrap();

  assert_eq!(trace.outcome, Outcome::Done);
  assert_eq!(trace.records.len(), 3);
  assert_eq!(env.seeds, vec![Some(SEED)]);
  assert_eq!(
    trace.records.iter().map(|record| record.action).collect::<Vec<_>>(),
    vec![Action::Up, Action::Left, Action::Down]
  );
  assert_eq!(trace.records[1].reward, 3.0);
  assert!(!trace.records[1].terminal);
  assert!(trace.records[2].terminal);
  for pair in trace.records.windows(2) {
    assert_eq!(pair[0].next_board, pair[1].board);
  }
}

#[test]
fn illegal_move_is_suppressed() {
  let mut env = CountingEnv::new(vec![Action::Left], 2);
  let mut driver = ScriptedDriver::new(vec![
    Choice::Move(Action::Left),
    Choice::Move(Action::Right),
    Choice::Move(Action::Left),
    Choice::Move(Action::Up),
  ]);
  let trace = play(&mut env, &mut NoPolicy, &mut driver, None).unwrap();

  assert_eq!(trace.outcome, Outcome::Done);
  assert_eq!(
    trace.records.iter().map(|record| record.action).collect::<Vec<_>>(),
    vec![Action::Right, Action::Up]
  );
  assert!(trace.records.iter().all(|record| record.board != record.next_board));
  // The retry happens on the same board and the driver knows what failed.
  assert_eq!(driver.seen_boards[0], driver.seen_boards[1]);
  assert_eq!(
    driver.seen_rejected,
    vec![vec![], vec![Action::Left], vec![], vec![Action::Left]]
  );
}

#[test]
fn cancellation_keeps_records() {
  let mut env = CountingEnv::new(Vec::new(), 100);
  let mut driver = ScriptedDriver::new(vec![
    Choice::Move(Action::Up),
    Choice::Move(Action::Right),
    Choice::Cancel,
    Choice::Move(Action::Down),
  ]);
  let trace = play(&mut env, &mut NoPolicy, &mut driver, None).unwrap();

  assert_eq!(trace.outcome, Outcome::Aborted);
  assert_eq!(trace.records.len(), 2);
  assert_eq!(driver.choices.len(), 1);
}

#[test]
fn environment_failure_is_surfaced() {
  let mut env = CountingEnv::new(Vec::new(), 100);
  env.fail_on = Some(Action::Down);
  let mut driver = ScriptedDriver::new(vec![Choice::Move(Action::Up), Choice::Move(Action::Down)]);
  match play(&mut env, &mut NoPolicy, &mut driver, None) {
    Err(SessionError::Environment(message)) => assert_eq!(message, "broken on down"),
    result => panic!("unexpected result: {:?}", result),
  }
}

#[test]
fn session_states() {
  let mut env = CountingEnv::new(vec![Action::Down], 2);
  let mut session = Session::new(&mut env, None);
  assert_eq!(session.state(), State::AwaitingAction);
  assert_eq!(session.apply(Action::Down), Ok(Applied::Suppressed));
  assert_eq!(session.rejected(), &[Action::Down]);
  assert_eq!(session.apply(Action::Down), Ok(Applied::Suppressed));
  assert_eq!(session.rejected(), &[Action::Down]);
  assert!(session.records().is_empty());
  assert_eq!(session.apply(Action::Up), Ok(Applied::Recorded));
  assert!(session.rejected().is_empty());
  assert_eq!(session.state(), State::AwaitingAction);
  assert_eq!(session.apply(Action::Up), Ok(Applied::Recorded));
  assert_eq!(session.state(), State::Done);
  session.cancel();
  assert_eq!(session.state(), State::Done);
  assert_eq!(session.into_trace().outcome, Outcome::Done);
}

#[test]
#[should_panic]
fn apply_after_end() {
  let mut env = CountingEnv::new(Vec::new(), 1);
  let mut session = Session::new(&mut env, None);
  session.apply(Action::Up).unwrap();
  session.apply(Action::Up).unwrap();
}

#[test]
fn greedy_game_runs_to_the_end() {
  let mut game = Game::new();
  let trace = play(&mut game, &mut NoPolicy, &mut GreedyDriver, Some(SEED)).unwrap();

  assert_eq!(trace.outcome, Outcome::Done);
  assert!(!trace.records.is_empty());
  assert!(trace.records.iter().all(|record| record.board != record.next_board));
  assert!(trace.records.last().unwrap().terminal);
  assert!(trace.records[..trace.records.len() - 1].iter().all(|record| !record.terminal));
  let score = trace.records.iter().map(|record| record.reward).sum::<f64>();
  assert_eq!(score, game.score() as f64);
}
