use q2048_game::{action::Action, board::Board};
use q2048_value::policy::{Choice, Driver, Suggestion};
use std::{
  io::{self, BufRead, Write},
  str::FromStr,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
  Move(Action),
  Accept,
  Quit,
}

/// Vim keys, action names, `y` or `a` to accept the suggestion, `q` to quit.
pub fn parse_command(input: &str) -> Option<Command> {
  match input.trim() {
    "k" => Some(Command::Move(Action::Up)),
    "l" => Some(Command::Move(Action::Right)),
    "j" => Some(Command::Move(Action::Down)),
    "h" => Some(Command::Move(Action::Left)),
    "y" | "a" => Some(Command::Accept),
    "q" | "quit" => Some(Command::Quit),
    word => Action::from_str(word).ok().map(Command::Move),
  }
}

/// Asks a human for every move.
pub struct TerminalDriver<R, W> {
  input: R,
  output: W,
}

impl<R: BufRead, W: Write> TerminalDriver<R, W> {
  pub fn new(input: R, output: W) -> Self {
    Self { input, output }
  }
}

impl<R: BufRead, W: Write> Driver for TerminalDriver<R, W> {
  type E = io::Error;

  fn choose(&mut self, board: &Board, suggestion: Option<&Suggestion>, rejected: &[Action]) -> io::Result<Choice> {
    let suggested = suggestion.and_then(|suggestion| suggestion.best_except(rejected));

    writeln!(self.output, "{}", board)?;
    if !rejected.is_empty() {
      let rejected = rejected.iter().map(ToString::to_string).collect::<Vec<_>>();
      writeln!(self.output, "Doesn't change the board: {}", rejected.join(", "))?;
    }
    if let Some(suggestion) = suggestion {
      for (action, value) in suggestion.ranked() {
        writeln!(self.output, "{:>6}: {:.3}", action, value)?;
      }
    }
    if let Some(action) = suggested {
      writeln!(self.output, "Suggested: {}", action)?;
    }

    loop {
      write!(self.output, "> ")?;
      self.output.flush()?;

      let mut line = String::new();
      if self.input.read_line(&mut line)? == 0 {
        return Ok(Choice::Cancel);
      }

      match parse_command(&line) {
        Some(Command::Move(action)) => return Ok(Choice::Move(action)),
        Some(Command::Accept) => match suggested {
          Some(action) => return Ok(Choice::Move(action)),
          None => writeln!(self.output, "Nothing to accept")?,
        },
        Some(Command::Quit) => return Ok(Choice::Cancel),
        None => writeln!(self.output, "Unknown command: {}", line.trim())?,
      }
    }
  }
}
