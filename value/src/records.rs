//! Raw record files.
//!
//! CSV with a header row and one row per record. Columns: the 16 board cells
//! `s0..s15`, `action`, `reward`, the 16 next board cells `n0..n15` and `done`
//! (0 or 1). Any malformed row fails the whole read.

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use q2048_game::{
  action::{Action, InvalidAction},
  board::{Board, CELLS},
  record::Record,
};
use std::{
  fs::File,
  io::{self, Read, Write},
  path::Path,
};
use thiserror::Error;

/// Number of columns of a row.
pub const COLUMNS: usize = 2 * CELLS + 3;

const ACTION_COLUMN: usize = CELLS;
const REWARD_COLUMN: usize = CELLS + 1;
const NEXT_BOARD_COLUMN: usize = CELLS + 2;
const DONE_COLUMN: usize = 2 * CELLS + 2;

#[derive(Error, Debug)]
pub enum RecordsError {
  #[error("io error: {0}")]
  Io(#[from] io::Error),
  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),
  #[error("missing header")]
  MissingHeader,
  #[error("unexpected header: {0}")]
  Header(String),
  #[error("line {line}: expected {expected} columns, found {found}")]
  ColumnCount { line: u64, expected: usize, found: usize },
  #[error("line {line}: invalid value {value:?} in column {column}")]
  Value { line: u64, column: String, value: String },
  #[error("line {line}: {source}")]
  Action {
    line: u64,
    #[source]
    source: InvalidAction,
  },
}

pub fn header() -> Vec<String> {
  (0..CELLS)
    .map(|i| format!("s{}", i))
    .chain(["action".to_string(), "reward".to_string()])
    .chain((0..CELLS).map(|i| format!("n{}", i)))
    .chain(["done".to_string()])
    .collect()
}

fn line(row: &StringRecord) -> u64 {
  row.position().map_or(0, |position| position.line())
}

fn parse<T: std::str::FromStr>(row: &StringRecord, column: usize) -> Result<T, RecordsError> {
  let value = &row[column];
  value.parse().map_err(|_| RecordsError::Value {
    line: line(row),
    column: header()[column].clone(),
    value: value.to_string(),
  })
}

fn parse_board(row: &StringRecord, offset: usize) -> Result<Board, RecordsError> {
  let mut cells = [0; CELLS];
  for (i, cell) in cells.iter_mut().enumerate() {
    *cell = parse(row, offset + i)?;
  }
  Ok(Board(cells))
}

fn parse_record(row: &StringRecord) -> Result<Record, RecordsError> {
  if row.len() != COLUMNS {
    return Err(RecordsError::ColumnCount {
      line: line(row),
      expected: COLUMNS,
      found: row.len(),
    });
  }

  let board = parse_board(row, 0)?;
  let action = Action::from_index(parse(row, ACTION_COLUMN)?).map_err(|source| RecordsError::Action {
    line: line(row),
    source,
  })?;
  let reward = parse(row, REWARD_COLUMN)?;
  let next_board = parse_board(row, NEXT_BOARD_COLUMN)?;
  let terminal = match parse::<u8>(row, DONE_COLUMN)? {
    0 => false,
    1 => true,
    _ => {
      return Err(RecordsError::Value {
        line: line(row),
        column: header()[DONE_COLUMN].clone(),
        value: row[DONE_COLUMN].to_string(),
      });
    }
  };

  Ok(Record::new(board, action, reward, next_board, terminal))
}

pub fn read_records<R: Read>(reader: R) -> Result<Vec<Record>, RecordsError> {
  let mut reader = ReaderBuilder::new()
    .has_headers(false)
    .flexible(true)
    .trim(Trim::All)
    .from_reader(reader);
  let mut rows = reader.records();

  let header_row = rows.next().ok_or(RecordsError::MissingHeader)??;
  if header_row.iter().ne(header().iter().map(String::as_str)) {
    return Err(RecordsError::Header(header_row.iter().collect::<Vec<_>>().join(",")));
  }

  rows.map(|row| parse_record(&row?)).collect()
}

fn row(record: &Record) -> Vec<String> {
  record
    .board
    .cells()
    .iter()
    .map(u32::to_string)
    .chain([record.action.index().to_string(), record.reward.to_string()])
    .chain(record.next_board.cells().iter().map(u32::to_string))
    .chain([(record.terminal as u8).to_string()])
    .collect()
}

pub fn write_records<W: Write>(writer: W, records: &[Record]) -> Result<(), RecordsError> {
  let mut writer = WriterBuilder::new().from_writer(writer);
  writer.write_record(header())?;
  for record in records {
    writer.write_record(row(record))?;
  }
  writer.flush()?;
  Ok(())
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<Record>, RecordsError> {
  read_records(File::open(path)?)
}

pub fn save<P: AsRef<Path>>(path: P, records: &[Record]) -> Result<(), RecordsError> {
  write_records(File::create(path)?, records)
}
