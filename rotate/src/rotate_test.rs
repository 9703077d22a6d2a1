use crate::rotate::{ROTATIONS, SYMMETRIES, Symmetry};
use q2048_game::{action::Action, board::Board, record::Record};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::HashSet;

const SEED: u64 = 7;

fn distinct_board() -> Board {
  Board(std::array::from_fn(|i| 1 << i))
}

fn random_board<R: Rng>(rng: &mut R) -> Board {
  Board(std::array::from_fn(|_| {
    let exponent = rng.random_range(0..12);
    if exponent == 0 { 0 } else { 1 << exponent }
  }))
}

#[test]
fn symmetries_order() {
  for (i, symmetry) in SYMMETRIES.into_iter().enumerate() {
    assert_eq!(symmetry.index(), i);
    assert_eq!(symmetry.flip(), i >= 4);
    assert_eq!(symmetry.turns() as usize, i % 4);
  }
  assert_eq!(SYMMETRIES[0], Symmetry::IDENTITY);
}

#[test]
fn rotate_corner_tile_clockwise() {
  let mut board = Board::EMPTY;
  board.set_cell(0, 0, 2);
  let rotate90 = SYMMETRIES[1];

  let mut expected = Board::EMPTY;
  expected.set_cell(0, 3, 2);
  assert_eq!(rotate90.permute_board(&board), expected);
  assert_eq!(rotate90.relabel_action(Action::Up), Action::Right);
}

#[test]
fn rotate_rows_to_columns() {
  let board = Board::from_rows([[1, 2, 3, 4], [5, 6, 7, 8], [9, 10, 11, 12], [13, 14, 15, 16]]);
  assert_eq!(
    SYMMETRIES[1].permute_board(&board),
    Board::from_rows([[13, 9, 5, 1], [14, 10, 6, 2], [15, 11, 7, 3], [16, 12, 8, 4]])
  );
  assert_eq!(
    SYMMETRIES[2].permute_board(&board),
    Board::from_rows([[16, 15, 14, 13], [12, 11, 10, 9], [8, 7, 6, 5], [4, 3, 2, 1]])
  );
  assert_eq!(
    SYMMETRIES[4].permute_board(&board),
    Board::from_rows([[4, 3, 2, 1], [8, 7, 6, 5], [12, 11, 10, 9], [16, 15, 14, 13]])
  );
  // Flip first, then turn: the flipped first row ends up in the last column.
  assert_eq!(
    SYMMETRIES[5].permute_board(&board),
    Board::from_rows([[16, 12, 8, 4], [15, 11, 7, 3], [14, 10, 6, 2], [13, 9, 5, 1]])
  );
}

#[test]
fn flip_swaps_left_and_right() {
  let flip = SYMMETRIES[4];
  assert_eq!(flip.relabel_action(Action::Up), Action::Up);
  assert_eq!(flip.relabel_action(Action::Right), Action::Left);
  assert_eq!(flip.relabel_action(Action::Down), Action::Down);
  assert_eq!(flip.relabel_action(Action::Left), Action::Right);
  assert_eq!(flip.rotate(2, 0), (2, 3));
}

#[test]
fn flip_then_turn_actions() {
  // [UP, LEFT, DOWN, RIGHT] shifted by the number of turns.
  let expected = [
    [Action::Up, Action::Left, Action::Down, Action::Right],
    [Action::Right, Action::Up, Action::Left, Action::Down],
    [Action::Down, Action::Right, Action::Up, Action::Left],
    [Action::Left, Action::Down, Action::Right, Action::Up],
  ];
  for turns in 0..4 {
    let symmetry = SYMMETRIES[4 + turns];
    for action in Action::ALL {
      assert_eq!(symmetry.relabel_action(action), expected[turns][action.index()]);
    }
  }
}

#[test]
fn relabel_action_is_bijection() {
  for symmetry in SYMMETRIES {
    let images = Action::ALL
      .into_iter()
      .map(|action| symmetry.relabel_action(action))
      .collect::<HashSet<_>>();
    assert_eq!(images.len(), Action::ALL.len());
  }
}

#[test]
fn permute_board_inverse() {
  let mut rng = Xoshiro256PlusPlus::seed_from_u64(SEED);
  for _ in 0..32 {
    let board = random_board(&mut rng);
    for symmetry in SYMMETRIES {
      let image = symmetry.permute_board(&board);
      assert_eq!(symmetry.inverse().permute_board(&image), board);
    }
  }
}

#[test]
fn inverse_composes_to_identity() {
  for symmetry in SYMMETRIES {
    assert_eq!(symmetry.then(symmetry.inverse()), Symmetry::IDENTITY);
    assert_eq!(symmetry.inverse().then(symmetry), Symmetry::IDENTITY);
    for action in Action::ALL {
      assert_eq!(symmetry.inverse().relabel_action(symmetry.relabel_action(action)), action);
    }
  }
}

#[test]
fn relabel_action_homomorphism() {
  for first in SYMMETRIES {
    for second in SYMMETRIES {
      let composed = first.then(second);
      for action in Action::ALL {
        assert_eq!(
          second.relabel_action(first.relabel_action(action)),
          composed.relabel_action(action),
          "{:?} then {:?} on {:?}",
          first,
          second,
          action
        );
      }
    }
  }
}

#[test]
fn permute_board_homomorphism() {
  let board = distinct_board();
  for first in SYMMETRIES {
    for second in SYMMETRIES {
      assert_eq!(
        second.permute_board(&first.permute_board(&board)),
        first.then(second).permute_board(&board),
        "{:?} then {:?}",
        first,
        second
      );
    }
  }
}

#[test]
fn group_is_closed_and_complete() {
  let mut products = HashSet::new();
  for first in SYMMETRIES {
    for second in SYMMETRIES {
      products.insert(first.then(second));
    }
  }
  assert_eq!(products.len(), ROTATIONS);
  assert!(products.iter().all(|symmetry| SYMMETRIES.contains(symmetry)));

  let turn = SYMMETRIES[1];
  let full_turn = turn.then(turn).then(turn).then(turn);
  assert_eq!(full_turn, Symmetry::IDENTITY);
}

#[test]
fn images_are_distinct_for_asymmetric_board() {
  let board = distinct_board();
  let images = SYMMETRIES
    .iter()
    .map(|symmetry| symmetry.permute_board(&board))
    .collect::<HashSet<_>>();
  assert_eq!(images.len(), ROTATIONS);
}

#[test]
fn symmetric_board_keeps_distinct_pairs_only_by_action() {
  let board = Board([2; 16]);
  let record = Record::new(board, Action::Up, 4.0, board, false);
  let images = SYMMETRIES.iter().map(|symmetry| symmetry.apply(&record)).collect::<Vec<_>>();
  assert!(images.iter().all(|image| image.board == board));
  let pairs = images
    .iter()
    .map(|image| (image.board, image.action))
    .collect::<HashSet<_>>();
  assert_eq!(pairs.len(), Action::ALL.len());
}

#[test]
fn apply_keeps_reward_and_terminal() {
  let board = distinct_board();
  let next_board = SYMMETRIES[2].permute_board(&board);
  let record = Record::new(board, Action::Left, 12.5, next_board, true);
  for symmetry in SYMMETRIES {
    let image = symmetry.apply(&record);
    assert_eq!(image.reward, record.reward);
    assert_eq!(image.terminal, record.terminal);
    assert_eq!(image.board, symmetry.permute_board(&record.board));
    assert_eq!(image.next_board, symmetry.permute_board(&record.next_board));
    assert_eq!(image.action, symmetry.relabel_action(record.action));
  }
}
