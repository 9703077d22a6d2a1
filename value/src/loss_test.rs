use crate::loss::action_conditioned_mse;
use ndarray::array;

#[test]
fn gathers_taken_action() {
  let predictions = array![[1.0, 2.0, 3.0, 4.0]];
  let actions = array![2];
  let rewards = array![5.0];
  assert_eq!(action_conditioned_mse(predictions.view(), actions.view(), rewards.view()), 4.0);
}

#[test]
fn averages_over_batch() {
  let predictions = array![[1.0, 2.0, 3.0, 4.0], [0.0, 0.0, 0.0, 10.0], [7.0, -1.0, 0.5, 0.0]];
  let actions = array![0, 3, 1];
  let rewards = array![1.0, 7.0, 1.0];
  // Squared errors: 0, 9, 4.
  let loss = action_conditioned_mse(predictions.view(), actions.view(), rewards.view());
  assert!((loss - 13.0 / 3.0_f64).abs() < 1e-12);
}

#[test]
fn other_actions_are_unconstrained() {
  let actions = array![1];
  let rewards = array![2.0f32];
  let first = array![[100.0f32, 2.0, -50.0, 3.0]];
  let second = array![[-7.0f32, 2.0, 9.0, 0.0]];
  assert_eq!(action_conditioned_mse(first.view(), actions.view(), rewards.view()), 0.0);
  assert_eq!(action_conditioned_mse(second.view(), actions.view(), rewards.view()), 0.0);
}

#[test]
#[should_panic]
fn invalid_action_index() {
  let predictions = array![[1.0, 2.0, 3.0, 4.0]];
  let actions = array![4];
  let rewards = array![5.0];
  action_conditioned_mse(predictions.view(), actions.view(), rewards.view());
}

#[test]
#[should_panic]
fn mismatched_lengths() {
  let predictions = array![[1.0, 2.0, 3.0, 4.0], [1.0, 2.0, 3.0, 4.0]];
  let actions = array![0];
  let rewards = array![5.0, 1.0];
  action_conditioned_mse(predictions.view(), actions.view(), rewards.view());
}
