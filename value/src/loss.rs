use itertools::izip;
use ndarray::{ArrayView1, ArrayView2};
use num_traits::Float;
use q2048_game::action::ACTIONS;

/// Mean squared error between the value predicted for the taken action and
/// the observed reward.
///
/// Only one of the four predictions of every example is supervised: the one
/// picked by its action. The others don't contribute to the loss.
///
/// Panics on an action index out of `0..4` or on mismatched lengths.
pub fn action_conditioned_mse<N: Float>(
  predictions: ArrayView2<N>,
  actions: ArrayView1<usize>,
  rewards: ArrayView1<N>,
) -> N {
  let (batch, outputs) = predictions.dim();
  assert_eq!(outputs, ACTIONS, "predictions must have a value per action");
  assert_eq!(actions.len(), batch, "actions count doesn't match predictions");
  assert_eq!(rewards.len(), batch, "rewards count doesn't match predictions");
  assert!(batch > 0, "empty batch");

  let sum = izip!(predictions.outer_iter(), actions.iter(), rewards.iter()).fold(
    N::zero(),
    |sum, (values, &action, &reward)| {
      assert!(action < ACTIONS, "invalid action index: {}", action);
      let error = values[action] - reward;
      sum + error * error
    },
  );

  sum / N::from(batch).unwrap_or_else(N::nan)
}
