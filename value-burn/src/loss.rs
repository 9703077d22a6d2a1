use burn::tensor::{Int, Tensor, backend::Backend};

/// Mean squared error between the predicted value of the taken action and
/// the observed reward. `predictions` is `batch × 4`, `actions` and `rewards`
/// are `batch`. Action indices must be checked by the caller.
pub fn action_conditioned_loss<B: Backend>(
  predictions: Tensor<B, 2>,
  actions: Tensor<B, 1, Int>,
  rewards: Tensor<B, 1>,
) -> Tensor<B, 1> {
  let [batch, _] = predictions.dims();
  let gathered = predictions.gather(1, actions.reshape([batch, 1])).reshape([batch]);
  (gathered - rewards).powf_scalar(2.0).mean()
}
