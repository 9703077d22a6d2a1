use crate::{features::cast, model::Model};
use ndarray::{Array2, Array3, Axis};
use num_traits::Float;
use q2048_game::action::ACTIONS;
use rand::Rng;
use rand_distr::StandardNormal;

/// Untrained stand-in that predicts normally distributed values.
pub struct RandomModel<R>(pub R);

impl<N: Float, R: Rng> Model<N> for RandomModel<R> {
  type E = ();

  fn predict(&mut self, boards: Array3<N>) -> Result<Array2<N>, Self::E> {
    let batch = boards.len_of(Axis(0));
    Ok(Array2::from_shape_simple_fn((batch, ACTIONS), || {
      cast(self.0.sample::<f64, _>(StandardNormal))
    }))
  }
}
