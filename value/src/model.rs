use either::Either;
use ndarray::{Array1, Array2, Array3};
use num_traits::Float;

pub trait Model<N: Float> {
  type E;

  /// Action values (`batch × 4`) for normalized boards (`batch × 4 × 4`).
  fn predict(&mut self, boards: Array3<N>) -> Result<Array2<N>, Self::E>;
}

pub trait TrainableModel<N: Float>: Model<N> + Sized {
  type TE: From<Self::E>;

  /// One optimization step on a batch. Returns the updated model and the
  /// batch loss before the update.
  fn train(self, boards: Array3<N>, actions: Array1<usize>, rewards: Array1<N>) -> Result<(Self, N), Self::TE>;

  /// Batch loss without updating the model.
  fn evaluate(&mut self, boards: Array3<N>, actions: Array1<usize>, rewards: Array1<N>) -> Result<N, Self::TE>;
}

impl<N: Float, L: Model<N>, R: Model<N>> Model<N> for Either<L, R> {
  type E = Either<L::E, R::E>;

  fn predict(&mut self, boards: Array3<N>) -> Result<Array2<N>, Self::E> {
    match self {
      Either::Left(model) => model.predict(boards).map_err(Either::Left),
      Either::Right(model) => model.predict(boards).map_err(Either::Right),
    }
  }
}
