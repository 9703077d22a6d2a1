//! Training set multiplication by board symmetries.
//!
//! Records of boards that are symmetric themselves produce repeated images.
//! They are kept: such positions get a proportionally bigger weight.

use q2048_game::record::Record;
use q2048_rotate::rotate::Symmetry;
use rayon::prelude::*;

/// Lazily yields every record transformed by every symmetry: all images of
/// the first record in symmetries order, then all images of the second one
/// and so on.
pub fn augmented<'a, I>(records: I, symmetries: &'a [Symmetry]) -> impl Iterator<Item = Record> + Clone + 'a
where
  I: IntoIterator<Item = Record> + 'a,
  I::IntoIter: Clone + 'a,
{
  records
    .into_iter()
    .flat_map(move |record| symmetries.iter().map(move |symmetry| symmetry.apply(&record)))
}

pub fn augment(records: &[Record], symmetries: &[Symmetry]) -> Vec<Record> {
  augmented(records.iter().copied(), symmetries).collect()
}

/// Same records as `augment` computed on the rayon pool. Consumers must not
/// rely on the order.
pub fn par_augment(records: &[Record], symmetries: &[Symmetry]) -> Vec<Record> {
  records
    .par_iter()
    .flat_map_iter(|record| symmetries.iter().map(move |symmetry| symmetry.apply(record)))
    .collect()
}
