pub mod augment;
pub mod batches;
pub mod features;
pub mod loss;
#[cfg(test)]
mod loss_test;
pub mod model;
pub mod policy;
pub mod random_model;
pub mod records;
pub mod session;
#[cfg(test)]
mod session_test;
