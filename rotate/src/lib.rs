pub mod rotate;
#[cfg(test)]
mod rotate_test;
