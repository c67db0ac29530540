pub mod generation;
pub mod prediction;
