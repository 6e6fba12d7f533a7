pub mod contraction;
pub mod volume;
