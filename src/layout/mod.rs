pub mod fit;
pub mod rng;
