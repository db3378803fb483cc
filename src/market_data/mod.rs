pub mod bar;
pub mod frame;
pub mod normalizer;

// Re-export the core types for convenient access (e.g. `use crate::market_data::BarSeries`).
pub use bar::{Bar, BarSeries};
pub use frame::RawFrame;
pub use normalizer::normalize;
