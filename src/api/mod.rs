pub mod rest;

pub use rest::{router, ApiState};
