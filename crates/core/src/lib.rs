pub mod config;
pub mod error;
pub mod model;

pub use error::{CellscopeError, Result};
