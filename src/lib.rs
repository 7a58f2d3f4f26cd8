pub mod datasets;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod settings;
pub mod utils;

pub use error::{Error, Result};
