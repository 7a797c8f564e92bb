pub mod error;

pub use error::{HeapError, Result};
