use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeapError {
    #[error("Duplicated heap entry ID: '{0}'")]
    DuplicateId(String),

    #[error("Class '{0}' is not registered in the heap scope")]
    UnknownClass(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Lock error: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, HeapError>;


impl<T> From<std::sync::PoisonError<T>> for HeapError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}
