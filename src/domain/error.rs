use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("Value From cannot be greater than Value To")]
    InvertedRange { from: f64, to: f64 },

    #[error("{field} must be a number")]
    NotANumber { field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("expected an array of rows")]
    NotAnArray,

    #[error("row {0} is not an object")]
    NotAnObject(usize),
}
