//! Error types for the mutation engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown recipe: {0}")]
    UnknownRecipe(String),

    #[error("Value {value} of function {function} still has {uses} use(s)")]
    ValueInUse {
        function: String,
        value: String,
        uses: usize,
    },

    #[error("Program has no function definitions")]
    NoFunctions,

    #[error("Every function was discarded by recipe {0}")]
    NoSurvivingFunctions(String),

    #[error("No valid functions found in {0}")]
    NoValidSeeds(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
