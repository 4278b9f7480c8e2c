//! Core types and utilities shared by the irmut mutation engine and its tools.

pub mod config;
pub mod error;

pub use config::*;
pub use error::{Error, Result};
