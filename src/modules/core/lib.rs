//! Core domain logic for Portico
//!
//! This crate contains the canonical configuration model, the raw document
//! tree it is decoded from, and the structured error types used to report
//! every defect of a configuration load.

pub mod domain;
pub mod error;
pub mod path;

pub use domain::*;
pub use error::{ConfigError, ConfigErrors, ErrorKind, PorticoError};
pub use path::FieldPath;
