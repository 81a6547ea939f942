//! Shared primitives for the Tally workspace

mod error;

pub use error::HttpError;
