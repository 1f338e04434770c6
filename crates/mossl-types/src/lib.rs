#![forbid(unsafe_code)]
#![doc = "Common types and error codes for mossl."]

pub mod error;

pub use error::*;
