#![forbid(unsafe_code)]

//! Core types shared by every wssec crate: the error taxonomy, algorithm
//! URI constants and the XML-DSig / XML-Enc / WS-Security namespace tables.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, ErrorKind, Result};
