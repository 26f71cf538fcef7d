//! Channel Protocol Implementation
//!
//! JSON-RPC 2.0 over newline-delimited stdio.

pub mod stdio;
pub mod types;
