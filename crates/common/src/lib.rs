//! Shared helpers for the string data and file upload services:
//! logging setup, startup directory checks and small response types.

pub mod types;
pub mod utils;
pub mod env;
