//! Storage abstractions for service layer
//!
//! Contains the reusable file-backed list store shared by the string data
//! and upload metadata stores.

pub mod json_list_store;

pub use json_list_store::{Identified, JsonListStore};
