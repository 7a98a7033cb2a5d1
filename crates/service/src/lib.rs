//! Service layer for the string data and file upload APIs.
//! - `storage` holds the append-only JSON list store.
//! - `file` builds the two concrete stores on top of it.
//! - `repo` exposes them to the HTTP layer as traits.

pub mod errors;
pub mod storage;
pub mod file;
pub mod repo;
