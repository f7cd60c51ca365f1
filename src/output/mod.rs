//! Output module for writing harvest results
//!
//! This module handles:
//! - Serializing the final record collection to JSON
//! - Writing the data file to disk

mod json;

pub use json::{to_json, write_json};
