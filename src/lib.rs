//! Plant health tracking: simulated photo analyses and a per-plant history
//! of them, kept in pluggable key/value storage.

pub mod analysis;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod file_store;
pub mod image;
pub mod kv;
pub mod models;
pub mod store;
pub mod summary;
pub mod tracker;
