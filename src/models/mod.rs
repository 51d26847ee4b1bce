//! Data models shared across the crate: remote file records, hit-testing
//! geometry, pending uploads, transfer jobs and settings.

pub mod file;
pub mod geometry;
pub mod pending;
pub mod settings;
pub mod transfer;
