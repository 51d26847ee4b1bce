//! Local configuration loading.
//!
//! Settings are read from a JSON file and never written back; the host
//! application owns any preference persistence.

pub mod settings;
