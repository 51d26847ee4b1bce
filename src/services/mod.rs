//! Business logic layer.
//!
//! Catalog, selection, directory flattening, the transfer queue and the
//! delete confirmation gate, tied together by `file_manager`. Delegates all
//! HTTP interaction to the `api` layer.

pub mod catalog;
pub mod confirmation;
pub mod file_manager;
pub mod flattener;
pub mod notifier;
pub mod progress;
pub mod retry_engine;
pub mod selection;
pub mod transfer_queue;
