pub mod api;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use api::v1::FileHostApiV1;
pub use error::{AppError, Result};
pub use services::file_manager::FileManager;

/// Install `env_logger` for host applications. The filter comes from
/// `RUST_LOG` and defaults to `info`. Calling it twice is harmless.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
