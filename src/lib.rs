// Library surface for the binary and headless/integration tests.
pub mod aim;
pub mod app;
pub mod app_dirs;
pub mod auth;
pub mod config;
pub mod error;
pub mod navigation;
pub mod reaction;
pub mod runtime;
pub mod scheduler;
pub mod score_store;
pub mod sensitivity;
pub mod session;
pub mod stats;
pub mod ui;
pub mod util;

pub use app::App;
pub use error::{AppError, Result};
