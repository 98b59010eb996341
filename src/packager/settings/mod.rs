//! Configuration records consumed by the pipeline.
//!
//! [`AppConfig`] describes the application being packaged, [`BuildOptions`]
//! describes one build. Both are usually produced by
//! [`crate::config::ConfigManager`] but can be constructed directly.

mod app;
mod builder;
mod options;

pub use app::AppConfig;
pub use builder::{BuildOptionsBuilder, DEFAULT_BUILD_TIMEOUT};
pub use options::{BuildOptions, BuildTool, BuildType, KeystoreConfig};
