//! Process configuration assembled by the binary.

use std::{net::SocketAddr, path::PathBuf};

use crate::{core::lifecycle::LifecycleConfig, runtime::handle::RuntimeConfig};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub database: PathBuf,
    /// free-exercise-db style JSON file. `None` serves without details.
    pub catalog: Option<PathBuf>,
    /// Keep everything in process memory instead of opening `database`.
    pub in_memory: bool,
    pub runtime: RuntimeConfig,
    pub lifecycle: LifecycleConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            database: PathBuf::from("gymlog.db"),
            catalog: None,
            in_memory: false,
            runtime: RuntimeConfig::default(),
            lifecycle: LifecycleConfig::default(),
        }
    }
}
