//! Store configuration
//!
//! Sources, later overriding earlier:
//! 1. Built-in defaults
//! 2. `cineflow.toml`, `cineflow.yaml`, `cineflow.json` in the config directory
//! 3. `CINEFLOW_` environment variables, nested keys split on `__`
//!    (`CINEFLOW_STORAGE__PATH=/srv/boards`)

use crate::drag::{DragConfig, DEFAULT_ACTIVATION_DISTANCE};
use crate::error::Result;
use crate::sync::{FileGateway, MemoryGateway, SyncGateway};
use crate::task::InsertPolicy;
use crate::types::BoardId;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CINEFLOW_";

/// Base name of config files
pub const CONFIG_FILE_STEM: &str = "cineflow";

/// Where board documents live
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageConfig {
    /// In-process only; lost on exit
    #[default]
    Memory,
    /// JSON files under `path`; `watch` also picks up writes from other processes
    File {
        path: PathBuf,
        #[serde(default)]
        watch: bool,
    },
}

impl StorageConfig {
    /// Build the gateway this storage describes
    pub fn gateway(&self) -> Arc<dyn SyncGateway> {
        match self {
            StorageConfig::Memory => Arc::new(MemoryGateway::new()),
            StorageConfig::File { path, .. } => Arc::new(FileGateway::new(path)),
        }
    }
}

/// Settings for one board store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub board_id: BoardId,
    /// Who is connecting; checked against the board's allow-list
    pub identity: Option<String>,
    pub settle_delay_ms: u64,
    pub activation_distance: f64,
    pub insert_policy: InsertPolicy,
    pub storage: StorageConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            board_id: BoardId::from_string("main"),
            identity: None,
            settle_delay_ms: 100,
            activation_distance: DEFAULT_ACTIVATION_DISTANCE,
            insert_policy: InsertPolicy::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl BoardConfig {
    pub fn new(board_id: impl Into<BoardId>) -> Self {
        Self {
            board_id: board_id.into(),
            ..Self::default()
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_insert_policy(mut self, policy: InsertPolicy) -> Self {
        self.insert_policy = policy;
        self
    }

    /// Load from defaults, config files in `dir` (if any), and the environment
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(dir).extract()?;
        debug!(board = %config.board_id, storage = ?config.storage, "loaded board config");
        Ok(config)
    }

    /// The layered sources, for callers that want to merge their own on top
    pub fn figment(dir: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(dir) = dir {
            let file = |ext: &str| dir.join(format!("{CONFIG_FILE_STEM}.{ext}"));
            figment = figment
                .merge(Toml::file(file("toml")))
                .merge(Yaml::file(file("yaml")))
                .merge(Json::file(file("json")));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn drag_config(&self) -> DragConfig {
        DragConfig {
            activation_distance: self.activation_distance,
            insert_policy: self.insert_policy,
        }
    }
}
