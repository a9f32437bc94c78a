use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_namespace() -> String {
    "map".to_string()
}

/// Configuration for a block database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// World directory that holds the store
    pub dir: PathBuf,

    /// Store name inside the world directory (default: "map")
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Treat corrupt records as absent instead of failing the load (default: false)
    #[serde(default)]
    pub ignore_load_errors: bool,

    /// Sync the engine after every saved block (default: false)
    #[serde(default)]
    pub sync_writes: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./world"),
            namespace: default_namespace(),
            ignore_load_errors: false,
            sync_writes: false,
        }
    }
}

impl StoreConfig {
    /// Create a new config for the given world directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }

    /// Set the store name
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Skip corrupt records on load
    pub fn ignore_load_errors(mut self, enabled: bool) -> Self {
        self.ignore_load_errors = enabled;
        self
    }

    /// Sync after each save
    pub fn sync_writes(mut self, enabled: bool) -> Self {
        self.sync_writes = enabled;
        self
    }

    /// Directory the engine lives in: `<dir>/<namespace>.db`.
    pub fn store_path(&self) -> PathBuf {
        self.dir.join(format!("{}.db", self.namespace))
    }
}
