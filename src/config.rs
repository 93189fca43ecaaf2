use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LgError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub robot: RobotConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("LEXGRAPH_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(root)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("lexgraph/config.toml"))
    }

    fn load_project(root: &Path) -> Result<Option<ConfigPatch>> {
        Self::load_patch(&root.join("config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| LgError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| LgError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.store {
            self.store.merge(patch);
        }
        if let Some(patch) = patch.search {
            self.search.merge(patch);
        }
        if let Some(patch) = patch.graph {
            self.graph.merge(patch);
        }
        if let Some(patch) = patch.ingest {
            self.ingest.merge(patch);
        }
        if let Some(patch) = patch.robot {
            self.robot.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_string("LEXGRAPH_STORE_DB_PATH") {
            self.store.db_path = PathBuf::from(value);
        }

        if let Some(value) = env_string("LEXGRAPH_SEARCH_EMBEDDING_BACKEND") {
            self.search.embedding_backend = value;
        }
        if let Some(value) = env_u32("LEXGRAPH_SEARCH_EMBEDDING_DIMS")? {
            self.search.embedding_dims = value;
        }
        if let Some(value) = env_string("LEXGRAPH_SEARCH_EMBEDDING_URL") {
            self.search.embedding_url = Some(value);
        }
        if let Some(value) = env_u64("LEXGRAPH_SEARCH_EMBEDDING_TIMEOUT_MS")? {
            self.search.embedding_timeout_ms = value;
        }
        if let Some(value) = env_u32("LEXGRAPH_SEARCH_MAX_INPUT_TOKENS")? {
            self.search.max_input_tokens = value;
        }
        if let Some(value) = env_string("LEXGRAPH_SEARCH_DISTANCE_METRIC") {
            self.search.distance_metric = value;
        }
        if let Some(value) = env_u32("LEXGRAPH_SEARCH_TOP_K")? {
            self.search.top_k = value;
        }
        if let Some(value) = env_f64("LEXGRAPH_SEARCH_ALPHA")? {
            self.search.alpha = value;
        }
        if let Some(value) = env_f64("LEXGRAPH_SEARCH_BETA")? {
            self.search.beta = value;
        }

        if let Some(value) = env_u64("LEXGRAPH_GRAPH_TIMEOUT_MS")? {
            self.graph.timeout_ms = value;
        }
        if let Some(value) = env_bool("LEXGRAPH_GRAPH_PARALLEL_LOOKUPS") {
            self.graph.parallel_lookups = value;
        }

        if let Some(value) = env_bool("LEXGRAPH_INGEST_SKIP_UNCHANGED") {
            self.ingest.skip_unchanged = value;
        }
        if let Some(value) = env_bool("LEXGRAPH_ROBOT_PRETTY") {
            self.robot.pretty = value;
        }

        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.search.embedding_dims == 0 {
            return Err(LgError::Config(
                "search.embedding_dims must be greater than 0".to_string(),
            ));
        }
        if self.search.top_k == 0 {
            return Err(LgError::Config(
                "search.top_k must be greater than 0".to_string(),
            ));
        }
        for (name, value) in [("alpha", self.search.alpha), ("beta", self.search.beta)] {
            if !value.is_finite() || value < 0.0 {
                return Err(LgError::Config(format!(
                    "search.{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        if !matches!(
            self.search.distance_metric.to_lowercase().as_str(),
            "l2" | "cosine"
        ) {
            return Err(LgError::Config(format!(
                "invalid search.distance_metric {} (expected l2|cosine)",
                self.search.distance_metric
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Relative paths resolve against the lexgraph root.
    #[serde(default)]
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("lexgraph.db"),
        }
    }
}

impl StoreConfig {
    fn merge(&mut self, patch: StorePatch) {
        if let Some(value) = patch.db_path {
            self.db_path = value;
        }
    }

    #[must_use]
    pub fn resolve_db_path(&self, root: &Path) -> PathBuf {
        if self.db_path.is_absolute() {
            self.db_path.clone()
        } else {
            root.join(&self.db_path)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub embedding_backend: String,
    #[serde(default)]
    pub embedding_dims: u32,
    /// Endpoint for the `api` backend
    #[serde(default)]
    pub embedding_url: Option<String>,
    #[serde(default)]
    pub embedding_timeout_ms: u64,
    #[serde(default)]
    pub max_input_tokens: u32,
    /// `l2` (squared euclidean) or `cosine`
    #[serde(default)]
    pub distance_metric: String,
    #[serde(default)]
    pub top_k: u32,
    #[serde(default)]
    pub alpha: f64,
    #[serde(default)]
    pub beta: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            embedding_backend: "hash".to_string(),
            embedding_dims: 384,
            embedding_url: None,
            embedding_timeout_ms: 10_000,
            max_input_tokens: 512,
            distance_metric: "l2".to_string(),
            top_k: 10,
            alpha: 0.7,
            beta: 0.3,
        }
    }
}

impl SearchConfig {
    fn merge(&mut self, patch: SearchPatch) {
        if let Some(value) = patch.embedding_backend {
            self.embedding_backend = value;
        }
        if let Some(value) = patch.embedding_dims {
            self.embedding_dims = value;
        }
        if let Some(value) = patch.embedding_url {
            self.embedding_url = Some(value);
        }
        if let Some(value) = patch.embedding_timeout_ms {
            self.embedding_timeout_ms = value;
        }
        if let Some(value) = patch.max_input_tokens {
            self.max_input_tokens = value;
        }
        if let Some(value) = patch.distance_metric {
            self.distance_metric = value;
        }
        if let Some(value) = patch.top_k {
            self.top_k = value;
        }
        if let Some(value) = patch.alpha {
            self.alpha = value;
        }
        if let Some(value) = patch.beta {
            self.beta = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Per-lookup budget; `0` disables the timeout
    #[serde(default)]
    pub timeout_ms: u64,
    #[serde(default)]
    pub parallel_lookups: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2_000,
            parallel_lookups: true,
        }
    }
}

impl GraphConfig {
    fn merge(&mut self, patch: GraphPatch) {
        if let Some(value) = patch.timeout_ms {
            self.timeout_ms = value;
        }
        if let Some(value) = patch.parallel_lookups {
            self.parallel_lookups = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Reuse stored vectors whose content hash is unchanged
    #[serde(default)]
    pub skip_unchanged: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            skip_unchanged: true,
        }
    }
}

impl IngestConfig {
    fn merge(&mut self, patch: IngestPatch) {
        if let Some(value) = patch.skip_unchanged {
            self.skip_unchanged = value;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RobotConfig {
    #[serde(default)]
    pub pretty: bool,
}

impl RobotConfig {
    fn merge(&mut self, patch: RobotPatch) {
        if let Some(value) = patch.pretty {
            self.pretty = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub store: Option<StorePatch>,
    pub search: Option<SearchPatch>,
    pub graph: Option<GraphPatch>,
    pub ingest: Option<IngestPatch>,
    pub robot: Option<RobotPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StorePatch {
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SearchPatch {
    pub embedding_backend: Option<String>,
    pub embedding_dims: Option<u32>,
    pub embedding_url: Option<String>,
    pub embedding_timeout_ms: Option<u64>,
    pub max_input_tokens: Option<u32>,
    pub distance_metric: Option<String>,
    pub top_k: Option<u32>,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GraphPatch {
    pub timeout_ms: Option<u64>,
    pub parallel_lookups: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct IngestPatch {
    pub skip_unchanged: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RobotPatch {
    pub pretty: Option<bool>,
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn env_u32(key: &str) -> Result<Option<u32>> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<u32>()
            .map(Some)
            .map_err(|err| LgError::Config(format!("invalid {key} value {value}: {err}"))),
        Err(_) => Ok(None),
    }
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|err| LgError::Config(format!("invalid {key} value {value}: {err}"))),
        Err(_) => Ok(None),
    }
}

fn env_f64(key: &str) -> Result<Option<f64>> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<f64>()
            .map(Some)
            .map_err(|err| LgError::Config(format!("invalid {key} value {value}: {err}"))),
        Err(_) => Ok(None),
    }
}
