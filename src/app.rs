//! Application context shared by CLI commands

use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::cli::progress::ProgressMode;
use crate::config::Config;
use crate::error::Result;
use crate::search::Pipeline;
use crate::storage::Database;

/// Default data directory, relative to the working directory
pub const DEFAULT_ROOT: &str = ".lexgraph";

#[derive(Debug)]
pub struct AppContext {
    /// Data directory holding the database and project config
    pub root: PathBuf,
    pub config: Config,
    pub db_path: PathBuf,
    pub robot_mode: bool,
    pub progress_mode: ProgressMode,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let root = resolve_root(cli.root.as_deref());
        let config = Config::load(cli.config.as_deref(), &root)?;
        let db_path = config.store.resolve_db_path(&root);
        let robot_mode = cli.robot;
        Ok(Self {
            root,
            db_path,
            robot_mode,
            progress_mode: ProgressMode::detect(robot_mode, cli.quiet),
            config,
        })
    }

    /// Open (creating and migrating if needed) the database.
    pub fn open_db(&self) -> Result<Database> {
        Database::open(&self.db_path)
    }

    /// Query pipeline over the SQLite stores.
    pub fn pipeline(&self) -> Result<Pipeline> {
        Pipeline::open(&self.config, &self.db_path)
    }

    /// Print a robot-mode payload, honouring `robot.pretty`.
    pub fn emit_json<T: serde::Serialize>(&self, value: &T) -> Result<()> {
        crate::cli::output::emit_json(value, self.config.robot.pretty)
    }
}

fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(|| PathBuf::from(DEFAULT_ROOT), Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_defaults_to_dot_dir() {
        assert_eq!(resolve_root(None), PathBuf::from(".lexgraph"));
        assert_eq!(
            resolve_root(Some(Path::new("/data/lex"))),
            PathBuf::from("/data/lex")
        );
    }
}
