//! Runtime configuration for the filesystem-backed service.

use crate::error::Result;
use crate::service::CostReportService;
use crate::storage::{FsObjectStore, JsonFileUploadLog};
use clap::Args;
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "cost-reports";
pub const LOG_FILE_NAME: &str = "upload-log.json";

pub type FsService = CostReportService<FsObjectStore, JsonFileUploadLog>;

#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Directory holding uploaded billing exports
    #[arg(long, env = "RAM_COST_DATA_DIR", default_value = DEFAULT_DATA_DIR, global = true)]
    pub data_dir: PathBuf,

    /// Upload log file (defaults to upload-log.json inside the data directory)
    #[arg(long, env = "RAM_COST_LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            log_file: None,
        }
    }
}

impl Config {
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join(LOG_FILE_NAME))
    }

    /// Open the object directory and upload log, creating them if missing.
    pub fn open(&self) -> Result<FsService> {
        let store = FsObjectStore::open(&self.data_dir)?;
        let log = JsonFileUploadLog::open(self.log_path())?;
        Ok(CostReportService::new(store, log))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: Config,
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.log_path(), PathBuf::from("cost-reports/upload-log.json"));
    }

    #[test]
    fn test_flags() {
        let cli = TestCli::parse_from(["test", "--data-dir", "/tmp/x", "--log-file", "/tmp/log.json"]);
        assert_eq!(cli.config.data_dir, PathBuf::from("/tmp/x"));
        assert_eq!(cli.config.log_path(), PathBuf::from("/tmp/log.json"));
    }

    #[test]
    fn test_open_creates_directories() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: dir.path().join("objects"),
            log_file: None,
        };
        let svc = config.open().unwrap();
        assert!(svc.store().root().is_dir());
        assert_eq!(svc.log().path(), dir.path().join("objects").join(LOG_FILE_NAME));
    }
}
