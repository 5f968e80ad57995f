use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

use sunshine_core::openweather::DEFAULT_API_URL;

pub struct Config {
    pub db_path: PathBuf,
    pub jobs_path: PathBuf,
    pub api_url: String,
}

impl Config {
    /// Resolves paths from `SUNSHINE_DATA_DIR` or the platform data directory,
    /// and the endpoint from `SUNSHINE_API_URL`.
    pub fn load() -> Result<Self> {
        let data_dir = match std::env::var_os("SUNSHINE_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => ProjectDirs::from("", "", "sunshine")
                .context("Could not determine home directory")?
                .data_dir()
                .to_path_buf(),
        };
        let api_url = std::env::var("SUNSHINE_API_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self::in_dir(data_dir, api_url)
    }

    pub fn in_dir(data_dir: PathBuf, api_url: String) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Ok(Config {
            db_path: data_dir.join("sunshine.db"),
            jobs_path: data_dir.join("jobs.json"),
            api_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_dir_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested").join("sunshine");
        let config = Config::in_dir(data_dir.clone(), DEFAULT_API_URL.to_string()).unwrap();

        assert!(data_dir.is_dir());
        assert_eq!(config.db_path, data_dir.join("sunshine.db"));
        assert_eq!(config.jobs_path, data_dir.join("jobs.json"));
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
