use config::{Config, ConfigError, Environment, File};
use monitor::{ServiceConfig, WatcherConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use summarize::OllamaConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub watcher: WatcherSettings,
    pub summarizer: SummarizerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_upload_mb: usize,
}

/// Relative entries are resolved against `root`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub root: PathBuf,
    pub watch_dir: PathBuf,
    pub output_dir: PathBuf,
    pub status_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherSettings {
    pub poll_interval_ms: u64,
    pub error_backoff_ms: u64,
    pub stop_timeout_secs: u64,
    pub autostart: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_chunk_chars: usize,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            max_upload_mb: 25,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
            watch_dir: PathBuf::from("watched"),
            output_dir: PathBuf::from("summaries"),
            status_file: PathBuf::from("file_status.json"),
        }
    }
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            error_backoff_ms: 5000,
            stop_timeout_secs: 30,
            autostart: true,
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            temperature: 0.3,
            max_chunk_chars: ingest::DEFAULT_MAX_CHUNK_CHARS,
            request_timeout_secs: 120,
        }
    }
}

impl PathsConfig {
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl AppConfig {
    /// Defaults, overlaid by an optional `docsum.toml` and then by
    /// `DOCSUM__SECTION__KEY` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("docsum").required(false))
            .add_source(
                Environment::with_prefix("DOCSUM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            watcher: WatcherConfig {
                watch_dir: self.paths.resolve(&self.paths.watch_dir),
                poll_interval: Duration::from_millis(self.watcher.poll_interval_ms),
                error_backoff: Duration::from_millis(self.watcher.error_backoff_ms),
            },
            output_dir: self.paths.resolve(&self.paths.output_dir),
            status_file: self.paths.resolve(&self.paths.status_file),
            max_chunk_chars: self.summarizer.max_chunk_chars,
            stop_timeout: Duration::from_secs(self.watcher.stop_timeout_secs),
        }
    }

    pub fn ollama_config(&self) -> OllamaConfig {
        OllamaConfig {
            base_url: self.summarizer.base_url.clone(),
            model: self.summarizer.model.clone(),
            temperature: self.summarizer.temperature,
            request_timeout: Duration::from_secs(self.summarizer.request_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_defaults_resolve_under_root() {
        let config = AppConfig::default();
        let service = config.service_config();

        assert_eq!(service.watcher.watch_dir, PathBuf::from("data/watched"));
        assert_eq!(service.output_dir, PathBuf::from("data/summaries"));
        assert_eq!(service.status_file, PathBuf::from("data/file_status.json"));
        assert_eq!(service.watcher.poll_interval, Duration::from_secs(2));
        assert_eq!(service.watcher.error_backoff, Duration::from_secs(5));
        assert_eq!(service.max_chunk_chars, 3000);
    }

    #[test]
    fn test_absolute_paths_ignore_root() {
        let mut config = AppConfig::default();
        config.paths.watch_dir = PathBuf::from("/srv/inbox");
        assert_eq!(
            config.service_config().watcher.watch_dir,
            PathBuf::from("/srv/inbox")
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(
                "[summarizer]\nmodel = \"mistral\"\n\n[watcher]\nautostart = false\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.summarizer.model, "mistral");
        assert_eq!(config.summarizer.max_chunk_chars, 3000);
        assert!(!config.watcher.autostart);
        assert_eq!(config.server.bind_addr, "0.0.0.0:5000");
    }
}
