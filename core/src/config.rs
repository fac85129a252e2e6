//! Engine configuration, persisted as JSON

use crate::archive::location::TranslateType;

use curator_utils::error::{FileIOError, IoResultExt};

use std::{
	collections::HashMap,
	fs,
	path::{Path, PathBuf},
	time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

const CONFIG_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error(transparent)]
	FileIO(#[from] FileIOError),
	#[error("malformed config file <path='{}'>: {source}", .path.display())]
	Parse {
		path: Box<Path>,
		#[source]
		source: serde_json::Error,
	},
	#[error("failed to serialize config: {0}")]
	Serialize(#[from] serde_json::Error),
	#[error("config schema version {found} is newer than the supported version {supported}")]
	UnsupportedVersion { found: u32, supported: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuratorConfig {
	/// Config schema version
	pub version: u32,

	pub archive: ArchiveConfig,

	pub relocation: RelocationConfig,

	#[serde(default)]
	pub crawler: CrawlerConfig,

	#[serde(default)]
	pub logging: LoggingConfig,
}

/// Names of the canonical archive directories and how metadata profiles are classified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
	pub corpusstructure_dir: String,
	pub metadata_dir: String,
	pub annotations_dir: String,
	pub media_dir: String,
	pub info_dir: String,

	/// Longest file or directory name written into the archive
	pub max_name_length: usize,

	/// Metadata profile schema -> whether documents of that profile describe a corpus or a session
	pub profile_types: HashMap<String, TranslateType>,
}

impl Default for ArchiveConfig {
	fn default() -> Self {
		Self {
			corpusstructure_dir: "Corpusstructure".to_string(),
			metadata_dir: "Metadata".to_string(),
			annotations_dir: "Annotations".to_string(),
			media_dir: "Media".to_string(),
			info_dir: "Info".to_string(),
			max_name_length: 100,
			profile_types: HashMap::new(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationConfig {
	/// Where deleted and unlinked files are moved to
	pub trash_root: PathBuf,

	/// Where superseded versions of replaced files are moved to
	pub versioning_root: PathBuf,
}

impl Default for RelocationConfig {
	fn default() -> Self {
		Self {
			trash_root: PathBuf::from("trash"),
			versioning_root: PathBuf::from("versioning"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
	pub poll_interval_secs: u64,
}

impl CrawlerConfig {
	#[must_use]
	pub const fn poll_interval(&self) -> Duration {
		Duration::from_secs(self.poll_interval_secs)
	}
}

impl Default for CrawlerConfig {
	fn default() -> Self {
		Self {
			poll_interval_secs: 60,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
	/// Default filter directive, overridden by `RUST_LOG`
	pub level: String,

	/// When set, logs are also written to daily rolling files in this directory
	pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			directory: None,
		}
	}
}

impl Default for CuratorConfig {
	fn default() -> Self {
		Self {
			version: CONFIG_VERSION,
			archive: ArchiveConfig::default(),
			relocation: RelocationConfig::default(),
			crawler: CrawlerConfig::default(),
			logging: LoggingConfig::default(),
		}
	}
}

impl CuratorConfig {
	/// Load the config at `path`, writing a default one there if it does not exist yet
	pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();

		if !path.exists() {
			warn!(path = %path.display(), "No config found, creating default");
			let config = Self::default();
			config.save(path)?;
			return Ok(config);
		}

		info!(path = %path.display(), "Loading config");
		let json = fs::read_to_string(path).at_path_with(path, "reading config")?;
		let config = serde_json::from_str::<Self>(&json).map_err(|source| ConfigError::Parse {
			path: path.into(),
			source,
		})?;

		if config.version > CONFIG_VERSION {
			return Err(ConfigError::UnsupportedVersion {
				found: config.version,
				supported: CONFIG_VERSION,
			});
		}

		Ok(config)
	}

	pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
		let path = path.as_ref();

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).at_path_with(parent, "creating config directory")?;
		}

		let json = serde_json::to_string_pretty(self)?;
		fs::write(path, json).at_path_with(path, "writing config")?;
		info!(path = %path.display(), "Saved config");

		Ok(())
	}
}
