//! Dated trash and versioning directories.
//!
//! Deleted, unlinked and superseded files are never erased from the archive. They are moved to
//! `{root}/{year}-{month}/{workspace_id}/` under a name that carries their archive identifier.

use crate::{config::RelocationConfig, workspace::WorkspaceId};

use curator_utils::{
	error::FileIOError,
	fs::{ensure_writable_dir, exists, move_file},
};

use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDate};
use strum::Display;
use thiserror::Error;
use tracing::{debug, instrument};

use super::naming;

const HANDLE_PREFIX: &str = "hdl:";

#[derive(Error, Debug)]
pub enum RelocationError {
	#[error("relocation target directory unusable: {0}")]
	TargetDirectory(#[source] FileIOError),
	#[error("no file name to relocate: <path='{}'>", .0.display())]
	MissingFileName(Box<Path>),
	#[error("relocation would overwrite another file: <path='{}'>", .0.display())]
	WouldOverwrite(Box<Path>),
	#[error("failed to move file: {0}")]
	Move(#[source] FileIOError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RelocationRoot {
	Trash,
	Versioning,
}

/// Target file name scheme for relocated files
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionedName {
	/// `v{id}__.{base}`, for numeric identifiers of the old archive
	Legacy(u64),
	/// `v_{handle}__.{base}`
	Handle(String),
}

impl VersionedName {
	#[must_use]
	pub fn for_identifier(identifier: &str) -> Self {
		if let Ok(id) = identifier.parse::<u64>() {
			return Self::Legacy(id);
		}

		let handle = identifier.strip_prefix(HANDLE_PREFIX).unwrap_or(identifier);
		Self::Handle(naming::sanitize(handle, usize::MAX))
	}

	#[must_use]
	pub fn file_name(&self, original_base_name: &str) -> String {
		match self {
			Self::Legacy(id) => format!("v{id}__.{original_base_name}"),
			Self::Handle(handle) => format!("v_{handle}__.{original_base_name}"),
		}
	}
}

#[derive(Debug, Clone)]
pub struct RelocationScheme {
	trash_root: PathBuf,
	versioning_root: PathBuf,
}

impl From<&RelocationConfig> for RelocationScheme {
	fn from(config: &RelocationConfig) -> Self {
		Self::new(&config.trash_root, &config.versioning_root)
	}
}

impl RelocationScheme {
	pub fn new(trash_root: impl Into<PathBuf>, versioning_root: impl Into<PathBuf>) -> Self {
		Self {
			trash_root: trash_root.into(),
			versioning_root: versioning_root.into(),
		}
	}

	#[must_use]
	pub fn root(&self, root: RelocationRoot) -> &Path {
		match root {
			RelocationRoot::Trash => &self.trash_root,
			RelocationRoot::Versioning => &self.versioning_root,
		}
	}

	/// Directory for files relocated today
	#[must_use]
	pub fn directory_for(&self, root: RelocationRoot, workspace_id: WorkspaceId) -> PathBuf {
		self.directory_for_date(root, workspace_id, Local::now().date_naive())
	}

	#[must_use]
	pub fn directory_for_date(
		&self,
		root: RelocationRoot,
		workspace_id: WorkspaceId,
		date: NaiveDate,
	) -> PathBuf {
		self.root(root)
			.join(format!("{:04}-{:02}", date.year(), date.month()))
			.join(workspace_id.to_string())
	}

	pub fn target_file_for(
		&self,
		directory: &Path,
		identifier: &str,
		current: &Path,
	) -> Result<PathBuf, RelocationError> {
		let base_name = current
			.file_name()
			.map(|name| name.to_string_lossy())
			.ok_or_else(|| RelocationError::MissingFileName(current.into()))?;

		Ok(directory.join(VersionedName::for_identifier(identifier).file_name(&base_name)))
	}

	/// `true` when `location` already sits below the trash or versioning root
	#[must_use]
	pub fn is_relocated(&self, location: &Path) -> bool {
		location.starts_with(&self.trash_root) || location.starts_with(&self.versioning_root)
	}

	/// Move the file at `current` into today's directory of `root`, returning where it landed.
	///
	/// On error nothing was moved, callers must keep pointing at `current`.
	#[instrument(skip(self), err)]
	pub async fn relocate(
		&self,
		root: RelocationRoot,
		workspace_id: WorkspaceId,
		identifier: &str,
		current: &Path,
	) -> Result<PathBuf, RelocationError> {
		let directory = self.directory_for(root, workspace_id);

		ensure_writable_dir(&directory)
			.await
			.map_err(RelocationError::TargetDirectory)?;

		let target = self.target_file_for(&directory, identifier, current)?;

		if exists(&target).await.map_err(RelocationError::Move)? {
			return Err(RelocationError::WouldOverwrite(target.into()));
		}

		move_file(current, &target)
			.await
			.map_err(RelocationError::Move)?;

		debug!(target = %target.display(), "Relocated file");

		Ok(target)
	}
}
