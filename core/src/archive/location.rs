//! Where new content goes inside the archive.
//!
//! Every corpus in the archive has the same layout below its base directory: corpus metadata in
//! the corpus structure directory, session metadata in the metadata directory (below the names of
//! the corpora leading to it) and resources sorted by kind into annotations, media and info.

use crate::{
	config::ArchiveConfig,
	workspace::{NodeId, NodeKind, WorkspaceNode},
};

use curator_utils::{chain_optional_iter, error::FileIOError, fs::exists};

use std::{
	collections::HashMap,
	ffi::OsStr,
	path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use super::naming::{sanitize_name, NameOrigin};

/// Upper bound of the `_N` suffix tried when looking for a free file name
pub const MAX_NAME_SUFFIX: u32 = 9_999;

/// What a metadata profile says its documents describe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslateType {
	Corpus,
	Session,
}

#[derive(Error, Debug)]
pub enum PathError {
	#[error("no corpus structure or metadata directory above the parent: <path='{}'>", .0.display())]
	NoTopNodeBoundary(Box<Path>),
	#[error("metadata node is neither a corpus nor a session: <node_id='{0}'>")]
	UnclassifiedMetadata(NodeId),
	#[error("failed to find an available name to avoid duplication: <path='{}'>", .0.display())]
	NoAvailableName(Box<Path>),
	#[error(transparent)]
	FileIO(#[from] FileIOError),
}

#[derive(Debug, Clone)]
pub struct ArchiveLayout {
	corpusstructure_dir: String,
	metadata_dir: String,
	annotations_dir: String,
	media_dir: String,
	info_dir: String,
	max_name_length: usize,
	profile_types: HashMap<String, TranslateType>,
}

impl From<&ArchiveConfig> for ArchiveLayout {
	fn from(config: &ArchiveConfig) -> Self {
		Self {
			corpusstructure_dir: config.corpusstructure_dir.clone(),
			metadata_dir: config.metadata_dir.clone(),
			annotations_dir: config.annotations_dir.clone(),
			media_dir: config.media_dir.clone(),
			info_dir: config.info_dir.clone(),
			max_name_length: config.max_name_length,
			profile_types: config.profile_types.clone(),
		}
	}
}

impl ArchiveLayout {
	#[must_use]
	pub const fn max_name_length(&self) -> usize {
		self.max_name_length
	}

	/// Corpus or session, according to the profile of a metadata node
	#[must_use]
	pub fn translate_type(&self, node: &WorkspaceNode) -> Option<TranslateType> {
		if !node.kind.is_metadata() {
			return None;
		}

		node.profile_schema
			.as_ref()
			.and_then(|profile| self.profile_types.get(profile))
			.copied()
	}

	/// Archive safe file name for a node
	#[must_use]
	pub fn file_name_for(&self, node: &WorkspaceNode) -> String {
		sanitize_name(&node.name, self.max_name_length, NameOrigin::FileName)
	}

	/// Archive safe directory name for a corpus node, taken from its title when it has one
	#[must_use]
	pub fn corpus_dir_name_for(&self, node: &WorkspaceNode) -> String {
		let name = node.title.as_deref().unwrap_or_else(|| {
			Path::new(&node.name)
				.file_stem()
				.and_then(OsStr::to_str)
				.unwrap_or(&node.name)
		});

		sanitize_name(name, self.max_name_length, NameOrigin::Title)
	}

	fn is_boundary(&self, dir: &Path) -> bool {
		dir.file_name().is_some_and(|name| {
			name == OsStr::new(&self.corpusstructure_dir) || name == OsStr::new(&self.metadata_dir)
		})
	}

	/// Base directory of the corpus holding `parent_path`: the parent of the closest corpus
	/// structure or metadata directory above it
	pub fn archive_base_for(&self, parent_path: &Path) -> Result<PathBuf, PathError> {
		parent_path
			.ancestors()
			.skip(1)
			.find(|dir| self.is_boundary(dir))
			.and_then(Path::parent)
			.map(Path::to_path_buf)
			.ok_or_else(|| PathError::NoTopNodeBoundary(parent_path.into()))
	}

	/// Canonical directory for a new node of `kind` whose parent lives at `parent_path`
	pub fn resolve_target_directory(
		&self,
		node: &WorkspaceNode,
		parent_path: &Path,
		corpus_name_path: &Path,
		translate_type: Option<TranslateType>,
	) -> Result<PathBuf, PathError> {
		let base = self.archive_base_for(parent_path)?;

		let directory = match node.kind {
			NodeKind::Metadata => match translate_type {
				Some(TranslateType::Corpus) => base.join(&self.corpusstructure_dir),
				Some(TranslateType::Session) => chain_optional_iter(
					[base, PathBuf::from(&self.metadata_dir)],
					[(!corpus_name_path.as_os_str().is_empty())
						.then(|| corpus_name_path.to_path_buf())],
				)
				.into_iter()
				.collect(),
				None => return Err(PathError::UnclassifiedMetadata(node.id)),
			},
			NodeKind::ResourceWritten => base.join(&self.annotations_dir),
			NodeKind::ResourceAudio | NodeKind::ResourceImage | NodeKind::ResourceVideo => {
				base.join(&self.media_dir)
			}
			NodeKind::ResourceInfo => base.join(&self.info_dir),
		};

		trace!(%node, directory = %directory.display(), "Resolved target directory");

		Ok(directory)
	}
}

/// First free path for `desired_name` in `directory`, trying `stem_1.ext`, `stem_2.ext`, ... on
/// collisions. Nothing is created on disk.
pub async fn resolve_available_file(
	directory: &Path,
	desired_name: &str,
) -> Result<PathBuf, PathError> {
	let candidate = directory.join(desired_name);
	if !exists(&candidate).await? {
		return Ok(candidate);
	}

	let desired = Path::new(desired_name);
	let stem = desired
		.file_stem()
		.and_then(OsStr::to_str)
		.unwrap_or(desired_name);
	let extension = desired
		.extension()
		.and_then(OsStr::to_str)
		.map(|ext| format!(".{ext}"))
		.unwrap_or_default();

	for suffix in 1..=MAX_NAME_SUFFIX {
		let candidate = directory.join(format!("{stem}_{suffix}{extension}"));
		if !exists(&candidate).await? {
			return Ok(candidate);
		}
	}

	Err(PathError::NoAvailableName(directory.join(desired_name).into()))
}
