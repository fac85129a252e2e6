//! Workspaces and the nodes they stage.
//!
//! A [`Workspace`] mirrors a subtree of the archive. Each [`WorkspaceNode`] either mirrors an
//! archived file (it carries the archive identifier and location) or is new to the archive (both
//! fields are `None`). The export pipeline is the only thing that touches the archive fields after
//! a node is created.

use std::{
	fmt,
	path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

pub type WorkspaceId = i32;
pub type NodeId = i32;

#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
	Metadata,
	ResourceWritten,
	ResourceAudio,
	ResourceImage,
	ResourceVideo,
	ResourceInfo,
}

impl NodeKind {
	#[must_use]
	pub const fn is_metadata(self) -> bool {
		matches!(self, Self::Metadata)
	}

	#[must_use]
	pub const fn is_media(self) -> bool {
		matches!(
			self,
			Self::ResourceAudio | Self::ResourceImage | Self::ResourceVideo
		)
	}
}

#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
	/// Unchanged copy of an archived node
	IsCopy,
	Uploaded,
	Created,
	Deleted,
	Virtual,
	External,
	Replaced,
}

/// Lifecycle of a workspace. Variants are declared in the order they are reached.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkspaceStatus {
	Uninitialised,
	Initialised,
	Submitted,
	/// Submitted and waiting for the crawler to finish reconciling the archive
	UpdatingArchive,
	DataMovedSuccess,
	DataMovedError,
	Error,
}

impl WorkspaceStatus {
	#[must_use]
	pub const fn is_terminal(self) -> bool {
		matches!(
			self,
			Self::DataMovedSuccess | Self::DataMovedError | Self::Error
		)
	}

	const fn rank(self) -> u8 {
		match self {
			Self::Uninitialised => 0,
			Self::Initialised => 1,
			Self::Submitted => 2,
			Self::UpdatingArchive => 3,
			Self::DataMovedSuccess | Self::DataMovedError | Self::Error => 4,
		}
	}

	/// Status only ever moves forward, and nothing leaves a terminal status
	#[must_use]
	pub const fn can_transition_to(self, next: Self) -> bool {
		!self.is_terminal() && next.rank() > self.rank()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionType {
	SubmitWorkspace,
	DeleteWorkspace,
}

#[derive(Error, Debug)]
#[error("invalid workspace status transition: <workspace_id='{workspace_id}', from='{from}', to='{to}'>")]
pub struct InvalidTransition {
	pub workspace_id: WorkspaceId,
	pub from: WorkspaceStatus,
	pub to: WorkspaceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
	pub id: WorkspaceId,
	pub user_id: String,
	pub top_node_id: NodeId,
	pub top_node_archive_uri: Option<String>,
	pub top_node_archive_location: Option<PathBuf>,
	/// Only set once the workspace was submitted and the crawler accepted the job
	pub crawler_id: Option<String>,
	pub status: WorkspaceStatus,
	pub message: String,
	pub used_storage_bytes: u64,
	pub max_storage_bytes: u64,
	pub start_date: DateTime<Utc>,
	pub end_date: Option<DateTime<Utc>>,
	pub session_start_date: DateTime<Utc>,
	pub session_end_date: Option<DateTime<Utc>>,
}

impl Workspace {
	#[must_use]
	pub fn new(id: WorkspaceId, user_id: impl Into<String>, top_node_id: NodeId) -> Self {
		let now = Utc::now();

		Self {
			id,
			user_id: user_id.into(),
			top_node_id,
			top_node_archive_uri: None,
			top_node_archive_location: None,
			crawler_id: None,
			status: WorkspaceStatus::Initialised,
			message: String::new(),
			used_storage_bytes: 0,
			max_storage_bytes: 0,
			start_date: now,
			end_date: None,
			session_start_date: now,
			session_end_date: None,
		}
	}

	/// Move to `next`, refusing anything that is not a forward transition
	pub fn transition(
		&mut self,
		next: WorkspaceStatus,
		message: impl Into<String>,
	) -> Result<(), InvalidTransition> {
		if !self.status.can_transition_to(next) {
			return Err(InvalidTransition {
				workspace_id: self.id,
				from: self.status,
				to: next,
			});
		}

		self.status = next;
		self.message = message.into();

		if next.is_terminal() {
			let now = Utc::now();
			self.end_date = Some(now);
			self.session_end_date = Some(now);
		}

		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceNode {
	pub id: NodeId,
	pub workspace_id: WorkspaceId,
	pub kind: NodeKind,
	pub status: NodeStatus,
	pub name: String,
	pub title: Option<String>,
	/// Where the staged file lives inside the workspace
	pub workspace_location: PathBuf,
	/// Persistent handle; `None` iff the node never existed in the archive
	pub archive_uri: Option<String>,
	pub archive_location: Option<PathBuf>,
	pub origin_location: Option<PathBuf>,
	pub profile_schema: Option<String>,
	pub format: String,
	pub protected: bool,
}

impl WorkspaceNode {
	#[must_use]
	pub fn new(
		id: NodeId,
		workspace_id: WorkspaceId,
		kind: NodeKind,
		status: NodeStatus,
		name: impl Into<String>,
		workspace_location: impl Into<PathBuf>,
	) -> Self {
		Self {
			id,
			workspace_id,
			kind,
			status,
			name: name.into(),
			title: None,
			workspace_location: workspace_location.into(),
			archive_uri: None,
			archive_location: None,
			origin_location: None,
			profile_schema: None,
			format: String::new(),
			protected: false,
		}
	}

	#[must_use]
	pub fn with_archive(mut self, uri: impl Into<String>, location: impl Into<PathBuf>) -> Self {
		self.archive_uri = Some(uri.into());
		self.archive_location = Some(location.into());
		self
	}

	#[must_use]
	pub fn with_profile(mut self, profile_schema: impl Into<String>) -> Self {
		self.profile_schema = Some(profile_schema.into());
		self
	}

	#[must_use]
	pub fn with_title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());
		self
	}

	#[must_use]
	pub const fn protected(mut self) -> Self {
		self.protected = true;
		self
	}

	/// Identifier and location of the node in the archive, if it was ever archived
	#[must_use]
	pub fn archived(&self) -> Option<(&str, &Path)> {
		self.archive_uri
			.as_deref()
			.zip(self.archive_location.as_deref())
	}

	/// Title when there is one, otherwise the file name
	#[must_use]
	pub fn display_name(&self) -> &str {
		self.title.as_deref().unwrap_or(&self.name)
	}
}

impl fmt::Display for WorkspaceNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"<node_id='{}', kind='{}', status='{}'",
			self.id, self.kind, self.status
		)?;
		if let Some(uri) = &self.archive_uri {
			write!(f, ", archive_uri='{uri}'")?;
		}
		write!(f, ">")
	}
}
