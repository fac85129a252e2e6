//! Interfaces to the services the engine talks to but does not own.
//!
//! Every bridge is passed in explicitly through [`Bridges`]; there is no global registry.

use crate::{
	crawler::CrawlerState,
	workspace::{Workspace, WorkspaceId, WorkspaceNode},
};

use std::{
	error::Error as StdError,
	path::{Path, PathBuf},
	sync::Arc,
};

use async_trait::async_trait;
use strum::Display;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Service {
	ArchiveLookup,
	HandleServer,
	Crawler,
	SearchIndex,
	PermissionAdjuster,
	Mailer,
	MetadataDocuments,
}

#[derive(Error, Debug)]
#[error("{service} request failed: {source}")]
pub struct BridgeError {
	pub service: Service,
	#[source]
	pub source: Box<dyn StdError + Send + Sync>,
}

impl BridgeError {
	pub fn new(service: Service, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
		Self {
			service,
			source: source.into(),
		}
	}
}

/// What the archive knows about one of its files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFileInfo {
	pub location: PathBuf,
	pub size: u64,
	/// Lowercase hex SHA-256 of the archived content
	pub checksum: String,
}

#[async_trait]
pub trait ArchiveObjects: Send + Sync {
	async fn file_info(&self, archive_uri: &str) -> Result<ArchiveFileInfo, BridgeError>;
}

#[async_trait]
pub trait HandleManager: Send + Sync {
	/// Mint a new handle resolving to `target`
	async fn create(&self, target: &Path) -> Result<String, BridgeError>;

	async fn update_target(&self, handle: &str, target: &Path) -> Result<(), BridgeError>;

	async fn delete(&self, handle: &str) -> Result<(), BridgeError>;
}

#[async_trait]
pub trait CrawlerBridge: Send + Sync {
	/// Start reconciling the archive below `top_node_uri`, returning the crawl job id
	async fn start(&self, top_node_uri: &str) -> Result<String, BridgeError>;

	async fn state(&self, job_id: &str) -> Result<CrawlerState, BridgeError>;
}

#[async_trait]
pub trait SearchIndex: Send + Sync {
	async fn remove(&self, archive_uri: &str) -> Result<(), BridgeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionScope {
	UnlinkedNodesOnly,
	AllNodes,
}

#[async_trait]
pub trait PermissionAdjuster: Send + Sync {
	async fn adjust(
		&self,
		workspace_id: WorkspaceId,
		scope: PermissionScope,
	) -> Result<(), BridgeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SubmissionOutcome {
	Success,
	Failure,
}

#[async_trait]
pub trait Mailer: Send + Sync {
	async fn notify(
		&self,
		workspace: &Workspace,
		outcome: SubmissionOutcome,
	) -> Result<(), BridgeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfHandleRemoval {
	Removed,
	Unsupported,
}

/// Access to the content of metadata documents
#[async_trait]
pub trait MetadataDocuments: Send + Sync {
	/// Rewrite the references of the archived document of `node` so they point at the archive
	/// identifiers of `children`
	async fn relink(
		&self,
		node: &WorkspaceNode,
		children: &[WorkspaceNode],
	) -> Result<(), BridgeError>;

	/// Strip the identifier a deleted document carries about itself
	async fn remove_self_handle(
		&self,
		node: &WorkspaceNode,
	) -> Result<SelfHandleRemoval, BridgeError> {
		debug!(%node, "Self handle removal not supported by this document handler");
		Ok(SelfHandleRemoval::Unsupported)
	}
}

/// Leaves document content exactly as it was staged
#[derive(Debug, Default, Clone, Copy)]
pub struct VerbatimDocuments;

#[async_trait]
impl MetadataDocuments for VerbatimDocuments {
	async fn relink(
		&self,
		node: &WorkspaceNode,
		children: &[WorkspaceNode],
	) -> Result<(), BridgeError> {
		debug!(%node, children_count = children.len(), "Keeping document content verbatim");
		Ok(())
	}
}

/// Every external service the engine needs, wired once by the embedding service
#[derive(Clone)]
pub struct Bridges {
	pub archive: Arc<dyn ArchiveObjects>,
	pub handles: Arc<dyn HandleManager>,
	pub crawler: Arc<dyn CrawlerBridge>,
	pub search: Arc<dyn SearchIndex>,
	pub permissions: Arc<dyn PermissionAdjuster>,
	pub mailer: Arc<dyn Mailer>,
	pub documents: Arc<dyn MetadataDocuments>,
}
