//! Read/write contract the engine needs from the workspace database.
//!
//! The relational store itself lives outside this crate; [`memory::MemoryWorkspaceStore`] is a
//! complete in-process implementation used by tests and by embedders that keep workspaces in RAM.

use crate::workspace::{NodeId, NodeStatus, Workspace, WorkspaceId, WorkspaceNode, WorkspaceStatus};

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;

#[derive(Error, Debug)]
pub enum StoreError {
	#[error("workspace not found: <id='{0}'>")]
	WorkspaceNotFound(WorkspaceId),
	#[error("workspace node not found: <id='{0}'>")]
	NodeNotFound(NodeId),
	#[error("workspace store backend error: {0}")]
	Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[async_trait]
pub trait WorkspaceStore: Send + Sync {
	async fn workspace(&self, workspace_id: WorkspaceId) -> Result<Workspace, StoreError>;

	async fn workspaces_in_status(
		&self,
		status: WorkspaceStatus,
	) -> Result<Vec<Workspace>, StoreError>;

	/// Persist status, message and end dates of the given workspace
	async fn update_workspace_status(&self, workspace: &Workspace) -> Result<(), StoreError>;

	async fn update_crawler_id(
		&self,
		workspace_id: WorkspaceId,
		crawler_id: &str,
	) -> Result<(), StoreError>;

	async fn node(&self, node_id: NodeId) -> Result<WorkspaceNode, StoreError>;

	/// Children in link order
	async fn children(&self, node_id: NodeId) -> Result<Vec<WorkspaceNode>, StoreError>;

	async fn parents(&self, node_id: NodeId) -> Result<Vec<WorkspaceNode>, StoreError>;

	async fn link(&self, parent_id: NodeId, child_id: NodeId) -> Result<(), StoreError>;

	/// Unlinking an edge that does not exist is not an error
	async fn unlink(&self, parent_id: NodeId, child_id: NodeId) -> Result<(), StoreError>;

	async fn set_status(&self, node_id: NodeId, status: NodeStatus) -> Result<(), StoreError>;

	async fn update_archive_uri(
		&self,
		node_id: NodeId,
		archive_uri: Option<String>,
	) -> Result<(), StoreError>;

	async fn update_archive_location(
		&self,
		node_id: NodeId,
		archive_location: Option<PathBuf>,
	) -> Result<(), StoreError>;

	/// Remember that `new_id` supersedes `old_id`
	async fn record_replacement(&self, old_id: NodeId, new_id: NodeId) -> Result<(), StoreError>;

	/// The node that `new_id` is meant to supersede, if any
	async fn pending_replacement(
		&self,
		new_id: NodeId,
	) -> Result<Option<WorkspaceNode>, StoreError>;

	/// Nodes without any parent, excluding the workspace top node and replaced nodes
	async fn unlinked_nodes(
		&self,
		workspace_id: WorkspaceId,
	) -> Result<Vec<WorkspaceNode>, StoreError>;

	async fn deleted_nodes(
		&self,
		workspace_id: WorkspaceId,
	) -> Result<Vec<WorkspaceNode>, StoreError>;
}
