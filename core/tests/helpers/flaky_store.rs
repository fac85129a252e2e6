//! Workspace store that fails chosen status updates and delegates everything else

use curator_core::{
	store::{memory::MemoryWorkspaceStore, StoreError},
	workspace::{NodeId, NodeStatus, Workspace, WorkspaceId, WorkspaceNode, WorkspaceStatus},
	WorkspaceStore,
};

use std::{collections::HashSet, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use parking_lot::Mutex;

pub struct FlakyStore {
	pub inner: Arc<MemoryWorkspaceStore>,
	failing_status_updates: Mutex<HashSet<WorkspaceId>>,
}

impl FlakyStore {
	pub fn new(inner: Arc<MemoryWorkspaceStore>) -> Self {
		Self {
			inner,
			failing_status_updates: Mutex::default(),
		}
	}

	pub fn fail_status_updates(&self, workspace_id: WorkspaceId, failing: bool) {
		let mut failing_ids = self.failing_status_updates.lock();
		if failing {
			failing_ids.insert(workspace_id);
		} else {
			failing_ids.remove(&workspace_id);
		}
	}
}

#[async_trait]
impl WorkspaceStore for FlakyStore {
	async fn workspace(&self, workspace_id: WorkspaceId) -> Result<Workspace, StoreError> {
		self.inner.workspace(workspace_id).await
	}

	async fn workspaces_in_status(
		&self,
		status: WorkspaceStatus,
	) -> Result<Vec<Workspace>, StoreError> {
		self.inner.workspaces_in_status(status).await
	}

	async fn update_workspace_status(&self, workspace: &Workspace) -> Result<(), StoreError> {
		if self.failing_status_updates.lock().contains(&workspace.id) {
			return Err(StoreError::Backend("connection reset by peer".into()));
		}
		self.inner.update_workspace_status(workspace).await
	}

	async fn update_crawler_id(
		&self,
		workspace_id: WorkspaceId,
		crawler_id: &str,
	) -> Result<(), StoreError> {
		self.inner.update_crawler_id(workspace_id, crawler_id).await
	}

	async fn node(&self, node_id: NodeId) -> Result<WorkspaceNode, StoreError> {
		self.inner.node(node_id).await
	}

	async fn children(&self, node_id: NodeId) -> Result<Vec<WorkspaceNode>, StoreError> {
		self.inner.children(node_id).await
	}

	async fn parents(&self, node_id: NodeId) -> Result<Vec<WorkspaceNode>, StoreError> {
		self.inner.parents(node_id).await
	}

	async fn link(&self, parent_id: NodeId, child_id: NodeId) -> Result<(), StoreError> {
		self.inner.link(parent_id, child_id).await
	}

	async fn unlink(&self, parent_id: NodeId, child_id: NodeId) -> Result<(), StoreError> {
		self.inner.unlink(parent_id, child_id).await
	}

	async fn set_status(&self, node_id: NodeId, status: NodeStatus) -> Result<(), StoreError> {
		self.inner.set_status(node_id, status).await
	}

	async fn update_archive_uri(
		&self,
		node_id: NodeId,
		archive_uri: Option<String>,
	) -> Result<(), StoreError> {
		self.inner.update_archive_uri(node_id, archive_uri).await
	}

	async fn update_archive_location(
		&self,
		node_id: NodeId,
		archive_location: Option<PathBuf>,
	) -> Result<(), StoreError> {
		self.inner
			.update_archive_location(node_id, archive_location)
			.await
	}

	async fn record_replacement(&self, old_id: NodeId, new_id: NodeId) -> Result<(), StoreError> {
		self.inner.record_replacement(old_id, new_id).await
	}

	async fn pending_replacement(
		&self,
		new_id: NodeId,
	) -> Result<Option<WorkspaceNode>, StoreError> {
		self.inner.pending_replacement(new_id).await
	}

	async fn unlinked_nodes(
		&self,
		workspace_id: WorkspaceId,
	) -> Result<Vec<WorkspaceNode>, StoreError> {
		self.inner.unlinked_nodes(workspace_id).await
	}

	async fn deleted_nodes(
		&self,
		workspace_id: WorkspaceId,
	) -> Result<Vec<WorkspaceNode>, StoreError> {
		self.inner.deleted_nodes(workspace_id).await
	}
}
