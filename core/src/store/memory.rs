use crate::workspace::{NodeId, NodeStatus, Workspace, WorkspaceId, WorkspaceNode, WorkspaceStatus};

use super::{StoreError, WorkspaceStore};

use std::{collections::HashMap, path::PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::trace;

#[derive(Debug, Default)]
struct Tables {
	workspaces: HashMap<WorkspaceId, Workspace>,
	nodes: HashMap<NodeId, WorkspaceNode>,
	/// (parent, child) in insertion order
	links: Vec<(NodeId, NodeId)>,
	/// new node -> node it supersedes
	replacements: HashMap<NodeId, NodeId>,
}

impl Tables {
	fn node_mut(&mut self, node_id: NodeId) -> Result<&mut WorkspaceNode, StoreError> {
		self.nodes
			.get_mut(&node_id)
			.ok_or(StoreError::NodeNotFound(node_id))
	}

	fn collect(&self, ids: impl Iterator<Item = NodeId>) -> Result<Vec<WorkspaceNode>, StoreError> {
		ids.map(|id| {
			self.nodes
				.get(&id)
				.cloned()
				.ok_or(StoreError::NodeNotFound(id))
		})
		.collect()
	}
}

/// Workspace store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryWorkspaceStore {
	tables: RwLock<Tables>,
}

impl MemoryWorkspaceStore {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert_workspace(&self, workspace: Workspace) {
		self.tables.write().workspaces.insert(workspace.id, workspace);
	}

	pub fn insert_node(&self, node: WorkspaceNode) {
		self.tables.write().nodes.insert(node.id, node);
	}

	pub fn insert_link(&self, parent_id: NodeId, child_id: NodeId) {
		let mut tables = self.tables.write();
		if !tables.links.contains(&(parent_id, child_id)) {
			tables.links.push((parent_id, child_id));
		}
	}

	pub fn insert_replacement(&self, old_id: NodeId, new_id: NodeId) {
		self.tables.write().replacements.insert(new_id, old_id);
	}

	/// Synchronous peek, mostly for assertions
	#[must_use]
	pub fn get_node(&self, node_id: NodeId) -> Option<WorkspaceNode> {
		self.tables.read().nodes.get(&node_id).cloned()
	}

	#[must_use]
	pub fn get_workspace(&self, workspace_id: WorkspaceId) -> Option<Workspace> {
		self.tables.read().workspaces.get(&workspace_id).cloned()
	}

	#[must_use]
	pub fn is_linked(&self, parent_id: NodeId, child_id: NodeId) -> bool {
		self.tables.read().links.contains(&(parent_id, child_id))
	}
}

#[async_trait]
impl WorkspaceStore for MemoryWorkspaceStore {
	async fn workspace(&self, workspace_id: WorkspaceId) -> Result<Workspace, StoreError> {
		self.get_workspace(workspace_id)
			.ok_or(StoreError::WorkspaceNotFound(workspace_id))
	}

	async fn workspaces_in_status(
		&self,
		status: WorkspaceStatus,
	) -> Result<Vec<Workspace>, StoreError> {
		let mut found = self
			.tables
			.read()
			.workspaces
			.values()
			.filter(|workspace| workspace.status == status)
			.cloned()
			.collect::<Vec<_>>();
		found.sort_by_key(|workspace| workspace.id);

		Ok(found)
	}

	async fn update_workspace_status(&self, workspace: &Workspace) -> Result<(), StoreError> {
		let mut tables = self.tables.write();
		let stored = tables
			.workspaces
			.get_mut(&workspace.id)
			.ok_or(StoreError::WorkspaceNotFound(workspace.id))?;

		stored.status = workspace.status;
		stored.message.clone_from(&workspace.message);
		stored.end_date = workspace.end_date;
		stored.session_end_date = workspace.session_end_date;

		Ok(())
	}

	async fn update_crawler_id(
		&self,
		workspace_id: WorkspaceId,
		crawler_id: &str,
	) -> Result<(), StoreError> {
		self.tables
			.write()
			.workspaces
			.get_mut(&workspace_id)
			.ok_or(StoreError::WorkspaceNotFound(workspace_id))?
			.crawler_id = Some(crawler_id.to_owned());

		Ok(())
	}

	async fn node(&self, node_id: NodeId) -> Result<WorkspaceNode, StoreError> {
		self.get_node(node_id).ok_or(StoreError::NodeNotFound(node_id))
	}

	async fn children(&self, node_id: NodeId) -> Result<Vec<WorkspaceNode>, StoreError> {
		let tables = self.tables.read();
		tables.collect(
			tables
				.links
				.iter()
				.filter(|(parent, _)| *parent == node_id)
				.map(|(_, child)| *child),
		)
	}

	async fn parents(&self, node_id: NodeId) -> Result<Vec<WorkspaceNode>, StoreError> {
		let tables = self.tables.read();
		tables.collect(
			tables
				.links
				.iter()
				.filter(|(_, child)| *child == node_id)
				.map(|(parent, _)| *parent),
		)
	}

	async fn link(&self, parent_id: NodeId, child_id: NodeId) -> Result<(), StoreError> {
		trace!(%parent_id, %child_id, "Linking nodes");
		self.insert_link(parent_id, child_id);
		Ok(())
	}

	async fn unlink(&self, parent_id: NodeId, child_id: NodeId) -> Result<(), StoreError> {
		trace!(%parent_id, %child_id, "Unlinking nodes");
		self.tables
			.write()
			.links
			.retain(|link| *link != (parent_id, child_id));
		Ok(())
	}

	async fn set_status(&self, node_id: NodeId, status: NodeStatus) -> Result<(), StoreError> {
		self.tables.write().node_mut(node_id)?.status = status;
		Ok(())
	}

	async fn update_archive_uri(
		&self,
		node_id: NodeId,
		archive_uri: Option<String>,
	) -> Result<(), StoreError> {
		self.tables.write().node_mut(node_id)?.archive_uri = archive_uri;
		Ok(())
	}

	async fn update_archive_location(
		&self,
		node_id: NodeId,
		archive_location: Option<PathBuf>,
	) -> Result<(), StoreError> {
		self.tables.write().node_mut(node_id)?.archive_location = archive_location;
		Ok(())
	}

	async fn record_replacement(&self, old_id: NodeId, new_id: NodeId) -> Result<(), StoreError> {
		self.insert_replacement(old_id, new_id);
		Ok(())
	}

	async fn pending_replacement(
		&self,
		new_id: NodeId,
	) -> Result<Option<WorkspaceNode>, StoreError> {
		let tables = self.tables.read();
		tables
			.replacements
			.get(&new_id)
			.map(|old_id| {
				tables
					.nodes
					.get(old_id)
					.cloned()
					.ok_or(StoreError::NodeNotFound(*old_id))
			})
			.transpose()
	}

	async fn unlinked_nodes(
		&self,
		workspace_id: WorkspaceId,
	) -> Result<Vec<WorkspaceNode>, StoreError> {
		let tables = self.tables.read();
		let top_node_id = tables
			.workspaces
			.get(&workspace_id)
			.ok_or(StoreError::WorkspaceNotFound(workspace_id))?
			.top_node_id;

		let mut found = tables
			.nodes
			.values()
			.filter(|node| {
				node.workspace_id == workspace_id
					&& node.id != top_node_id
					&& node.status != NodeStatus::Replaced
					&& !tables.links.iter().any(|(_, child)| *child == node.id)
			})
			.cloned()
			.collect::<Vec<_>>();
		found.sort_by_key(|node| node.id);

		Ok(found)
	}

	async fn deleted_nodes(
		&self,
		workspace_id: WorkspaceId,
	) -> Result<Vec<WorkspaceNode>, StoreError> {
		let mut found = self
			.tables
			.read()
			.nodes
			.values()
			.filter(|node| node.workspace_id == workspace_id && node.status == NodeStatus::Deleted)
			.cloned()
			.collect::<Vec<_>>();
		found.sort_by_key(|node| node.id);

		Ok(found)
	}
}
