//! One exporter per node status.
//!
//! | status                    | exporter            |
//! |---------------------------|---------------------|
//! | uploaded, created         | [`ExporterKind::Added`] |
//! | unchanged copy            | [`ExporterKind::General`] |
//! | deleted, replaced         | [`ExporterKind::ReplacedOrDeleted`] |
//! | no parent left            | [`ExporterKind::Unlinked`] |
//! | virtual, external         | [`ExporterKind::Untouched`] |

use crate::{
	archive::{resolve_available_file, ArchiveLayout, RelocationRoot, RelocationScheme},
	bridge::{Bridges, SelfHandleRemoval},
	checksum,
	store::WorkspaceStore,
	workspace::{NodeStatus, WorkspaceId, WorkspaceNode},
};

use curator_utils::{error::IoResultExt, fs::move_file};

use std::{
	path::{Path, PathBuf},
	sync::Arc,
};

use strum::Display;
use tokio::fs;
use tracing::{debug, error, info, instrument, trace, warn};

use super::{DeferredInconsistency, ExportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ExporterKind {
	Added,
	General,
	ReplacedOrDeleted,
	Unlinked,
	Untouched,
}

impl ExporterKind {
	/// `linked` tells whether the node was reached through the tree or found without a parent
	#[must_use]
	pub const fn for_node(node: &WorkspaceNode, linked: bool) -> Self {
		match node.status {
			NodeStatus::Deleted | NodeStatus::Replaced => Self::ReplacedOrDeleted,
			NodeStatus::Virtual | NodeStatus::External => Self::Untouched,
			_ if !linked => Self::Unlinked,
			NodeStatus::Uploaded | NodeStatus::Created => Self::Added,
			// A copy that lost its identifier is a new archive object
			NodeStatus::IsCopy if node.archive_uri.is_none() => Self::Added,
			NodeStatus::IsCopy => Self::General,
		}
	}
}

/// Where in the tree a node is being exported
#[derive(Debug, Clone, Copy)]
pub struct ExportContext<'a> {
	pub workspace_id: WorkspaceId,
	pub parent: Option<&'a WorkspaceNode>,
	/// Names of the corpora between the top node and this node
	pub corpus_name_path: &'a Path,
}

#[derive(Debug)]
pub struct Exported {
	/// The node as it is after the export
	pub node: WorkspaceNode,
	/// Children still have to be exported
	pub descend: bool,
	/// Document references must be rewritten once the children are exported
	pub relink: bool,
	pub skipped: bool,
	pub deferred: Option<DeferredInconsistency>,
}

impl Exported {
	const fn done(node: WorkspaceNode) -> Self {
		Self {
			node,
			descend: false,
			relink: false,
			skipped: false,
			deferred: None,
		}
	}

	const fn skipped(node: WorkspaceNode) -> Self {
		Self {
			node,
			descend: false,
			relink: false,
			skipped: true,
			deferred: None,
		}
	}
}

pub struct NodeExporters {
	store: Arc<dyn WorkspaceStore>,
	bridges: Bridges,
	layout: Arc<ArchiveLayout>,
	relocation: Arc<RelocationScheme>,
}

impl NodeExporters {
	pub fn new(
		store: Arc<dyn WorkspaceStore>,
		bridges: Bridges,
		layout: Arc<ArchiveLayout>,
		relocation: Arc<RelocationScheme>,
	) -> Self {
		Self {
			store,
			bridges,
			layout,
			relocation,
		}
	}

	#[instrument(skip_all, fields(node_id = node.id, %kind), err)]
	pub async fn export(
		&self,
		kind: ExporterKind,
		node: WorkspaceNode,
		ctx: &ExportContext<'_>,
	) -> Result<Exported, ExportError> {
		match kind {
			ExporterKind::Added => self.export_added(node, ctx).await,
			ExporterKind::General => self.export_general(node).await,
			ExporterKind::ReplacedOrDeleted => {
				self.export_replaced_or_deleted(node, ctx.workspace_id).await
			}
			ExporterKind::Unlinked => self.export_unlinked(node, ctx.workspace_id).await,
			ExporterKind::Untouched => {
				debug!(%node, "Node is not owned by the archive, leaving it alone");
				Ok(Exported::skipped(node))
			}
		}
	}

	async fn export_added(
		&self,
		mut node: WorkspaceNode,
		ctx: &ExportContext<'_>,
	) -> Result<Exported, ExportError> {
		let parent = ctx.parent.ok_or(ExportError::MissingParent(node.id))?;
		let parent_location =
			parent
				.archive_location
				.as_deref()
				.ok_or(ExportError::ParentNotArchived {
					node_id: node.id,
					parent_id: parent.id,
				})?;

		let directory = self.layout.resolve_target_directory(
			&node,
			parent_location,
			ctx.corpus_name_path,
			self.layout.translate_type(&node),
		)?;

		fs::create_dir_all(&directory)
			.await
			.at_path_with(&directory, "creating archive directory")?;

		let target = resolve_available_file(&directory, &self.layout.file_name_for(&node)).await?;

		move_file(&node.workspace_location, &target).await?;

		let handle = match self.bridges.handles.create(&target).await {
			Ok(handle) => handle,
			Err(e) => {
				// Without a handle the node is not archived, its file goes back to the workspace
				if let Err(move_back_err) = move_file(&target, &node.workspace_location).await {
					error!(
						%node,
						target = %target.display(),
						?move_back_err,
						"Failed to move file back to the workspace after handle creation failed;"
					);
				}
				return Err(e.into());
			}
		};

		self.store
			.update_archive_location(node.id, Some(target.clone()))
			.await?;
		self.store
			.update_archive_uri(node.id, Some(handle.clone()))
			.await?;

		info!(%node, target = %target.display(), %handle, "Added node to the archive");

		node.archive_location = Some(target);
		node.archive_uri = Some(handle);

		let is_metadata = node.kind.is_metadata();

		Ok(Exported {
			descend: is_metadata,
			relink: is_metadata,
			..Exported::done(node)
		})
	}

	async fn export_general(&self, node: WorkspaceNode) -> Result<Exported, ExportError> {
		let archive_uri = node
			.archive_uri
			.as_deref()
			.ok_or(ExportError::NotArchived(node.id))?;

		let archived = self.bridges.archive.file_info(archive_uri).await?;
		let is_metadata = node.kind.is_metadata();

		if checksum::same_content(&node.workspace_location, archived.size, &archived.checksum)
			.await?
		{
			trace!(%node, "Content unchanged");
			return Ok(Exported {
				descend: is_metadata,
				..Exported::done(node)
			});
		}

		let target = node
			.archive_location
			.clone()
			.unwrap_or(archived.location);

		fs::copy(&node.workspace_location, &target)
			.await
			.at_path_with(&target, "writing changed content to the archive")?;

		info!(%node, target = %target.display(), "Updated archived content");

		Ok(Exported {
			descend: is_metadata,
			relink: is_metadata,
			..Exported::done(node)
		})
	}

	/// Retire a deleted or replaced node: its file goes to the trash or versioning directory and
	/// its handle is deleted or pointed at the retired file.
	pub async fn export_replaced_or_deleted(
		&self,
		mut node: WorkspaceNode,
		workspace_id: WorkspaceId,
	) -> Result<Exported, ExportError> {
		let Some((archive_uri, location)) = archived_parts(&node) else {
			debug!(%node, "Node never reached the archive, nothing to retire");
			return Ok(Exported::skipped(node));
		};

		if self.relocation.is_relocated(&location) {
			debug!(%node, "Node already retired");
			return Ok(Exported::skipped(node));
		}

		let replaced = node.status == NodeStatus::Replaced;
		let root = if replaced {
			RelocationRoot::Versioning
		} else {
			RelocationRoot::Trash
		};

		let deferred = self
			.relocate(&mut node, root, workspace_id, &archive_uri, &location)
			.await?;

		if replaced {
			if deferred.is_none() {
				self.bridges
					.handles
					.update_target(&archive_uri, &archived_location(&node, &location))
					.await?;
			}
		} else {
			self.bridges.handles.delete(&archive_uri).await?;

			if node.kind.is_metadata() {
				match self.bridges.documents.remove_self_handle(&node).await? {
					SelfHandleRemoval::Removed => {
						debug!(%node, "Removed self handle from deleted document");
					}
					SelfHandleRemoval::Unsupported => {
						warn!(%node, "Deleted document still carries its own handle");
					}
				}
			}

			self.store.update_archive_uri(node.id, None).await?;
			node.archive_uri = None;
		}

		Ok(Exported {
			deferred,
			..Exported::done(node)
		})
	}

	async fn export_unlinked(
		&self,
		mut node: WorkspaceNode,
		workspace_id: WorkspaceId,
	) -> Result<Exported, ExportError> {
		let Some((archive_uri, location)) = archived_parts(&node) else {
			debug!(%node, "Unlinked node never reached the archive");
			return Ok(Exported::skipped(node));
		};

		if self.relocation.is_relocated(&location) {
			debug!(%node, "Unlinked node already in the trash");
			return Ok(Exported::skipped(node));
		}

		let deferred = self
			.relocate(
				&mut node,
				RelocationRoot::Trash,
				workspace_id,
				&archive_uri,
				&location,
			)
			.await?;

		self.bridges.search.remove(&archive_uri).await?;

		Ok(Exported {
			deferred,
			..Exported::done(node)
		})
	}

	/// Failing to relocate does not fail the export, the node keeps pointing at `location`
	async fn relocate(
		&self,
		node: &mut WorkspaceNode,
		root: RelocationRoot,
		workspace_id: WorkspaceId,
		archive_uri: &str,
		location: &Path,
	) -> Result<Option<DeferredInconsistency>, ExportError> {
		match self
			.relocation
			.relocate(root, workspace_id, archive_uri, location)
			.await
		{
			Ok(target) => {
				self.store
					.update_archive_location(node.id, Some(target.clone()))
					.await?;
				node.archive_location = Some(target);
				Ok(None)
			}
			Err(e) => {
				warn!(
					%node,
					%root,
					location = %location.display(),
					?e,
					"Failed to relocate file, archive location left as it was;"
				);

				Ok(Some(DeferredInconsistency {
					node_id: node.id,
					archive_location: location.to_path_buf(),
					reason: e.to_string(),
				}))
			}
		}
	}
}

fn archived_parts(node: &WorkspaceNode) -> Option<(String, PathBuf)> {
	node.archived()
		.map(|(uri, location)| (uri.to_owned(), location.to_path_buf()))
}

fn archived_location(node: &WorkspaceNode, fallback: &Path) -> PathBuf {
	node.archive_location
		.clone()
		.unwrap_or_else(|| fallback.to_path_buf())
}
