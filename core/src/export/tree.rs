use crate::{
	archive::{ArchiveLayout, RelocationScheme, TranslateType},
	bridge::{Bridges, MetadataDocuments},
	replace::{ReplaceActionManager, ReplaceChecker},
	store::WorkspaceStore,
	workspace::{NodeStatus, Workspace, WorkspaceId, WorkspaceNode},
};

use std::{path::PathBuf, sync::Arc};

use futures::future::BoxFuture;
use tracing::{info, instrument, trace};

use super::{ExportContext, ExportError, ExportReport, Exported, ExporterKind, NodeExporters};

/// Walks a workspace depth first, handing every node to its exporter
pub struct TreeExporter {
	pub(super) store: Arc<dyn WorkspaceStore>,
	pub(super) exporters: Arc<NodeExporters>,
	checker: ReplaceChecker,
	manager: ReplaceActionManager,
	layout: Arc<ArchiveLayout>,
	documents: Arc<dyn MetadataDocuments>,
}

impl TreeExporter {
	pub fn new(
		store: Arc<dyn WorkspaceStore>,
		bridges: &Bridges,
		layout: Arc<ArchiveLayout>,
		relocation: Arc<RelocationScheme>,
	) -> Self {
		let exporters = Arc::new(NodeExporters::new(
			Arc::clone(&store),
			bridges.clone(),
			Arc::clone(&layout),
			relocation,
		));

		Self {
			checker: ReplaceChecker::new(Arc::clone(&store), Arc::clone(&bridges.archive)),
			manager: ReplaceActionManager::new(Arc::clone(&store), Arc::clone(&exporters)),
			documents: Arc::clone(&bridges.documents),
			store,
			exporters,
			layout,
		}
	}

	/// Export the whole tree below the top node of `workspace`
	#[instrument(skip_all, fields(workspace_id = workspace.id), err)]
	pub async fn export_tree(&self, workspace: &Workspace) -> Result<ExportReport, ExportError> {
		let top = self.store.node(workspace.top_node_id).await?;
		let mut report = ExportReport::default();

		self.export_subtree(workspace.id, top, None, PathBuf::new(), &mut report)
			.await?;

		info!(
			skipped = report.skipped,
			deferred = report.deferred.len(),
			"Exported workspace tree"
		);

		Ok(report)
	}

	fn export_subtree<'a>(
		&'a self,
		workspace_id: WorkspaceId,
		node: WorkspaceNode,
		parent: Option<&'a WorkspaceNode>,
		corpus_name_path: PathBuf,
		report: &'a mut ExportReport,
	) -> BoxFuture<'a, Result<(), ExportError>> {
		Box::pin(async move {
			// Replacements applied to earlier siblings may have changed this node since the
			// children were listed
			let node = match parent {
				Some(_) => self.store.node(node.id).await?,
				None => node,
			};

			// Handled by the unlinked and deleted nodes pass
			if node.status == NodeStatus::Deleted {
				trace!(%node, "Skipping deleted node in tree walk");
				return Ok(());
			}

			let node = match parent {
				Some(parent) => {
					match self
						.apply_pending_replacement(workspace_id, node, parent, report)
						.await?
					{
						Some(node) => node,
						None => return Ok(()),
					}
				}
				None => node,
			};

			let kind = ExporterKind::for_node(&node, true);
			let exported = self
				.exporters
				.export(
					kind,
					node,
					&ExportContext {
						workspace_id,
						parent,
						corpus_name_path: &corpus_name_path,
					},
				)
				.await?;
			report.record(kind, &exported);

			let Exported {
				node,
				descend,
				relink,
				..
			} = exported;

			if !descend {
				return Ok(());
			}

			let children_corpus_name_path =
				if self.layout.translate_type(&node) == Some(TranslateType::Corpus) {
					corpus_name_path.join(self.layout.corpus_dir_name_for(&node))
				} else {
					corpus_name_path
				};

			for child in self.store.children(node.id).await? {
				self.export_subtree(
					workspace_id,
					child,
					Some(&node),
					children_corpus_name_path.clone(),
					report,
				)
				.await?;
			}

			if relink {
				let children = self.store.children(node.id).await?;
				self.documents.relink(&node, &children).await?;
			}

			Ok(())
		})
	}

	/// Runs the replace checker when `node` supersedes an archived node that was not retired yet.
	/// Returns `None` when the replacement turned `node` into a deleted duplicate.
	async fn apply_pending_replacement(
		&self,
		workspace_id: WorkspaceId,
		node: WorkspaceNode,
		parent: &WorkspaceNode,
		report: &mut ExportReport,
	) -> Result<Option<WorkspaceNode>, ExportError> {
		let Some(old) = self.store.pending_replacement(node.id).await? else {
			return Ok(Some(node));
		};

		if old.status == NodeStatus::Replaced {
			return Ok(Some(node));
		}

		info!(old = %old, new = %node, "Replacing archived node");

		let mut actions = Vec::new();
		self.checker
			.decide_replace_actions(&old, &node, parent, true, &mut actions)
			.await?;

		let applied = self.manager.apply(workspace_id, &actions).await?;
		report.deferred.extend(applied.deferred);

		let node = self.store.node(node.id).await?;

		Ok((node.status != NodeStatus::Deleted).then_some(node))
	}
}
