use crate::workspace::{NodeId, WorkspaceId};

use std::{
	collections::{HashSet, VecDeque},
	path::Path,
};

use tracing::{info, instrument, trace};

use super::{ExportContext, ExportError, ExportReport, ExporterKind, TreeExporter};

impl TreeExporter {
	/// Retire every node that left the tree: unlinked ones go to the trash, deleted ones to the
	/// trash with their handle deleted. Children that were only reachable through such a node
	/// follow it.
	#[instrument(skip(self), err)]
	pub async fn export_unlinked_and_deleted(
		&self,
		workspace_id: WorkspaceId,
	) -> Result<ExportReport, ExportError> {
		let mut report = ExportReport::default();
		let mut seen = HashSet::new();

		let mut pending = self
			.store
			.unlinked_nodes(workspace_id)
			.await?
			.into_iter()
			.chain(self.store.deleted_nodes(workspace_id).await?)
			.collect::<VecDeque<_>>();

		while let Some(node) = pending.pop_front() {
			if !seen.insert(node.id) {
				continue;
			}

			let (node_id, is_metadata) = (node.id, node.kind.is_metadata());
			let kind = ExporterKind::for_node(&node, false);

			let exported = self
				.exporters
				.export(
					kind,
					node,
					&ExportContext {
						workspace_id,
						parent: None,
						corpus_name_path: Path::new(""),
					},
				)
				.await?;
			report.record(kind, &exported);

			if is_metadata {
				for child in self.store.children(node_id).await? {
					if self.only_linked_from(child.id, node_id).await? {
						trace!(%child, parent_id = node_id, "Following orphaned child");
						pending.push_back(child);
					}
				}
			}
		}

		info!(
			retired = seen.len(),
			skipped = report.skipped,
			deferred = report.deferred.len(),
			"Exported unlinked and deleted nodes"
		);

		Ok(report)
	}

	async fn only_linked_from(&self, node_id: NodeId, parent_id: NodeId) -> Result<bool, ExportError> {
		Ok(self
			.store
			.parents(node_id)
			.await?
			.iter()
			.all(|parent| parent.id == parent_id))
	}
}
