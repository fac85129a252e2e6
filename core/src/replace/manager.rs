use crate::{
	export::{DeferredInconsistency, ExportError, NodeExporters},
	store::WorkspaceStore,
	workspace::{NodeStatus, WorkspaceId},
};

use std::{collections::HashSet, sync::Arc};

use thiserror::Error;
use tracing::{debug, error, instrument};

use super::ReplaceAction;

/// What a fully applied action list left behind
#[derive(Debug, Default)]
pub struct AppliedActions {
	pub count: usize,
	/// Relocations that failed while retiring replaced nodes
	pub deferred: Vec<DeferredInconsistency>,
}

/// Application stopped at `failed`. Everything in `committed` stays applied.
#[derive(Error, Debug)]
#[error(
	"replace action failed after {} committed action(s): <action='{failed}'>: {source}",
	.committed.len()
)]
pub struct PartialApplyError {
	pub committed: Vec<ReplaceAction>,
	pub failed: ReplaceAction,
	#[source]
	pub source: Box<ExportError>,
}

pub struct ReplaceActionManager {
	store: Arc<dyn WorkspaceStore>,
	exporters: Arc<NodeExporters>,
}

impl ReplaceActionManager {
	pub fn new(store: Arc<dyn WorkspaceStore>, exporters: Arc<NodeExporters>) -> Self {
		Self { store, exporters }
	}

	/// Apply `actions` in order. The first failure stops the walk; nothing is rolled back.
	#[instrument(skip(self, actions), fields(actions_count = actions.len()), err)]
	pub async fn apply(
		&self,
		workspace_id: WorkspaceId,
		actions: &[ReplaceAction],
	) -> Result<AppliedActions, PartialApplyError> {
		let mut applied = AppliedActions::default();

		// Identifiers of archived nodes this list links back in, they must survive any delete
		let relinked = actions
			.iter()
			.filter_map(|action| match action {
				ReplaceAction::Link { node, .. } => node.archive_uri.as_deref(),
				_ => None,
			})
			.collect::<HashSet<_>>();

		for (idx, action) in actions.iter().enumerate() {
			if let Err(e) = self
				.apply_one(workspace_id, action, &relinked, &mut applied)
				.await
			{
				error!(%action, ?e, "Failed to apply replace action");
				return Err(PartialApplyError {
					committed: actions[..idx].to_vec(),
					failed: action.clone(),
					source: Box::new(e),
				});
			}

			applied.count += 1;
		}

		Ok(applied)
	}

	async fn apply_one(
		&self,
		workspace_id: WorkspaceId,
		action: &ReplaceAction,
		relinked: &HashSet<&str>,
		applied: &mut AppliedActions,
	) -> Result<(), ExportError> {
		debug!(%action, "Applying replace action");

		match action {
			ReplaceAction::Delete { node } => {
				// A duplicate of a relinked node shares its archived file and handle
				if node
					.archive_uri
					.as_deref()
					.is_some_and(|uri| relinked.contains(uri))
				{
					debug!(%node, "Detaching duplicate from the archived node it mirrors");
					self.store.update_archive_uri(node.id, None).await?;
					self.store.update_archive_location(node.id, None).await?;
				}
				self.store.set_status(node.id, NodeStatus::Deleted).await?;
			}

			ReplaceAction::Unlink { node, parent } => {
				self.store.unlink(parent.id, node.id).await?;
			}

			ReplaceAction::Link { node, parent } => {
				self.store.link(parent.id, node.id).await?;
			}

			ReplaceAction::Replace {
				old,
				parent,
				new,
				new_already_linked,
			} => {
				if !new_already_linked {
					self.store.link(parent.id, new.id).await?;
				}
				self.store.unlink(parent.id, old.id).await?;
				self.store.set_status(old.id, NodeStatus::Replaced).await?;
				self.store.record_replacement(old.id, new.id).await?;

				// The identifier stays with the retired node, the new one gets its own on export
				if new.archive_uri.is_some() && new.archive_uri == old.archive_uri {
					self.store.update_archive_uri(new.id, None).await?;
					self.store.update_archive_location(new.id, None).await?;
				}

				let mut retired = old.clone();
				retired.status = NodeStatus::Replaced;

				let exported = self
					.exporters
					.export_replaced_or_deleted(retired, workspace_id)
					.await?;
				applied.deferred.extend(exported.deferred);
			}

			ReplaceAction::RemoveArchiveIdentifier { node, .. } => {
				self.store.update_archive_uri(node.id, None).await?;
				self.store.update_archive_location(node.id, None).await?;
			}
		}

		Ok(())
	}
}
