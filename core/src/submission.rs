//! Top level workflows run when a user submits or deletes a workspace.

use crate::{
	archive::{ArchiveLayout, RelocationScheme},
	bridge::{BridgeError, Bridges, PermissionScope},
	export::{ExportError, ExportReport, TreeExporter},
	store::{StoreError, WorkspaceStore},
	workspace::{
		InvalidTransition, NodeId, SubmissionType, Workspace, WorkspaceId, WorkspaceStatus,
	},
};

use std::sync::Arc;

use thiserror::Error;
use tokio::{spawn, task::JoinHandle};
use tracing::{error, info, instrument, warn};

#[derive(Error, Debug)]
pub enum SubmissionError {
	#[error("top node has no archive identifier after export: <node_id='{0}'>")]
	TopNodeNotArchived(NodeId),
	#[error("workspace can not be submitted in its current status: <workspace_id='{workspace_id}', status='{status}'>")]
	NotSubmittable {
		workspace_id: WorkspaceId,
		status: WorkspaceStatus,
	},

	#[error(transparent)]
	Export(#[from] ExportError),
	#[error(transparent)]
	Transition(#[from] InvalidTransition),
	#[error(transparent)]
	Store(#[from] StoreError),
	#[error(transparent)]
	Bridge(#[from] BridgeError),
}

pub struct Submitter {
	store: Arc<dyn WorkspaceStore>,
	bridges: Bridges,
	tree: TreeExporter,
}

impl Submitter {
	pub fn new(
		store: Arc<dyn WorkspaceStore>,
		bridges: Bridges,
		layout: Arc<ArchiveLayout>,
		relocation: Arc<RelocationScheme>,
	) -> Self {
		Self {
			tree: TreeExporter::new(Arc::clone(&store), &bridges, layout, relocation),
			store,
			bridges,
		}
	}

	/// Run the submission in the background, resolving to whether it succeeded
	pub fn dispatch(
		self: &Arc<Self>,
		workspace_id: WorkspaceId,
		kind: SubmissionType,
	) -> JoinHandle<bool> {
		let this = Arc::clone(self);

		spawn(async move {
			match this.run(workspace_id, kind).await {
				Ok(_) => true,
				Err(e) => {
					error!(workspace_id, %kind, ?e, "Submission failed;");
					false
				}
			}
		})
	}

	/// Any failure aborts the remaining phases and leaves the workspace in
	/// [`WorkspaceStatus::Error`]. Submitting a workspace that is already past submission is
	/// refused before anything runs and leaves it untouched.
	#[instrument(skip(self), err)]
	pub async fn run(
		&self,
		workspace_id: WorkspaceId,
		kind: SubmissionType,
	) -> Result<ExportReport, SubmissionError> {
		let mut workspace = self.store.workspace(workspace_id).await?;

		if kind == SubmissionType::SubmitWorkspace
			&& !matches!(
				workspace.status,
				WorkspaceStatus::Initialised | WorkspaceStatus::Submitted
			) {
			return Err(SubmissionError::NotSubmittable {
				workspace_id,
				status: workspace.status,
			});
		}

		let res = match kind {
			SubmissionType::SubmitWorkspace => self.submit(&mut workspace).await,
			SubmissionType::DeleteWorkspace => self.delete(&workspace).await,
		};

		match &res {
			Ok(report) if !report.deferred.is_empty() => {
				warn!(
					deferred = ?report.deferred,
					"Submission finished with files left in place that must be reconciled;"
				);
			}
			Ok(_) => {}
			Err(e) => self.mark_failed(&mut workspace, e).await,
		}

		res
	}

	async fn submit(&self, workspace: &mut Workspace) -> Result<ExportReport, SubmissionError> {
		if workspace.status != WorkspaceStatus::Submitted {
			workspace.transition(WorkspaceStatus::Submitted, "Workspace submitted")?;
			self.store.update_workspace_status(workspace).await?;
		}

		let mut report = self.tree.export_tree(workspace).await?;
		report.merge(self.tree.export_unlinked_and_deleted(workspace.id).await?);

		let top = self.store.node(workspace.top_node_id).await?;
		let top_node_uri = top
			.archive_uri
			.ok_or(SubmissionError::TopNodeNotArchived(top.id))?;

		let crawler_id = self.bridges.crawler.start(&top_node_uri).await?;
		self.store
			.update_crawler_id(workspace.id, &crawler_id)
			.await?;
		info!(workspace_id = workspace.id, %crawler_id, "Crawler started");
		workspace.crawler_id = Some(crawler_id);

		workspace.transition(
			WorkspaceStatus::UpdatingArchive,
			"Waiting for the crawler to update the archive",
		)?;
		self.store.update_workspace_status(workspace).await?;

		self.bridges
			.permissions
			.adjust(workspace.id, PermissionScope::AllNodes)
			.await?;

		Ok(report)
	}

	async fn delete(&self, workspace: &Workspace) -> Result<ExportReport, SubmissionError> {
		let report = self.tree.export_unlinked_and_deleted(workspace.id).await?;

		self.bridges
			.permissions
			.adjust(workspace.id, PermissionScope::UnlinkedNodesOnly)
			.await?;

		Ok(report)
	}

	async fn mark_failed(&self, workspace: &mut Workspace, e: &SubmissionError) {
		// The crawler owns the outcome from here on
		if workspace.status == WorkspaceStatus::UpdatingArchive {
			warn!(
				workspace_id = workspace.id,
				?e,
				"Submission step failed after the crawler started, keeping its status;"
			);
			return;
		}

		if let Err(e) = workspace.transition(WorkspaceStatus::Error, e.to_string()) {
			warn!(?e, "Workspace already finished, keeping its status;");
			return;
		}

		if let Err(e) = self.store.update_workspace_status(workspace).await {
			error!(workspace_id = workspace.id, ?e, "Failed to persist workspace error status;");
		}
	}
}
