//! Finalizing submitted workspaces once the crawler has reconciled the archive.
//!
//! After a submission the workspace waits in [`WorkspaceStatus::UpdatingArchive`] with the id of
//! the crawl job stored on it. Each pass of [`CrawlerStatusPoller`] asks the crawler about every
//! waiting workspace and moves the finished ones to their terminal status, notifying the owner.

use crate::{
	bridge::{CrawlerBridge, Mailer, SubmissionOutcome},
	store::{StoreError, WorkspaceStore},
	workspace::{InvalidTransition, Workspace, WorkspaceId, WorkspaceStatus},
};

use std::{convert::Infallible, fmt, str::FromStr, sync::Arc, time::Duration};

use thiserror::Error;
use tokio::{
	spawn,
	sync::Mutex,
	task::JoinHandle,
	time::{interval_at, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

/// State of a crawl job as reported by the crawler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlerState {
	Started,
	Success,
	Crashed,
	/// Anything the crawler reports that we don't know, treated as a failed crawl
	Unknown(String),
}

impl CrawlerState {
	#[must_use]
	pub const fn is_pending(&self) -> bool {
		matches!(self, Self::Started)
	}
}

impl FromStr for CrawlerState {
	type Err = Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s {
			"STARTED" => Self::Started,
			"SUCCESS" => Self::Success,
			"CRASHED" => Self::Crashed,
			other => Self::Unknown(other.to_owned()),
		})
	}
}

impl fmt::Display for CrawlerState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Started => write!(f, "STARTED"),
			Self::Success => write!(f, "SUCCESS"),
			Self::Crashed => write!(f, "CRASHED"),
			Self::Unknown(state) => write!(f, "{state}"),
		}
	}
}

#[derive(Error, Debug)]
pub enum CrawlerError {
	#[error("workspace waits for a crawl but has no crawler id: <workspace_id='{0}'>")]
	MissingCrawlerId(WorkspaceId),
	#[error(transparent)]
	Transition(#[from] InvalidTransition),
	#[error(transparent)]
	Store(#[from] StoreError),
}

/// What one pass over the waiting workspaces did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PollSummary {
	pub still_pending: usize,
	pub succeeded: usize,
	pub failed: usize,
	/// Crawler could not be asked, the workspace stays pending
	pub unreachable: usize,
	/// Finalizing failed, retried on the next pass
	pub errored: usize,
}

pub struct CrawlerStatusPoller {
	store: Arc<dyn WorkspaceStore>,
	crawler: Arc<dyn CrawlerBridge>,
	mailer: Arc<dyn Mailer>,
	pass_lock: Mutex<()>,
}

impl CrawlerStatusPoller {
	pub fn new(
		store: Arc<dyn WorkspaceStore>,
		crawler: Arc<dyn CrawlerBridge>,
		mailer: Arc<dyn Mailer>,
	) -> Self {
		Self {
			store,
			crawler,
			mailer,
			pass_lock: Mutex::new(()),
		}
	}

	/// One pass over every workspace waiting for its crawl.
	///
	/// Returns `None` without doing anything when another pass of this poller is still running.
	#[instrument(skip(self), err)]
	pub async fn poll_once(&self) -> Result<Option<PollSummary>, CrawlerError> {
		let Ok(_guard) = self.pass_lock.try_lock() else {
			debug!("Previous crawler status pass still running, skipping");
			return Ok(None);
		};

		let mut summary = PollSummary::default();

		for workspace in self
			.store
			.workspaces_in_status(WorkspaceStatus::UpdatingArchive)
			.await?
		{
			let Some(crawler_id) = workspace.crawler_id.clone() else {
				error!(
					workspace_id = workspace.id,
					"{}",
					CrawlerError::MissingCrawlerId(workspace.id)
				);
				summary.unreachable += 1;
				continue;
			};

			let state = match self.crawler.state(&crawler_id).await {
				Ok(state) => state,
				Err(e) => {
					warn!(
						workspace_id = workspace.id,
						%crawler_id,
						?e,
						"Failed to get crawler state, workspace stays pending;"
					);
					summary.unreachable += 1;
					continue;
				}
			};

			trace!(workspace_id = workspace.id, %crawler_id, %state, "Crawler state");

			if state.is_pending() {
				summary.still_pending += 1;
				continue;
			}

			let workspace_id = workspace.id;
			match self.finalize(workspace, &state).await {
				Ok(SubmissionOutcome::Success) => summary.succeeded += 1,
				Ok(SubmissionOutcome::Failure) => summary.failed += 1,
				Err(e) => {
					error!(workspace_id, %crawler_id, ?e, "Failed to finalize workspace;");
					summary.errored += 1;
				}
			}
		}

		Ok(Some(summary))
	}

	async fn finalize(
		&self,
		mut workspace: Workspace,
		state: &CrawlerState,
	) -> Result<SubmissionOutcome, CrawlerError> {
		let (status, outcome, message) = if *state == CrawlerState::Success {
			(
				WorkspaceStatus::DataMovedSuccess,
				SubmissionOutcome::Success,
				"Data was successfully moved to the archive".to_string(),
			)
		} else {
			(
				WorkspaceStatus::DataMovedError,
				SubmissionOutcome::Failure,
				format!("Crawler finished with state {state}, data was not moved correctly"),
			)
		};

		workspace.transition(status, message)?;
		self.store.update_workspace_status(&workspace).await?;

		info!(workspace_id = workspace.id, %status, "Workspace finalized");

		if let Err(e) = self.mailer.notify(&workspace, outcome).await {
			error!(workspace_id = workspace.id, ?e, "Failed to notify workspace owner;");
		}

		Ok(outcome)
	}

	/// Run [`Self::poll_once`] every `period` until `cancel_token` is cancelled
	pub fn spawn(self: Arc<Self>, period: Duration, cancel_token: CancellationToken) -> JoinHandle<()> {
		spawn(async move {
			let mut interval = interval_at(Instant::now() + period, period);
			interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

			loop {
				tokio::select! {
					() = cancel_token.cancelled() => {
						debug!("Crawler status poller stopped");
						break;
					}
					_ = interval.tick() => {
						if let Err(e) = self.poll_once().await {
							error!(?e, "Crawler status pass failed;");
						}
					}
				}
			}
		})
	}
}
