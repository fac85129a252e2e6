//!
//! # Curator
//!
//! Submission engine for archive workspaces. A workspace is an editable staging copy of a subtree
//! of a handle addressed archive; submitting it reconciles every edit back into the archive:
//! - new nodes are moved into their canonical archive directory and get a fresh handle;
//! - changed copies overwrite their archived content;
//! - replaced nodes are diffed against their predecessor and the superseded files are moved to a
//!   dated versioning directory;
//! - deleted and unlinked nodes are moved to a dated trash directory;
//! - finally the crawler is asked to reconcile the archive index, and the workspace is finalized
//!   once it reports back.
//!
//! Everything outside the engine (workspace database, handle server, crawler, search index,
//! mail) is reached through the traits in [`bridge`] and [`store`].

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub mod archive;
pub mod bridge;
pub mod checksum;
pub mod config;
pub mod crawler;
pub mod export;
pub mod logging;
pub mod replace;
pub mod store;
pub mod submission;
pub mod workspace;

pub use bridge::Bridges;
pub use config::CuratorConfig;
pub use crawler::{CrawlerState, CrawlerStatusPoller};
pub use store::WorkspaceStore;
pub use submission::{SubmissionError, Submitter};
pub use workspace::{SubmissionType, Workspace, WorkspaceNode, WorkspaceStatus};

/// The submitter and the crawler status poller, wired from one config
pub struct Engine {
	pub submitter: Arc<Submitter>,
	pub poller: Arc<CrawlerStatusPoller>,
	poll_interval: Duration,
}

impl Engine {
	pub fn new(config: &CuratorConfig, store: Arc<dyn WorkspaceStore>, bridges: Bridges) -> Self {
		let poller = Arc::new(CrawlerStatusPoller::new(
			Arc::clone(&store),
			Arc::clone(&bridges.crawler),
			Arc::clone(&bridges.mailer),
		));

		let submitter = Arc::new(Submitter::new(
			store,
			bridges,
			Arc::new((&config.archive).into()),
			Arc::new((&config.relocation).into()),
		));

		Self {
			submitter,
			poller,
			poll_interval: config.crawler.poll_interval(),
		}
	}

	/// Start polling the crawler on the configured interval
	pub fn start_polling(&self, cancel_token: CancellationToken) -> JoinHandle<()> {
		Arc::clone(&self.poller).spawn(self.poll_interval, cancel_token)
	}
}
