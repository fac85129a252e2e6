//! In-process stand-ins for every external service, recording what the engine asked of them

use curator_core::{
	bridge::{
		ArchiveFileInfo, ArchiveObjects, BridgeError, Bridges, CrawlerBridge, HandleManager, Mailer,
		MetadataDocuments, PermissionAdjuster, PermissionScope, SearchIndex, Service,
		SubmissionOutcome,
	},
	checksum,
	workspace::{NodeId, Workspace, WorkspaceId, WorkspaceNode},
	CrawlerState,
};

use std::{
	collections::HashMap,
	path::{Path, PathBuf},
	sync::{
		atomic::{AtomicBool, AtomicUsize, Ordering},
		Arc,
	},
};

use async_trait::async_trait;
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
	HandleCreated { handle: String, target: PathBuf },
	HandleRetargeted { handle: String, target: PathBuf },
	HandleDeleted(String),
	SearchRemoved(String),
	CrawlerStarted { top_node_uri: String, job_id: String },
	PermissionsAdjusted(WorkspaceId, PermissionScope),
	Notified(WorkspaceId, SubmissionOutcome),
	Relinked { node_id: NodeId, children: Vec<NodeId> },
}

#[derive(Debug, Default)]
pub struct FakeServices {
	archived: Mutex<HashMap<String, PathBuf>>,
	calls: Mutex<Vec<Call>>,
	crawler_states: Mutex<HashMap<String, CrawlerState>>,
	crawler_unreachable: AtomicBool,
	refuse_crawls: AtomicBool,
	refuse_handles: AtomicBool,
	next_id: AtomicUsize,
}

impl FakeServices {
	pub fn bridges(self: &Arc<Self>) -> Bridges {
		Bridges {
			archive: Arc::clone(self) as _,
			handles: Arc::clone(self) as _,
			crawler: Arc::clone(self) as _,
			search: Arc::clone(self) as _,
			permissions: Arc::clone(self) as _,
			mailer: Arc::clone(self) as _,
			documents: Arc::clone(self) as _,
		}
	}

	pub fn register(&self, archive_uri: &str, location: &Path) {
		self.archived
			.lock()
			.insert(archive_uri.to_string(), location.to_path_buf());
	}

	pub fn calls(&self) -> Vec<Call> {
		self.calls.lock().clone()
	}

	pub fn notifications(&self) -> Vec<(WorkspaceId, SubmissionOutcome)> {
		self.calls()
			.into_iter()
			.filter_map(|call| match call {
				Call::Notified(workspace_id, outcome) => Some((workspace_id, outcome)),
				_ => None,
			})
			.collect()
	}

	pub fn set_crawler_state(&self, job_id: &str, state: CrawlerState) {
		self.crawler_states.lock().insert(job_id.to_string(), state);
	}

	pub fn set_crawler_unreachable(&self, unreachable: bool) {
		self.crawler_unreachable.store(unreachable, Ordering::SeqCst);
	}

	pub fn refuse_crawls(&self) {
		self.refuse_crawls.store(true, Ordering::SeqCst);
	}

	pub fn refuse_handles(&self) {
		self.refuse_handles.store(true, Ordering::SeqCst);
	}

	fn record(&self, call: Call) {
		self.calls.lock().push(call);
	}

	fn next_id(&self) -> usize {
		self.next_id.fetch_add(1, Ordering::SeqCst) + 1
	}
}

#[async_trait]
impl ArchiveObjects for FakeServices {
	async fn file_info(&self, archive_uri: &str) -> Result<ArchiveFileInfo, BridgeError> {
		let location = self
			.archived
			.lock()
			.get(archive_uri)
			.cloned()
			.ok_or_else(|| {
				BridgeError::new(
					Service::ArchiveLookup,
					format!("unknown archive uri {archive_uri}"),
				)
			})?;

		let size = tokio::fs::metadata(&location)
			.await
			.map_err(|e| BridgeError::new(Service::ArchiveLookup, e))?
			.len();
		let checksum = checksum::file_checksum(&location)
			.await
			.map_err(|e| BridgeError::new(Service::ArchiveLookup, e))?;

		Ok(ArchiveFileInfo {
			location,
			size,
			checksum,
		})
	}
}

#[async_trait]
impl HandleManager for FakeServices {
	async fn create(&self, target: &Path) -> Result<String, BridgeError> {
		if self.refuse_handles.load(Ordering::SeqCst) {
			return Err(BridgeError::new(Service::HandleServer, "handle server unavailable"));
		}

		let handle = format!("hdl:test/new-{}", self.next_id());
		self.register(&handle, target);
		self.record(Call::HandleCreated {
			handle: handle.clone(),
			target: target.to_path_buf(),
		});

		Ok(handle)
	}

	async fn update_target(&self, handle: &str, target: &Path) -> Result<(), BridgeError> {
		self.register(handle, target);
		self.record(Call::HandleRetargeted {
			handle: handle.to_string(),
			target: target.to_path_buf(),
		});

		Ok(())
	}

	async fn delete(&self, handle: &str) -> Result<(), BridgeError> {
		self.archived.lock().remove(handle);
		self.record(Call::HandleDeleted(handle.to_string()));

		Ok(())
	}
}

#[async_trait]
impl CrawlerBridge for FakeServices {
	async fn start(&self, top_node_uri: &str) -> Result<String, BridgeError> {
		if self.refuse_crawls.load(Ordering::SeqCst) {
			return Err(BridgeError::new(Service::Crawler, "crawler refused the job"));
		}

		let job_id = format!("crawl-{}", self.next_id());
		self.record(Call::CrawlerStarted {
			top_node_uri: top_node_uri.to_string(),
			job_id: job_id.clone(),
		});

		Ok(job_id)
	}

	async fn state(&self, job_id: &str) -> Result<CrawlerState, BridgeError> {
		if self.crawler_unreachable.load(Ordering::SeqCst) {
			return Err(BridgeError::new(Service::Crawler, "connection refused"));
		}

		Ok(self
			.crawler_states
			.lock()
			.get(job_id)
			.cloned()
			.unwrap_or(CrawlerState::Started))
	}
}

#[async_trait]
impl SearchIndex for FakeServices {
	async fn remove(&self, archive_uri: &str) -> Result<(), BridgeError> {
		self.record(Call::SearchRemoved(archive_uri.to_string()));
		Ok(())
	}
}

#[async_trait]
impl PermissionAdjuster for FakeServices {
	async fn adjust(
		&self,
		workspace_id: WorkspaceId,
		scope: PermissionScope,
	) -> Result<(), BridgeError> {
		self.record(Call::PermissionsAdjusted(workspace_id, scope));
		Ok(())
	}
}

#[async_trait]
impl Mailer for FakeServices {
	async fn notify(
		&self,
		workspace: &Workspace,
		outcome: SubmissionOutcome,
	) -> Result<(), BridgeError> {
		self.record(Call::Notified(workspace.id, outcome));
		Ok(())
	}
}

#[async_trait]
impl MetadataDocuments for FakeServices {
	async fn relink(
		&self,
		node: &WorkspaceNode,
		children: &[WorkspaceNode],
	) -> Result<(), BridgeError> {
		self.record(Call::Relinked {
			node_id: node.id,
			children: children.iter().map(|child| child.id).collect(),
		});
		Ok(())
	}
}
