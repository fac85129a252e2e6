//! A throwaway archive, workspace and relocation roots on disk, plus the engine parts wired to them

use curator_core::{
	archive::{ArchiveLayout, RelocationScheme, TranslateType},
	config::ArchiveConfig,
	crawler::CrawlerStatusPoller,
	export::{NodeExporters, TreeExporter},
	replace::{ReplaceActionManager, ReplaceChecker},
	store::memory::MemoryWorkspaceStore,
	workspace::{NodeId, NodeKind, NodeStatus, Workspace, WorkspaceId, WorkspaceNode},
	Bridges, Submitter,
};

use std::{
	path::{Path, PathBuf},
	sync::Arc,
};

use tempfile::TempDir;
use tokio::fs;

use super::FakeServices;

pub const WORKSPACE_ID: WorkspaceId = 1;
pub const TOP_NODE_ID: NodeId = 1;
pub const TOP_NODE_URI: &str = "hdl:test/corpus";
pub const CORPUS_PROFILE: &str = "corpus-profile";
pub const SESSION_PROFILE: &str = "session-profile";

pub struct TestArchive {
	pub store: Arc<MemoryWorkspaceStore>,
	pub services: Arc<FakeServices>,
	pub bridges: Bridges,
	pub layout: Arc<ArchiveLayout>,
	pub relocation: Arc<RelocationScheme>,
	pub root: PathBuf,
	_dir: TempDir,
}

impl TestArchive {
	/// Workspace [`WORKSPACE_ID`] whose top node is the archived corpus `Corpus`
	pub async fn new() -> anyhow::Result<Self> {
		let dir = tempfile::tempdir()?;
		let root = dir.path().to_path_buf();

		let mut archive_config = ArchiveConfig::default();
		archive_config.profile_types.extend([
			(CORPUS_PROFILE.to_string(), TranslateType::Corpus),
			(SESSION_PROFILE.to_string(), TranslateType::Session),
		]);

		let store = Arc::new(MemoryWorkspaceStore::new());
		let services = Arc::new(FakeServices::default());

		let this = Self {
			bridges: services.bridges(),
			layout: Arc::new(ArchiveLayout::from(&archive_config)),
			relocation: Arc::new(RelocationScheme::new(
				root.join("trash"),
				root.join("versioning"),
			)),
			store,
			services,
			root,
			_dir: dir,
		};

		this.store
			.insert_workspace(Workspace::new(WORKSPACE_ID, "someone", TOP_NODE_ID));

		let top = this
			.add_archived(
				TOP_NODE_ID,
				NodeKind::Metadata,
				"corpus.cmdi",
				TOP_NODE_URI,
				"Corpus/Corpusstructure/corpus.cmdi",
				b"<corpus/>",
			)
			.await?
			.with_profile(CORPUS_PROFILE)
			.with_title("Corpus");
		this.store.insert_node(top);

		Ok(this)
	}

	pub fn archive_path(&self, relative: impl AsRef<Path>) -> PathBuf {
		self.root.join("archive").join(relative)
	}

	pub fn staged_path(&self, id: NodeId, name: &str) -> PathBuf {
		self.root.join("workspace").join(id.to_string()).join(name)
	}

	/// Node mirroring an archived file, staged and archived copies both holding `content`
	pub async fn add_archived(
		&self,
		id: NodeId,
		kind: NodeKind,
		name: &str,
		archive_uri: &str,
		archive_relative: &str,
		content: &[u8],
	) -> anyhow::Result<WorkspaceNode> {
		let location = self.archive_path(archive_relative);
		write(&location, content).await?;

		let staged = self.staged_path(id, name);
		write(&staged, content).await?;

		self.services.register(archive_uri, &location);

		let node = WorkspaceNode::new(id, WORKSPACE_ID, kind, NodeStatus::IsCopy, name, staged)
			.with_archive(archive_uri, location);
		self.store.insert_node(node.clone());

		Ok(node)
	}

	/// Node that only exists in the workspace
	pub async fn add_staged(
		&self,
		id: NodeId,
		kind: NodeKind,
		status: NodeStatus,
		name: &str,
		content: &[u8],
	) -> anyhow::Result<WorkspaceNode> {
		let staged = self.staged_path(id, name);
		write(&staged, content).await?;

		let node = WorkspaceNode::new(id, WORKSPACE_ID, kind, status, name, staged);
		self.store.insert_node(node.clone());

		Ok(node)
	}

	pub async fn restage(&self, node: &WorkspaceNode, content: &[u8]) -> anyhow::Result<()> {
		write(&node.workspace_location, content).await
	}

	pub fn save(&self, node: WorkspaceNode) -> WorkspaceNode {
		self.store.insert_node(node.clone());
		node
	}

	pub fn link(&self, parent_id: NodeId, child_id: NodeId) {
		self.store.insert_link(parent_id, child_id);
	}

	pub fn node(&self, id: NodeId) -> WorkspaceNode {
		self.store.get_node(id).expect("node exists")
	}

	pub fn workspace(&self) -> Workspace {
		self.store.get_workspace(WORKSPACE_ID).expect("workspace exists")
	}

	pub fn set_workspace(&self, workspace: Workspace) {
		self.store.insert_workspace(workspace);
	}

	pub fn exporters(&self) -> Arc<NodeExporters> {
		Arc::new(NodeExporters::new(
			self.store.clone(),
			self.bridges.clone(),
			Arc::clone(&self.layout),
			Arc::clone(&self.relocation),
		))
	}

	pub fn tree_exporter(&self) -> TreeExporter {
		TreeExporter::new(
			self.store.clone(),
			&self.bridges,
			Arc::clone(&self.layout),
			Arc::clone(&self.relocation),
		)
	}

	pub fn checker(&self) -> ReplaceChecker {
		ReplaceChecker::new(self.store.clone(), Arc::clone(&self.bridges.archive))
	}

	pub fn manager(&self) -> ReplaceActionManager {
		ReplaceActionManager::new(self.store.clone(), self.exporters())
	}

	pub fn submitter(&self) -> Arc<Submitter> {
		Arc::new(Submitter::new(
			self.store.clone(),
			self.bridges.clone(),
			Arc::clone(&self.layout),
			Arc::clone(&self.relocation),
		))
	}

	pub fn poller(&self) -> Arc<CrawlerStatusPoller> {
		Arc::new(CrawlerStatusPoller::new(
			self.store.clone(),
			Arc::clone(&self.bridges.crawler),
			Arc::clone(&self.bridges.mailer),
		))
	}
}

pub async fn write(path: &Path, content: &[u8]) -> anyhow::Result<()> {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).await?;
	}
	fs::write(path, content).await?;

	Ok(())
}
