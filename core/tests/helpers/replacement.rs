use curator_core::workspace::{NodeKind, NodeStatus, WorkspaceNode};

use super::{TestArchive, SESSION_PROFILE, TOP_NODE_ID};

pub const OLD_URI: &str = "hdl:test/H1";
pub const KEPT_URI: &str = "hdl:test/H10";
pub const DROPPED_URI: &str = "hdl:test/H11";

/// Session `a.cmdi` with annotations `c1.eaf` and `c2.eaf`, replaced by `b.cmdi` which keeps
/// `c1.eaf` unchanged, drops `c2.eaf` and brings the new `c3.eaf`
pub struct Replacement {
	pub old: WorkspaceNode,
	pub old_kept: WorkspaceNode,
	pub old_dropped: WorkspaceNode,
	pub new: WorkspaceNode,
	pub new_kept: WorkspaceNode,
	pub new_added: WorkspaceNode,
}

impl TestArchive {
	/// `b.cmdi` already took the place of `a.cmdi` below the top node and the replacement is
	/// recorded as pending
	pub async fn add_replacement(&self) -> anyhow::Result<Replacement> {
		let old = self.save(
			self.add_archived(
				10,
				NodeKind::Metadata,
				"a.cmdi",
				OLD_URI,
				"Corpus/Metadata/Corpus/a.cmdi",
				b"<session name=\"a\"/>",
			)
			.await?
			.with_profile(SESSION_PROFILE),
		);
		let old_kept = self
			.add_archived(
				11,
				NodeKind::ResourceWritten,
				"c1.eaf",
				KEPT_URI,
				"Corpus/Annotations/c1.eaf",
				b"kept annotation",
			)
			.await?;
		let old_dropped = self
			.add_archived(
				12,
				NodeKind::ResourceWritten,
				"c2.eaf",
				DROPPED_URI,
				"Corpus/Annotations/c2.eaf",
				b"dropped annotation",
			)
			.await?;
		self.link(old.id, old_kept.id);
		self.link(old.id, old_dropped.id);

		let new = self.save(
			self.add_staged(
				20,
				NodeKind::Metadata,
				NodeStatus::Uploaded,
				"b.cmdi",
				b"<session name=\"b\"/>",
			)
			.await?
			.with_profile(SESSION_PROFILE),
		);
		let new_kept = self.save(
			self.add_staged(
				21,
				NodeKind::ResourceWritten,
				NodeStatus::IsCopy,
				"c1.eaf",
				b"kept annotation",
			)
			.await?
			.with_archive(KEPT_URI, self.archive_path("Corpus/Annotations/c1.eaf")),
		);
		let new_added = self
			.add_staged(
				22,
				NodeKind::ResourceWritten,
				NodeStatus::Uploaded,
				"c3.eaf",
				b"added annotation",
			)
			.await?;

		self.link(TOP_NODE_ID, new.id);
		self.link(new.id, new_kept.id);
		self.link(new.id, new_added.id);
		self.store.insert_replacement(old.id, new.id);

		Ok(Replacement {
			old,
			old_kept,
			old_dropped,
			new,
			new_kept,
			new_added,
		})
	}
}
