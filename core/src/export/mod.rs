//! Moving workspace nodes into their final archive state.

use crate::{
	archive::PathError,
	bridge::BridgeError,
	replace::{PartialApplyError, ReplaceError},
	store::StoreError,
	workspace::NodeId,
};

use curator_utils::error::FileIOError;

use std::{collections::HashMap, path::PathBuf};

use thiserror::Error;

pub mod node;
pub mod tree;
mod unlinked;

pub use node::{ExportContext, Exported, ExporterKind, NodeExporters};
pub use tree::TreeExporter;

#[derive(Error, Debug)]
pub enum ExportError {
	#[error("node to add has no parent: <node_id='{0}'>")]
	MissingParent(NodeId),
	#[error("parent of a node to add is not in the archive: <node_id='{node_id}', parent_id='{parent_id}'>")]
	ParentNotArchived { node_id: NodeId, parent_id: NodeId },
	#[error("archived copy has no archive identifier: <node_id='{0}'>")]
	NotArchived(NodeId),

	#[error(transparent)]
	Path(#[from] PathError),
	#[error(transparent)]
	FileIO(#[from] FileIOError),
	#[error(transparent)]
	Store(#[from] StoreError),
	#[error(transparent)]
	Bridge(#[from] BridgeError),
	#[error(transparent)]
	Replace(#[from] ReplaceError),
	#[error(transparent)]
	Apply(#[from] PartialApplyError),
}

/// A file that should have been relocated but was not. Its node still points at the old place
/// and needs reconciling outside of the submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredInconsistency {
	pub node_id: NodeId,
	pub archive_location: PathBuf,
	pub reason: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportReport {
	pub exported: HashMap<ExporterKind, usize>,
	/// Nodes that had nothing to do, e.g. deleted before ever reaching the archive
	pub skipped: usize,
	pub deferred: Vec<DeferredInconsistency>,
}

impl ExportReport {
	pub(crate) fn record(&mut self, kind: ExporterKind, exported: &Exported) {
		if exported.skipped {
			self.skipped += 1;
		} else {
			*self.exported.entry(kind).or_default() += 1;
		}

		self.deferred.extend(exported.deferred.iter().cloned());
	}

	#[must_use]
	pub fn count(&self, kind: ExporterKind) -> usize {
		self.exported.get(&kind).copied().unwrap_or_default()
	}

	pub fn merge(&mut self, other: Self) {
		for (kind, count) in other.exported {
			*self.exported.entry(kind).or_default() += count;
		}
		self.skipped += other.skipped;
		self.deferred.extend(other.deferred);
	}
}
