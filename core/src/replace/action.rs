use crate::workspace::{NodeId, WorkspaceNode};

use std::fmt;

/// One structural change produced by a replace decision. Pure data, see
/// [`ReplaceActionManager`](super::ReplaceActionManager) for what applying each one means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceAction {
	Delete {
		node: WorkspaceNode,
	},
	Unlink {
		node: WorkspaceNode,
		parent: WorkspaceNode,
	},
	Link {
		node: WorkspaceNode,
		parent: WorkspaceNode,
	},
	Replace {
		old: WorkspaceNode,
		parent: WorkspaceNode,
		new: WorkspaceNode,
		new_already_linked: bool,
	},
	RemoveArchiveIdentifier {
		node: WorkspaceNode,
		parent: WorkspaceNode,
	},
}

impl ReplaceAction {
	/// The node the action is about; the old node for replacements
	#[must_use]
	pub const fn node_id(&self) -> NodeId {
		match self {
			Self::Delete { node }
			| Self::Unlink { node, .. }
			| Self::Link { node, .. }
			| Self::RemoveArchiveIdentifier { node, .. } => node.id,
			Self::Replace { old, .. } => old.id,
		}
	}

	#[must_use]
	pub const fn name(&self) -> &'static str {
		match self {
			Self::Delete { .. } => "delete",
			Self::Unlink { .. } => "unlink",
			Self::Link { .. } => "link",
			Self::Replace { .. } => "replace",
			Self::RemoveArchiveIdentifier { .. } => "remove_archive_identifier",
		}
	}
}

impl fmt::Display for ReplaceAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Delete { node } => write!(f, "delete <node_id='{}'>", node.id),
			Self::Unlink { node, parent } | Self::Link { node, parent } => write!(
				f,
				"{} <node_id='{}', parent_id='{}'>",
				self.name(),
				node.id,
				parent.id
			),
			Self::Replace {
				old,
				parent,
				new,
				new_already_linked,
			} => write!(
				f,
				"replace <old_id='{}', new_id='{}', parent_id='{}', already_linked='{new_already_linked}'>",
				old.id, new.id, parent.id
			),
			Self::RemoveArchiveIdentifier { node, parent } => write!(
				f,
				"remove_archive_identifier <node_id='{}', parent_id='{}'>",
				node.id, parent.id
			),
		}
	}
}
