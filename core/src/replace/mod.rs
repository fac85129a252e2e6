//! Reconciling an archived node with the node that replaces it.
//!
//! Replacing is done in two steps. [`ReplaceChecker`] walks both trees and plans every structural
//! change as a [`ReplaceAction`] without touching anything. Only when the whole plan is known, and
//! no protected node stands in the way, [`ReplaceActionManager`] applies it in order.

use crate::{
	bridge::BridgeError,
	store::StoreError,
	workspace::{NodeId, WorkspaceId},
};

use curator_utils::error::FileIOError;

use thiserror::Error;

pub mod action;
pub mod checker;
pub mod manager;

pub use action::ReplaceAction;
pub use checker::{CheckerKind, ReplaceChecker};
pub use manager::{AppliedActions, PartialApplyError, ReplaceActionManager};

#[derive(Error, Debug)]
pub enum ReplaceError {
	#[error(
		"protected node can't be replaced or removed: <node_id='{node_id}', archive_uri='{}', workspace_id='{workspace_id}'>",
		.archive_uri.as_deref().unwrap_or_default()
	)]
	ProtectedNode {
		node_id: NodeId,
		archive_uri: Option<String>,
		workspace_id: WorkspaceId,
	},
	#[error(transparent)]
	Store(#[from] StoreError),
	#[error(transparent)]
	Bridge(#[from] BridgeError),
	#[error(transparent)]
	FileIO(#[from] FileIOError),
}
