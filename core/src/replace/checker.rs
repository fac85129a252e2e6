use crate::{
	bridge::ArchiveObjects,
	checksum,
	store::WorkspaceStore,
	workspace::{NodeKind, WorkspaceNode},
};

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, trace};

use super::{ReplaceAction, ReplaceError};

/// Which exploration a replaced node gets, purely by its declared kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckerKind {
	/// Children are matched against the replacement's children
	Metadata,
	/// Leaf, nothing below to explore
	Resource,
}

impl CheckerKind {
	#[must_use]
	pub const fn for_node(node: &WorkspaceNode) -> Self {
		match node.kind {
			NodeKind::Metadata => Self::Metadata,
			NodeKind::ResourceWritten
			| NodeKind::ResourceAudio
			| NodeKind::ResourceImage
			| NodeKind::ResourceVideo
			| NodeKind::ResourceInfo => Self::Resource,
		}
	}
}

pub struct ReplaceChecker {
	store: Arc<dyn WorkspaceStore>,
	archive: Arc<dyn ArchiveObjects>,
}

impl ReplaceChecker {
	pub fn new(store: Arc<dyn WorkspaceStore>, archive: Arc<dyn ArchiveObjects>) -> Self {
		Self { store, archive }
	}

	/// Plan the replacement of `old` by `new` below `parent`, appending to `actions`.
	///
	/// Nothing is changed in the store or on disk. On error `actions` is left exactly as it was
	/// when this call started.
	pub fn decide_replace_actions<'a>(
		&'a self,
		old: &'a WorkspaceNode,
		new: &'a WorkspaceNode,
		parent: &'a WorkspaceNode,
		new_already_linked: bool,
		actions: &'a mut Vec<ReplaceAction>,
	) -> BoxFuture<'a, Result<(), ReplaceError>> {
		Box::pin(async move {
			let checkpoint = actions.len();

			let res = async {
				ensure_unprotected(old)?;

				actions.push(ReplaceAction::Replace {
					old: old.clone(),
					parent: parent.clone(),
					new: new.clone(),
					new_already_linked,
				});

				match CheckerKind::for_node(old) {
					CheckerKind::Metadata => {}
					CheckerKind::Resource => return Ok::<_, ReplaceError>(()),
				}

				let old_children = self.store.children(old.id).await?;
				let new_children = self.store.children(new.id).await?;
				let mut new_matched = vec![false; new_children.len()];

				for old_child in &old_children {
					let matched = old_child.archive_uri.as_deref().and_then(|uri| {
						new_children
							.iter()
							.enumerate()
							.find(|(idx, new_child)| {
								!new_matched[*idx] && new_child.archive_uri.as_deref() == Some(uri)
							})
							.map(|(idx, _)| idx)
					});

					let Some(idx) = matched else {
						self.ensure_subtree_unprotected(old_child).await?;
						trace!(old_child = %old_child, "No counterpart in the replacement");
						actions.push(ReplaceAction::Delete {
							node: old_child.clone(),
						});
						continue;
					};

					new_matched[idx] = true;
					let new_child = &new_children[idx];

					match CheckerKind::for_node(old_child) {
						CheckerKind::Metadata => {
							self.decide_replace_actions(old_child, new_child, new, true, actions)
								.await?;
						}
						CheckerKind::Resource => {
							ensure_unprotected(old_child)?;

							if self.resource_changed(old_child, new_child).await? {
								self.decide_replace_actions(old_child, new_child, new, true, actions)
									.await?;
							} else if self.linked_elsewhere(new_child, new).await? {
								debug!(
									old_child = %old_child,
									new_child = %new_child,
									"Unchanged resource duplicated elsewhere, keeping the archived one"
								);
								actions.extend([
									ReplaceAction::Unlink {
										node: new_child.clone(),
										parent: new.clone(),
									},
									ReplaceAction::Delete {
										node: new_child.clone(),
									},
									ReplaceAction::Link {
										node: old_child.clone(),
										parent: new.clone(),
									},
								]);
							} else {
								trace!(old_child = %old_child, "Resource unchanged");
							}
						}
					}
				}

				actions.extend(
					new_children
						.iter()
						.zip(new_matched)
						.filter(|(_, matched)| !matched)
						.map(|(new_child, _)| ReplaceAction::RemoveArchiveIdentifier {
							node: new_child.clone(),
							parent: new.clone(),
						}),
				);

				Ok(())
			}
			.await;

			if res.is_err() {
				actions.truncate(checkpoint);
			}

			res
		})
	}

	/// Compares the archived content of `old` with the staged content of `new`, size first
	async fn resource_changed(
		&self,
		old: &WorkspaceNode,
		new: &WorkspaceNode,
	) -> Result<bool, ReplaceError> {
		let Some(archive_uri) = old.archive_uri.as_deref() else {
			return Ok(true);
		};

		let archived = self.archive.file_info(archive_uri).await?;

		Ok(!checksum::same_content(&new.workspace_location, archived.size, &archived.checksum)
			.await?)
	}

	async fn linked_elsewhere(
		&self,
		node: &WorkspaceNode,
		parent: &WorkspaceNode,
	) -> Result<bool, ReplaceError> {
		Ok(self
			.store
			.parents(node.id)
			.await?
			.iter()
			.any(|other| other.id != parent.id))
	}

	async fn ensure_subtree_unprotected(&self, root: &WorkspaceNode) -> Result<(), ReplaceError> {
		ensure_unprotected(root)?;

		let mut pending = vec![root.id];
		while let Some(node_id) = pending.pop() {
			for child in self.store.children(node_id).await? {
				ensure_unprotected(&child)?;
				pending.push(child.id);
			}
		}

		Ok(())
	}
}

fn ensure_unprotected(node: &WorkspaceNode) -> Result<(), ReplaceError> {
	if node.protected {
		return Err(ReplaceError::ProtectedNode {
			node_id: node.id,
			archive_uri: node.archive_uri.clone(),
			workspace_id: node.workspace_id,
		});
	}

	Ok(())
}
