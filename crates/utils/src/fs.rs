//! Small filesystem helpers shared by the export pipeline.

use crate::error::{FileIOError, IoResultExt};

use std::{io, path::Path};

use tokio::fs;
use tracing::{debug, trace};

/// `true` if something exists at `path`, without following the error path on races
pub async fn exists(path: impl AsRef<Path>) -> Result<bool, FileIOError> {
	let path = path.as_ref();
	fs::try_exists(path).await.at_path(path)
}

/// Create `dir` (and its parents) and make sure we can write into it.
///
/// A directory that exists but is read-only is reported as a `PermissionDenied` error.
pub async fn ensure_writable_dir(dir: impl AsRef<Path>) -> Result<(), FileIOError> {
	let dir = dir.as_ref();

	fs::create_dir_all(dir)
		.await
		.at_path_with(dir, "creating directory")?;

	let metadata = fs::metadata(dir)
		.await
		.at_path_with(dir, "reading directory metadata")?;

	if !metadata.is_dir() {
		return Err(FileIOError::new(
			dir,
			io::Error::new(io::ErrorKind::Other, "not a directory"),
		)
		.with_context("checking directory"));
	}

	if metadata.permissions().readonly() {
		return Err(FileIOError::new(
			dir,
			io::Error::from(io::ErrorKind::PermissionDenied),
		)
		.with_context("checking directory is writable"));
	}

	Ok(())
}

/// Move a file, falling back to copy + remove when a plain rename is refused
/// (e.g. source and target live on different devices).
pub async fn move_file(
	source: impl AsRef<Path>,
	target: impl AsRef<Path>,
) -> Result<(), FileIOError> {
	let (source, target) = (source.as_ref(), target.as_ref());

	match fs::rename(source, target).await {
		Ok(()) => {
			trace!(source = %source.display(), target = %target.display(), "Renamed file");
			Ok(())
		}
		Err(e) if e.kind() == io::ErrorKind::NotFound => {
			Err(FileIOError::new(source, e).with_context("moving file"))
		}
		Err(e) => {
			debug!(
				source = %source.display(),
				target = %target.display(),
				?e,
				"Rename failed, falling back to copy and remove;"
			);

			fs::copy(source, target)
				.await
				.at_path_with(target, "copying file")?;

			fs::remove_file(source)
				.await
				.at_path_with(source, "removing moved file")
		}
	}
}
