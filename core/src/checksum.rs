use curator_utils::error::{FileIOError, IoResultExt};

use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::{fs, io::AsyncReadExt};

const BLOCK_LEN: usize = 64 * 1024;

/// Lowercase hex SHA-256 of the file at `path`, streamed in blocks
pub async fn file_checksum(path: impl AsRef<Path>) -> Result<String, FileIOError> {
	let path = path.as_ref();
	let mut file = fs::File::open(path)
		.await
		.at_path_with(path, "opening file to checksum")?;

	let mut hasher = Sha256::new();
	let mut buf = vec![0; BLOCK_LEN];

	loop {
		let read = file
			.read(&mut buf)
			.await
			.at_path_with(path, "reading file to checksum")?;
		if read == 0 {
			break;
		}
		hasher.update(&buf[..read]);
	}

	Ok(hex::encode(hasher.finalize()))
}

/// Whether the file at `path` has exactly `size` bytes hashing to `checksum`.
///
/// Sizes are compared first, the file is only hashed when they agree.
pub async fn same_content(
	path: impl AsRef<Path>,
	size: u64,
	checksum: &str,
) -> Result<bool, FileIOError> {
	let path = path.as_ref();
	let actual_size = fs::metadata(path)
		.await
		.at_path_with(path, "reading file size")?
		.len();

	if actual_size != size {
		return Ok(false);
	}

	Ok(file_checksum(path).await? == checksum)
}
