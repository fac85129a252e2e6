use std::{fmt::Display, io, path::Path};

use thiserror::Error;

/// File I/O error that remembers which path it happened on
#[derive(Error, Debug)]
pub struct FileIOError {
	pub path: Box<Path>,
	#[source]
	pub source: io::Error,
	pub maybe_context: Option<&'static str>,
}

impl Display for FileIOError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.maybe_context {
			Some(ctx) => write!(
				f,
				"file I/O error ({ctx}): {}; <path='{}'>",
				self.source,
				self.path.display()
			),
			None => write!(
				f,
				"file I/O error: {}; <path='{}'>",
				self.source,
				self.path.display()
			),
		}
	}
}

impl FileIOError {
	pub fn new(path: impl AsRef<Path>, source: io::Error) -> Self {
		Self {
			path: path.as_ref().into(),
			source,
			maybe_context: None,
		}
	}

	#[must_use]
	pub const fn with_context(mut self, context: &'static str) -> Self {
		self.maybe_context = Some(context);
		self
	}

	/// The underlying [`io::ErrorKind`], handy for matching on not found and friends
	#[must_use]
	pub fn kind(&self) -> io::ErrorKind {
		self.source.kind()
	}
}

impl<P: AsRef<Path>> From<(P, io::Error)> for FileIOError {
	fn from((path, source): (P, io::Error)) -> Self {
		Self::new(path, source)
	}
}

/// Attach a path (and optionally a short context) to a raw [`io::Result`]
pub trait IoResultExt<T> {
	fn at_path(self, path: impl AsRef<Path>) -> Result<T, FileIOError>;

	fn at_path_with(self, path: impl AsRef<Path>, context: &'static str)
		-> Result<T, FileIOError>;
}

impl<T> IoResultExt<T> for io::Result<T> {
	fn at_path(self, path: impl AsRef<Path>) -> Result<T, FileIOError> {
		self.map_err(|e| FileIOError::new(path, e))
	}

	fn at_path_with(
		self,
		path: impl AsRef<Path>,
		context: &'static str,
	) -> Result<T, FileIOError> {
		self.map_err(|e| FileIOError::new(path, e).with_context(context))
	}
}
