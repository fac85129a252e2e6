//! Archive-safe file and directory names.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

/// Inserted before the kept suffix when a name has to be shortened
pub const ELLIPSIS: &str = "...";

/// Longest suffix (dot included) preserved when a name is shortened
const MAX_KEPT_SUFFIX_LEN: usize = 7;

static XML_ENTITY: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);")
		.expect("invalid xml entity regex")
});

/// Where a name being sanitized came from, only changes how loudly we log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameOrigin {
	/// Derived from a node title, rewriting is expected
	Title,
	/// An uploaded file name, rewriting it is worth a warning
	FileName,
}

const fn is_allowed(c: char) -> bool {
	c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Make `raw` safe to use as an archive path element and log what changed.
///
/// XML entity references and every character outside `[A-Za-z0-9._-]` become `_`. Runs of
/// underscores produced by this substitution collapse into one, underscores already present in
/// `raw` are kept as they are. Names longer than `max_len` are shortened, keeping a short
/// extension behind an [`ELLIPSIS`].
pub fn sanitize_name(raw: &str, max_len: usize, origin: NameOrigin) -> String {
	let sanitized = sanitize(raw, max_len);

	if sanitized != raw {
		match origin {
			NameOrigin::Title => {
				info!(original = raw, %sanitized, "Derived archive name from title");
			}
			NameOrigin::FileName => {
				warn!(original = raw, %sanitized, "File name changed to be archive safe");
			}
		}
	}

	sanitized
}

/// [`sanitize_name`] without the audit trail
pub(crate) fn sanitize(raw: &str, max_len: usize) -> String {
	let mut out = String::with_capacity(raw.len());
	let mut last_substituted = false;
	let mut cursor = 0;

	for entity in XML_ENTITY.find_iter(raw) {
		substitute_chars(&raw[cursor..entity.start()], &mut out, &mut last_substituted);
		push_substitute(&mut out, &mut last_substituted);
		cursor = entity.end();
	}
	substitute_chars(&raw[cursor..], &mut out, &mut last_substituted);

	truncate(out, max_len)
}

fn push_substitute(out: &mut String, last_substituted: &mut bool) {
	if !*last_substituted {
		out.push('_');
	}
	*last_substituted = true;
}

fn substitute_chars(chunk: &str, out: &mut String, last_substituted: &mut bool) {
	for c in chunk.chars() {
		if is_allowed(c) {
			out.push(c);
			*last_substituted = false;
		} else {
			push_substitute(out, last_substituted);
		}
	}
}

// Only ever called with ASCII, so byte lengths are char lengths
fn truncate(name: String, max_len: usize) -> String {
	if name.len() <= max_len {
		return name;
	}

	let suffix = name
		.rfind('.')
		.filter(|&idx| idx > 0 && name.len() - idx <= MAX_KEPT_SUFFIX_LEN)
		.map_or("", |idx| &name[idx..]);

	if ELLIPSIS.len() + suffix.len() >= max_len {
		return name[..max_len].to_string();
	}

	let keep = max_len - ELLIPSIS.len() - suffix.len();
	format!("{}{ELLIPSIS}{suffix}", &name[..keep])
}
