//! Placement of files inside the archive: names, canonical directories and relocation.

pub mod location;
pub mod naming;
pub mod relocation;

pub use location::{resolve_available_file, ArchiveLayout, PathError, TranslateType};
pub use naming::{sanitize_name, NameOrigin};
pub use relocation::{RelocationError, RelocationRoot, RelocationScheme, VersionedName};
