//! # Primitives
//!
//! Compiled-in constants for the lastgreen core.

/// Default number of feed pages read per poll.
///
/// - A poll only needs what happened since the last cursor.
/// - Two pages covers a burst of runs between polls without reading history.
pub const DEFAULT_PAGE_LIMIT: u32 = 2;

/// Upper bound on pages read per poll, whatever the configuration says.
pub const MAX_PAGE_LIMIT: u32 = 10;

/// Suffix appended to a repository's last path segment to form a material name.
pub const MATERIAL_NAME_SUFFIX: &str = "-git";

/// Magic bytes for the stored cursor record header.
pub const MAGIC_BYTES: &[u8; 4] = b"LGRN";

/// Current record format version.
///
/// Increment this when making breaking changes to `CursorRecord`.
pub const FORMAT_VERSION: u8 = 1;

/// Clamp a configured page limit into `1..=MAX_PAGE_LIMIT`.
#[must_use]
pub const fn clamp_page_limit(limit: u32) -> u32 {
    if limit == 0 {
        1
    } else if limit > MAX_PAGE_LIMIT {
        MAX_PAGE_LIMIT
    } else {
        limit
    }
}
