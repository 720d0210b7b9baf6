//! Archive Codecs
//!
//! ZIP and GZIP adapters plus the naming rules that decide when a file is treated
//! as a container. `.zip` and `.jar` share the ZIP codec; naming is purely conventional.

pub mod gzip_codec;
pub mod zip_codec;

/// Suffixes read and written with the ZIP codec
pub const ZIP_SUFFIXES: &[&str] = &[".zip", ".jar"];

/// Suffix read and written with the GZIP codec
pub const GZIP_SUFFIX: &str = ".gz";

/// Container format implied by a file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Gzip,
}

fn ends_with_ignore_case(name: &str, suffix: &str) -> bool {
    name.len() >= suffix.len()
        && name.is_char_boundary(name.len() - suffix.len())
        && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

/// Classify a file name by its archive suffix
pub fn archive_kind(name: &str) -> Option<ArchiveKind> {
    if ZIP_SUFFIXES.iter().any(|s| ends_with_ignore_case(name, s)) {
        Some(ArchiveKind::Zip)
    } else if ends_with_ignore_case(name, GZIP_SUFFIX) {
        Some(ArchiveKind::Gzip)
    } else {
        None
    }
}

pub fn is_container_name(name: &str) -> bool {
    archive_kind(name).is_some()
}

/// Strip one archive suffix (`.zip`, `.jar`, or `.gz`) from a name
pub fn strip_archive_suffix(name: &str) -> &str {
    for suffix in ZIP_SUFFIXES.iter().chain(std::iter::once(&GZIP_SUFFIX)) {
        if ends_with_ignore_case(name, suffix) {
            return &name[..name.len() - suffix.len()];
        }
    }
    name
}

/// Verdict of the untrusted entry-name filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryNameCheck {
    Accepted,
    /// Contains a parent-directory traversal sequence
    Traversal,
    /// Contains a character outside `[A-Za-z0-9 .$_()/-]`
    UnsafeCharacter(char),
}

fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ' ' | '.' | '$' | '_' | '(' | ')' | '/' | '-')
}

/// Check an inner archive entry name before it is registered in the tree
pub fn check_entry_name(name: &str) -> EntryNameCheck {
    if name.contains("..") {
        return EntryNameCheck::Traversal;
    }
    match name.chars().find(|c| !is_safe_char(*c)) {
        Some(c) => EntryNameCheck::UnsafeCharacter(c),
        None => EntryNameCheck::Accepted,
    }
}
