//! EFI GUID formatting and optional name resolution.

use std::collections::HashMap;

use uuid::Uuid;

/// Formats an on-disk EFI GUID (mixed-endian) in registry form,
/// e.g. `3B6686BD-0D76-4030-B70E-B5519E2FC5A0`.
pub fn guid_to_string(bytes: &[u8; 16]) -> String {
    let mut buffer = Uuid::encode_buffer();
    Uuid::from_bytes_le(*bytes)
        .hyphenated()
        .encode_upper(&mut buffer)
        .to_string()
}

/// Source of human-readable names for GUIDs.
///
/// The name database itself lives outside this crate; callers plug theirs in
/// through this trait. Lookups use the registry-form string.
pub trait GuidDatabase {
    fn lookup(&self, guid: &str) -> Option<&str>;

    /// Name for `guid`, falling back to the GUID itself.
    fn display_name(&self, guid: &str) -> String {
        self.lookup(guid).unwrap_or(guid).to_string()
    }
}

/// Database that knows no names.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGuidNames;

impl GuidDatabase for NoGuidNames {
    fn lookup(&self, _guid: &str) -> Option<&str> {
        None
    }
}

impl GuidDatabase for HashMap<String, String> {
    fn lookup(&self, guid: &str) -> Option<&str> {
        self.get(guid).map(String::as_str)
    }
}
