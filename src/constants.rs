pub(crate) const DEFAULT_WHOLE_STREAM_SIZE_LIMIT: u64 = u64::MAX;
pub(crate) const DEFAULT_PER_FIELD_SIZE_LIMIT: u64 = u64::MAX;

pub(crate) const DEFAULT_BUFFER_SIZE: usize = 4096;
pub(crate) const DEFAULT_BOUNDARY_SCAN_LIMIT: usize = 8 * 1024;

pub(crate) const MAX_HEADERS: usize = 32;
pub(crate) const MAX_HEADER_BYTES: usize = 8 * 1024;

pub(crate) const BOUNDARY_EXT: &str = "--";
pub(crate) const CR: u8 = b'\r';
pub(crate) const LF: u8 = b'\n';
pub(crate) const CRLF: &str = "\r\n";

/// Whitespace allowed between a boundary and the end of its line.
pub(crate) fn is_transport_padding(b: u8) -> bool {
    b == b' ' || b == b'\t'
}
