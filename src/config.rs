use encoding_rs::{Encoding, UTF_8};

use crate::constants;
use crate::constraints::Constraints;

/// Settings for one parse.
///
/// # Examples
///
/// ```
/// use multipart_form::{Config, Constraints, SizeLimit};
///
/// let config = Config::new()
///     .boundary("X-BOUNDARY")
///     .encoding(encoding_rs::WINDOWS_1252)
///     .buffer_size(16 * 1024)
///     .constraints(Constraints::new().size_limit(SizeLimit::new().per_field(1024 * 1024)));
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) boundary: Option<String>,
    pub(crate) encoding: &'static Encoding,
    pub(crate) buffer_size: usize,
    pub(crate) boundary_scan_limit: usize,
    pub(crate) constraints: Constraints,
}

impl Config {
    /// Creates a config that auto-detects the boundary, decodes text as UTF-8
    /// and reads the source 4 KiB at a time.
    pub fn new() -> Config {
        Config::default()
    }

    /// Sets the boundary token, as found in the `Content-Type` header (without
    /// the leading `--`).
    ///
    /// When unset or empty, the boundary is detected from the first line of the
    /// body that starts with `--`.
    pub fn boundary<B: Into<String>>(mut self, boundary: B) -> Config {
        self.boundary = Some(boundary.into());
        self
    }

    /// Sets the encoding used to decode parameter values.
    pub fn encoding(mut self, encoding: &'static Encoding) -> Config {
        self.encoding = encoding;
        self
    }

    /// Sets the largest number of bytes taken from the source at a time. A
    /// size of `0` is treated as `1`.
    pub fn buffer_size(mut self, buffer_size: usize) -> Config {
        self.buffer_size = buffer_size.max(1);
        self
    }

    /// Sets how many bytes boundary detection may look at before giving up.
    pub fn boundary_scan_limit(mut self, limit: usize) -> Config {
        self.boundary_scan_limit = limit;
        self
    }

    /// Sets the [`Constraints`] applied while parsing.
    pub fn constraints(mut self, constraints: Constraints) -> Config {
        self.constraints = constraints;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            boundary: None,
            encoding: UTF_8,
            buffer_size: constants::DEFAULT_BUFFER_SIZE,
            boundary_scan_limit: constants::DEFAULT_BOUNDARY_SCAN_LIMIT,
            constraints: Constraints::default(),
        }
    }
}
