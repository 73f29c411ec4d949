use std::fmt::{self, Debug, Display, Formatter};

use derive_more::Display;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A set of errors that can occur while parsing a multipart stream and in
/// other operations.
#[derive(Display)]
#[non_exhaustive]
pub enum Error {
    /// An unknown field is detected when multipart
    /// [`constraints`](crate::Constraints::allowed_fields) are added.
    #[display(fmt = "unknown field received: {}", "field_name.as_deref().unwrap_or(\"<unknown>\")")]
    UnknownField { field_name: Option<String> },

    /// The stream ended in the middle of a field's data.
    #[display(
        fmt = "field '{}' received with incomplete data",
        "field_name.as_deref().unwrap_or(\"<unknown>\")"
    )]
    IncompleteFieldData { field_name: Option<String> },

    /// The stream ended before the blank line closing a field's headers.
    #[display(fmt = "failed to read field complete headers")]
    IncompleteHeaders,

    /// A field's header block grew past the limit without a closing blank
    /// line.
    #[display(fmt = "field headers exceeded the maximum size limit: {} bytes", limit)]
    HeadersSizeExceeded { limit: usize },

    /// Failed to read headers.
    #[display(fmt = "failed to read headers: {}", _0)]
    ReadHeaderFailed(httparse::Error),

    /// Failed to decode the field's raw header name to
    /// [`HeaderName`](http::header::HeaderName) type.
    #[display(fmt = "failed to decode field's raw header name: {:?} {}", name, cause)]
    DecodeHeaderName { name: String, cause: BoxError },

    /// Failed to decode the field's raw header value to
    /// [`HeaderValue`](http::header::HeaderValue) type.
    #[display(fmt = "failed to decode field's raw header value: {}", cause)]
    DecodeHeaderValue { value: Vec<u8>, cause: BoxError },

    /// The stream ended before the terminal boundary was seen.
    #[display(fmt = "incomplete multipart stream")]
    IncompleteStream,

    /// A boundary was followed by something other than `--`, transport
    /// padding or a line break.
    ///
    /// This includes a line inside a field's data that starts with the
    /// boundary token and goes on with extra characters, e.g. `--boundaryX`.
    #[display(fmt = "malformed boundary line")]
    MalformedBoundaryLine,

    /// No boundary line was found while auto-detecting the boundary.
    #[display(fmt = "multipart boundary not found in the first {} bytes of the stream", limit)]
    BoundaryNotFound { limit: usize },

    /// The incoming field size exceeded the maximum limit.
    #[display(
        fmt = "field '{}' exceeded the maximum size limit: {} bytes",
        "field_name.as_deref().unwrap_or(\"<unknown>\")",
        limit
    )]
    FieldSizeExceeded { limit: u64, field_name: Option<String> },

    /// The incoming stream size exceeded the maximum limit.
    #[display(fmt = "stream size exceeded the maximum limit: {} bytes", limit)]
    StreamSizeExceeded { limit: u64 },

    /// Stream read failed.
    #[display(fmt = "stream read failed: {}", _0)]
    StreamReadFailed(BoxError),

    /// Creating, writing or closing a file sink failed.
    #[display(fmt = "file sink failed: {}", _0)]
    SinkFailed(std::io::Error),

    /// The `Content-Type` header is not `multipart/form-data`.
    #[display(fmt = "Content-Type is not multipart/form-data")]
    NoMultipart,

    /// Failed to convert the `Content-Type` to [`mime::Mime`] type.
    #[display(fmt = "Failed to convert Content-Type to `mime::Mime` type: {}", _0)]
    DecodeContentType(mime::FromStrError),

    /// No boundary found in `Content-Type` header.
    #[display(fmt = "multipart boundary not found in Content-Type")]
    NoBoundary,

    /// Failed to decode the field data as `JSON` in
    /// `field.json()` method, available with the `json` feature.
    #[display(fmt = "failed to decode field data as JSON: {}", _0)]
    DecodeJson(BoxError),
}

impl Error {
    /// Returns `true` if the stream ended before the terminal boundary, i.e.
    /// the upload was truncated.
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(self, Error::IncompleteStream | Error::IncompleteFieldData { .. })
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for Error {}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string().eq(&other.to_string())
    }
}

impl Eq for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::IncompleteFieldData {
            field_name: Some("file".to_owned()),
        };
        assert_eq!(err.to_string(), "field 'file' received with incomplete data");

        let err = Error::UnknownField { field_name: None };
        assert_eq!(err.to_string(), "unknown field received: <unknown>");

        let err = Error::BoundaryNotFound { limit: 16 };
        assert_eq!(
            err.to_string(),
            "multipart boundary not found in the first 16 bytes of the stream"
        );
    }

    #[test]
    fn test_unexpected_eof() {
        assert!(Error::IncompleteStream.is_unexpected_eof());
        assert!(Error::IncompleteFieldData { field_name: None }.is_unexpected_eof());
        assert!(!Error::IncompleteHeaders.is_unexpected_eof());
        assert!(!Error::BoundaryNotFound { limit: 1 }.is_unexpected_eof());
    }
}
