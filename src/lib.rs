//! A streaming parser for `multipart/form-data` bodies.
//!
//! It splits a body into its parts without buffering it as a whole, across
//! read chunks of any size, and sorts every part into either a named
//! parameter or a named file.
//!
//! Two levels of API are offered:
//!
//! * [`Multipart`] yields one [`Field`] at a time, and each field's data can be
//!   read chunk by chunk.
//! * [`FormDataParser`] drives a [`Multipart`] to the end and returns a
//!   [`FormData`]: parameters decoded to text, files written to the sinks of a
//!   [`SinkFactory`].
//!
//! The boundary may be passed in (see [`parse_boundary`] to get it from a
//! `Content-Type` header) or detected from the body itself.
//!
//! # Examples
//!
//! ```
//! use multipart_form::{parse_form_data, Config};
//! use bytes::Bytes;
//! use std::convert::Infallible;
//! use futures_util::stream::once;
//!
//! # async fn run() {
//! let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_file_field\"; filename=\"a-text-file.txt\"\r\nContent-Type: text/plain\r\n\r\nHello world\r\n--X-BOUNDARY--\r\n";
//! let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
//!
//! let form = parse_form_data(stream, Config::new().boundary("X-BOUNDARY")).await.unwrap();
//!
//! assert_eq!(form.parameter("my_text_field").unwrap().data(), "abcd");
//!
//! let file = form.file("my_file_field").unwrap();
//! assert_eq!(file.file_name(), "a-text-file.txt");
//! assert_eq!(file.data(), b"Hello world");
//! # }
//! # tokio::runtime::Runtime::new().unwrap().block_on(run());
//! ```
//!
//! # Features
//!
//! * `tokio-io`: read from a tokio [`AsyncRead`](tokio::io::AsyncRead).
//! * `json`: deserialize a field with [`Field::json`].
//! * `log`: emit `log` records while parsing.

#![cfg_attr(nightly, feature(doc_cfg))]

pub use bytes;
pub use config::Config;
pub use constraints::Constraints;
pub use content_disposition::PartKind;
pub use error::Error;
pub use field::Field;
pub use form_data::{FilePart, FormData, ParameterPart};
pub use multipart::Multipart;
pub use parser::{parse_form_data, FormDataParser};
pub use sink::{MemorySink, SinkFactory};
pub use size_limit::SizeLimit;

#[cfg(feature = "log")]
macro_rules! trace {
    ($($t:tt)*) => (::log::trace!($($t)*));
}

#[cfg(not(feature = "log"))]
macro_rules! trace {
    ($($t:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! debug {
    ($($t:tt)*) => (::log::debug!($($t)*));
}

#[cfg(not(feature = "log"))]
macro_rules! debug {
    ($($t:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! warn {
    ($($t:tt)*) => (::log::warn!($($t)*));
}

#[cfg(not(feature = "log"))]
macro_rules! warn {
    ($($t:tt)*) => {};
}

mod boundary;
mod buffer;
mod config;
mod constants;
mod constraints;
mod content_disposition;
mod error;
mod field;
mod form_data;
mod helpers;
mod multipart;
mod parser;
mod sink;
mod size_limit;
mod state;

/// A Result type often returned from methods that can have `multipart-form` errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Parses the `Content-Type` header to extract the boundary value.
///
/// # Examples
///
/// ```
/// let content_type = "multipart/form-data; boundary=ABCDEFG";
///
/// assert_eq!(multipart_form::parse_boundary(content_type), Ok("ABCDEFG".to_owned()));
/// ```
pub fn parse_boundary<T: AsRef<str>>(content_type: T) -> Result<String> {
    let m = content_type
        .as_ref()
        .parse::<mime::Mime>()
        .map_err(Error::DecodeContentType)?;

    if !(m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA) {
        return Err(Error::NoMultipart);
    }

    m.get_param(mime::BOUNDARY)
        .map(|name| name.as_str().to_owned())
        .ok_or(Error::NoBoundary)
}
