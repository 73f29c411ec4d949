use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use encoding_rs::{Encoding, UTF_8};
use futures_util::stream::{Stream, TryStreamExt};
use http::header::{self, HeaderMap};
#[cfg(feature = "json")]
use serde::de::DeserializeOwned;

use crate::content_disposition::PartKind;
use crate::state::{FieldHead, MultipartState};

/// A single field in a multipart stream.
///
/// Its body can be read by chunks via [`chunk`](Field::chunk) or through its
/// [`Stream`] implementation, or all at once via [`bytes`](Field::bytes),
/// [`text`](Field::text) and friends.
///
/// A `Field` mutably borrows the [`Multipart`](crate::Multipart) it was
/// yielded from; drop it (or read it to the end) before asking for the next
/// one.
///
/// # Examples
///
/// ```
/// use multipart_form::{Multipart, PartKind};
/// use bytes::Bytes;
/// use std::convert::Infallible;
/// use futures_util::stream::once;
///
/// # async fn run() {
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"avatar\"; filename=\"a.png\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
/// let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
/// let mut multipart = Multipart::new(stream, "X-BOUNDARY");
///
/// while let Some(mut field) = multipart.next_field().await.unwrap() {
///     assert_eq!(field.kind(), PartKind::File);
///     assert_eq!(field.file_name(), Some("a.png"));
///
///     while let Some(chunk) = field.chunk().await.unwrap() {
///         println!("Chunk: {:?}", chunk);
///     }
/// }
/// # }
/// # tokio::runtime::Runtime::new().unwrap().block_on(run());
/// ```
#[derive(Debug)]
pub struct Field<'m, 'r> {
    state: &'m mut MultipartState<'r>,
    headers: HeaderMap,
    meta: FieldMeta,
}

#[derive(Debug)]
struct FieldMeta {
    name: Option<String>,
    file_name: Option<String>,
    content_type: Option<mime::Mime>,
    kind: PartKind,
    idx: usize,
}

impl<'m, 'r> Field<'m, 'r> {
    pub(crate) fn new(state: &'m mut MultipartState<'r>, head: FieldHead) -> Self {
        let content_type = Self::parse_content_type(&head.headers);
        let kind = head.content_disposition.kind();

        Field {
            state,
            headers: head.headers,
            meta: FieldMeta {
                name: head.content_disposition.field_name,
                file_name: head.content_disposition.file_name,
                content_type,
                kind,
                idx: head.idx,
            },
        }
    }

    fn parse_content_type(headers: &HeaderMap) -> Option<mime::Mime> {
        headers
            .get(header::CONTENT_TYPE)
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<mime::Mime>().ok())
    }

    /// The field name found in the
    /// [`Content-Disposition`](https://developer.mozilla.org/en-US/docs/Web/HTTP/Headers/Content-Disposition)
    /// header.
    pub fn name(&self) -> Option<&str> {
        self.meta.name.as_deref()
    }

    /// The file name found in the
    /// [`Content-Disposition`](https://developer.mozilla.org/en-US/docs/Web/HTTP/Headers/Content-Disposition)
    /// header.
    pub fn file_name(&self) -> Option<&str> {
        self.meta.file_name.as_deref()
    }

    /// Whether this field is a parameter or a file.
    pub fn kind(&self) -> PartKind {
        self.meta.kind
    }

    /// Get the content type of the field.
    pub fn content_type(&self) -> Option<&mime::Mime> {
        self.meta.content_type.as_ref()
    }

    /// Get a map of headers as [`HeaderMap`].
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The index of this field in order of appearance in the stream.
    pub fn index(&self) -> usize {
        self.meta.idx
    }

    /// Get the full data of the field as [`Bytes`].
    pub async fn bytes(mut self) -> crate::Result<Bytes> {
        let mut buf = BytesMut::new();

        while let Some(bytes) = self.chunk().await? {
            buf.extend_from_slice(&bytes);
        }

        Ok(buf.freeze())
    }

    /// Stream a chunk of the field data.
    ///
    /// When the field data has been exhausted, this will return `None`.
    pub async fn chunk(&mut self) -> crate::Result<Option<Bytes>> {
        self.try_next().await
    }

    /// Try to deserialize the field data as JSON.
    ///
    /// # Optional
    ///
    /// This requires the optional `json` feature to be enabled.
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    pub async fn json<T: DeserializeOwned>(self) -> crate::Result<T> {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| crate::Error::DecodeJson(err.into()))
    }

    /// Get the full field data as text.
    ///
    /// The `charset` parameter of the field's `Content-Type` is honoured;
    /// without one the data is decoded with the encoding from
    /// [`Config::encoding`](crate::Config::encoding), UTF-8 by default.
    pub async fn text(self) -> crate::Result<String> {
        let encoding = self.charset().unwrap_or(self.state.encoding);
        self.text_with_encoding(encoding).await
    }

    /// Get the full field data as text given a specific encoding label.
    ///
    /// The `charset` parameter of the field's `Content-Type` still takes
    /// precedence. Unknown labels fall back to UTF-8.
    pub async fn text_with_charset(self, default_encoding: &str) -> crate::Result<String> {
        let encoding = self
            .charset()
            .or_else(|| Encoding::for_label(default_encoding.as_bytes()))
            .unwrap_or(UTF_8);

        self.text_with_encoding(encoding).await
    }

    /// Get the full field data decoded with exactly `encoding`, ignoring any
    /// `charset` the field declares.
    pub async fn text_with_encoding(self, encoding: &'static Encoding) -> crate::Result<String> {
        let bytes = self.bytes().await?;

        let (text, _, _) = encoding.decode(&bytes);

        Ok(text.into_owned())
    }

    fn charset(&self) -> Option<&'static Encoding> {
        self.content_type()
            .and_then(|mime| mime.get_param(mime::CHARSET))
            .and_then(|charset| Encoding::for_label(charset.as_str().as_bytes()))
    }
}

impl Stream for Field<'_, '_> {
    type Item = crate::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().state.poll_field_chunk(cx).map(|res| res.transpose())
    }
}
