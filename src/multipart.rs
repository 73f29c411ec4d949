use bytes::Bytes;
use futures_util::future::poll_fn;
use futures_util::stream::{Stream, TryStreamExt};
#[cfg(feature = "tokio-io")]
use tokio::io::AsyncRead;
#[cfg(feature = "tokio-io")]
use tokio_util::io::ReaderStream;

use crate::config::Config;
use crate::state::MultipartState;
use crate::Field;

/// Represents the implementation of `multipart/form-data` formatted data.
///
/// This will parse the source stream into [`Field`] instances via
/// [`next_field`](Multipart::next_field). A [`Field`] borrows the
/// `Multipart` it came from, so only one field is read at a time; whatever a
/// field leaves unread is skipped when the next one is requested.
///
/// The boundary can be given up front or detected from the body itself, see
/// [`Config::boundary`].
///
/// # Examples
///
/// ```
/// use multipart_form::Multipart;
/// use bytes::Bytes;
/// use std::convert::Infallible;
/// use futures_util::stream::once;
///
/// # async fn run() {
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
/// let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
/// let mut multipart = Multipart::new(stream, "X-BOUNDARY");
///
/// while let Some(field) = multipart.next_field().await.unwrap() {
///     println!("Field: {:?}", field.text().await)
/// }
/// # }
/// # tokio::runtime::Runtime::new().unwrap().block_on(run());
/// ```
#[derive(Debug)]
pub struct Multipart<'r> {
    state: MultipartState<'r>,
}

impl<'r> Multipart<'r> {
    /// Construct a new `Multipart` instance with the given [`Bytes`] stream and the boundary.
    pub fn new<S, O, E, B>(stream: S, boundary: B) -> Multipart<'r>
    where
        S: Stream<Item = Result<O, E>> + Send + 'r,
        O: Into<Bytes> + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
        B: Into<String>,
    {
        Multipart::with_config(stream, Config::new().boundary(boundary))
    }

    /// Construct a new `Multipart` instance with the given [`Bytes`] stream and [`Config`].
    ///
    /// # Examples
    ///
    /// ```
    /// use multipart_form::{Config, Multipart};
    /// use bytes::Bytes;
    /// use std::convert::Infallible;
    /// use futures_util::stream::once;
    ///
    /// # async fn run() {
    /// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
    /// let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
    ///
    /// // No boundary given, it is read from the body.
    /// let mut multipart = Multipart::with_config(stream, Config::new().buffer_size(4));
    ///
    /// let field = multipart.next_field().await.unwrap().unwrap();
    /// assert_eq!(field.text().await.unwrap(), "abcd");
    /// assert_eq!(multipart.boundary(), Some("X-BOUNDARY"));
    /// # }
    /// # tokio::runtime::Runtime::new().unwrap().block_on(run());
    /// ```
    pub fn with_config<S, O, E>(stream: S, config: Config) -> Multipart<'r>
    where
        S: Stream<Item = Result<O, E>> + Send + 'r,
        O: Into<Bytes> + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    {
        let stream = stream
            .map_ok(|b| b.into())
            .map_err(|err| crate::Error::StreamReadFailed(err.into()));

        Multipart {
            state: MultipartState::new(Box::pin(stream), config),
        }
    }

    /// Construct a new `Multipart` instance with the given [`AsyncRead`] reader and the boundary.
    ///
    /// # Optional
    ///
    /// This requires the optional `tokio-io` feature to be enabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use multipart_form::Multipart;
    ///
    /// # async fn run() {
    /// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
    /// let reader = data.as_bytes();
    /// let mut multipart = Multipart::with_reader(reader, "X-BOUNDARY");
    ///
    /// while let Some(mut field) = multipart.next_field().await.unwrap() {
    ///     while let Some(chunk) = field.chunk().await.unwrap() {
    ///         println!("Chunk: {:?}", chunk);
    ///     }
    /// }
    /// # }
    /// # tokio::runtime::Runtime::new().unwrap().block_on(run());
    /// ```
    #[cfg(feature = "tokio-io")]
    #[cfg_attr(nightly, doc(cfg(feature = "tokio-io")))]
    pub fn with_reader<R, B>(reader: R, boundary: B) -> Multipart<'r>
    where
        R: AsyncRead + Send + 'r,
        B: Into<String>,
    {
        Multipart::with_reader_config(reader, Config::new().boundary(boundary))
    }

    /// Construct a new `Multipart` instance with the given [`AsyncRead`] reader and [`Config`].
    ///
    /// The reader is read `buffer_size` bytes at a time.
    ///
    /// # Optional
    ///
    /// This requires the optional `tokio-io` feature to be enabled.
    #[cfg(feature = "tokio-io")]
    #[cfg_attr(nightly, doc(cfg(feature = "tokio-io")))]
    pub fn with_reader_config<R>(reader: R, config: Config) -> Multipart<'r>
    where
        R: AsyncRead + Send + 'r,
    {
        let stream = ReaderStream::with_capacity(reader, config.buffer_size);
        Multipart::with_config(stream, config)
    }

    /// Yields the next [`Field`] if available.
    ///
    /// Returns `Ok(None)` after the terminal boundary. Unread data of the
    /// previous field is skipped first.
    pub async fn next_field(&mut self) -> crate::Result<Option<Field<'_, 'r>>> {
        let head = poll_fn(|cx| self.state.poll_next_field(cx)).await?;
        Ok(head.map(move |head| Field::new(&mut self.state, head)))
    }

    /// Yields the next [`Field`] with their positioning index as a tuple `(usize, Field)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use multipart_form::Multipart;
    /// use bytes::Bytes;
    /// use std::convert::Infallible;
    /// use futures_util::stream::once;
    ///
    /// # async fn run() {
    /// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
    /// let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
    /// let mut multipart = Multipart::new(stream, "X-BOUNDARY");
    ///
    /// while let Some((idx, field)) = multipart.next_field_with_idx().await.unwrap() {
    ///     println!("Index: {:?}, Content: {:?}", idx, field.text().await)
    /// }
    /// # }
    /// # tokio::runtime::Runtime::new().unwrap().block_on(run());
    /// ```
    pub async fn next_field_with_idx(&mut self) -> crate::Result<Option<(usize, Field<'_, 'r>)>> {
        self.next_field().await.map(|f| f.map(|field| (field.index(), field)))
    }

    /// The boundary token in use, once it is known.
    ///
    /// With auto-detection this is `None` until the first call to
    /// [`next_field`](Multipart::next_field) has read the boundary line.
    pub fn boundary(&self) -> Option<&str> {
        self.state.boundary.as_ref().map(|boundary| boundary.token())
    }
}
