use std::io;

use futures_util::io::AsyncWrite;

use crate::Field;

/// Creates the writable sink each file part is streamed into.
///
/// The parser writes a file's body into the sink chunk by chunk as it is
/// scanned and closes the sink once the part ends. The sink is then handed
/// back inside a [`FilePart`](crate::FilePart); whatever storage backs it
/// (memory, a temporary file, ...) is the caller's to manage.
///
/// Any `FnMut(&Field) -> io::Result<W>` closure is a factory.
///
/// # Examples
///
/// ```
/// use multipart_form::{Config, Field, FormDataParser};
/// use bytes::Bytes;
/// use futures_util::io::Cursor;
/// use std::convert::Infallible;
/// use futures_util::stream::once;
///
/// fn in_memory(_field: &Field<'_, '_>) -> std::io::Result<Cursor<Vec<u8>>> {
///     Ok(Cursor::new(Vec::new()))
/// }
///
/// # async fn run() {
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
/// let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
///
/// let parser = FormDataParser::new(stream, Config::new().boundary("X-BOUNDARY"));
/// let form = parser.parse(in_memory).await.unwrap();
///
/// assert_eq!(form.file("file").unwrap().data().get_ref(), b"abcd");
/// # }
/// # tokio::runtime::Runtime::new().unwrap().block_on(run());
/// ```
pub trait SinkFactory {
    /// The sink type handed out for every file part.
    type Sink: AsyncWrite + Unpin;

    /// Creates the sink for `field`, whose headers have been read but whose
    /// body has not.
    fn create_sink(&mut self, field: &Field<'_, '_>) -> io::Result<Self::Sink>;
}

/// Keeps every file in memory as a `Vec<u8>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemorySink;

impl SinkFactory for MemorySink {
    type Sink = Vec<u8>;

    fn create_sink(&mut self, _field: &Field<'_, '_>) -> io::Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

impl<F, W> SinkFactory for F
where
    F: FnMut(&Field<'_, '_>) -> io::Result<W>,
    W: AsyncWrite + Unpin,
{
    type Sink = W;

    fn create_sink(&mut self, field: &Field<'_, '_>) -> io::Result<W> {
        self(field)
    }
}
