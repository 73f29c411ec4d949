use bytes::Bytes;
use encoding_rs::Encoding;
use futures_util::io::{AsyncWrite, AsyncWriteExt};
use futures_util::stream::Stream;
#[cfg(feature = "tokio-io")]
use tokio::io::AsyncRead;

use crate::config::Config;
use crate::content_disposition::PartKind;
use crate::form_data::{FilePart, FormData, ParameterPart};
use crate::sink::{MemorySink, SinkFactory};
use crate::{Field, Multipart};

/// Parses a whole `multipart/form-data` body into a [`FormData`] in a single
/// pass.
///
/// Parameters are collected and decoded with the configured encoding. Files
/// are written to sinks from a [`SinkFactory`] while they are scanned, so
/// their content is never buffered as a whole.
///
/// # Examples
///
/// ```
/// use multipart_form::{Config, FormDataParser, MemorySink};
/// use bytes::Bytes;
/// use std::convert::Infallible;
/// use futures_util::stream::iter;
///
/// # async fn run() {
/// let data = "--boundry\nContent-Disposition: form-data; name=\"text\"\n\ntextdata\n--boundry\nContent-Disposition: form-data; name=\"file\"; filename=\"data.txt\"\n\ntiny\n--boundry--";
/// let chunks = data.as_bytes().chunks(5).map(|c| Result::<Bytes, Infallible>::Ok(Bytes::copy_from_slice(c)));
/// let stream = iter(chunks.collect::<Vec<_>>());
///
/// let form = FormDataParser::new(stream, Config::new()).parse(MemorySink).await.unwrap();
///
/// assert_eq!(form.parameter("text").unwrap().data(), "textdata");
/// assert_eq!(form.file("file").unwrap().file_name(), "data.txt");
/// assert_eq!(form.file("file").unwrap().data(), b"tiny");
/// # }
/// # tokio::runtime::Runtime::new().unwrap().block_on(run());
/// ```
#[derive(Debug)]
pub struct FormDataParser<'r> {
    multipart: Multipart<'r>,
    encoding: &'static Encoding,
}

impl<'r> FormDataParser<'r> {
    /// Creates a parser over the given [`Bytes`] stream.
    pub fn new<S, O, E>(stream: S, config: Config) -> FormDataParser<'r>
    where
        S: Stream<Item = Result<O, E>> + Send + 'r,
        O: Into<Bytes> + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    {
        let encoding = config.encoding;

        FormDataParser {
            multipart: Multipart::with_config(stream, config),
            encoding,
        }
    }

    /// Creates a parser over the given [`AsyncRead`] reader.
    ///
    /// # Optional
    ///
    /// This requires the optional `tokio-io` feature to be enabled.
    #[cfg(feature = "tokio-io")]
    #[cfg_attr(nightly, doc(cfg(feature = "tokio-io")))]
    pub fn with_reader<R>(reader: R, config: Config) -> FormDataParser<'r>
    where
        R: AsyncRead + Send + 'r,
    {
        let encoding = config.encoding;

        FormDataParser {
            multipart: Multipart::with_reader_config(reader, config),
            encoding,
        }
    }

    /// Reads the body up to its terminal boundary.
    ///
    /// Parts without a field name are skipped. On error every sink opened so
    /// far has been closed and the partial result is dropped.
    ///
    /// Dropping the returned future (e.g. on a timeout) drops the sink of the
    /// file being read without calling `poll_close` on it.
    pub async fn parse<F: SinkFactory>(mut self, mut sinks: F) -> crate::Result<FormData<F::Sink>> {
        let mut form = FormData::new();

        while let Some(field) = self.multipart.next_field().await? {
            let name = match field.name() {
                Some(name) => name.to_owned(),
                None => {
                    warn!("skipping field {} without a name", field.index());
                    continue;
                }
            };

            match field.kind() {
                PartKind::Parameter => {
                    let data = field.text_with_encoding(self.encoding).await?;

                    if let Some(_prev) = form.insert_parameter(ParameterPart::new(name, data)) {
                        debug!("parameter {:?} overwritten by a later field", _prev.name());
                    }
                }
                PartKind::File => {
                    let file_name = field.file_name().unwrap_or_default().to_owned();
                    let content_type = field.content_type().cloned();

                    let mut sink = sinks.create_sink(&field).map_err(crate::Error::SinkFailed)?;

                    if let Err(err) = write_to_sink(field, &mut sink).await {
                        // `err` takes precedence over a failing close.
                        let _ = sink.close().await;
                        return Err(err);
                    }

                    sink.close().await.map_err(crate::Error::SinkFailed)?;

                    if let Some(_prev) = form.insert_file(FilePart::new(name, file_name, content_type, sink)) {
                        debug!("file {:?} overwritten by a later field", _prev.name());
                    }
                }
            }
        }

        debug!("parsed {} parameters and {} files", form.parameters().len(), form.files().len());

        Ok(form)
    }
}

async fn write_to_sink<W>(mut field: Field<'_, '_>, sink: &mut W) -> crate::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(chunk) = field.chunk().await? {
        sink.write_all(&chunk).await.map_err(crate::Error::SinkFailed)?;
    }

    Ok(())
}

/// Parses a whole body, keeping files in memory.
///
/// Shorthand for `FormDataParser::new(stream, config).parse(MemorySink)`.
pub async fn parse_form_data<'r, S, O, E>(stream: S, config: Config) -> crate::Result<FormData<Vec<u8>>>
where
    S: Stream<Item = Result<O, E>> + Send + 'r,
    O: Into<Bytes> + 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    FormDataParser::new(stream, config).parse(MemorySink).await
}
