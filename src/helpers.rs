use std::convert::TryFrom;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use httparse::Header;

use crate::constants;

/// Parses a raw header block, as returned by
/// [`read_header_block`](crate::buffer::StreamBuffer::read_header_block),
/// into a [`HeaderMap`].
///
/// Every line is trimmed before parsing, so LF line endings and indented
/// lines are accepted. Folded header lines are not supported.
pub(crate) fn parse_header_block(block: &[u8]) -> crate::Result<HeaderMap> {
    let mut normalized = Vec::with_capacity(block.len() + constants::CRLF.len() * 2);

    for line in block.split(|b| *b == constants::LF) {
        let line = line.trim_ascii();
        if line.is_empty() {
            continue;
        }

        normalized.extend_from_slice(line);
        normalized.extend_from_slice(constants::CRLF.as_bytes());
    }
    normalized.extend_from_slice(constants::CRLF.as_bytes());

    let mut headers = [httparse::EMPTY_HEADER; constants::MAX_HEADERS];

    match httparse::parse_headers(&normalized, &mut headers) {
        Ok(httparse::Status::Complete((_, raw_headers))) => convert_raw_headers_to_header_map(raw_headers),
        Ok(httparse::Status::Partial) => Err(crate::Error::IncompleteHeaders),
        Err(err) => Err(crate::Error::ReadHeaderFailed(err)),
    }
}

pub(crate) fn convert_raw_headers_to_header_map(raw_headers: &[Header]) -> crate::Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(raw_headers.len());

    for raw_header in raw_headers {
        let name = HeaderName::try_from(raw_header.name).map_err(|err| crate::Error::DecodeHeaderName {
            name: raw_header.name.to_owned(),
            cause: err.into(),
        })?;

        let value = HeaderValue::try_from(raw_header.value).map_err(|err| crate::Error::DecodeHeaderValue {
            value: raw_header.value.to_owned(),
            cause: err.into(),
        })?;

        headers.insert(name, value);
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header;

    #[test]
    fn test_parse_header_block_crlf() {
        let block = b"Content-Disposition: form-data; name=\"file\"; filename=\"data.txt\"\r\nContent-Type: text/plain\r\n\r\n";
        let headers = parse_header_block(block).unwrap();

        assert_eq!(headers.len(), 2);
        assert_eq!(
            headers.get(header::CONTENT_DISPOSITION).unwrap(),
            "form-data; name=\"file\"; filename=\"data.txt\""
        );
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "text/plain");
    }

    #[test]
    fn test_parse_header_block_lf_and_indentation() {
        let block = b"    Content-Disposition: form-data; name=\"text\"  \n\t Content-Type: text/plain\n   \n";
        let headers = parse_header_block(block).unwrap();

        assert_eq!(
            headers.get(header::CONTENT_DISPOSITION).unwrap(),
            "form-data; name=\"text\""
        );
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "text/plain");
    }

    #[test]
    fn test_parse_header_block_empty() {
        let headers = parse_header_block(b"\r\n").unwrap();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_parse_header_block_invalid() {
        let res = parse_header_block(b"not a header line\r\n\r\n");
        assert!(matches!(res, Err(crate::Error::ReadHeaderFailed(_))));
    }

    #[test]
    fn test_parse_header_block_too_many_headers() {
        let mut block = Vec::new();
        for i in 0..=constants::MAX_HEADERS {
            block.extend_from_slice(format!("X-Header-{}: {}\r\n", i, i).as_bytes());
        }
        block.extend_from_slice(b"\r\n");

        assert_eq!(
            parse_header_block(&block),
            Err(crate::Error::ReadHeaderFailed(httparse::Error::TooManyHeaders))
        );
    }
}
