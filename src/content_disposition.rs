use http::header::{self, HeaderMap};

/// The two kinds of parts a `multipart/form-data` body carries.
///
/// A part is a [`File`](PartKind::File) exactly when its `Content-Disposition`
/// header has a `filename` parameter, even an empty one. Nothing else, such as
/// the `Content-Type`, changes the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    /// A named scalar value.
    Parameter,
    /// A named upload with a file name and a byte stream.
    File,
}

pub(crate) struct ContentDisposition {
    pub(crate) field_name: Option<String>,
    pub(crate) file_name: Option<String>,
}

impl ContentDisposition {
    pub fn parse(headers: &HeaderMap) -> ContentDisposition {
        let content_disposition = headers
            .get(header::CONTENT_DISPOSITION)
            .and_then(|val| std::str::from_utf8(val.as_bytes()).ok());

        let mut field_name = None;
        let mut file_name = None;

        if let Some(value) = content_disposition {
            for (key, val) in DispositionParams::new(value) {
                if key.eq_ignore_ascii_case("name") {
                    field_name = Some(val);
                } else if key.eq_ignore_ascii_case("filename") {
                    file_name = Some(val);
                }
            }
        }

        ContentDisposition { field_name, file_name }
    }

    pub fn kind(&self) -> PartKind {
        if self.file_name.is_some() {
            PartKind::File
        } else {
            PartKind::Parameter
        }
    }
}

/// Iterates over the `key=value` parameters that follow the disposition type,
/// e.g. `form-data; name="a"; filename="b.txt"`.
struct DispositionParams<'a> {
    rest: &'a str,
}

impl<'a> DispositionParams<'a> {
    fn new(value: &'a str) -> Self {
        // skip the disposition type.
        let rest = value.find(';').map(|idx| &value[idx + 1..]).unwrap_or("");
        DispositionParams { rest }
    }
}

impl<'a> Iterator for DispositionParams<'a> {
    type Item = (&'a str, String);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let input = self.rest.trim_start_matches(|c: char| c == ';' || c.is_ascii_whitespace());
            if input.is_empty() {
                return None;
            }

            let key_end = input.find(|c: char| c == '=' || c == ';').unwrap_or(input.len());
            let key = input[..key_end].trim();

            if !input[key_end..].starts_with('=') {
                // a parameter without a value.
                self.rest = &input[key_end..];
                continue;
            }

            let after_eq = input[key_end + 1..].trim_start();

            let (value, rest) = if let Some(quoted) = after_eq.strip_prefix('"') {
                parse_quoted(quoted)
            } else {
                let end = after_eq.find(';').unwrap_or(after_eq.len());
                (after_eq[..end].trim_end().to_owned(), &after_eq[end..])
            };

            self.rest = rest;
            return Some((key, value));
        }
    }
}

/// Reads a quoted string whose opening quote is already stripped, returning
/// the unescaped value and the input after the closing quote.
fn parse_quoted(input: &str) -> (String, &str) {
    let mut value = String::new();
    let mut chars = input.char_indices();

    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => return (value, &input[idx + 1..]),
            '\\' => match chars.next() {
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            c => value.push(c),
        }
    }

    // unterminated, take everything.
    (value, "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::HeaderValue;

    fn parse(value: &str) -> ContentDisposition {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_bytes(value.as_bytes()).unwrap(),
        );
        ContentDisposition::parse(&headers)
    }

    #[test]
    fn test_content_disposition_field_name() {
        let cd = parse(r#"form-data; name="my_field""#);
        assert_eq!(cd.field_name.as_deref(), Some("my_field"));
        assert_eq!(cd.file_name, None);

        let cd = parse(r#"form-data; name="my field""#);
        assert_eq!(cd.field_name.as_deref(), Some("my field"));

        let cd = parse(r#"form-data; name="my_field"; filename="file abc.txt""#);
        assert_eq!(cd.field_name.as_deref(), Some("my_field"));

        let cd = parse("form-data; name=\"你好\"; filename=\"file abc.txt\"");
        assert_eq!(cd.field_name.as_deref(), Some("你好"));

        let cd = parse("form-data; name=\"কখগ\"; filename=\"你好.txt\"");
        assert_eq!(cd.field_name.as_deref(), Some("কখগ"));

        let cd = parse("form-data; name=bare_token");
        assert_eq!(cd.field_name.as_deref(), Some("bare_token"));
    }

    #[test]
    fn test_content_disposition_file_name() {
        let cd = parse(r#"form-data; name="my_field"; filename="file_name.txt""#);
        assert_eq!(cd.file_name.as_deref(), Some("file_name.txt"));

        let cd = parse(r#"form-data; name="my_field"; filename="file name.txt""#);
        assert_eq!(cd.file_name.as_deref(), Some("file name.txt"));

        let cd = parse(r#"form-data; filename="file-name.txt""#);
        assert_eq!(cd.file_name.as_deref(), Some("file-name.txt"));
        assert_eq!(cd.field_name, None);

        let cd = parse("form-data; filename=\"কখগ-你好.txt\"");
        assert_eq!(cd.file_name.as_deref(), Some("কখগ-你好.txt"));
    }

    #[test]
    fn test_content_disposition_param_order_and_case() {
        let cd = parse(r#"form-data; filename="a.txt"; NAME="upload""#);
        assert_eq!(cd.field_name.as_deref(), Some("upload"));
        assert_eq!(cd.file_name.as_deref(), Some("a.txt"));
    }

    #[test]
    fn test_content_disposition_quoted_specials() {
        let cd = parse(r#"form-data; name="a;b"; filename="say \"hi\".txt""#);
        assert_eq!(cd.field_name.as_deref(), Some("a;b"));
        assert_eq!(cd.file_name.as_deref(), Some(r#"say "hi".txt"#));
    }

    #[test]
    fn test_content_disposition_missing() {
        let cd = ContentDisposition::parse(&HeaderMap::new());
        assert_eq!(cd.field_name, None);
        assert_eq!(cd.file_name, None);
        assert_eq!(cd.kind(), PartKind::Parameter);
    }

    #[test]
    fn test_part_kind() {
        assert_eq!(parse(r#"form-data; name="text""#).kind(), PartKind::Parameter);
        assert_eq!(
            parse(r#"form-data; name="file"; filename="data.txt""#).kind(),
            PartKind::File
        );
        assert_eq!(parse(r#"form-data; name="file"; filename="""#).kind(), PartKind::File);
    }
}
