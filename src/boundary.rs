use crate::constants;
use memchr::memmem;

/// A boundary token as it appears on the wire, with the scanner that looks
/// for it inside field data.
#[derive(Debug)]
pub(crate) struct Boundary {
    token: String,
    dash_boundary: Vec<u8>,
    scanner: BoundaryScanner,
}

impl Boundary {
    /// Returns `None` for an empty token.
    pub(crate) fn new(token: &str) -> Option<Boundary> {
        if token.is_empty() {
            return None;
        }

        let dash_boundary = format!("{}{}", constants::BOUNDARY_EXT, token).into_bytes();

        let mut delimiter = Vec::with_capacity(dash_boundary.len() + 1);
        delimiter.push(constants::LF);
        delimiter.extend_from_slice(&dash_boundary);

        Some(Boundary {
            token: token.to_owned(),
            dash_boundary,
            scanner: BoundaryScanner::new(delimiter),
        })
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    /// `--` followed by the token.
    pub(crate) fn dash_boundary(&self) -> &[u8] {
        &self.dash_boundary
    }

    pub(crate) fn scanner(&self) -> &BoundaryScanner {
        &self.scanner
    }
}

/// Outcome of scanning a buffer for the delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scan {
    /// The delimiter starts at `delim_start` (the index of its LF). Field data
    /// ends at `data_end`, which excludes a CR right before the LF.
    Found { data_end: usize, delim_start: usize },
    /// No delimiter yet. The first `safe` bytes can never be part of one; the
    /// rest may turn into a delimiter once more bytes arrive.
    Partial { safe: usize },
}

/// Searches for `LF "--" boundary` in a buffer that is refilled piece by
/// piece.
///
/// A full match is located with `memmem`. When there is none, the longest
/// suffix of the buffer that is a proper prefix of the delimiter is computed
/// with a KMP automaton; those bytes (plus a CR in front of them) are held
/// back, so a delimiter split across any number of refills is still seen.
#[derive(Debug)]
pub(crate) struct BoundaryScanner {
    delimiter: Vec<u8>,
    failure: Vec<usize>,
    finder: memmem::Finder<'static>,
}

impl BoundaryScanner {
    pub(crate) fn new(delimiter: Vec<u8>) -> BoundaryScanner {
        let failure = failure_table(&delimiter);
        let finder = memmem::Finder::new(&delimiter).into_owned();

        BoundaryScanner {
            delimiter,
            failure,
            finder,
        }
    }

    #[cfg(test)]
    pub(crate) fn delimiter(&self) -> &[u8] {
        &self.delimiter
    }

    pub(crate) fn scan(&self, buf: &[u8]) -> Scan {
        if let Some(idx) = self.finder.find(buf) {
            let data_end = if idx > 0 && buf[idx - 1] == constants::CR {
                idx - 1
            } else {
                idx
            };

            return Scan::Found {
                data_end,
                delim_start: idx,
            };
        }

        let mut safe = buf.len() - self.pending_prefix_len(buf);

        // The CR may belong to a CRLF that precedes the delimiter.
        if safe > 0 && buf[safe - 1] == constants::CR {
            safe -= 1;
        }

        Scan::Partial { safe }
    }

    /// Length of the longest suffix of `buf` that is a proper prefix of the
    /// delimiter.
    fn pending_prefix_len(&self, buf: &[u8]) -> usize {
        let tail_start = buf.len().saturating_sub(self.delimiter.len() - 1);
        let mut matched = 0;

        for &b in &buf[tail_start..] {
            while matched > 0 && self.delimiter[matched] != b {
                matched = self.failure[matched - 1];
            }

            if self.delimiter[matched] == b {
                matched += 1;
            }
        }

        matched
    }
}

fn failure_table(pattern: &[u8]) -> Vec<usize> {
    let mut table = vec![0; pattern.len()];
    let mut k = 0;

    for i in 1..pattern.len() {
        while k > 0 && pattern[i] != pattern[k] {
            k = table[k - 1];
        }

        if pattern[i] == pattern[k] {
            k += 1;
        }

        table[i] = k;
    }

    table
}

/// Outcome of looking for the boundary line at the start of a stream.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Detection {
    Found(String),
    NeedMore,
    NotFound,
}

/// Finds the first complete line within `limit` bytes that starts with `--`
/// and takes the rest of it, without trailing padding and line break, as the
/// boundary token.
///
/// Nothing is consumed from the buffer, but complete lines already looked at
/// are skipped on the next call, so the buffer must only grow in between.
#[derive(Debug)]
pub(crate) struct BoundaryDetector {
    limit: usize,
    line_start: usize,
}

impl BoundaryDetector {
    pub(crate) fn new(limit: usize) -> BoundaryDetector {
        BoundaryDetector { limit, line_start: 0 }
    }

    pub(crate) fn limit(&self) -> usize {
        self.limit
    }

    pub(crate) fn detect(&mut self, buf: &[u8]) -> Detection {
        let window = &buf[..buf.len().min(self.limit)];

        while let Some(len) = window.get(self.line_start..).and_then(|rest| memchr::memchr(constants::LF, rest)) {
            let line = &window[self.line_start..self.line_start + len];
            self.line_start += len + 1;

            let token = match line.strip_prefix(constants::BOUNDARY_EXT.as_bytes()) {
                Some(rest) => rest.trim_ascii_end(),
                None => continue,
            };

            if token.is_empty() {
                continue;
            }

            if let Ok(token) = std::str::from_utf8(token) {
                return Detection::Found(token.to_owned());
            }
        }

        if buf.len() >= self.limit {
            Detection::NotFound
        } else {
            Detection::NeedMore
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner(token: &str) -> Boundary {
        Boundary::new(token).unwrap()
    }

    #[test]
    fn test_boundary_new() {
        let boundary = scanner("X-BOUNDARY");
        assert_eq!(boundary.token(), "X-BOUNDARY");
        assert_eq!(boundary.dash_boundary(), b"--X-BOUNDARY");
        assert_eq!(boundary.scanner().delimiter(), b"\n--X-BOUNDARY");

        assert!(Boundary::new("").is_none());
    }

    #[test]
    fn test_failure_table() {
        assert_eq!(failure_table(b"aabaaab"), vec![0, 1, 0, 1, 2, 2, 3]);
        assert_eq!(failure_table(b"\n--b"), vec![0, 0, 0, 0]);
        assert_eq!(failure_table(b"\n--\n--"), vec![0, 0, 0, 1, 2, 3]);
    }

    #[test]
    fn test_scan_found() {
        let boundary = scanner("boundry");
        let scanner = boundary.scanner();

        assert_eq!(
            scanner.scan(b"textdata\n--boundry\n"),
            Scan::Found {
                data_end: 8,
                delim_start: 8
            }
        );
        assert_eq!(
            scanner.scan(b"textdata\r\n--boundry--"),
            Scan::Found {
                data_end: 8,
                delim_start: 9
            }
        );
        assert_eq!(
            scanner.scan(b"\r\n--boundry"),
            Scan::Found {
                data_end: 0,
                delim_start: 1
            }
        );
    }

    #[test]
    fn test_scan_leftmost_match_wins() {
        let boundary = scanner("b");
        assert_eq!(
            boundary.scanner().scan(b"a\n--b\n--b"),
            Scan::Found {
                data_end: 1,
                delim_start: 1
            }
        );
    }

    #[test]
    fn test_scan_holds_back_partial_delimiter() {
        let boundary = scanner("boundry");
        let scanner = boundary.scanner();

        assert_eq!(scanner.scan(b"textdata"), Scan::Partial { safe: 8 });
        assert_eq!(scanner.scan(b"textdata\n"), Scan::Partial { safe: 8 });
        assert_eq!(scanner.scan(b"textdata\r\n--bou"), Scan::Partial { safe: 8 });
        assert_eq!(scanner.scan(b"textdata\r"), Scan::Partial { safe: 8 });
        assert_eq!(scanner.scan(b"\n--boundr"), Scan::Partial { safe: 0 });
        assert_eq!(scanner.scan(b""), Scan::Partial { safe: 0 });
    }

    #[test]
    fn test_scan_near_misses_are_released() {
        let boundary = scanner("boundry");
        let scanner = boundary.scanner();

        assert_eq!(scanner.scan(b"x\n--boundrx"), Scan::Partial { safe: 11 });
        assert_eq!(scanner.scan(b"x\n-\n--"), Scan::Partial { safe: 3 });
        assert_eq!(scanner.scan(b"--boundry"), Scan::Partial { safe: 9 });
    }

    #[test]
    fn test_scan_self_overlapping_delimiter() {
        // "\n--\n--" contains its own prefix "\n--".
        let boundary = scanner("\n--");
        let scanner = boundary.scanner();

        assert_eq!(scanner.scan(b"ab\n--\n-"), Scan::Partial { safe: 2 });
        assert_eq!(scanner.scan(b"ab\n--\n--\n--"), Scan::Found { data_end: 2, delim_start: 2 });
    }

    #[test]
    fn test_scan_byte_by_byte() {
        let boundary = scanner("boundry");
        let scanner = boundary.scanner();
        let input = b"tiny data \r\n--boundr\r\n--boundry--";

        let mut buf = Vec::new();
        let mut emitted = Vec::new();
        let mut found = None;

        for &b in input.iter() {
            buf.push(b);
            match scanner.scan(&buf) {
                Scan::Found { data_end, delim_start } => {
                    emitted.extend_from_slice(&buf[..data_end]);
                    found = Some(buf.len() - delim_start);
                    break;
                }
                Scan::Partial { safe } => {
                    emitted.extend_from_slice(&buf[..safe]);
                    buf.drain(..safe);
                }
            }
        }

        assert_eq!(emitted, b"tiny data \r\n--boundr");
        assert_eq!(found, Some("\n--boundry".len()));
    }

    fn detect_boundary(buf: &[u8], limit: usize) -> Detection {
        BoundaryDetector::new(limit).detect(buf)
    }

    #[test]
    fn test_detect_boundary() {
        assert_eq!(
            detect_boundary(b"--boundry\nContent-Disposition: form-data", 1024),
            Detection::Found("boundry".to_owned())
        );
        assert_eq!(
            detect_boundary(b"--boundry \r\n", 1024),
            Detection::Found("boundry".to_owned())
        );
        assert_eq!(
            detect_boundary(b"preamble\r\n--\r\n--abc\r\n", 1024),
            Detection::Found("abc".to_owned())
        );
        assert_eq!(detect_boundary(b"--boundry", 1024), Detection::NeedMore);
        assert_eq!(detect_boundary(b"", 1024), Detection::NeedMore);
    }

    #[test]
    fn test_detect_boundary_respects_limit() {
        assert_eq!(detect_boundary(b"xxxxxxxx\n--abc\n", 8), Detection::NotFound);
        assert_eq!(detect_boundary(b"no boundary here", 8), Detection::NotFound);
        assert_eq!(detect_boundary(b"--abc\nmore", 6), Detection::Found("abc".to_owned()));
    }

    #[test]
    fn test_detect_boundary_resumes_after_complete_lines() {
        let mut detector = BoundaryDetector::new(1024);
        let mut buf = b"preamble\r\n--".to_vec();

        assert_eq!(detector.detect(&buf), Detection::NeedMore);
        assert_eq!(detector.line_start, 10);

        buf.extend_from_slice(b"\r\n--ab");
        assert_eq!(detector.detect(&buf), Detection::NeedMore);
        assert_eq!(detector.line_start, 14);

        buf.extend_from_slice(b"c\r\n");
        assert_eq!(detector.detect(&buf), Detection::Found("abc".to_owned()));
    }
}
