//! Lazy line source for proxy lists and credential files (spec §4.1).
//!
//! Never loads the whole input into memory: wraps a buffered reader behind
//! a pull-style iterator so the batching driver (§4.8) can slice it into
//! bounded windows of `M` lines at a time.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::endpoint::{parse_credential_line, parse_endpoint_line, Credential, Endpoint};
use crate::error::InputError;

/// A lazy sequence of trimmed, non-empty, non-comment lines.
///
/// Handles both LF and CRLF termination (`BufRead::lines` already strips
/// both). A `#` at line-start marks a comment line, which is skipped.
pub struct LineSource<R: BufRead> {
    reader: R,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Pull the next raw, trimmed, non-comment, non-blank line, or `None` at EOF.
    fn next_raw(&mut self) -> io::Result<Option<String>> {
        loop {
            let mut buf = String::new();
            let n = self.reader.read_line(&mut buf)?;
            if n == 0 {
                return Ok(None);
            }
            let trimmed = buf.trim_end_matches(['\n', '\r']).trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Ok(Some(trimmed.to_string()));
        }
    }

    /// Pull up to `n` raw lines' worth of parsed endpoints, skipping lines
    /// that fail to parse rather than counting them against `n`. The
    /// returned `bool` is `true` once the underlying reader has hit EOF —
    /// callers must use it, not `Vec::is_empty`, to detect end of input: a
    /// window whose `n` raw lines are all unparseable is empty but not EOF.
    pub fn next_endpoint_window(&mut self, n: usize) -> io::Result<(Vec<Endpoint>, bool)> {
        let mut out = Vec::with_capacity(n);
        let mut eof = false;
        for _ in 0..n {
            match self.next_raw()? {
                Some(line) => {
                    if let Some(ep) = parse_endpoint_line(&line) {
                        out.push(ep);
                    }
                }
                None => {
                    eof = true;
                    break;
                }
            }
        }
        Ok((out, eof))
    }

    /// Drain every remaining endpoint line (used when chunking is disabled).
    pub fn drain_endpoints(&mut self) -> io::Result<Vec<Endpoint>> {
        let mut out = Vec::new();
        while let Some(line) = self.next_raw()? {
            if let Some(ep) = parse_endpoint_line(&line) {
                out.push(ep);
            }
        }
        Ok(out)
    }
}

impl LineSource<BufReader<File>> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| InputError::ProxyList {
            path: path.clone(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl LineSource<BufReader<io::Stdin>> {
    pub fn from_stdin() -> Self {
        Self::new(BufReader::new(io::stdin()))
    }
}

/// Load the (small, finite) credential list in full.
pub fn load_credentials(path: impl AsRef<Path>) -> Result<Vec<Credential>, InputError> {
    let path: PathBuf = path.as_ref().to_path_buf();
    let content = std::fs::read_to_string(&path).map_err(|source| InputError::CredentialFile {
        path: path.clone(),
        source,
    })?;
    Ok(content
        .lines()
        .filter_map(parse_credential_line)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn drains_all_endpoints_skipping_comments_and_blanks() {
        let input = "# header\n1.2.3.4:80\n\n5.6.7.8:443\r\n# trailer\n";
        let mut src = LineSource::new(Cursor::new(input));
        let eps = src.drain_endpoints().unwrap();
        assert_eq!(eps.len(), 2);
        assert_eq!(eps[0].host, "1.2.3.4");
        assert_eq!(eps[1].port, 443);
    }

    #[test]
    fn windows_are_bounded_and_exhaust_cleanly() {
        let input = "1:1\n2:2\n3:3\n4:4\n5:5\n";
        let mut src = LineSource::new(Cursor::new(input));
        let (w1, eof1) = src.next_endpoint_window(2).unwrap();
        assert_eq!(w1.len(), 2);
        assert!(!eof1);
        let (w2, eof2) = src.next_endpoint_window(2).unwrap();
        assert_eq!(w2.len(), 2);
        assert!(!eof2);
        let (w3, eof3) = src.next_endpoint_window(2).unwrap();
        assert_eq!(w3.len(), 1);
        assert!(eof3);
        let (w4, eof4) = src.next_endpoint_window(2).unwrap();
        assert!(w4.is_empty());
        assert!(eof4);
    }

    #[test]
    fn window_of_entirely_unparseable_lines_is_not_mistaken_for_eof() {
        let input = "not-an-endpoint\nalso-bad\n6:6\n";
        let mut src = LineSource::new(Cursor::new(input));
        let (w1, eof1) = src.next_endpoint_window(2).unwrap();
        assert!(w1.is_empty());
        assert!(!eof1);
        let (w2, eof2) = src.next_endpoint_window(2).unwrap();
        assert_eq!(w2.len(), 1);
        assert!(eof2);
    }
}
