//! Fully buffered HTTP responses.

use flate2::read::GzDecoder;
use reqwest::header::{HeaderMap, CONTENT_ENCODING};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::io::Read;
use url::Url;

use crate::error::HttpError;

/// A response whose body has already been read (and gunzipped).
///
/// The body can be read any number of times.
#[derive(Debug, Clone)]
pub struct BufferedResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Final URL after redirects.
    pub url: Url,
    body: Vec<u8>,
}

impl BufferedResponse {
    /// Builds a buffered response, decompressing gzip bodies.
    pub fn new(status: StatusCode, headers: HeaderMap, url: Url, raw: Vec<u8>) -> Result<Self, HttpError> {
        let body = if is_gzip(&headers) { gunzip(&raw)? } else { raw };
        Ok(Self {
            status,
            headers,
            url,
            body,
        })
    }

    /// Raw body bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Returns a header value as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body length in bytes.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Returns true if the body is empty.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

fn is_gzip(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("gzip"))
}

fn gunzip(raw: &[u8]) -> Result<Vec<u8>, HttpError> {
    let mut out = Vec::with_capacity(raw.len() * 4);
    GzDecoder::new(raw).read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use reqwest::header::HeaderValue;
    use std::io::Write;

    fn url() -> Url {
        Url::parse("https://s180-en.ogame.gameforge.com/").unwrap()
    }

    #[test]
    fn test_gzip_body_is_decoded() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"<html>overview</html>").unwrap();
        let compressed = encoder.finish().unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));

        let resp = BufferedResponse::new(StatusCode::OK, headers, url(), compressed).unwrap();
        assert_eq!(resp.text(), "<html>overview</html>");
        // Readable more than once.
        assert_eq!(resp.bytes(), b"<html>overview</html>");
    }

    #[test]
    fn test_plain_body_untouched() {
        let resp = BufferedResponse::new(StatusCode::OK, HeaderMap::new(), url(), b"[1,2]".to_vec()).unwrap();
        let parsed: Vec<i64> = resp.json().unwrap();
        assert_eq!(parsed, vec![1, 2]);
    }

    #[test]
    fn test_corrupt_gzip_is_an_error() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        let result = BufferedResponse::new(StatusCode::OK, headers, url(), b"not gzip".to_vec());
        assert!(matches!(result, Err(HttpError::Decode(_))));
    }
}
