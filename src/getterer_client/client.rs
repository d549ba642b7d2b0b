use std::time::Duration;

use log::{debug, warn};
use reqwest::{
    blocking::Client,
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    StatusCode,
};
use snafu::{ResultExt, Snafu};
use url::Url;

use crate::config::models::Settings;

pub const SENTINEL_REQUEST: &str = "error";
pub const SENTINEL_STATUS: &str = "Could not getSingle";
pub const SENTINEL_BODY: &str = "Could not take snapshot";

/// Something that can GET a Getterer endpoint.
pub trait StatusSource {
    fn try_fetch(&self, url: &Url) -> Result<String, FetchError>;

    /// Like [`StatusSource::try_fetch`], but a failure is logged and replaced
    /// by the sentinel string for its kind.
    fn fetch(&self, url: &Url) -> String {
        match self.try_fetch(url) {
            Ok(body) => body,
            Err(e) => {
                warn!("{}", e);
                e.sentinel().to_string()
            }
        }
    }
}

/// The endpoints of one Getterer instance.
#[derive(Debug, Clone)]
pub struct GettererUrls {
    base: Url,
}

impl GettererUrls {
    pub fn new(base: &str) -> Result<Self, url::ParseError> {
        let base = Url::parse(base)?;
        if base.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
        }
        Ok(Self { base })
    }

    pub fn printers(&self) -> Url {
        let mut url = self.endpoint(&["printers"]);
        url.set_query(Some("json=y"));
        url
    }

    pub fn status_json(&self, printer: &str) -> Url {
        let mut url = self.status_plain(printer);
        url.set_query(Some("json=y"));
        url
    }

    pub fn status_plain(&self, printer: &str) -> Url {
        self.endpoint(&["status", printer])
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        // A trailing slash on the base leaves an empty last segment behind.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Blocking HTTP client for the Getterer, configured once and reused for
/// every request of a poll.
pub struct GettererClient {
    client: Client,
}

impl GettererClient {
    pub fn new(settings: &Settings) -> Result<Self, FetchError> {
        Self::with_timeout(Duration::from_secs(settings.ttl), &settings.status_token)
    }

    pub fn with_timeout(timeout: Duration, status_token: &str) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        if !status_token.is_empty() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", status_token)).context(TokenSnafu)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context(ClientSnafu)?;

        Ok(Self { client })
    }
}

impl StatusSource for GettererClient {
    fn try_fetch(&self, url: &Url) -> Result<String, FetchError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .context(RequestSnafu { url: url.to_string() })?;

        let status = response.status();
        if status != StatusCode::OK {
            // Dropping the response here releases the connection.
            return StatusSnafu { url: url.to_string(), status }.fail();
        }

        response.text().context(BodySnafu { url: url.to_string() })
    }
}

// ////// //
// Errors //
// ////// //

#[derive(Debug, Snafu)]
pub enum FetchError {
    #[snafu(display("Could not create client connection to {url}"))]
    Request { url: String, source: reqwest::Error },

    #[snafu(display("Could not getSingle: {url} HTTPStatus: {status}"))]
    Status { url: String, status: StatusCode },

    #[snafu(display("Cannot take getSingle URL \"{url}\""))]
    Body { url: String, source: reqwest::Error },

    #[snafu(display("Status token cannot be sent as an HTTP header"))]
    Token { source: reqwest::header::InvalidHeaderValue },

    #[snafu(display("Could not build HTTP client"))]
    Client { source: reqwest::Error },
}

impl FetchError {
    /// The placeholder that goes into a report cell instead of a body.
    pub fn sentinel(&self) -> &'static str {
        match self {
            FetchError::Status { .. } => SENTINEL_STATUS,
            FetchError::Body { .. } => SENTINEL_BODY,
            FetchError::Request { .. } | FetchError::Token { .. } | FetchError::Client { .. } => SENTINEL_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::{BufRead, BufReader, Write},
        net::TcpListener,
        sync::mpsc,
        thread,
    };

    use super::*;

    /// Serves a single canned HTTP response and hands back the request head.
    fn serve_once(status_line: &'static str, body: &'static str) -> (Url, mpsc::Receiver<String>) {
        serve_raw(Some(format!(
            "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        )))
    }

    /// Writes `response` verbatim and closes, or with `None` reads the request
    /// and then stays silent for a few seconds.
    fn serve_raw(response: Option<String>) -> (Url, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                head.push_str(&line);
            }
            match response {
                Some(response) => stream.write_all(response.as_bytes()).unwrap(),
                None => thread::sleep(Duration::from_secs(3)),
            }
            let _ = tx.send(head);
        });

        (Url::parse(&format!("http://127.0.0.1:{}/status/ender5", port)).unwrap(), rx)
    }

    fn client(token: &str) -> GettererClient {
        GettererClient::with_timeout(Duration::from_secs(5), token).unwrap()
    }

    #[test]
    fn ok_response_returns_body_verbatim() {
        let (url, rx) = serve_once("200 OK", "Operational\n");
        assert_eq!(client("").fetch(&url), "Operational\n");

        let head = rx.recv().unwrap();
        assert!(head.starts_with("GET /status/ender5 HTTP/1.1"));
        assert!(!head.to_ascii_lowercase().contains("authorization"));
    }

    #[test]
    fn status_token_is_sent_as_bearer() {
        let (url, rx) = serve_once("200 OK", "{}");
        client("s3cret").fetch(&url);

        let head = rx.recv().unwrap();
        assert!(head.contains("authorization: Bearer s3cret") || head.contains("Authorization: Bearer s3cret"));
    }

    #[test]
    fn non_200_becomes_get_single_sentinel() {
        let (url, _rx) = serve_once("404 Not Found", "no such printer");
        let client = client("");

        assert_eq!(client.fetch(&url), SENTINEL_STATUS);
    }

    #[test]
    fn non_200_error_names_url_and_status() {
        let (url, _rx) = serve_once("503 Service Unavailable", "");
        let err = client("").try_fetch(&url).unwrap_err();

        let message = err.to_string();
        assert!(message.contains("/status/ender5"));
        assert!(message.contains("503"));
    }

    #[test]
    fn unreachable_host_becomes_error_sentinel() {
        // Bind and drop to get a port nobody is listening on.
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let url = Url::parse(&format!("http://127.0.0.1:{}/printers?json=y", port)).unwrap();

        assert_eq!(client("").fetch(&url), SENTINEL_REQUEST);
    }

    #[test]
    fn truncated_body_becomes_snapshot_sentinel() {
        let (url, _rx) = serve_raw(Some(
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 100\r\nConnection: close\r\n\r\nOperat"
                .to_string(),
        ));

        let err = client("").try_fetch(&url).unwrap_err();
        assert!(matches!(err, FetchError::Body { .. }));
        assert_eq!(err.sentinel(), SENTINEL_BODY);
    }

    #[test]
    fn silent_server_times_out_into_error_sentinel() {
        let (url, _rx) = serve_raw(None);
        let client = GettererClient::with_timeout(Duration::from_secs(1), "").unwrap();

        assert_eq!(client.fetch(&url), SENTINEL_REQUEST);
    }

    #[test]
    fn sentinels_match_error_kind() {
        let err = FetchError::Status { url: "http://x/".into(), status: StatusCode::INTERNAL_SERVER_ERROR };
        assert_eq!(err.sentinel(), "Could not getSingle");
    }

    #[test]
    fn urls_are_built_below_the_base() {
        let urls = GettererUrls::new("http://172.28.0.10:54038").unwrap();
        assert_eq!(urls.printers().as_str(), "http://172.28.0.10:54038/printers?json=y");
        assert_eq!(urls.status_json("ender5").as_str(), "http://172.28.0.10:54038/status/ender5?json=y");
        assert_eq!(urls.status_plain("ender5").as_str(), "http://172.28.0.10:54038/status/ender5");
    }

    #[test]
    fn urls_tolerate_trailing_slash_and_sub_path() {
        let urls = GettererUrls::new("http://getterer.local/api/").unwrap();
        assert_eq!(urls.printers().as_str(), "http://getterer.local/api/printers?json=y");

        let urls = GettererUrls::new("http://getterer.local/api").unwrap();
        assert_eq!(urls.status_plain("ender5").as_str(), "http://getterer.local/api/status/ender5");
    }

    #[test]
    fn printer_names_are_one_encoded_segment() {
        let urls = GettererUrls::new("http://getterer.local").unwrap();
        assert_eq!(urls.status_plain("shop/mk3 #2").as_str(), "http://getterer.local/status/shop%2Fmk3%20%232");
    }
}
