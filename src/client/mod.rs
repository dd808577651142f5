use std::io::{self, Write};
use std::time::Duration;

use bytes::Bytes;
use log::debug;
use reqwest::blocking::{Body, Request, Response};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::request::{build_request, DaemonContentType, RequestBody};
use crate::error::{DockerError, Result};
use crate::progress::ErrorScanner;

pub mod query;
pub mod request;

/// Connection to a Docker daemon over HTTP.
pub struct Client {
    endpoint: Url,
    api_version: Option<String>,
    http: reqwest::blocking::Client,
}

impl Client {
    /// Creates a client for `endpoint`, e.g. `tcp://127.0.0.1:2375` or `https://docker.example.com`.
    pub fn new(endpoint: &str) -> Result<Client> {
        Self::build(endpoint, None)
    }

    /// Same as [`Client::new`], pinning every request to API version `api_version`.
    pub fn new_versioned(endpoint: &str, api_version: &str) -> Result<Client> {
        let version = api_version.trim_start_matches('v');
        if version.is_empty() {
            return Err(DockerError::InvalidEndpoint(format!("empty API version for {}", endpoint)));
        }
        Self::build(endpoint, Some(version.to_string()))
    }

    fn build(endpoint: &str, api_version: Option<String>) -> Result<Client> {
        let endpoint = parse_endpoint(endpoint)?;
        // Pulls and builds can stream for a long time, only the connect phase is bounded.
        let http = reqwest::blocking::ClientBuilder::new()
            .timeout(None::<Duration>)
            .connect_timeout(Duration::from_secs(10))
            .redirect(Policy::default())
            .build()?;
        Ok(Client {
            endpoint,
            api_version,
            http,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn get_url(&self, path: &str) -> String {
        let base = self.endpoint.as_str().trim_end_matches('/');
        match &self.api_version {
            None => format!("{}{}", base, path),
            Some(version) => format!("{}/v{}{}", base, version, path),
        }
    }

    /// Sends a request and reads the whole response body.
    pub fn do_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        data: Option<&B>,
    ) -> Result<DaemonResponse> {
        let url = self.get_url(path);
        let request = build_request(&self.http, &url, method, &HeaderMap::new(), data.map(RequestBody::Json))?;
        let response = self.execute(request)?;
        let status = response.status();
        let body = response.bytes()?;
        if !is_success(status) {
            return Err(DockerError::api(status, &body));
        }
        Ok(DaemonResponse { body })
    }

    /// Sends `input` as the request body and copies the response body into `output` untouched.
    ///
    /// A JSON message stream that reports an error fails with [`DockerError::Stream`].
    pub fn stream(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        input: Option<Body>,
        output: Option<&mut dyn Write>,
    ) -> Result<()> {
        let input = match input {
            None if method == Method::POST || method == Method::PUT => Some(Body::from(Vec::<u8>::new())),
            input => input,
        };
        let url = self.get_url(path);
        let request = build_request::<()>(&self.http, &url, method, &headers, input.map(RequestBody::Read))?;
        let mut response = self.execute(request)?;
        let status = response.status();
        if !is_success(status) {
            let body = response.bytes()?;
            return Err(DockerError::api(status, &body));
        }
        let scan = is_json_stream(&response);
        match output {
            Some(writer) => copy_body(&mut response, writer, scan, path),
            None => copy_body(&mut response, io::sink(), scan, path),
        }
    }

    fn execute(&self, request: Request) -> Result<Response> {
        debug!("{} {}", request.method(), request.url());
        self.http.execute(request).map_err(|err| {
            if err.is_connect() {
                debug!("connect failed: {}", err);
                DockerError::ConnectionRefused
            } else {
                DockerError::Http(err)
            }
        })
    }
}

fn is_json_stream(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map_or(false, |value| value.starts_with(DaemonContentType::JSON.val()))
}

fn copy_body<W: Write>(response: &mut Response, output: W, scan: bool, path: &str) -> Result<()> {
    if scan {
        let mut scanner = ErrorScanner::new(output);
        let copied = response.copy_to(&mut scanner)?;
        debug!("{} response bytes streamed from {}", copied, path);
        return scanner.finish();
    }
    let mut output = output;
    let copied = response.copy_to(&mut output)?;
    debug!("{} response bytes streamed from {}", copied, path);
    Ok(())
}

fn is_success(status: StatusCode) -> bool {
    (200..400).contains(&status.as_u16())
}

fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let invalid = || DockerError::InvalidEndpoint(endpoint.to_string());
    let url = match endpoint.strip_prefix("tcp://") {
        Some(address) => Url::parse(&format!("http://{}", address)),
        None => Url::parse(endpoint),
    }
    .map_err(|_| invalid())?;
    match url.scheme() {
        "http" | "https" => {}
        "unix" => {
            return Err(DockerError::InvalidEndpoint(format!(
                "unix sockets are not supported, expose the daemon over tcp: {}",
                endpoint
            )))
        }
        _ => return Err(invalid()),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid());
    }
    Ok(url)
}

/// Fully read daemon response.
pub struct DaemonResponse {
    body: Bytes,
}

impl DaemonResponse {
    pub fn json_body<R: DeserializeOwned>(&self) -> Result<R> {
        Ok(serde_json::from_slice::<R>(self.body.as_ref())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tcp_endpoint_becomes_http() {
        let client = Client::new("tcp://localhost:4243").unwrap();
        assert_eq!(client.endpoint().scheme(), "http");
        assert_eq!(client.get_url("/images/json"), "http://localhost:4243/images/json");
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = Client::new("https://docker.example.com:2376/").unwrap();
        assert_eq!(
            client.get_url("/images/busybox/json"),
            "https://docker.example.com:2376/images/busybox/json"
        );
    }

    #[test]
    fn versioned_url() {
        let client = Client::new_versioned("http://localhost:4243", "v1.12").unwrap();
        assert_eq!(client.get_url("/images/json?all=0"), "http://localhost:4243/v1.12/images/json?all=0");
    }

    #[test]
    fn rejects_bad_endpoints() {
        for endpoint in ["unix:///var/run/docker.sock", "ftp://localhost", "not an url", "http://"] {
            let result = Client::new(endpoint);
            assert!(
                matches!(result, Err(DockerError::InvalidEndpoint(_))),
                "{} should be rejected",
                endpoint
            );
        }
        assert!(matches!(
            Client::new_versioned("http://localhost:4243", "v"),
            Err(DockerError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn success_range() {
        assert!(is_success(StatusCode::OK));
        assert!(is_success(StatusCode::NO_CONTENT));
        assert!(is_success(StatusCode::NOT_MODIFIED));
        assert!(!is_success(StatusCode::NOT_FOUND));
        assert!(!is_success(StatusCode::CONTINUE));
    }
}
