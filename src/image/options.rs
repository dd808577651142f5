use std::io::{Read, Write};

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::client::query::QueryString;
use crate::error::Result;

/// Source value telling the daemon to read the image from the request body.
pub const STDIN_SOURCE: &str = "-";

/// Options of [`Client::push_image`](crate::Client::push_image).
#[derive(Default)]
pub struct PushImageOptions<'a> {
    /// Name of the image
    pub name: String,
    /// Registry server to push the image
    pub registry: String,
    pub output_stream: Option<&'a mut dyn Write>,
}

impl PushImageOptions<'_> {
    pub(crate) fn query_string(&self) -> String {
        QueryString::new().string("registry", &self.registry).encode()
    }
}

/// Credentials for the registry an image is pushed to.
///
/// An empty instance may be used for unauthenticated pushes.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfiguration {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
}

impl AuthConfiguration {
    /// JSON body of a push request, newline terminated.
    pub(crate) fn push_body(&self) -> Result<Vec<u8>> {
        let mut body = serde_json::to_vec(self)?;
        body.push(b'\n');
        Ok(body)
    }

    /// Value of the `X-Registry-Auth` header.
    pub(crate) fn header_value(&self) -> Result<String> {
        Ok(URL_SAFE.encode(serde_json::to_vec(self)?))
    }
}

#[derive(Default)]
pub struct PullImageOptions<'a> {
    pub repository: String,
    pub registry: String,
    pub output_stream: Option<&'a mut dyn Write>,
}

impl PullImageOptions<'_> {
    pub(crate) fn query_string(&self) -> String {
        QueryString::new()
            .string("fromImage", &self.repository)
            .string("registry", &self.registry)
            .encode()
    }
}

/// Import of an image from a URL, a local file or `input_stream`.
///
/// `source` is either an `http(s)` URL, a local file path or [`STDIN_SOURCE`].
/// `input_stream` is only sent when `source` is [`STDIN_SOURCE`].
#[derive(Default)]
pub struct ImportImageOptions<'a> {
    pub repository: String,
    pub source: String,
    pub input_stream: Option<Box<dyn Read + Send>>,
    pub output_stream: Option<&'a mut dyn Write>,
}

/// Build of an image from a remote context, e.g. a git repository or tarball URL.
#[derive(Default)]
pub struct BuildImageOptions<'a> {
    pub name: String,
    pub remote: String,
    pub suppress_output: bool,
    pub output_stream: Option<&'a mut dyn Write>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct TagImageOptions {
    pub repo: String,
    pub force: bool,
}

impl TagImageOptions {
    pub(crate) fn query_string(&self) -> String {
        QueryString::new()
            .string("repo", &self.repo)
            .flag("force", self.force)
            .encode()
    }
}
