use std::fs;
use std::io::{Read, Write};

use log::{debug, info};
use reqwest::blocking::Body;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use url::Url;

use crate::client::query::QueryString;
use crate::client::Client;
use crate::error::{DockerError, Result};

pub use model::{ApiImage, Config, Image};
pub use options::{
    AuthConfiguration, BuildImageOptions, ImportImageOptions, PullImageOptions, PushImageOptions, TagImageOptions,
    STDIN_SOURCE,
};

pub mod model;
pub mod options;

const REGISTRY_AUTH_HEADER: HeaderName = HeaderName::from_static("x-registry-auth");

impl Client {
    /// Lists the images known to the daemon; `all` includes intermediate layers.
    pub fn list_images(&self, all: bool) -> Result<Vec<ApiImage>> {
        let path = format!("/images/json?all={}", if all { "1" } else { "0" });
        let response = self.do_request::<()>(Method::GET, &path, None)?;
        response.json_body::<Vec<ApiImage>>()
    }

    /// Removes an image by its name or ID.
    pub fn remove_image(&self, name: &str) -> Result<()> {
        self.do_request::<()>(Method::DELETE, &format!("/images/{}", name), None)
            .map_err(DockerError::or_no_such_image)?;
        Ok(())
    }

    /// Returns an image by its name or ID.
    pub fn inspect_image(&self, name: &str) -> Result<Image> {
        let response = self
            .do_request::<()>(Method::GET, &format!("/images/{}/json", name), None)
            .map_err(DockerError::or_no_such_image)?;
        response.json_body::<Image>()
    }

    /// Pushes an image to a remote registry, streaming progress to the output stream.
    pub fn push_image(&self, opts: PushImageOptions<'_>, auth: &AuthConfiguration) -> Result<()> {
        if opts.name.is_empty() {
            return Err(DockerError::NoSuchImage);
        }
        let path = format!("/images/{}/push?{}", opts.name, opts.query_string());
        let mut headers = HeaderMap::new();
        let auth_header = HeaderValue::from_str(&auth.header_value()?)
            .map_err(|err| DockerError::InvalidAuth(err.to_string()))?;
        headers.insert(REGISTRY_AUTH_HEADER, auth_header);
        let body = Body::from(auth.push_body()?);
        info!("Pushing image {}", opts.name);
        self.stream(Method::POST, &path, headers, Some(body), opts.output_stream)
    }

    /// Pulls an image from a remote registry, streaming progress to the output stream.
    pub fn pull_image(&self, opts: PullImageOptions<'_>) -> Result<()> {
        if opts.repository.is_empty() {
            return Err(DockerError::NoSuchImage);
        }
        info!("Pulling image {}", opts.repository);
        let query = opts.query_string();
        self.create_image(&query, None, opts.output_stream)
    }

    /// Imports an image from a URL, a local file or the options' input stream.
    pub fn import_image(&self, opts: ImportImageOptions<'_>) -> Result<()> {
        let ImportImageOptions {
            repository,
            mut source,
            input_stream,
            output_stream,
        } = opts;
        if repository.is_empty() {
            return Err(DockerError::NoSuchImage);
        }
        let mut input = if source == STDIN_SOURCE {
            input_stream.map(Body::new)
        } else {
            None
        };
        if source != STDIN_SOURCE && !is_url(&source) {
            info!("Reading image from local file {}", source);
            let content = fs::read(&source)?;
            debug!("{} bytes read from {}", content.len(), source);
            input = Some(Body::from(content));
            source = STDIN_SOURCE.to_string();
        }
        let query = QueryString::new()
            .string("repo", &repository)
            .string("fromSrc", &source)
            .encode();
        self.create_image(&query, input, output_stream)
    }

    fn create_image(&self, query: &str, input: Option<Body>, output: Option<&mut dyn Write>) -> Result<()> {
        let path = format!("/images/create?{}", query);
        self.stream(Method::POST, &path, HeaderMap::new(), input, output)
    }

    /// Builds an image from a remote context. The image is named after the remote when no name is given.
    pub fn build_image(&self, opts: BuildImageOptions<'_>) -> Result<()> {
        let BuildImageOptions {
            name,
            remote,
            suppress_output,
            output_stream,
        } = opts;
        if remote.is_empty() {
            return Err(DockerError::MissingRepo);
        }
        let name = if name.is_empty() { remote.clone() } else { name };
        let output = output_stream.ok_or(DockerError::MissingOutputStream)?;
        let query = QueryString::new()
            .string("t", &name)
            .string("remote", &remote)
            .flag("q", suppress_output)
            .encode();
        info!("Building image {} from {}", name, remote);
        self.stream(Method::POST, &format!("/build?{}", query), HeaderMap::new(), None, Some(output))
    }

    /// Writes the tarball of an image and its history to `output`.
    pub fn get_image_tarball(&self, name: &str, output: &mut dyn Write) -> Result<()> {
        let path = format!("/images/{}/get", name);
        self.stream(Method::GET, &path, HeaderMap::new(), None, Some(output))
    }

    /// Loads images from a tarball produced by [`Client::get_image_tarball`].
    pub fn post_image_tarball<R: Read + Send + 'static>(&self, input: R) -> Result<()> {
        self.stream(Method::POST, "/images/load", HeaderMap::new(), Some(Body::new(input)), None)
    }

    /// Tags image `name` into repository `tag`.
    pub fn set_image_tag(&self, name: &str, tag: &str, force: bool) -> Result<()> {
        let opts = TagImageOptions {
            repo: tag.to_string(),
            force,
        };
        let path = format!("/images/{}/tag?{}", name, opts.query_string());
        self.stream(Method::POST, &path, HeaderMap::new(), None, None)
    }
}

fn is_url(source: &str) -> bool {
    match Url::parse(source) {
        Ok(url) => url.scheme() == "http" || url.scheme() == "https",
        Err(_) => false,
    }
}
