use std::str::FromStr;

use reqwest::blocking::{Body, Client, Request};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, Url};
use serde::Serialize;

use crate::error::Result;

pub const USER_AGENT_VALUE: &str = concat!("dockimg/", env!("CARGO_PKG_VERSION"));

pub enum RequestBody<'a, T: Serialize + ?Sized> {
    Json(&'a T),
    Read(Body),
}

pub struct DaemonContentType(&'static str);

impl DaemonContentType {
    pub const JSON: Self = Self("application/json");
    /// Sent with every POST that carries no JSON body.
    pub const PLAIN_TEXT: Self = Self("plain/text");

    pub fn val(&self) -> &'static str {
        self.0
    }
}

pub fn build_request<T: Serialize + ?Sized>(
    client: &Client,
    url: &str,
    method: Method,
    headers: &HeaderMap,
    body: Option<RequestBody<T>>,
) -> Result<Request> {
    let url = Url::from_str(url)?;
    let is_post = method == Method::POST;
    let mut builder = client
        .request(method, url)
        .header(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE))
        .headers(headers.clone());
    match body {
        None => {
            if is_post {
                builder = builder.header(CONTENT_TYPE, DaemonContentType::PLAIN_TEXT.val());
            }
        }
        Some(RequestBody::Json(json_body)) => {
            let json_bytes = serde_json::to_vec(json_body)?;
            builder = builder
                .header(CONTENT_TYPE, DaemonContentType::JSON.val())
                .body(json_bytes)
        }
        Some(RequestBody::Read(body)) => {
            if is_post {
                builder = builder.header(CONTENT_TYPE, DaemonContentType::PLAIN_TEXT.val());
            }
            builder = builder.body(body)
        }
    }
    Ok(builder.build()?)
}
