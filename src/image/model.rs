use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Entry of `GET /images/json`.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiImage {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "RepoTags", skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub repo_tags: Vec<String>,
    #[serde(rename = "Created")]
    pub created: i64,
    #[serde(rename = "Size")]
    pub size: i64,
    #[serde(rename = "VirtualSize")]
    pub virtual_size: i64,
    #[serde(rename = "ParentId", skip_serializing_if = "String::is_empty")]
    pub parent_id: String,
    /// Only sent by old daemons, newer ones fill `repo_tags`.
    #[serde(rename = "Repository", skip_serializing_if = "String::is_empty")]
    pub repository: String,
    #[serde(rename = "Tag", skip_serializing_if = "String::is_empty")]
    pub tag: String,
}

/// Result of `GET /images/{name}/json`.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
    #[serde(rename = "Id", alias = "id")]
    pub id: String,
    #[serde(rename = "Parent", alias = "parent")]
    pub parent: String,
    #[serde(rename = "Comment", alias = "comment")]
    pub comment: String,
    #[serde(rename = "Created", alias = "created")]
    pub created: Option<DateTime<Utc>>,
    #[serde(rename = "Container", alias = "container")]
    pub container: String,
    #[serde(rename = "ContainerConfig", alias = "container_config", deserialize_with = "null_as_default")]
    pub container_config: Config,
    #[serde(rename = "DockerVersion", alias = "docker_version")]
    pub docker_version: String,
    #[serde(rename = "Author", alias = "author")]
    pub author: String,
    #[serde(rename = "Config", alias = "config")]
    pub config: Option<Config>,
    #[serde(rename = "Architecture", alias = "architecture")]
    pub architecture: String,
    #[serde(rename = "Size", alias = "size")]
    pub size: i64,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    pub hostname: Option<String>,
    pub domainname: Option<String>,
    pub user: Option<String>,
    pub memory: Option<i64>,
    pub memory_swap: Option<i64>,
    pub cpu_shares: Option<i64>,
    pub attach_stdin: Option<bool>,
    pub attach_stdout: Option<bool>,
    pub attach_stderr: Option<bool>,
    pub port_specs: Option<Vec<String>>,
    pub exposed_ports: Option<HashMap<String, Value>>,
    pub tty: Option<bool>,
    pub open_stdin: Option<bool>,
    pub stdin_once: Option<bool>,
    pub env: Option<Vec<String>>,
    pub cmd: Option<Vec<String>>,
    pub dns: Option<Vec<String>>,
    pub image: Option<String>,
    pub volumes: Option<HashMap<String, Value>>,
    pub volumes_from: Option<String>,
    pub working_dir: Option<String>,
    pub entrypoint: Option<Vec<String>>,
    pub network_disabled: Option<bool>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
