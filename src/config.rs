use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use home::home_dir;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{DockerError, Result};
use crate::image::AuthConfiguration;

/// Key of Docker Hub in `~/.docker/config.json`.
pub const DEFAULT_REGISTRY: &str = "https://index.docker.io/v1/";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserDockerConfig {
    pub auths: Option<HashMap<String, UserDockerConfigAuth>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserDockerConfigAuth {
    pub auth: Option<String>,
    pub email: Option<String>,
}

/// Looks up the credentials stored by `docker login` for `registry`.
pub fn load_docker_auth(registry: &str) -> Result<Option<AuthConfiguration>> {
    match home_dir() {
        None => Ok(None),
        Some(dir) => read_docker_config(&dir.join(".docker/config.json"), registry),
    }
}

pub fn read_docker_config(config_path: &Path, registry: &str) -> Result<Option<AuthConfiguration>> {
    if !config_path.is_file() {
        debug!("docker config not found at {}", config_path.to_string_lossy());
        return Ok(None);
    }
    let config_file = File::open(config_path)?;
    let user_docker_config = serde_json::from_reader::<_, UserDockerConfig>(config_file)?;
    auth_from_docker_config(user_docker_config, registry)
}

fn auth_from_docker_config(user_docker_config: UserDockerConfig, registry: &str) -> Result<Option<AuthConfiguration>> {
    let entry = match user_docker_config.auths.and_then(|mut auths| auths.remove(registry)) {
        None => return Ok(None),
        Some(entry) => entry,
    };
    let encoded = match entry.auth {
        None => return Ok(None),
        Some(encoded) => encoded,
    };
    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|err| DockerError::InvalidAuth(format!("{}: {}", registry, err)))?;
    let decoded = String::from_utf8(decoded).map_err(|err| DockerError::InvalidAuth(format!("{}: {}", registry, err)))?;
    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| DockerError::InvalidAuth(format!("{}: expected 'user:password'", registry)))?;
    Ok(Some(AuthConfiguration {
        username: username.to_string(),
        password: password.to_string(),
        email: entry.email.unwrap_or_default(),
    }))
}
