use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Error;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(about = "Manage images of a Docker daemon", version)]
pub struct CmdArgs {
    /// Daemon endpoint, e.g. 'tcp://127.0.0.1:2375' or 'https://docker.example.com:2376'
    #[arg(long, short = 'H', env = "DOCKER_HOST", default_value = "tcp://127.0.0.1:2375")]
    pub host: String,

    /// [OPTION] Pin requests to an API version, e.g. '1.41'
    #[arg(long)]
    pub api_version: Option<String>,

    /// Log requests sent to the daemon
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List images
    Images(ImagesArgs),
    /// Show low-level information on an image
    Inspect { name: String },
    /// Remove an image
    Rmi { name: String },
    /// Pull an image from a registry
    Pull(PullArgs),
    /// Push an image to a registry
    Push(PushArgs),
    /// Import an image from a URL, a local tarball or '-' for stdin
    Import(ImportArgs),
    /// Build an image from a remote context
    Build(BuildArgs),
    /// Save an image to a tar archive
    Save(SaveArgs),
    /// Load images from a tar archive
    Load(LoadArgs),
    /// Tag an image into a repository
    Tag(TagArgs),
}

#[derive(Args)]
pub struct ImagesArgs {
    /// Show all images, including intermediate layers
    #[arg(long, short)]
    pub all: bool,
}

#[derive(Args)]
pub struct PullArgs {
    pub repository: String,

    /// [OPTION] Registry to pull from
    #[arg(long, default_value = "")]
    pub registry: String,
}

#[derive(Args)]
pub struct PushArgs {
    pub name: String,

    /// [OPTION] Registry to push to
    #[arg(long, default_value = "")]
    pub registry: String,

    /// [OPTION] Auth of the registry. Example:'myname:mypass','myname:${MY_PASSWORD_ENV}'.
    /// Read from ~/.docker/config.json when not set.
    #[arg(long)]
    pub auth: Option<BaseAuth>,

    /// [OPTION] Email sent along with the auth
    #[arg(long, default_value = "")]
    pub email: String,
}

#[derive(Args)]
pub struct ImportArgs {
    /// URL, local tarball path or '-' to read from stdin
    pub source: String,

    /// Repository of the imported image
    #[arg(long)]
    pub repo: String,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Remote context, e.g. 'github.com/user/repo'
    #[arg(long)]
    pub remote: String,

    /// [OPTION] Image name, defaults to the remote
    #[arg(long, short, default_value = "")]
    pub tag: String,

    /// Suppress the build output
    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct SaveArgs {
    pub name: String,

    /// Tar archive to write
    #[arg(long, short)]
    pub output: PathBuf,
}

#[derive(Args)]
pub struct LoadArgs {
    /// Tar archive to read
    #[arg(long, short)]
    pub input: PathBuf,
}

#[derive(Args)]
pub struct TagArgs {
    pub name: String,
    pub tag: String,

    /// Replace an existing tag
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Clone)]
pub struct BaseAuth {
    pub username: String,
    pub password: String,
}

impl FromStr for BaseAuth {
    type Err = Error;

    fn from_str(arg: &str) -> Result<Self, Self::Err> {
        let (username, password) = arg.split_once(':').ok_or_else(|| Error::msg("error auth input"))?;
        Ok(BaseAuth {
            username: value_or_env(username)?,
            password: value_or_env(password)?,
        })
    }
}

fn value_or_env(param: &str) -> anyhow::Result<String> {
    let value = match param.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
        Some(name) => env::var(name).map_err(|err| Error::msg(format!("env '{}': {}", name, err)))?,
        None => param.to_string(),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_consistent() {
        CmdArgs::command().debug_assert();
    }

    #[test]
    fn auth_from_env() -> anyhow::Result<()> {
        let path = env::var("PATH")?;
        let auth = BaseAuth::from_str("gopher:${PATH}")?;
        assert_eq!(auth.username, "gopher");
        assert_eq!(auth.password, path);
        Ok(())
    }

    #[test]
    fn auth_keeps_colons_in_password() -> anyhow::Result<()> {
        let auth = BaseAuth::from_str("gopher:pa:ss")?;
        assert_eq!(auth.password, "pa:ss");
        assert!(BaseAuth::from_str("gopher").is_err());
        Ok(())
    }

    #[test]
    fn parses_push() {
        let args = CmdArgs::try_parse_from([
            "dockimg",
            "--host",
            "http://localhost:4243",
            "push",
            "tsuru/python",
            "--registry",
            "docker.tsuru.io",
            "--auth",
            "gopher:gopher123",
        ])
        .unwrap();
        assert_eq!(args.host, "http://localhost:4243");
        match args.command {
            Command::Push(push) => {
                assert_eq!(push.name, "tsuru/python");
                assert_eq!(push.registry, "docker.tsuru.io");
                assert_eq!(push.auth.unwrap().password, "gopher123");
                assert_eq!(push.email, "");
            }
            _ => panic!("expected push"),
        }
    }
}
