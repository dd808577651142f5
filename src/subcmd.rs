use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use colored::Colorize;
use dockimg::config::{load_docker_auth, DEFAULT_REGISTRY};
use dockimg::image::STDIN_SOURCE;
use dockimg::{
    ApiImage, AuthConfiguration, BuildImageOptions, Client, ImportImageOptions, ProgressWriter, PullImageOptions,
    PushImageOptions,
};
use log::{debug, info};

use crate::cmd::{BuildArgs, Command, ImagesArgs, ImportArgs, LoadArgs, PullArgs, PushArgs, SaveArgs, TagArgs};

pub fn run(client: &Client, command: Command) -> Result<()> {
    match command {
        Command::Images(args) => images(client, args),
        Command::Inspect { name } => inspect(client, &name),
        Command::Rmi { name } => {
            client.remove_image(&name)?;
            println!("Deleted: {}", name);
            Ok(())
        }
        Command::Pull(args) => pull(client, args),
        Command::Push(args) => push(client, args),
        Command::Import(args) => import(client, args),
        Command::Build(args) => build(client, args),
        Command::Save(args) => save(client, args),
        Command::Load(args) => load(client, args),
        Command::Tag(args) => tag(client, args),
    }
}

fn images(client: &Client, args: ImagesArgs) -> Result<()> {
    let images = client.list_images(args.all)?;
    println!("{:<40} {:<14} {:<20} {:>12}", "REPOSITORY:TAG", "IMAGE ID", "CREATED", "SIZE");
    for image in &images {
        for name in image_names(image) {
            println!(
                "{:<40} {:<14} {:<20} {:>12}",
                name,
                short_id(&image.id),
                created_at(image.created),
                display_size(image)
            );
        }
    }
    Ok(())
}

fn image_names(image: &ApiImage) -> Vec<String> {
    if !image.repo_tags.is_empty() {
        return image.repo_tags.clone();
    }
    if image.repository.is_empty() {
        return vec!["<none>:<none>".to_string()];
    }
    vec![format!("{}:{}", image.repository, image.tag)]
}

// Daemons speaking API 1.44 and later no longer send VirtualSize.
fn display_size(image: &ApiImage) -> i64 {
    if image.virtual_size == 0 {
        image.size
    } else {
        image.virtual_size
    }
}

fn short_id(id: &str) -> &str {
    let id = id.strip_prefix("sha256:").unwrap_or(id);
    match id.char_indices().nth(12) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

fn created_at(created: i64) -> String {
    match Local.timestamp_opt(created, 0).single() {
        Some(time) => time.format("%Y-%m-%d %H:%M").to_string(),
        None => created.to_string(),
    }
}

fn inspect(client: &Client, name: &str) -> Result<()> {
    let image = client.inspect_image(name)?;
    println!("{}", serde_json::to_string_pretty(&image)?);
    Ok(())
}

fn pull(client: &Client, args: PullArgs) -> Result<()> {
    let mut output = ProgressWriter::new(io::stdout());
    client.pull_image(PullImageOptions {
        repository: args.repository,
        registry: args.registry,
        output_stream: Some(&mut output),
    })?;
    output.finish()?;
    Ok(())
}

fn push(client: &Client, args: PushArgs) -> Result<()> {
    let auth = match args.auth {
        Some(auth) => AuthConfiguration {
            username: auth.username,
            password: auth.password,
            email: args.email,
        },
        None => {
            let registry = if args.registry.is_empty() {
                DEFAULT_REGISTRY
            } else {
                args.registry.as_str()
            };
            let auth = load_docker_auth(registry)?;
            debug!("docker config auth for {}: {}", registry, auth.is_some());
            let mut auth = auth.unwrap_or_default();
            if !args.email.is_empty() {
                auth.email = args.email;
            }
            auth
        }
    };
    let mut output = ProgressWriter::new(io::stdout());
    client.push_image(
        PushImageOptions {
            name: args.name,
            registry: args.registry,
            output_stream: Some(&mut output),
        },
        &auth,
    )?;
    output.finish()?;
    Ok(())
}

fn import(client: &Client, args: ImportArgs) -> Result<()> {
    let input_stream: Option<Box<dyn io::Read + Send>> = if args.source == STDIN_SOURCE {
        Some(Box::new(io::stdin()))
    } else {
        None
    };
    let mut output = ProgressWriter::new(io::stdout());
    client.import_image(ImportImageOptions {
        repository: args.repo,
        source: args.source,
        input_stream,
        output_stream: Some(&mut output),
    })?;
    output.finish()?;
    Ok(())
}

fn build(client: &Client, args: BuildArgs) -> Result<()> {
    let mut output = ProgressWriter::new(io::stdout());
    client.build_image(BuildImageOptions {
        name: args.tag,
        remote: args.remote,
        suppress_output: args.quiet,
        output_stream: Some(&mut output),
    })?;
    output.finish()?;
    Ok(())
}

fn save(client: &Client, args: SaveArgs) -> Result<()> {
    let file = File::create(&args.output).with_context(|| format!("create {}", args.output.to_string_lossy()))?;
    let mut writer = BufWriter::new(file);
    client.get_image_tarball(&args.name, &mut writer)?;
    writer.flush()?;
    info!("Saved {} to {}", args.name, args.output.to_string_lossy());
    Ok(())
}

fn load(client: &Client, args: LoadArgs) -> Result<()> {
    let file = File::open(&args.input).with_context(|| format!("open {}", args.input.to_string_lossy()))?;
    client.post_image_tarball(file)?;
    info!("Loaded {}", args.input.to_string_lossy());
    Ok(())
}

fn tag(client: &Client, args: TagArgs) -> Result<()> {
    client.set_image_tag(&args.name, &args.tag, args.force)?;
    println!("Tagged {} as {}", args.name, args.tag);
    Ok(())
}

pub fn print_success() {
    println!("{}", "Done.".green());
}

pub fn print_failed(err: &anyhow::Error) {
    eprintln!(
        r#"
{}
{}
"#,
        "Failed.".red(),
        failure_message(err)
    );
}

fn failure_message(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_for_listing() {
        let tagged = ApiImage {
            repo_tags: vec!["busybox:latest".to_string(), "busybox:1.36".to_string()],
            ..Default::default()
        };
        assert_eq!(image_names(&tagged), vec!["busybox:latest", "busybox:1.36"]);
        let legacy = ApiImage {
            repository: "base".to_string(),
            tag: "ubuntu-12.10".to_string(),
            ..Default::default()
        };
        assert_eq!(image_names(&legacy), vec!["base:ubuntu-12.10"]);
        assert_eq!(image_names(&ApiImage::default()), vec!["<none>:<none>"]);
    }

    #[test]
    fn short_ids() {
        assert_eq!(short_id("sha256:4b1b2c7d9e0f1a2b3c4d"), "4b1b2c7d9e0f");
        assert_eq!(short_id("b750fe79269d2ec9a3c5"), "b750fe79269d");
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id("ééééééééééééé"), "éééééééééééé");
    }

    #[test]
    fn size_falls_back_without_virtual_size() {
        let modern = ApiImage {
            size: 4_261_574,
            ..Default::default()
        };
        assert_eq!(display_size(&modern), 4_261_574);
        let legacy = ApiImage {
            size: 24653,
            virtual_size: 180_116_135,
            ..Default::default()
        };
        assert_eq!(display_size(&legacy), 180_116_135);
    }

    #[test]
    fn failure_shows_whole_chain() {
        let err = anyhow::Error::new(io::Error::new(io::ErrorKind::PermissionDenied, "read-only file system"))
            .context("create /ro/x.tar");
        assert_eq!(failure_message(&err), "create /ro/x.tar: read-only file system");
    }
}
