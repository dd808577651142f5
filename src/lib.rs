//! Client for the image endpoints of the Docker Engine API.
//!
//! ```no_run
//! use dockimg::{Client, PullImageOptions};
//!
//! let client = Client::new("tcp://127.0.0.1:2375")?;
//! let mut output = std::io::stdout();
//! client.pull_image(PullImageOptions {
//!     repository: "busybox".to_string(),
//!     output_stream: Some(&mut output),
//!     ..Default::default()
//! })?;
//! for image in client.list_images(false)? {
//!     println!("{} {:?}", image.id, image.repo_tags);
//! }
//! # Ok::<(), dockimg::DockerError>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod image;
pub mod progress;

pub use client::Client;
pub use error::{DockerError, Result};
pub use image::{
    ApiImage, AuthConfiguration, BuildImageOptions, Image, ImportImageOptions, PullImageOptions, PushImageOptions,
    TagImageOptions,
};
pub use progress::ProgressWriter;
