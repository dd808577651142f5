use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DockerError>;

#[derive(Debug, Error)]
pub enum DockerError {
    /// Returned when the image does not exist.
    #[error("No such image")]
    NoSuchImage,

    #[error("Missing remote repository e.g. 'github.com/user/repo'")]
    MissingRepo,

    #[error("Missing output-stream")]
    MissingOutputStream,

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("cannot connect to Docker endpoint")]
    ConnectionRefused,

    /// Non-success status returned by the daemon, with the raw response body.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Error reported inside a JSON progress stream.
    #[error("{0}")]
    Stream(String),

    #[error("invalid registry auth: {0}")]
    InvalidAuth(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),
}

impl DockerError {
    pub fn api(status: StatusCode, body: &[u8]) -> DockerError {
        DockerError::Api {
            status: status.as_u16(),
            message: String::from_utf8_lossy(body).into(),
        }
    }

    /// HTTP status of an `Api` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            DockerError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn or_no_such_image(self) -> DockerError {
        match self.status() {
            Some(status) if status == StatusCode::NOT_FOUND.as_u16() => DockerError::NoSuchImage,
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let err = DockerError::api(StatusCode::INTERNAL_SERVER_ERROR, b"server error");
        assert_eq!(err.to_string(), "API error (500): server error");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn not_found_maps_to_no_such_image() {
        let err = DockerError::api(StatusCode::NOT_FOUND, b"no such image: busybox");
        assert!(matches!(err.or_no_such_image(), DockerError::NoSuchImage));
    }

    #[test]
    fn other_errors_pass_through() {
        let err = DockerError::api(StatusCode::CONFLICT, b"image is in use").or_no_such_image();
        assert_eq!(err.status(), Some(409));
        assert!(matches!(
            DockerError::ConnectionRefused.or_no_such_image(),
            DockerError::ConnectionRefused
        ));
    }
}
