use std::io::{self, Write};

use log::warn;
use serde::Deserialize;

use crate::error::{DockerError, Result};

/// One line of the daemon's JSON progress stream.
#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct JsonMessage {
    pub status: String,
    pub progress: String,
    pub stream: String,
    pub error: String,
    pub id: String,
}

/// Renders the JSON messages of pull, push, import and build streams as text.
///
/// The first error reported by the daemon is kept and returned by [`ProgressWriter::finish`].
pub struct ProgressWriter<W: Write> {
    inner: W,
    pending: Vec<u8>,
    error: Option<String>,
}

impl<W: Write> ProgressWriter<W> {
    pub fn new(inner: W) -> ProgressWriter<W> {
        ProgressWriter {
            inner,
            pending: Vec::new(),
            error: None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Renders what is left of the stream and hands back the inner writer.
    pub fn finish(mut self) -> Result<W> {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.render_line(&line)?;
        }
        self.inner.flush()?;
        match self.error {
            Some(error) => Err(DockerError::Stream(error)),
            None => Ok(self.inner),
        }
    }

    fn render_line(&mut self, line: &[u8]) -> io::Result<()> {
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            return Ok(());
        }
        let message = match serde_json::from_slice::<JsonMessage>(trimmed) {
            Ok(message) => message,
            Err(_) => {
                self.inner.write_all(line)?;
                return self.inner.write_all(b"\n");
            }
        };
        if !message.error.is_empty() {
            warn!("daemon reported: {}", message.error);
            if self.error.is_none() {
                self.error = Some(message.error);
            }
            return Ok(());
        }
        if !message.stream.is_empty() {
            self.inner.write_all(message.stream.as_bytes())?;
        }
        if !message.status.is_empty() {
            if !message.id.is_empty() {
                write!(self.inner, "{}: ", message.id)?;
            }
            if message.progress.is_empty() {
                writeln!(self.inner, "{}", message.status)?;
            } else {
                write!(self.inner, "{} {}\r", message.status, message.progress)?;
            }
        }
        Ok(())
    }
}

impl<W: Write> Write for ProgressWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        while let Some(position) = self.pending.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=position).collect();
            self.render_line(&line[..line.len() - 1])?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Copies a JSON message stream through untouched while watching it for daemon errors.
pub(crate) struct ErrorScanner<W: Write> {
    inner: W,
    pending: Vec<u8>,
    error: Option<String>,
}

impl<W: Write> ErrorScanner<W> {
    pub(crate) fn new(inner: W) -> ErrorScanner<W> {
        ErrorScanner {
            inner,
            pending: Vec::new(),
            error: None,
        }
    }

    /// Fails with the first error the daemon reported in the stream.
    pub(crate) fn finish(mut self) -> Result<()> {
        let line = std::mem::take(&mut self.pending);
        self.scan_line(&line);
        self.inner.flush()?;
        match self.error {
            Some(error) => Err(DockerError::Stream(error)),
            None => Ok(()),
        }
    }

    fn scan_line(&mut self, line: &[u8]) {
        if self.error.is_some() {
            return;
        }
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            return;
        }
        if let Ok(message) = serde_json::from_slice::<JsonMessage>(trimmed) {
            if !message.error.is_empty() {
                warn!("daemon reported: {}", message.error);
                self.error = Some(message.error);
            }
        }
    }
}

impl<W: Write> Write for ErrorScanner<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write_all(buf)?;
        if self.error.is_none() {
            self.pending.extend_from_slice(buf);
            while let Some(position) = self.pending.iter().position(|byte| *byte == b'\n') {
                let line: Vec<u8> = self.pending.drain(..=position).collect();
                self.scan_line(&line);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(input: &str) -> (String, Option<String>) {
        let mut writer = ProgressWriter::new(Vec::<u8>::new());
        writer.write_all(input.as_bytes()).unwrap();
        let error = writer.error().map(str::to_string);
        match writer.finish() {
            Ok(output) => (String::from_utf8(output).unwrap(), error),
            Err(DockerError::Stream(message)) => (String::new(), Some(message)),
            Err(err) => panic!("unexpected error: {}", err),
        }
    }

    #[test]
    fn renders_status_and_progress() {
        let input = concat!(
            "{\"status\":\"Pulling from library/busybox\",\"id\":\"latest\"}\n",
            "{\"status\":\"Downloading\",\"progress\":\"[==>   ] 1 MB/4 MB\",\"id\":\"a3ed95caeb02\"}\n",
            "{\"status\":\"Download complete\",\"id\":\"a3ed95caeb02\"}\n",
        );
        let (output, error) = render(input);
        assert_eq!(
            output,
            "latest: Pulling from library/busybox\na3ed95caeb02: Downloading [==>   ] 1 MB/4 MB\ra3ed95caeb02: Download complete\n"
        );
        assert!(error.is_none());
    }

    #[test]
    fn renders_build_stream() {
        let input = "{\"stream\":\"Step 1/2 : FROM busybox\\n\"}\n{\"stream\":\"Successfully built 4b1b2c7d\\n\"}";
        let (output, _) = render(input);
        assert_eq!(output, "Step 1/2 : FROM busybox\nSuccessfully built 4b1b2c7d\n");
    }

    #[test]
    fn keeps_first_error() {
        let input = concat!(
            "{\"status\":\"Pulling repository nope\"}\n",
            "{\"errorDetail\":{\"message\":\"not found\"},\"error\":\"image nope not found\"}\n",
            "{\"error\":\"second\"}\n",
        );
        let (_, error) = render(input);
        assert_eq!(error.as_deref(), Some("image nope not found"));
    }

    #[test]
    fn passes_through_plain_text_in_chunks() {
        let mut writer = ProgressWriter::new(Vec::<u8>::new());
        writer.write_all(b"Loaded ima").unwrap();
        writer.write_all(b"ge: busybox\n{\"stat").unwrap();
        writer.write_all(b"us\":\"done\"}\n").unwrap();
        let output = writer.finish().unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "Loaded image: busybox\ndone\n");
    }

    #[test]
    fn scanner_copies_untouched_and_fails_on_error() {
        let input = concat!(
            "{\"status\":\"The push refers to repository [docker.io/library/test]\"}\n",
            "{\"errorDetail\":{\"message\":\"unauthorized\"},\"error\":\"unauthorized: authentication required\"}\n",
        );
        let mut output = Vec::<u8>::new();
        let mut scanner = ErrorScanner::new(&mut output);
        for chunk in input.as_bytes().chunks(7) {
            scanner.write_all(chunk).unwrap();
        }
        match scanner.finish() {
            Err(DockerError::Stream(message)) => assert_eq!(message, "unauthorized: authentication required"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(output, input.as_bytes());
    }

    #[test]
    fn scanner_accepts_clean_stream() {
        let mut scanner = ErrorScanner::new(io::sink());
        scanner
            .write_all(b"{\"status\":\"Pulling from library/busybox\"}\n{\"status\":\"Done\"}")
            .unwrap();
        assert!(scanner.finish().is_ok());
    }
}
