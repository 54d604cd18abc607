//! Subprocess path: pipes the external downloader's stdout to the client.
//!
//! The child is spawned with `kill_on_drop`, so dropping the body stream
//! (a disconnected client) terminates it. Stderr is drained by a separate
//! task for the lifetime of the process.

use std::path::PathBuf;
use std::process::Stdio;

use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

use crate::extractor::DEFAULT_YTDLP_BINARY;
use crate::resolver::download_selection;
use crate::user_agent::BROWSER_USER_AGENT;

use super::{CHUNK_SIZE, StreamError};

/// Launches the downloader and exposes its output as a byte stream.
#[derive(Debug, Clone)]
pub struct SubprocessDownloader {
    binary: PathBuf,
}

impl SubprocessDownloader {
    /// Creates a downloader running the given executable.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, url: &str, format_id: &str) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg("-f")
            .arg(download_selection(format_id))
            .arg("-o")
            .arg("-")
            .arg("--no-part")
            .arg("--no-progress")
            .arg("--no-warnings")
            .arg("--user-agent")
            .arg(BROWSER_USER_AGENT)
            .arg("--")
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    /// Spawns the downloader for `format_id` and streams its stdout.
    ///
    /// The stream ends cleanly only after stdout is drained and the process
    /// exited zero. A non-zero exit is yielded as a final
    /// [`StreamError::SubprocessFailure`] carrying the captured stderr.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Spawn`] when the process cannot be started.
    #[instrument(skip(self), fields(downloader = %self.binary.display()))]
    pub fn spawn(
        &self,
        url: &str,
        format_id: &str,
    ) -> Result<BoxStream<'static, Result<Bytes, StreamError>>, StreamError> {
        let program = self.binary.display().to_string();
        let mut child = self
            .command(url, format_id)
            .spawn()
            .map_err(|source| StreamError::Spawn {
                program: program.clone(),
                source,
            })?;
        debug!(pid = ?child.id(), "Downloader started");

        let stdout = child.stdout.take().ok_or_else(|| StreamError::Spawn {
            program: program.clone(),
            source: std::io::Error::other("stdout was not captured"),
        })?;
        let stderr_task = child.stderr.take().map(|stderr| tokio::spawn(drain(stderr)));

        let pipe = Pipe {
            child,
            stdout,
            stderr_task,
            program,
            finished: false,
        };
        Ok(stream::unfold(pipe, Pipe::next_item).boxed())
    }
}

impl Default for SubprocessDownloader {
    fn default() -> Self {
        Self::new(DEFAULT_YTDLP_BINARY)
    }
}

struct Pipe {
    child: Child,
    stdout: ChildStdout,
    stderr_task: Option<JoinHandle<String>>,
    program: String,
    finished: bool,
}

impl Pipe {
    async fn next_item(mut self) -> Option<(Result<Bytes, StreamError>, Self)> {
        if self.finished {
            return None;
        }

        let mut buf = BytesMut::zeroed(CHUNK_SIZE);
        match self.stdout.read(&mut buf).await {
            Ok(0) => {
                self.finished = true;
                let outcome = self.finish().await;
                outcome.err().map(|error| (Err(error), self))
            }
            Ok(n) => {
                buf.truncate(n);
                Some((Ok(buf.freeze()), self))
            }
            Err(source) => {
                self.finished = true;
                let error = StreamError::Spawn {
                    program: self.program.clone(),
                    source,
                };
                Some((Err(error), self))
            }
        }
    }

    /// Reaps the process after stdout closed.
    async fn finish(&mut self) -> Result<(), StreamError> {
        let status = self.child.wait().await.map_err(|source| StreamError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        let stderr = match self.stderr_task.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if status.success() {
            debug!("Downloader finished");
            return Ok(());
        }
        error!(code = ?status.code(), stderr = %stderr, "Downloader exited non-zero");
        Err(StreamError::SubprocessFailure {
            code: status.code(),
            stderr,
        })
    }
}

async fn drain(mut reader: impl AsyncRead + Unpin) -> String {
    let mut captured = Vec::new();
    if let Err(error) = reader.read_to_end(&mut captured).await {
        debug!(error = %error, "Stopped reading downloader stderr");
    }
    String::from_utf8_lossy(&captured).trim().to_string()
}
