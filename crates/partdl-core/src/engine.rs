//! Resumable download engine
//!
//! One `DownloadSession` per file. The session is a pull-driven sequence:
//! each call to [`DownloadSession::next_event`] advances the transfer by at
//! most one chunk and returns one progress event, or `None` once the
//! destination file is in place. Progress lives in the partial file itself
//! (`<destination>.part_<expected_size>`), so a restarted process resumes
//! from the partial file's on-disk length rather than from in-memory state.
//!
//! Transient network failures are retried indefinitely after a fixed delay;
//! each retry surfaces as a stalled event so the consumer can report it.
//! Cancellation is abandonment: stop pulling and drop the session, the
//! partial file stays for the next attempt. Running two sessions against
//! the same destination concurrently is not supported.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::{CONTENT_LENGTH, RANGE};
use reqwest::{Client, Response};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use partdl_types::{DownloadTarget, ProgressEvent};

use crate::error::{DownloadError, Result};

pub const DEFAULT_CHUNK_SIZE: u64 = 1_000_000;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Tuning knobs for a download session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Bytes accumulated before each durable write (and progress event).
    pub chunk_size: u64,
    /// Fixed pause between retries. No exponential growth, no retry cap.
    pub retry_delay: Duration,
    pub connect_timeout: Duration,
    /// Per-read stall timeout; there is no overall download timeout.
    pub read_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            retry_delay: DEFAULT_RETRY_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// A resumable download of one file.
#[derive(Debug)]
pub struct DownloadSession {
    client: Client,
    target: DownloadTarget,
    config: SessionConfig,
    expected_size: u64,
    part_path: PathBuf,
    /// Append handle, opened once per session on first write.
    file: Option<File>,
    /// In-flight range response, if a connection is open.
    conn: Option<Response>,
    /// Bytes received but not yet written to the partial file.
    pending: Vec<u8>,
    /// Resume offset: length of the partial file, mirrored in memory.
    offset: u64,
    /// The server ended the stream; decide on the next pull whether that
    /// was completion or an early close.
    eof: bool,
    /// Sleep for `retry_delay` before the next reconnect.
    backoff: bool,
    finished: bool,
}

impl DownloadSession {
    /// Start a download session: pre-flight checks and the size probe.
    ///
    /// Fails before any network call when the destination already exists,
    /// and with [`DownloadError::UnknownSize`]
    /// when the server does not report a content length. Transport errors
    /// here are fatal — an unreachable server surfaces before any data
    /// transfer begins.
    pub async fn start(target: DownloadTarget, config: SessionConfig) -> Result<Self> {
        if fs::try_exists(&target.destination).await? {
            return Err(DownloadError::AlreadyExists(target.destination.clone()));
        }

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()?;

        let expected_size = probe_size(&client, &target.url).await?;
        let part_path = target.part_path(expected_size);
        info!(url = %target.url, size = expected_size, "starting download session");

        Ok(Self {
            client,
            target,
            config,
            expected_size,
            part_path,
            file: None,
            conn: None,
            pending: Vec::new(),
            offset: 0,
            eof: false,
            backoff: false,
            finished: false,
        })
    }

    /// Total size declared by the server at session start.
    pub fn expected_size(&self) -> u64 {
        self.expected_size
    }

    /// Path of the partial file this session accumulates into.
    pub fn part_path(&self) -> &Path {
        &self.part_path
    }

    /// Pull the next progress event, or `None` once the download is
    /// complete and the destination file is in place.
    ///
    /// Returns `Err` only for fatal conditions (size mismatch, file I/O);
    /// network failures come back as stalled events and are retried after
    /// the configured delay, indefinitely.
    pub async fn next_event(&mut self) -> Result<Option<ProgressEvent>> {
        loop {
            if self.finished {
                return Ok(None);
            }

            let chunk = match self.conn.as_mut() {
                Some(conn) => conn.chunk().await,
                None => {
                    if self.eof {
                        self.eof = false;
                        if self.offset >= self.expected_size {
                            self.finalize().await?;
                            return Ok(None);
                        }
                        self.backoff = true;
                        warn!(offset = self.offset, "server closed the connection early");
                        return Ok(Some(self.stalled(
                            "connection closed before the requested range was complete",
                        )));
                    }

                    if self.backoff {
                        tokio::time::sleep(self.config.retry_delay).await;
                        self.backoff = false;
                    }

                    // The partial file is the authority on where to resume.
                    self.offset = self.part_len().await?;
                    if self.offset >= self.expected_size {
                        self.finalize().await?;
                        return Ok(None);
                    }

                    match self.connect().await {
                        Ok(response) => {
                            self.conn = Some(response);
                        }
                        Err(err) => {
                            self.backoff = true;
                            warn!(error = %err, "request failed, will retry");
                            return Ok(Some(self.stalled(err.to_string())));
                        }
                    }
                    continue;
                }
            };

            match chunk {
                Ok(Some(data)) => {
                    self.pending.extend_from_slice(&data);
                    if (self.pending.len() as u64) < self.config.chunk_size {
                        continue;
                    }
                    self.write_pending().await?;
                    return Ok(Some(self.progressed()));
                }
                Ok(None) => {
                    self.conn = None;
                    self.eof = true;
                    if !self.pending.is_empty() {
                        self.write_pending().await?;
                        return Ok(Some(self.progressed()));
                    }
                    // Next iteration decides: complete or closed early.
                }
                Err(err) => {
                    // Unwritten bytes are dropped; the range re-requested
                    // after the backoff starts at the durable offset.
                    self.pending.clear();
                    self.conn = None;
                    self.backoff = true;
                    warn!(error = %err, offset = self.offset, "read failed, will retry");
                    return Ok(Some(self.stalled(err.to_string())));
                }
            }
        }
    }

    async fn connect(&mut self) -> std::result::Result<Response, reqwest::Error> {
        debug!(offset = self.offset, "requesting byte range");
        let range = format!("bytes={}-{}", self.offset, self.expected_size - 1);
        let response = self
            .client
            .get(&self.target.url)
            .header(RANGE, range)
            .send()
            .await?
            .error_for_status()?;
        Ok(response)
    }

    /// Append the pending buffer to the partial file and make it durable
    /// before the progress event is reported.
    async fn write_pending(&mut self) -> Result<()> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.part_path)
                .await?;
            self.file = Some(file);
        }
        if let Some(file) = self.file.as_mut() {
            file.write_all(&self.pending).await?;
            file.sync_data().await?;
        }
        self.offset += self.pending.len() as u64;
        self.pending.clear();
        Ok(())
    }

    /// Verify the partial file's size and move it into place.
    async fn finalize(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            file.sync_all().await?;
        }
        if self.expected_size == 0 && !fs::try_exists(&self.part_path).await? {
            // Nothing was ever written; the destination is an empty file.
            File::create(&self.part_path).await?;
        }

        let actual = self.part_len().await?;
        if actual != self.expected_size {
            return Err(DownloadError::SizeMismatch {
                expected: self.expected_size,
                actual,
            });
        }

        fs::rename(&self.part_path, &self.target.destination).await?;
        self.finished = true;
        info!(destination = %self.target.destination.display(), "download complete");
        Ok(())
    }

    async fn part_len(&self) -> Result<u64> {
        match fs::metadata(&self.part_path).await {
            Ok(meta) => Ok(meta.len()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(0),
            Err(err) => Err(err.into()),
        }
    }

    fn progressed(&self) -> ProgressEvent {
        ProgressEvent {
            bytes_so_far: self.offset,
            total_bytes: self.expected_size,
            error: None,
        }
    }

    fn stalled(&self, message: impl Into<String>) -> ProgressEvent {
        ProgressEvent {
            bytes_so_far: self.offset,
            total_bytes: self.expected_size,
            error: Some(message.into()),
        }
    }
}

/// Ask the server for the resource's size without transferring data.
///
/// A missing or unparsable Content-Length is a fatal precondition failure:
/// without it neither the partial-file name nor the completion check is
/// well-defined.
pub async fn probe_size(client: &Client, url: &str) -> Result<u64> {
    let response = client.head(url).send().await?.error_for_status()?;
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| DownloadError::UnknownSize(url.to_string()))
}
