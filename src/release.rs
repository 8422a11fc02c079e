//! Release publishing through the GitHub CLI.
//!
//! Uploads go out as one `gh release upload --clobber` batch. Clobbering makes
//! a repeated upload idempotent, so the batch is retried as a whole on
//! transient failures.

use crate::deps::{CommandExecutor, CommandLine, command_succeeds, run_checked};
use crate::error::{ReleaseError, Result};
use camino::Utf8PathBuf;
use log::{info, warn};
use std::thread;
use std::time::Duration;

/// Number of upload attempts before giving up.
pub const UPLOAD_ATTEMPTS: u32 = 5;

/// Environment variable the GitHub CLI reads its token from.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Bounded retry with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: UPLOAD_ATTEMPTS,
            delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Retry up to `attempts` times (at least once), sleeping `delay` in
    /// between.
    #[must_use]
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Maximum number of attempts.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent.
    ///
    /// # Errors
    ///
    /// Returns a non-retryable error unchanged, or
    /// [`ReleaseError::UploadFailed`] wrapping the last error once every
    /// attempt has failed.
    pub fn run<T>(&self, mut operation: impl FnMut(u32) -> Result<T>) -> Result<T> {
        let mut attempt = 1;
        loop {
            match operation(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) if attempt >= self.attempts => {
                    return Err(ReleaseError::UploadFailed {
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
                Err(err) => {
                    warn!("attempt {attempt}/{} failed: {err}", self.attempts);
                    if !self.delay.is_zero() {
                        thread::sleep(self.delay);
                    }
                    attempt += 1;
                }
            }
        }
    }
}

/// Publishes artefacts to a GitHub release.
pub struct ReleasePublisher<'a> {
    executor: &'a dyn CommandExecutor,
    token: Option<String>,
    retry: RetryPolicy,
}

impl<'a> ReleasePublisher<'a> {
    /// Create a publisher. When `token` is set it is exported as
    /// `GITHUB_TOKEN` for every `gh` call.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor, token: Option<String>) -> Self {
        Self {
            executor,
            token,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the default retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Create the release for `ref_name` unless it already exists.
    ///
    /// `create_options` are passed verbatim to `gh release create`.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Release`] if the release is missing and cannot
    /// be created.
    pub fn ensure_release_exists(&self, ref_name: &str, create_options: &[String]) -> Result<()> {
        let view = self.gh().args(["release", "view", ref_name]);
        if command_succeeds(self.executor, &view) {
            info!("release {ref_name} already exists");
            return Ok(());
        }

        let create = self
            .gh()
            .args(["release", "create", ref_name])
            .args(create_options.iter().map(String::as_str));
        run_checked(self.executor, &create)
            .map(drop)
            .map_err(|err| ReleaseError::Release {
                operation: "create",
                message: err.to_string(),
            })?;
        info!("release {ref_name} created");
        Ok(())
    }

    /// Upload `artefacts` to the release for `ref_name`, replacing assets with
    /// the same name.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::UploadFailed`] once every attempt has failed.
    pub fn publish(&self, artefacts: &[Utf8PathBuf], ref_name: &str) -> Result<()> {
        if artefacts.is_empty() {
            warn!("no artefacts to upload");
            return Ok(());
        }

        let upload = self
            .gh()
            .args(["release", "upload", ref_name])
            .args(artefacts.iter().map(|path| path.as_str()))
            .arg("--clobber");

        self.retry.run(|attempt| {
            info!("uploading {} file(s), attempt {attempt}", artefacts.len());
            run_checked(self.executor, &upload).map(drop)
        })?;
        info!("file upload successfully");
        Ok(())
    }

    fn gh(&self) -> CommandLine {
        let command = CommandLine::new("gh");
        match &self.token {
            Some(token) => command.env(TOKEN_ENV, token.as_str()),
            None => command,
        }
    }
}
