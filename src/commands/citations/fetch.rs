use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{info, warn};

use crate::http::{RetryPolicy, browser_headers, build_client, is_transient_status};
use crate::util::pause;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url} returned {status} after {attempts} attempt(s)")]
    Status {
        url: String,
        status: StatusCode,
        attempts: u32,
    },
    #[error("request to {url} failed after {attempts} attempt(s)")]
    Transport {
        url: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to store download from {url}")]
    Storage {
        url: String,
        #[source]
        source: io::Error,
    },
}

/// A downloaded PDF living in a temporary file.
///
/// The file is removed when the value is dropped; [`FetchedDocument::cleanup`]
/// does the same but surfaces removal errors.
#[derive(Debug)]
pub struct FetchedDocument {
    url: String,
    file: NamedTempFile,
}

impl FetchedDocument {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn cleanup(self) -> io::Result<()> {
        self.file.close()
    }
}

pub struct DocumentFetcher {
    client: Client,
    policy: RetryPolicy,
    temp_dir: Option<PathBuf>,
}

impl DocumentFetcher {
    pub fn new(timeout: Duration, policy: RetryPolicy) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout, browser_headers("application/pdf"))?,
            policy,
            temp_dir: None,
        })
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// GETs `url`, retrying 500/502/503/504 and connect/timeout failures
    /// within the retry budget. Other statuses fail immediately.
    pub fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.client.get(url).send() {
                Ok(response) if response.status().is_success() => {
                    let document = self.store(url, response, attempt)?;
                    info!(url, attempts = attempt, "downloaded document");
                    return Ok(document);
                }
                Ok(response) => {
                    let status = response.status();
                    if is_transient_status(status) && attempt < max_attempts {
                        let delay = self.policy.delay_for(attempt);
                        warn!(url, status = status.as_u16(), attempt, ?delay, "retrying download");
                        pause(delay);
                        continue;
                    }
                    return Err(FetchError::Status {
                        url: url.to_string(),
                        status,
                        attempts: attempt,
                    });
                }
                Err(err) => {
                    if (err.is_timeout() || err.is_connect()) && attempt < max_attempts {
                        let delay = self.policy.delay_for(attempt);
                        warn!(url, error = %err, attempt, ?delay, "retrying download");
                        pause(delay);
                        continue;
                    }
                    return Err(FetchError::Transport {
                        url: url.to_string(),
                        attempts: attempt,
                        source: err,
                    });
                }
            }
        }
    }

    fn store(
        &self,
        url: &str,
        mut response: Response,
        attempts: u32,
    ) -> Result<FetchedDocument, FetchError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("ivn_citations_").suffix(".pdf");
        let created = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        let mut file = created.map_err(|source| FetchError::Storage {
            url: url.to_string(),
            source,
        })?;

        // A partial body is removed when `file` drops on the error path.
        response
            .copy_to(&mut file)
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                attempts,
                source,
            })?;

        Ok(FetchedDocument {
            url: url.to_string(),
            file,
        })
    }
}
