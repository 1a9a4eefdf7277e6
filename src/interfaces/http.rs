use std::io;
use std::time::Duration;

use thiserror::Error;
use ureq::tls::{TlsConfig, TlsProvider};
use ureq::Agent;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Request(#[from] ureq::Error),
    #[error("fetch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        match self {
            FetchError::Request(ureq::Error::Timeout(_)) => true,
            FetchError::Request(ureq::Error::Io(e)) => {
                matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

/// Timeout-bounded HTTP GET client shared by all devices
///
/// Requests run on tokio's blocking pool so a slow device never stalls the runtime.
/// Cloning is cheap and shares the connection pool.
#[derive(Clone)]
pub struct HttpFetcher {
    agent: Agent,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .tls_config(TlsConfig::builder().provider(TlsProvider::NativeTls).build())
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self { agent, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url` and return its body; non-2xx statuses are errors
    pub async fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let agent = self.agent.clone();
        let url = url.to_string();
        tokio::task::spawn_blocking(move || {
            log::trace!("GET {url}");
            let mut response = agent.get(&url).call()?;
            let status = response.status().as_u16();
            let body = response.body_mut().read_to_string()?;
            Ok(FetchResponse { status, body })
        })
        .await?
    }
}
