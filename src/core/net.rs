// src/core/net.rs
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use thiserror::Error;

use crate::identity::Identity;

/// Raw result of a GET that reached the server.
#[derive(Clone, Debug)]
pub struct Fetched {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Fetched {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("request timed out")]
    Timeout,
    #[error("{0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// GET `url` as `identity`. Non-2xx statuses are returned, not raised; the
/// pipeline decides what they mean.
pub trait Fetcher {
    fn fetch(&mut self, url: &str, identity: &Identity, timeout: Duration)
        -> Result<Fetched, TransportError>;
}

/// `reqwest` fetcher holding one client per identity.
///
/// A new identity serial means a new `Client`: new connection pool, new
/// cookie jar seeded from the identity. Cookies the server sets along the
/// way stay in that jar until the identity is rotated out.
#[derive(Default)]
pub struct HttpFetcher {
    active: Option<(u64, Client)>,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn client_for(&mut self, identity: &Identity, url: &Url) -> Result<&Client, TransportError> {
        let stale = !matches!(&self.active, Some((serial, _)) if *serial == identity.serial());
        if stale {
            tracing::debug!(serial = identity.serial(), "building client for new identity");
            self.active = Some((identity.serial(), build_client(identity, url)?));
        }
        match &self.active {
            Some((_, client)) => Ok(client),
            None => Err(TransportError::Request("no client".into())),
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&mut self, url: &str, identity: &Identity, timeout: Duration)
        -> Result<Fetched, TransportError>
    {
        let parsed = Url::parse(url).map_err(|e| TransportError::Request(format!("bad url {url}: {e}")))?;
        let client = self.client_for(identity, &parsed)?;

        let resp = client.get(parsed).timeout(timeout).send()?;
        let status = resp.status().as_u16();
        let body = resp.bytes()?.to_vec();
        Ok(Fetched { status, body })
    }
}

fn build_client(identity: &Identity, url: &Url) -> Result<Client, TransportError> {
    let mut headers = HeaderMap::new();
    for (name, value) in identity.headers() {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| TransportError::Request(format!("header {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| TransportError::Request(format!("header value: {e}")))?;
        headers.insert(name, value);
    }

    // Path=/ so every calendar path on the host receives them
    let jar = Jar::default();
    for (name, value) in identity.cookies() {
        jar.add_cookie_str(&format!("{name}={value}; Path=/"), url);
    }

    Ok(Client::builder()
        .default_headers(headers)
        .cookie_provider(Arc::new(jar))
        .gzip(true)
        .build()?)
}
