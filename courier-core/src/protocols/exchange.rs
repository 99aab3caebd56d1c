use std::collections::HashMap;
use std::time::Duration;

use rst_common::standard::chrono::{self, DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::Value;
use rst_common::with_logging::log::debug;
use rst_common::with_tokio::tokio::sync::RwLock;

use crate::identity::did_of;

use super::types::ExchangeError;

/// `Exchange` is an outbound request waiting for its response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct Exchange {
    pub thid: String,
    pub protocol: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub peer: Option<String>,

    pub request: Value,

    /// Set when the request was sent authenticated, the response must then be too
    #[serde(default)]
    pub authenticated: bool,

    #[serde(rename = "openedAt")]
    pub opened_at: DateTime<Utc>,

    #[serde(rename = "expiresAt")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Exchange {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|expires| expires <= now).unwrap_or(false)
    }

    /// `accepts` checks a response sender against the peer the request was sent to
    ///
    /// `from` is the claimed sender, `sender_kid` the key that authenticated the
    /// envelope, if any
    pub fn accepts(
        &self,
        from: Option<&str>,
        sender_kid: Option<&str>,
    ) -> Result<(), ExchangeError> {
        let peer = match &self.peer {
            Some(peer) => did_of(peer),
            None => return Ok(()),
        };

        let claimed = from.map(did_of);
        if claimed != Some(peer) {
            return Err(ExchangeError::PeerMismatch(format!(
                "{}: expected {}, got {}",
                self.thid,
                peer,
                claimed.unwrap_or("none")
            )));
        }

        if self.authenticated && sender_kid.map(did_of) != Some(peer) {
            return Err(ExchangeError::Unauthenticated(self.thid.clone()));
        }

        Ok(())
    }
}

/// `ExchangeStore` keeps open exchanges keyed by their thread id
///
/// A thread is closed at most once, a second response to the same thread
/// is reported as an unknown thread
#[derive(Default)]
pub struct ExchangeStore {
    exchanges: RwLock<HashMap<String, Exchange>>,
    ttl: Option<Duration>,
}

impl ExchangeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            exchanges: RwLock::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    pub async fn open(
        &self,
        thid: &str,
        protocol: &str,
        peer: Option<&str>,
        request: Value,
    ) -> Result<Exchange, ExchangeError> {
        self.insert(thid, protocol, peer, request, false).await
    }

    /// `open_authenticated` opens an exchange only an authenticated peer response can close
    pub async fn open_authenticated(
        &self,
        thid: &str,
        protocol: &str,
        peer: &str,
        request: Value,
    ) -> Result<Exchange, ExchangeError> {
        self.insert(thid, protocol, Some(peer), request, true).await
    }

    async fn insert(
        &self,
        thid: &str,
        protocol: &str,
        peer: Option<&str>,
        request: Value,
        authenticated: bool,
    ) -> Result<Exchange, ExchangeError> {
        let now = Utc::now();
        let mut exchanges = self.exchanges.write().await;
        exchanges.retain(|_, exchange| !exchange.is_expired(now));

        if exchanges.contains_key(thid) {
            return Err(ExchangeError::ThreadAlreadyOpen(thid.to_string()));
        }

        let expires_at = self
            .ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .map(|ttl| now + ttl);

        let exchange = Exchange {
            thid: thid.to_string(),
            protocol: protocol.to_string(),
            peer: peer.map(|val| val.to_string()),
            request,
            authenticated,
            opened_at: now,
            expires_at,
        };

        debug!("opening {} exchange {}", protocol, thid);
        exchanges.insert(thid.to_string(), exchange.clone());
        Ok(exchange)
    }

    pub async fn get(&self, thid: &str) -> Option<Exchange> {
        let exchanges = self.exchanges.read().await;
        exchanges.get(thid).cloned()
    }

    /// `close` removes the exchange and hands it back to the caller
    ///
    /// An expired exchange is removed as well, but reported as [`ExchangeError::Expired`]
    pub async fn close(&self, thid: &str) -> Result<Exchange, ExchangeError> {
        let mut exchanges = self.exchanges.write().await;
        let exchange = exchanges
            .remove(thid)
            .ok_or(ExchangeError::UnknownThread(thid.to_string()))?;

        if exchange.is_expired(Utc::now()) {
            return Err(ExchangeError::Expired(thid.to_string()));
        }

        debug!("closing {} exchange {}", exchange.protocol, thid);
        Ok(exchange)
    }

    /// `correlate` closes the exchange answered by a response from `from`
    ///
    /// A response the exchange doesn't accept leaves the exchange open, the
    /// expected peer may still answer
    pub async fn correlate(
        &self,
        thid: &str,
        from: Option<&str>,
        sender_kid: Option<&str>,
    ) -> Result<Exchange, ExchangeError> {
        let mut exchanges = self.exchanges.write().await;
        let exchange = exchanges
            .get(thid)
            .ok_or(ExchangeError::UnknownThread(thid.to_string()))?;

        if exchange.is_expired(Utc::now()) {
            let _ = exchanges.remove(thid);
            return Err(ExchangeError::Expired(thid.to_string()));
        }

        exchange.accepts(from, sender_kid)?;

        let exchange = exchanges
            .remove(thid)
            .ok_or(ExchangeError::UnknownThread(thid.to_string()))?;

        debug!("closing {} exchange {}", exchange.protocol, thid);
        Ok(exchange)
    }

    /// `gc` drops every exchange expired at `now` and returns how many were dropped
    pub async fn gc(&self, now: DateTime<Utc>) -> usize {
        let mut exchanges = self.exchanges.write().await;
        let before = exchanges.len();
        exchanges.retain(|_, exchange| !exchange.is_expired(now));
        before - exchanges.len()
    }

    pub async fn len(&self) -> usize {
        self.exchanges.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.exchanges.read().await.is_empty()
    }
}
