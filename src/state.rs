//! Shared application state
//!
//! Every dependency is constructed here and passed to handlers through
//! `State<Arc<AppState>>`; there are no process-wide singletons.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::core::orchestrator::Orchestrator;
use crate::core::session::SessionStore;
use crate::core::speech::{GoogleSpeechClient, SpeechGateway};

/// Reason a WebSocket connection slot could not be acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionLimitError {
    GlobalLimitReached,
    PerIpLimitReached,
}

/// Application state shared by all handlers
#[derive(Debug)]
pub struct AppState {
    pub config: ServerConfig,
    pub sessions: Arc<SessionStore>,
    pub orchestrator: Arc<Orchestrator>,
    pub speech: SpeechGateway,

    ws_connections: AtomicUsize,
    ip_connections: DashMap<IpAddr, usize>,
}

impl AppState {
    /// Build the state, creating the Google speech client when a key is configured.
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let speech = match config.google_speech_config() {
            Some(speech_config) => match GoogleSpeechClient::new(speech_config) {
                Ok(client) => SpeechGateway::new(Arc::new(client)),
                Err(e) => {
                    warn!(error = %e, "Failed to initialize speech client, running degraded");
                    SpeechGateway::unconfigured()
                }
            },
            None => {
                info!("GOOGLE_API_KEY not set, speech runs with stand-in output");
                SpeechGateway::unconfigured()
            }
        };

        Self::with_parts(config, Arc::new(Orchestrator::new()), speech)
    }

    /// Build the state from explicit collaborators.
    pub fn with_parts(
        config: ServerConfig,
        orchestrator: Arc<Orchestrator>,
        speech: SpeechGateway,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            sessions: Arc::new(SessionStore::new()),
            orchestrator,
            speech,
            ws_connections: AtomicUsize::new(0),
            ip_connections: DashMap::new(),
        })
    }

    /// Reserve a WebSocket slot for `ip`, honoring the global and per-IP caps.
    pub fn try_acquire_connection(&self, ip: IpAddr) -> Result<(), ConnectionLimitError> {
        let result = self.acquire_locked(ip);
        if result.is_err() {
            self.ip_connections.remove_if(&ip, |_, count| *count == 0);
        }
        result
    }

    fn acquire_locked(&self, ip: IpAddr) -> Result<(), ConnectionLimitError> {
        // Per-IP entry lock is held while the global counter is updated
        let mut per_ip = self.ip_connections.entry(ip).or_insert(0);
        if *per_ip >= self.config.max_connections_per_ip as usize {
            return Err(ConnectionLimitError::PerIpLimitReached);
        }

        match self.config.max_websocket_connections {
            Some(max) => {
                self.ws_connections
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                        (current < max).then_some(current + 1)
                    })
                    .map_err(|_| ConnectionLimitError::GlobalLimitReached)?;
            }
            None => {
                self.ws_connections.fetch_add(1, Ordering::AcqRel);
            }
        }

        *per_ip += 1;
        Ok(())
    }

    /// Return a slot obtained from [`AppState::try_acquire_connection`].
    pub fn release_connection(&self, ip: IpAddr) {
        let _ = self
            .ws_connections
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_sub(1)
            });

        if let Some(mut count) = self.ip_connections.get_mut(&ip) {
            *count = count.saturating_sub(1);
        }
        self.ip_connections.remove_if(&ip, |_, count| *count == 0);
    }

    pub fn ws_connection_count(&self) -> usize {
        self.ws_connections.load(Ordering::Acquire)
    }

    pub fn ip_connection_count(&self, ip: &IpAddr) -> usize {
        self.ip_connections.get(ip).map(|count| *count).unwrap_or(0)
    }
}

/// Releases a connection slot when dropped
pub struct ConnectionSlot {
    state: Arc<AppState>,
    ip: IpAddr,
}

impl ConnectionSlot {
    /// Take ownership of a slot that was already acquired for `ip`.
    pub fn new(state: Arc<AppState>, ip: IpAddr) -> Self {
        Self { state, ip }
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.state.release_connection(self.ip);
    }
}
