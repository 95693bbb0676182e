//! `RelayServer` builder and server loop.
//!
//! This is the entry point for running a relay. It ties together all the
//! layers: transport → protocol → router → session registry.

use std::sync::Arc;
use std::time::Duration;

use relayforge_protocol::{Codec, JsonCodec};
use relayforge_session::{RandomSource, SessionRegistry};
use relayforge_transport::{Transport, WebSocketTransport};

use crate::RelayError;
use crate::config::ServerConfig;
use crate::handler::establish_and_handle;
use crate::outbox::Outbox;
use crate::router::Router;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. All
/// interior mutability lives inside the registry and the outbox.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) router: Arc<Router>,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Option<Duration>,
    pub(crate) handshake_timeout: Duration,
}

/// How long an accepted socket may take to complete its WebSocket upgrade.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Builder for configuring and starting a relay.
///
/// # Example
///
/// ```rust,no_run
/// use relayforge::prelude::*;
///
/// # async fn start() -> Result<(), RelayError> {
/// let server = RelayServer::builder()
///     .bind("0.0.0.0:3000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct RelayServerBuilder {
    bind_addr: String,
    idle_timeout: Option<Duration>,
    handshake_timeout: Duration,
    registry: Arc<SessionRegistry>,
}

impl RelayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::from_config(&ServerConfig::default())
    }

    /// Creates a builder from process configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            bind_addr: config.bind_addr(),
            idle_timeout: config.idle_timeout,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            registry: Arc::new(SessionRegistry::default()),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Closes connections that stay silent for `timeout`.
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Drops sockets that haven't finished the WebSocket upgrade within
    /// `timeout`.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Uses a fresh registry drawing from `random` for session ids and the
    /// creator's coin flip.
    pub fn random_source(mut self, random: impl RandomSource) -> Self {
        self.registry = Arc::new(SessionRegistry::new(random));
        self
    }

    /// Binds the listener and wires the layers together.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<RelayServer<JsonCodec>, RelayError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let router = Router::new(self.registry, Arc::new(Outbox::new()));
        let state = Arc::new(ServerState {
            router: Arc::new(router),
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
            handshake_timeout: self.handshake_timeout,
        });

        Ok(RelayServer { transport, state })
    }
}

impl Default for RelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound relay server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RelayServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl RelayServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }
}

impl<C: Codec> RelayServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The session registry this server routes through.
    pub fn registry(&self) -> Arc<SessionRegistry> {
        Arc::clone(self.state.router.registry())
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a task per accepted socket; the WebSocket handshake runs on
    /// that task, never in this loop. A failed accept is logged and the
    /// loop carries on. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), RelayError> {
        tracing::info!("relay server running");

        loop {
            match self.transport.accept().await {
                Ok(pending) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = establish_and_handle(pending, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
