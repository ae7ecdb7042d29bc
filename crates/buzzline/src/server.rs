//! Server builder and accept loop.

use std::net::SocketAddr;
use std::sync::Arc;

use buzzline_protocol::{Codec, JsonCodec};
use buzzline_room::{ContentProvider, MatchConfig, RoomRegistry};
use buzzline_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::lobby::Lobby;
use crate::BuzzlineError;

/// State shared by every connection task.
pub(crate) struct ServerState<P, C> {
    pub(crate) lobby: Lobby<P>,
    pub(crate) codec: C,
}

/// Configures and binds a [`BuzzlineServer`].
///
/// ```ignore
/// let server = BuzzlineServer::builder()
///     .bind("0.0.0.0:5000")
///     .match_config(MatchConfig::default())
///     .build(ClueBank::load("clues.json").await?)
///     .await?;
/// server.run().await?;
/// ```
pub struct BuzzlineServerBuilder {
    bind_addr: String,
    match_config: MatchConfig,
}

impl BuzzlineServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            match_config: MatchConfig::default(),
        }
    }

    /// Address to listen on. Port 0 picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn match_config(mut self, config: MatchConfig) -> Self {
        self.match_config = config;
        self
    }

    /// Binds the listener and creates an empty room registry.
    pub async fn build<P: ContentProvider>(
        self,
        provider: P,
    ) -> Result<BuzzlineServer<P, JsonCodec>, BuzzlineError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let registry = RoomRegistry::new(provider, self.match_config);

        let state = Arc::new(ServerState {
            lobby: Lobby::new(registry),
            codec: JsonCodec,
        });

        Ok(BuzzlineServer { transport, state })
    }
}

impl Default for BuzzlineServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound server, ready to [`run`](Self::run).
pub struct BuzzlineServer<P, C> {
    transport: WebSocketTransport,
    state: Arc<ServerState<P, C>>,
}

impl BuzzlineServer<(), JsonCodec> {
    pub fn builder() -> BuzzlineServerBuilder {
        BuzzlineServerBuilder::new()
    }
}

impl<P, C> BuzzlineServer<P, C>
where
    P: ContentProvider,
    C: Codec,
{
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// The live rooms. Cloning shares them.
    pub fn registry(&self) -> RoomRegistry<P> {
        self.state.lobby.registry().clone()
    }

    /// Accepts connections until the task is dropped.
    pub async fn run(mut self) -> Result<(), BuzzlineError> {
        tracing::info!(addr = ?self.local_addr().ok(), "buzzline server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }
    }
}
