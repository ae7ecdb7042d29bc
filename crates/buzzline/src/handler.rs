//! Per-connection task.
//!
//! Each accepted socket gets a reader loop (decode, route through the
//! lobby) and a writer task that drains the connection's outbound queue.
//! Rooms hold clones of the queue's sender, so the writer is stopped
//! explicitly when the reader ends.

use std::sync::Arc;

use buzzline_protocol::{ClientEvent, Codec, ServerEvent};
use buzzline_room::ContentProvider;
use buzzline_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::lobby::ClientContext;
use crate::server::ServerState;
use crate::BuzzlineError;

pub(crate) async fn handle_connection<P, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<P, C>>,
) -> Result<(), BuzzlineError>
where
    P: ContentProvider,
    C: Codec,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(conn = %conn_id, "handling new connection");

    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_loop(Arc::clone(&conn), Arc::clone(&state), rx));

    let mut ctx = ClientContext::new(conn_id, tx);
    let result = read_loop(&conn, &state, &mut ctx).await;

    state.lobby.disconnect(&ctx).await;
    writer.abort();
    tracing::debug!(conn = %conn_id, room = ?ctx.attached(), "connection finished");
    result
}

async fn read_loop<P, C>(
    conn: &WebSocketConnection,
    state: &ServerState<P, C>,
    ctx: &mut ClientContext,
) -> Result<(), BuzzlineError>
where
    P: ContentProvider,
    C: Codec,
{
    loop {
        let data = match conn.recv().await? {
            Some(data) => data,
            None => {
                tracing::info!(conn = %ctx.id(), "connection closed");
                return Ok(());
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(conn = %ctx.id(), error = %e, "undecodable frame ignored");
                continue;
            }
        };
        tracing::trace!(conn = %ctx.id(), event = event.name(), "client event");
        state.lobby.route(ctx, event).await;
    }
}

async fn write_loop<P, C>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<P, C>>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
) where
    P: ContentProvider,
    C: Codec,
{
    while let Some(event) = rx.recv().await {
        let bytes = match state.codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(conn = %conn.id(), error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(conn = %conn.id(), error = %e, "send failed, stopping writer");
            break;
        }
    }
}
