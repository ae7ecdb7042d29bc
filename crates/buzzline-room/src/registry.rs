//! The registry of live rooms.

use std::collections::HashMap;
use std::sync::Arc;

use buzzline_protocol::RoomCode;
use tokio::sync::Mutex;

use crate::code::random_room_code;
use crate::room::spawn_room;
use crate::{ContentProvider, MatchConfig, RoomHandle};

/// Live rooms by code. Shared with every room actor so a room can remove
/// itself when it tears down.
pub(crate) type RoomTable = Arc<Mutex<HashMap<RoomCode, RoomHandle>>>;

/// Creates, finds, and destroys rooms.
///
/// Cloning is cheap; every clone sees the same rooms.
pub struct RoomRegistry<P> {
    rooms: RoomTable,
    provider: Arc<P>,
    config: MatchConfig,
}

impl<P> Clone for RoomRegistry<P> {
    fn clone(&self) -> Self {
        Self {
            rooms: Arc::clone(&self.rooms),
            provider: Arc::clone(&self.provider),
            config: self.config.clone(),
        }
    }
}

impl<P: ContentProvider> RoomRegistry<P> {
    pub fn new(provider: P, config: MatchConfig) -> Self {
        Self::with_provider(Arc::new(provider), config)
    }

    pub fn with_provider(provider: Arc<P>, config: MatchConfig) -> Self {
        Self {
            rooms: Arc::new(Mutex::new(HashMap::new())),
            provider,
            config: config.validated(),
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Opens a room under a fresh random code.
    pub async fn create_room(&self) -> RoomCode {
        self.create_room_with(random_room_code).await
    }

    /// Opens a room, drawing codes from `codes` until one is free.
    ///
    /// The free check and the insert happen under one lock, so two
    /// concurrent creates can never share a code.
    pub async fn create_room_with(&self, mut codes: impl FnMut() -> RoomCode) -> RoomCode {
        let mut rooms = self.rooms.lock().await;
        let mut code = codes();
        while rooms.contains_key(&code) {
            tracing::debug!(room = %code, "room code collision, drawing again");
            code = codes();
        }

        let handle = spawn_room(
            code.clone(),
            Arc::clone(&self.provider),
            self.config.clone(),
            Arc::clone(&self.rooms),
        );
        rooms.insert(code.clone(), handle);
        tracing::info!(room = %code, rooms = rooms.len(), "room created");
        code
    }

    pub async fn find(&self, code: &RoomCode) -> Option<RoomHandle> {
        self.rooms.lock().await.get(code).cloned()
    }

    /// Removes a room and tells its actor to stop. Returns `false` if no
    /// such room was live; calling it twice is harmless.
    pub async fn destroy(&self, code: &RoomCode) -> bool {
        let removed = self.rooms.lock().await.remove(code);
        match removed {
            Some(handle) => {
                handle.try_shutdown();
                tracing::info!(room = %code, "room destroyed");
                true
            }
            None => false,
        }
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    pub async fn room_codes(&self) -> Vec<RoomCode> {
        let mut codes: Vec<RoomCode> = self.rooms.lock().await.keys().cloned().collect();
        codes.sort();
        codes
    }
}
