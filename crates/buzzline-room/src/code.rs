//! Room code generation.

use buzzline_protocol::RoomCode;
use rand::Rng;

/// Six uniform characters from `A..=Z`.
///
/// Collisions are the registry's problem; this only draws.
pub fn random_room_code() -> RoomCode {
    let mut rng = rand::rng();
    let code: String = (0..RoomCode::LEN)
        .map(|_| char::from(rng.random_range(b'A'..=b'Z')))
        .collect();
    RoomCode::from(code)
}
