//! Text protocol exchanged between the two players of a match.
//!
//! Every message is a single line on the wire:
//!
//! - `ALIEN:{"x":..,"y":..,"speed":..}`: an alien destroyed by the sender,
//!   to be re-spawned on the receiver's field
//! - `GAME_OVER`: the sender's session has ended
//! - `PING`: liveness probe, carries no payload
//!
//! The trailing newline is added by the transport, not by [`PeerMessage::encode`].

use serde::{Deserialize, Serialize};
use std::fmt;

pub const ALIEN_TAG: &str = "ALIEN:";
pub const GAME_OVER_TAG: &str = "GAME_OVER";
pub const PING_TAG: &str = "PING";

/// Longest frame accepted from a peer, not counting the newline. An
/// `ALIEN:` frame is well under 100 bytes.
pub const MAX_FRAME_LEN: usize = 1024;

/// Kinematics of a destroyed alien, reused as the template for the alien
/// injected into the opponent's field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlienSpawn {
    pub x: f32,
    pub y: f32,
    pub speed: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PeerMessage {
    Alien(AlienSpawn),
    GameOver,
    Ping,
}

impl PeerMessage {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        match self {
            PeerMessage::Alien(spawn) => {
                let payload = serde_json::to_string(spawn)
                    .map_err(|e| ProtocolError::Encode(e.to_string()))?;
                Ok(format!("{}{}", ALIEN_TAG, payload))
            }
            PeerMessage::GameOver => Ok(GAME_OVER_TAG.to_string()),
            PeerMessage::Ping => Ok(PING_TAG.to_string()),
        }
    }

    /// Parses one frame. Surrounding whitespace (including the line
    /// terminator) is ignored.
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let frame = frame.trim();

        if let Some(payload) = frame.strip_prefix(ALIEN_TAG) {
            let spawn: AlienSpawn = serde_json::from_str(payload)
                .map_err(|e| ProtocolError::MalformedPayload(e.to_string()))?;
            if !(spawn.x.is_finite() && spawn.y.is_finite() && spawn.speed.is_finite()) {
                return Err(ProtocolError::MalformedPayload(
                    "non-finite alien kinematics".to_string(),
                ));
            }
            return Ok(PeerMessage::Alien(spawn));
        }

        match frame {
            GAME_OVER_TAG => Ok(PeerMessage::GameOver),
            PING_TAG => Ok(PeerMessage::Ping),
            other => Err(ProtocolError::UnknownTag(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolError {
    UnknownTag(String),
    MalformedPayload(String),
    Encode(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::UnknownTag(frame) => write!(f, "unrecognized frame: {:?}", frame),
            ProtocolError::MalformedPayload(reason) => {
                write!(f, "malformed alien payload: {}", reason)
            }
            ProtocolError::Encode(reason) => write!(f, "failed to encode message: {}", reason),
        }
    }
}

impl std::error::Error for ProtocolError {}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_alien_roundtrip() {
        let message = PeerMessage::Alien(AlienSpawn {
            x: 100.0,
            y: 50.0,
            speed: 1.5,
        });
        let encoded = message.encode().unwrap();
        assert!(encoded.starts_with(ALIEN_TAG));
        assert!(!encoded.contains('\n'));
        assert_eq!(PeerMessage::decode(&encoded).unwrap(), message);
    }

    #[test]
    fn test_game_over_roundtrip() {
        let encoded = PeerMessage::GameOver.encode().unwrap();
        assert_eq!(encoded, "GAME_OVER");
        assert_eq!(PeerMessage::decode(&encoded).unwrap(), PeerMessage::GameOver);
    }

    #[test]
    fn test_ping_roundtrip() {
        let encoded = PeerMessage::Ping.encode().unwrap();
        assert_eq!(encoded, "PING");
        assert_eq!(PeerMessage::decode(&encoded).unwrap(), PeerMessage::Ping);
    }

    #[test]
    fn test_decode_integer_coordinates() {
        match PeerMessage::decode("ALIEN:{\"x\":100,\"y\":50,\"speed\":1.5}\n").unwrap() {
            PeerMessage::Alien(spawn) => {
                assert_approx_eq!(spawn.x, 100.0);
                assert_approx_eq!(spawn.y, 50.0);
                assert_approx_eq!(spawn.speed, 1.5);
            }
            other => panic!("Wrong message after decode: {:?}", other),
        }
    }

    #[test]
    fn test_decode_unknown_tag() {
        assert!(matches!(
            PeerMessage::decode("CHAT:hello"),
            Err(ProtocolError::UnknownTag(_))
        ));
        assert!(matches!(
            PeerMessage::decode(""),
            Err(ProtocolError::UnknownTag(_))
        ));
    }

    #[test]
    fn test_decode_malformed_payload() {
        let frames = [
            "ALIEN:",
            "ALIEN:{not json}",
            "ALIEN:{\"x\":1.0,\"y\":2.0}",
            "ALIEN:{\"x\":\"left\",\"y\":2.0,\"speed\":1.0}",
        ];
        for frame in frames {
            assert!(
                matches!(
                    PeerMessage::decode(frame),
                    Err(ProtocolError::MalformedPayload(_))
                ),
                "frame {:?} should be rejected",
                frame
            );
        }
    }
}
