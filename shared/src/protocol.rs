//! Fixed-layout, tag-prefixed wire messages.
//!
//! Every message has an exact byte size determined by its leading tag; a
//! payload whose length does not match is a protocol violation and is
//! dropped by the receiver, never interpreted. Layouts (sizes include the
//! tag byte):
//!
//! | tag | message         | payload                                        |
//! |-----|-----------------|------------------------------------------------|
//! | 0   | GameState       | len×2, dir×2, body `[pos; 64]`×2, apple        |
//! | 1   | StartGame       | grid w/h, seed `[pos; 3]`×2, apple             |
//! | 2   | StopGame        | result                                         |
//! | 3   | DirectionChange | direction                                      |
//!
//! `pos` is two quantized coordinate bytes. Snapshot body arrays are sized
//! to capacity; only the first `len` entries are meaningful.

use crate::collision::GameResult;
use crate::position::Direction;
use crate::MAX_SNAKE_SIZE;
use thiserror::Error;

pub const TAG_GAME_STATE: u8 = 0;
pub const TAG_START_GAME: u8 = 1;
pub const TAG_STOP_GAME: u8 = 2;
pub const TAG_DIRECTION_CHANGE: u8 = 3;

pub const GAME_STATE_LEN: usize = 5 + 4 * MAX_SNAKE_SIZE + 2;
pub const START_GAME_LEN: usize = 3 + 12 + 2;
pub const STOP_GAME_LEN: usize = 2;
pub const DIRECTION_CHANGE_LEN: usize = 2;

/// Largest message the protocol can produce.
pub const MAX_MESSAGE_LEN: usize = GAME_STATE_LEN;

/// A quantized grid cell as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WirePos {
    pub x: u8,
    pub z: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Server → client snapshot, sufficient to render one frame.
    GameState {
        snake1_len: u8,
        snake2_len: u8,
        snake1_dir: Direction,
        snake2_dir: Direction,
        snake1_body: [WirePos; MAX_SNAKE_SIZE],
        snake2_body: [WirePos; MAX_SNAKE_SIZE],
        apple: WirePos,
    },
    /// Server → client match setup.
    StartGame {
        grid_width: u8,
        grid_height: u8,
        snake1_seed: [WirePos; 3],
        snake2_seed: [WirePos; 3],
        apple: WirePos,
    },
    /// Server → client match outcome.
    StopGame { result: GameResult },
    /// Client → server steering input.
    DirectionChange { direction: Direction },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty payload")]
    Empty,
    #[error("unknown message tag {0}")]
    UnknownTag(u8),
    #[error("tag {tag}: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        tag: u8,
        expected: usize,
        actual: usize,
    },
    #[error("invalid direction byte {0}")]
    InvalidDirection(u8),
    #[error("invalid result byte {0}")]
    InvalidResult(u8),
    #[error("declared body length {0} exceeds capacity {MAX_SNAKE_SIZE}")]
    BodyTooLong(u8),
}

impl Message {
    pub fn tag(&self) -> u8 {
        match self {
            Message::GameState { .. } => TAG_GAME_STATE,
            Message::StartGame { .. } => TAG_START_GAME,
            Message::StopGame { .. } => TAG_STOP_GAME,
            Message::DirectionChange { .. } => TAG_DIRECTION_CHANGE,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Message::GameState { .. } => "GameState",
            Message::StartGame { .. } => "StartGame",
            Message::StopGame { .. } => "StopGame",
            Message::DirectionChange { .. } => "DirectionChange",
        }
    }

    /// Exact on-wire size for a tag, or `None` for an unknown tag.
    pub fn expected_len(tag: u8) -> Option<usize> {
        match tag {
            TAG_GAME_STATE => Some(GAME_STATE_LEN),
            TAG_START_GAME => Some(START_GAME_LEN),
            TAG_STOP_GAME => Some(STOP_GAME_LEN),
            TAG_DIRECTION_CHANGE => Some(DIRECTION_CHANGE_LEN),
            _ => None,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Message::GameState {
                snake1_len,
                snake2_len,
                snake1_dir,
                snake2_dir,
                snake1_body,
                snake2_body,
                apple,
            } => {
                let mut buf = Vec::with_capacity(GAME_STATE_LEN);
                buf.push(TAG_GAME_STATE);
                buf.push(*snake1_len);
                buf.push(*snake2_len);
                buf.push(snake1_dir.to_wire());
                buf.push(snake2_dir.to_wire());
                for pos in snake1_body.iter().chain(snake2_body.iter()) {
                    buf.push(pos.x);
                    buf.push(pos.z);
                }
                buf.push(apple.x);
                buf.push(apple.z);
                buf
            }
            Message::StartGame {
                grid_width,
                grid_height,
                snake1_seed,
                snake2_seed,
                apple,
            } => {
                let mut buf = Vec::with_capacity(START_GAME_LEN);
                buf.push(TAG_START_GAME);
                buf.push(*grid_width);
                buf.push(*grid_height);
                for pos in snake1_seed.iter().chain(snake2_seed.iter()) {
                    buf.push(pos.x);
                    buf.push(pos.z);
                }
                buf.push(apple.x);
                buf.push(apple.z);
                buf
            }
            Message::StopGame { result } => vec![TAG_STOP_GAME, result.to_wire()],
            Message::DirectionChange { direction } => {
                vec![TAG_DIRECTION_CHANGE, direction.to_wire()]
            }
        }
    }

    pub fn decode(buf: &[u8]) -> Result<Message, ProtocolError> {
        let (&tag, _) = buf.split_first().ok_or(ProtocolError::Empty)?;
        let expected = Message::expected_len(tag).ok_or(ProtocolError::UnknownTag(tag))?;
        if buf.len() != expected {
            return Err(ProtocolError::LengthMismatch {
                tag,
                expected,
                actual: buf.len(),
            });
        }

        match tag {
            TAG_GAME_STATE => {
                let snake1_len = buf[1];
                let snake2_len = buf[2];
                if usize::from(snake1_len) > MAX_SNAKE_SIZE {
                    return Err(ProtocolError::BodyTooLong(snake1_len));
                }
                if usize::from(snake2_len) > MAX_SNAKE_SIZE {
                    return Err(ProtocolError::BodyTooLong(snake2_len));
                }
                let snake1_dir = Direction::from_wire(buf[3])
                    .ok_or(ProtocolError::InvalidDirection(buf[3]))?;
                let snake2_dir = Direction::from_wire(buf[4])
                    .ok_or(ProtocolError::InvalidDirection(buf[4]))?;

                let mut snake1_body = [WirePos::default(); MAX_SNAKE_SIZE];
                let mut snake2_body = [WirePos::default(); MAX_SNAKE_SIZE];
                let body_base = 5;
                for (i, slot) in snake1_body.iter_mut().enumerate() {
                    *slot = read_pos(buf, body_base + 2 * i);
                }
                let body2_base = body_base + 2 * MAX_SNAKE_SIZE;
                for (i, slot) in snake2_body.iter_mut().enumerate() {
                    *slot = read_pos(buf, body2_base + 2 * i);
                }
                let apple = read_pos(buf, body2_base + 2 * MAX_SNAKE_SIZE);

                Ok(Message::GameState {
                    snake1_len,
                    snake2_len,
                    snake1_dir,
                    snake2_dir,
                    snake1_body,
                    snake2_body,
                    apple,
                })
            }
            TAG_START_GAME => {
                let grid_width = buf[1];
                let grid_height = buf[2];
                let mut snake1_seed = [WirePos::default(); 3];
                let mut snake2_seed = [WirePos::default(); 3];
                for (i, slot) in snake1_seed.iter_mut().enumerate() {
                    *slot = read_pos(buf, 3 + 2 * i);
                }
                for (i, slot) in snake2_seed.iter_mut().enumerate() {
                    *slot = read_pos(buf, 9 + 2 * i);
                }
                let apple = read_pos(buf, 15);

                Ok(Message::StartGame {
                    grid_width,
                    grid_height,
                    snake1_seed,
                    snake2_seed,
                    apple,
                })
            }
            TAG_STOP_GAME => {
                let result =
                    GameResult::from_wire(buf[1]).ok_or(ProtocolError::InvalidResult(buf[1]))?;
                Ok(Message::StopGame { result })
            }
            TAG_DIRECTION_CHANGE => {
                let direction = Direction::from_wire(buf[1])
                    .ok_or(ProtocolError::InvalidDirection(buf[1]))?;
                Ok(Message::DirectionChange { direction })
            }
            _ => unreachable!("tag validated above"),
        }
    }
}

fn read_pos(buf: &[u8], offset: usize) -> WirePos {
    WirePos {
        x: buf[offset],
        z: buf[offset + 1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_game_state() -> Message {
        let mut snake1_body = [WirePos::default(); MAX_SNAKE_SIZE];
        let mut snake2_body = [WirePos::default(); MAX_SNAKE_SIZE];
        snake1_body[0] = WirePos { x: 2, z: 2 };
        snake1_body[1] = WirePos { x: 1, z: 2 };
        snake1_body[2] = WirePos { x: 0, z: 2 };
        snake2_body[0] = WirePos { x: 8, z: 8 };
        snake2_body[1] = WirePos { x: 7, z: 8 };
        snake2_body[2] = WirePos { x: 6, z: 8 };
        Message::GameState {
            snake1_len: 3,
            snake2_len: 3,
            snake1_dir: Direction::Right,
            snake2_dir: Direction::Forward,
            snake1_body,
            snake2_body,
            apple: WirePos { x: 5, z: 9 },
        }
    }

    #[test]
    fn test_sizes_are_fixed_per_tag() {
        assert_eq!(sample_game_state().encode().len(), GAME_STATE_LEN);
        let start = Message::StartGame {
            grid_width: 20,
            grid_height: 20,
            snake1_seed: [WirePos { x: 2, z: 2 }; 3],
            snake2_seed: [WirePos { x: 8, z: 8 }; 3],
            apple: WirePos { x: 5, z: 9 },
        };
        assert_eq!(start.encode().len(), START_GAME_LEN);
        assert_eq!(
            Message::StopGame {
                result: GameResult::Tie
            }
            .encode()
            .len(),
            STOP_GAME_LEN
        );
        assert_eq!(
            Message::DirectionChange {
                direction: Direction::Left
            }
            .encode()
            .len(),
            DIRECTION_CHANGE_LEN
        );
    }

    #[test]
    fn test_game_state_roundtrip() {
        let msg = sample_game_state();
        assert_eq!(Message::decode(&msg.encode()), Ok(msg));
    }

    #[test]
    fn test_start_game_roundtrip() {
        let msg = Message::StartGame {
            grid_width: 12,
            grid_height: 34,
            snake1_seed: [
                WirePos { x: 2, z: 2 },
                WirePos { x: 1, z: 2 },
                WirePos { x: 0, z: 2 },
            ],
            snake2_seed: [
                WirePos { x: 8, z: 8 },
                WirePos { x: 7, z: 8 },
                WirePos { x: 6, z: 8 },
            ],
            apple: WirePos { x: 4, z: 4 },
        };
        assert_eq!(Message::decode(&msg.encode()), Ok(msg));
    }

    #[test]
    fn test_control_message_roundtrips() {
        for result in [GameResult::Tie, GameResult::Snake1, GameResult::Snake2] {
            let msg = Message::StopGame { result };
            assert_eq!(Message::decode(&msg.encode()), Ok(msg));
        }
        for direction in [
            Direction::Forward,
            Direction::Backward,
            Direction::Left,
            Direction::Right,
        ] {
            let msg = Message::DirectionChange { direction };
            assert_eq!(Message::decode(&msg.encode()), Ok(msg));
        }
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut encoded = sample_game_state().encode();
        encoded.pop();
        assert_eq!(
            Message::decode(&encoded),
            Err(ProtocolError::LengthMismatch {
                tag: TAG_GAME_STATE,
                expected: GAME_STATE_LEN,
                actual: GAME_STATE_LEN - 1,
            })
        );

        // A truncated control message must not be read as a shorter tag.
        assert_eq!(
            Message::decode(&[TAG_START_GAME, 20]),
            Err(ProtocolError::LengthMismatch {
                tag: TAG_START_GAME,
                expected: START_GAME_LEN,
                actual: 2,
            })
        );
    }

    #[test]
    fn test_unknown_tag_and_empty_rejected() {
        assert_eq!(Message::decode(&[]), Err(ProtocolError::Empty));
        assert_eq!(Message::decode(&[9, 0]), Err(ProtocolError::UnknownTag(9)));
    }

    #[test]
    fn test_declared_length_beyond_capacity_rejected() {
        let mut encoded = sample_game_state().encode();
        encoded[1] = MAX_SNAKE_SIZE as u8 + 1;
        assert_eq!(
            Message::decode(&encoded),
            Err(ProtocolError::BodyTooLong(MAX_SNAKE_SIZE as u8 + 1))
        );
    }

    #[test]
    fn test_invalid_enum_bytes_rejected() {
        assert_eq!(
            Message::decode(&[TAG_STOP_GAME, 3]),
            Err(ProtocolError::InvalidResult(3))
        );
        assert_eq!(
            Message::decode(&[TAG_DIRECTION_CHANGE, 7]),
            Err(ProtocolError::InvalidDirection(7))
        );
    }
}
