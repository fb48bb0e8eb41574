//! Lossy quantization between grid coordinates and one-byte wire values.
//!
//! Grid sizes are clamped to at most 40 cells per axis, so every coordinate
//! the game can produce fits a byte exactly; the mapping is lossless within
//! that range and anything outside it is a contract violation.

use crate::protocol::WirePos;
use crate::{GridPos, GRID_MAX};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum CodecError {
    #[error("coordinate {0} outside quantizer range 0..={1}")]
    OutOfRange(f32, u8),
    #[error("wire value {0} outside quantizer range 0..={1}")]
    WireOutOfRange(u8, u8),
}

/// Precomputed coordinate lookup table, built once per session.
pub struct Quantizer {
    from_wire: [f32; 256],
    max: u8,
}

impl Quantizer {
    pub fn new(max: u8) -> Self {
        let mut from_wire = [0.0f32; 256];
        for (value, slot) in from_wire.iter_mut().enumerate().take(max as usize + 1) {
            *slot = value as f32;
        }
        Self { from_wire, max }
    }

    /// Maps an integer-valued coordinate to its wire byte. Fractional or
    /// out-of-range input is rejected, never truncated.
    pub fn quantize(&self, value: f32) -> Result<u8, CodecError> {
        let cell = value as i64;
        if cell as f32 != value || cell < 0 || cell > i64::from(self.max) {
            return Err(CodecError::OutOfRange(value, self.max));
        }
        Ok(cell as u8)
    }

    pub fn dequantize(&self, wire: u8) -> Result<f32, CodecError> {
        if wire > self.max {
            return Err(CodecError::WireOutOfRange(wire, self.max));
        }
        Ok(self.from_wire[wire as usize])
    }

    pub fn encode_pos(&self, pos: GridPos) -> Result<WirePos, CodecError> {
        Ok(WirePos {
            x: self.quantize(pos.x)?,
            z: self.quantize(pos.z)?,
        })
    }

    pub fn decode_pos(&self, wire: WirePos) -> Result<GridPos, CodecError> {
        Ok(GridPos::new(
            self.dequantize(wire.x)?,
            self.dequantize(wire.z)?,
        ))
    }
}

impl Default for Quantizer {
    fn default() -> Self {
        Self::new(GRID_MAX as u8)
    }
}
