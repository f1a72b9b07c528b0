//! Mockup (entity template) decoder.
//!
//! The server describes every entity class once, at load time, as a compact
//! hex-encoded binary blob. This module parses that blob into immutable
//! [`Mockup`] records keyed by template id.
//!
//! Wire layout per template (all fields little-endian, fixed width):
//!
//! ```text
//! id:i32, size:i16, shape:u8,
//! gun_count:i32,    gun[gun_count]    { length:i16, width:i16, x:f32, y:f32, angle:f32, aspect:f32 }
//! turret_count:i32, turret[turret_count] { size:i16, x:f32, y:f32, shape:u8 }
//! ```
//!
//! Decoding is strictly sequential and offset-driven: no field is
//! self-delimiting, so a truncated or misaligned stream fails with a
//! [`DecodeError`] instead of reading past the buffer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::math::Vec2;

/// Identifies an entity template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MockupId(pub i32);

/// Mockup stream decode failure.
///
/// Fatal to the decode call that raised it; the caller's template table is
/// never left partially updated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("hex payload has odd length {0}")]
    OddHexLength(usize),
    #[error("invalid hex digit {byte:#04x} at position {pos}")]
    InvalidHexDigit { pos: usize, byte: u8 },
    #[error("unexpected end of stream at offset {offset}: needed {needed} more bytes")]
    UnexpectedEof { offset: usize, needed: usize },
    #[error("negative {field} count {count} at offset {offset}")]
    NegativeCount {
        field: &'static str,
        count: i32,
        offset: usize,
    },
}

/// Gun attachment: a trapezoid barrel mounted on the template body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gun {
    pub length: i16,
    pub width: i16,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub aspect: f32,
}

impl Gun {
    /// Distance from the body center to the gun mount point.
    pub fn mount_offset(&self) -> f32 {
        Vec2::new(self.x, self.y).len()
    }

    /// Direction from the body center to the gun mount point, in radians.
    pub fn mount_direction(&self) -> f32 {
        Vec2::new(self.x, self.y).angle()
    }
}

/// Turret attachment: a polygon drawn above the template body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Turret {
    pub size: i16,
    pub x: f32,
    pub y: f32,
    pub shape: u8,
}

/// Immutable shape template for one entity class.
///
/// `shape` 0 denotes a circular silhouette; a positive value selects a
/// regular polygon with that many sides (see `render::poly_angle_offset`
/// for the orientation convention).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mockup {
    pub id: MockupId,
    pub size: i16,
    pub shape: u8,
    pub guns: Vec<Gun>,
    pub turrets: Vec<Turret>,
}

impl Mockup {
    /// Base body radius in world units.
    pub fn radius(&self) -> f32 {
        f32::from(self.size)
    }
}

/// Sequential little-endian reader over a decoded byte stream.
struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.offset.checked_add(n).ok_or(DecodeError::UnexpectedEof {
            offset: self.offset,
            needed: n,
        })?;
        if end > self.data.len() {
            return Err(DecodeError::UnexpectedEof {
                offset: self.offset,
                needed: end - self.data.len(),
            });
        }
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn i16(&mut self) -> Result<i16, DecodeError> {
        let b = self.take(2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    fn i32(&mut self) -> Result<i32, DecodeError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f32(&mut self) -> Result<f32, DecodeError> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Decodes a hex string ("pairs of hex digits") into raw bytes.
pub fn decode_hex(hex: &str) -> Result<Vec<u8>, DecodeError> {
    let raw = hex.as_bytes();
    if raw.len() % 2 != 0 {
        return Err(DecodeError::OddHexLength(raw.len()));
    }

    fn nibble(pos: usize, byte: u8) -> Result<u8, DecodeError> {
        match byte {
            b'0'..=b'9' => Ok(byte - b'0'),
            b'a'..=b'f' => Ok(byte - b'a' + 10),
            b'A'..=b'F' => Ok(byte - b'A' + 10),
            _ => Err(DecodeError::InvalidHexDigit { pos, byte }),
        }
    }

    let mut bytes = Vec::with_capacity(raw.len() / 2);
    for (i, pair) in raw.chunks_exact(2).enumerate() {
        let hi = nibble(i * 2, pair[0])?;
        let lo = nibble(i * 2 + 1, pair[1])?;
        bytes.push((hi << 4) | lo);
    }
    Ok(bytes)
}

/// Decodes a full hex-encoded mockup stream.
///
/// Reads records back to back until the stream is exhausted. Any truncation
/// or malformed field fails the whole call; no partial record is returned.
pub fn decode_mockups(hex: &str) -> Result<Vec<Mockup>, DecodeError> {
    let bytes = decode_hex(hex)?;
    let mut r = Reader::new(&bytes);
    let mut mockups = Vec::new();

    while !r.is_empty() {
        mockups.push(decode_record(&mut r)?);
    }

    Ok(mockups)
}

fn decode_record(r: &mut Reader<'_>) -> Result<Mockup, DecodeError> {
    let id = MockupId(r.i32()?);
    let size = r.i16()?;
    let shape = r.u8()?;

    let gun_count_offset = r.offset;
    let gun_count = r.i32()?;
    if gun_count < 0 {
        return Err(DecodeError::NegativeCount {
            field: "gun",
            count: gun_count,
            offset: gun_count_offset,
        });
    }
    let mut guns = Vec::with_capacity(gun_count as usize);
    for _ in 0..gun_count {
        guns.push(Gun {
            length: r.i16()?,
            width: r.i16()?,
            x: r.f32()?,
            y: r.f32()?,
            angle: r.f32()?,
            aspect: r.f32()?,
        });
    }

    let turret_count_offset = r.offset;
    let turret_count = r.i32()?;
    if turret_count < 0 {
        return Err(DecodeError::NegativeCount {
            field: "turret",
            count: turret_count,
            offset: turret_count_offset,
        });
    }
    let mut turrets = Vec::with_capacity(turret_count as usize);
    for _ in 0..turret_count {
        turrets.push(Turret {
            size: r.i16()?,
            x: r.f32()?,
            y: r.f32()?,
            shape: r.u8()?,
        });
    }

    Ok(Mockup {
        id,
        size,
        shape,
        guns,
        turrets,
    })
}

/// Template table: populated at load time, read-only afterwards.
#[derive(Debug, Default, Clone)]
pub struct MockupTable {
    templates: HashMap<MockupId, Mockup>,
}

impl MockupTable {
    /// Decodes a hex stream and inserts every template it contains.
    ///
    /// Insertion happens wholesale after a successful decode: on failure the
    /// table is exactly as it was before the call. Re-decoding an id
    /// overwrites the prior record. Returns the number of templates decoded.
    pub fn load_hex(&mut self, hex: &str) -> Result<usize, DecodeError> {
        let decoded = decode_mockups(hex)?;
        let count = decoded.len();
        for mockup in decoded {
            self.templates.insert(mockup.id, mockup);
        }
        debug!(templates = count, "Mockup stream decoded");
        Ok(count)
    }

    pub fn get(&self, id: MockupId) -> Option<&Mockup> {
        self.templates.get(&id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
