//! # Cursor Record Format
//!
//! Binary encoding of a `CursorRecord` as stored in the redb `cursors` table.
//!
//! Format: Header (5 bytes) + postcard-serialized record.
//! - 4 bytes: Magic ("LGRN")
//! - 1 byte: Version
//!
//! The header is checked before the payload is parsed, and payloads larger
//! than `MAX_RECORD_PAYLOAD_SIZE` are refused without allocating.

use crate::{CursorRecord, LastGreenError, primitives};

/// Maximum allowed payload size for one stored record (1 MB).
///
/// A record holds one cursor and one stage run; anything near this size is
/// corruption.
pub const MAX_RECORD_PAYLOAD_SIZE: usize = 1024 * 1024;

const HEADER_SIZE: usize = 5;

// =============================================================================
// RECORD HEADER
// =============================================================================

/// The header that precedes every stored record.
#[derive(Debug, Clone, Copy)]
pub struct RecordHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl RecordHeader {
    /// Create a header with the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), LastGreenError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(LastGreenError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(LastGreenError::DeserializationError(format!(
                "Unsupported record version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LastGreenError> {
        if bytes.len() < HEADER_SIZE {
            return Err(LastGreenError::DeserializationError(
                "Record header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for RecordHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ENCODE / DECODE
// =============================================================================

/// Encode a record (header + payload). Pure, no I/O.
pub fn record_to_bytes(record: &CursorRecord) -> Result<Vec<u8>, LastGreenError> {
    let payload = postcard::to_stdvec(record)
        .map_err(|e| LastGreenError::SerializationError(e.to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
    bytes.extend_from_slice(&RecordHeader::new().to_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode a record previously written by [`record_to_bytes`].
pub fn record_from_bytes(bytes: &[u8]) -> Result<CursorRecord, LastGreenError> {
    let header = RecordHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload = &bytes[HEADER_SIZE..];
    if payload.len() > MAX_RECORD_PAYLOAD_SIZE {
        return Err(LastGreenError::DeserializationError(format!(
            "Record payload of {} bytes exceeds maximum {}",
            payload.len(),
            MAX_RECORD_PAYLOAD_SIZE
        )));
    }

    postcard::from_bytes(payload).map_err(|e| LastGreenError::DeserializationError(e.to_string()))
}
