pub mod fact;
pub mod fmt;

use std::{
    fmt::Display,
    io::{self, Read},
};

use byteorder::{LittleEndian, ReadBytesExt};

pub use crate::chunks::fact::FactChunk;
pub use crate::chunks::fmt::FmtChunk;
use crate::WavLawResult;

// 100% necessary to have these chunks
pub const RIFF: [u8; 4] = *b"RIFF";
pub const WAVE: [u8; 4] = *b"WAVE";
pub const DATA: [u8; 4] = *b"data";
pub const FMT: [u8; 4] = *b"fmt ";

// Present for G.711 encodings only
pub const FACT: [u8; 4] = *b"fact";

/// Id plus little-endian payload size.
pub const CHUNK_HEADER_SIZE: usize = 8;

pub trait Chunk: Display {
    /// Payload size in bytes, less the id and size fields.
    fn size(&self) -> u32;
    /// The full chunk, header included.
    fn as_bytes(&self) -> Box<[u8]>;
    /// Reads the payload described by `header`. Implementations consume exactly
    /// `header.size` bytes so the caller stays aligned on the next chunk.
    fn from_reader<R: Read>(reader: &mut R, header: &ChunkHeader) -> WavLawResult<Self>
    where
        Self: Sized;
}

pub fn read_chunk<T: Chunk, R: Read>(reader: &mut R, header: &ChunkHeader) -> WavLawResult<T> {
    T::from_reader(reader, header)
}

/// Wrapper around a 4 byte buffer. Used for storing and displaying/debugging the identifier of a chunk.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ChunkIdentifier {
    identifier: [u8; 4],
}

impl ChunkIdentifier {
    pub const fn new(identifier: [u8; 4]) -> Self {
        ChunkIdentifier { identifier }
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.identifier
    }
}

impl From<&[u8; 4]> for ChunkIdentifier {
    fn from(identifier: &[u8; 4]) -> Self {
        ChunkIdentifier {
            identifier: *identifier,
        }
    }
}

impl From<[u8; 4]> for ChunkIdentifier {
    fn from(identifier: [u8; 4]) -> Self {
        ChunkIdentifier { identifier }
    }
}

impl PartialEq<[u8; 4]> for ChunkIdentifier {
    fn eq(&self, other: &[u8; 4]) -> bool {
        &self.identifier == other
    }
}

impl Display for ChunkIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match std::str::from_utf8(&self.identifier) {
            Ok(s) => write!(f, "{:?}", s),
            Err(_) => write!(f, "{:02x?}", self.identifier),
        }
    }
}

/// The id and declared payload size that prefix every chunk after the RIFF header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChunkHeader {
    pub id: ChunkIdentifier,
    pub size: u32,
}

impl ChunkHeader {
    pub fn new<I: Into<ChunkIdentifier>>(id: I, size: u32) -> Self {
        ChunkHeader {
            id: id.into(),
            size,
        }
    }

    /// Reads the next chunk header. Returns `None` if the stream ends cleanly on a chunk
    /// boundary; a header cut short part way through is an `UnexpectedEof` error.
    pub fn read_next<R: Read>(reader: &mut R) -> WavLawResult<Option<Self>> {
        let mut id = [0u8; 4];
        let mut filled = 0;
        while filled < id.len() {
            match reader.read(&mut id[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        match filled {
            0 => Ok(None),
            4 => {
                let size = reader.read_u32::<LittleEndian>()?;
                Ok(Some(ChunkHeader::new(id, size)))
            }
            _ => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated chunk id").into()),
        }
    }

    pub fn as_bytes(&self) -> [u8; CHUNK_HEADER_SIZE] {
        let mut bytes = [0; CHUNK_HEADER_SIZE];
        bytes[0..4].copy_from_slice(self.id.as_bytes());
        bytes[4..8].copy_from_slice(&self.size.to_le_bytes());
        bytes
    }

    /// RIFF pads chunks with an odd payload size to a word boundary.
    pub fn padding(&self) -> u64 {
        (self.size % 2) as u64
    }
}

impl Display for ChunkHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "chunk {} (size: {})", self.id, self.size)
    }
}

/// Advances `reader` by exactly `n_bytes`, failing on a short stream.
pub(crate) fn skip<R: Read>(reader: &mut R, n_bytes: u64) -> WavLawResult<()> {
    let skipped = io::copy(&mut reader.by_ref().take(n_bytes), &mut io::sink())?;
    if skipped < n_bytes {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected to skip {} bytes, stream ended after {}", n_bytes, skipped),
        )
        .into());
    }
    Ok(())
}
