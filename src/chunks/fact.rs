//! Contains the FactChunk struct and its implementation.
use std::{
    fmt::{Display, Formatter},
    io::Read,
};

use byteorder::{LittleEndian, ReadBytesExt};
#[cfg(feature = "colored")]
use colored::Colorize;

use crate::{
    chunks::{skip, Chunk, ChunkHeader, FACT},
    error::FormatError,
    log, WavLawResult,
};

pub const FACT_SIZE: usize = 4;

/// The fact chunk of a wav file. Contains a single field, ``num_samples``. This field is the number of samples in the wav file per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FactChunk {
    pub num_samples: u32,
}

impl FactChunk {
    /// Creates a new FactChunk with the given number of samples.
    pub fn new(num_samples: u32) -> Self {
        Self { num_samples }
    }
}

impl Chunk for FactChunk {
    /// Returns the size of the FactChunk in bytes less the size of the ID and size field itself.
    fn size(&self) -> u32 {
        FACT_SIZE as u32
    }

    /// Returns the full FactChunk in bytes.
    fn as_bytes(&self) -> Box<[u8]> {
        let mut buf = [0; 12];
        buf[0..4].copy_from_slice(&FACT);
        buf[4..8].copy_from_slice(&self.size().to_le_bytes());
        buf[8..12].copy_from_slice(&self.num_samples.to_le_bytes());
        Box::new(buf)
    }

    /// Reads the FactChunk from a reader positioned just past the chunk header.
    fn from_reader<R: Read>(reader: &mut R, header: &ChunkHeader) -> WavLawResult<Self> {
        if (header.size as usize) < FACT_SIZE {
            return Err(FormatError::FactChunkTooSmall(header.size).into());
        }
        let num_samples = reader.read_u32::<LittleEndian>()?;

        let trailing = header.size as u64 - FACT_SIZE as u64;
        if trailing > 0 {
            log!(log::Level::Debug, "Skipping {} trailing fact bytes", trailing);
            skip(reader, trailing)?;
        }
        Ok(FactChunk::new(num_samples))
    }
}

#[cfg(feature = "colored")]
impl Display for FactChunk {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\n\t{} {}",
            "FactChunk: ".white().bold().underline(),
            "num_samples:".green().bold(),
            self.num_samples.to_string().white()
        )
    }
}

#[cfg(not(feature = "colored"))]
impl Display for FactChunk {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "FactChunk: num_samples: {}", self.num_samples)
    }
}
