/// Module containing the error types for WavLaw
use thiserror::Error;

use crate::{chunks::ChunkIdentifier, wav_type::FormatCode};

pub type WavLawResult<T> = Result<T, WavLawError>;

/// Error types for WavLaw
#[derive(Error, Debug)]
pub enum WavLawError {
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("Unsupported encoding {0}: no transform is implemented for it yet")]
    UnsupportedEncoding(FormatCode),
    #[error("Unknown format code: {0}")]
    UnknownFormatCode(u16),
    #[error("Invalid sample layout: {format} with {bits_per_sample} bits per sample")]
    InvalidLayout {
        format: FormatCode,
        bits_per_sample: u16,
    },
}

/// Errors raised while validating the structure of a RIFF/WAVE stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Not a RIFF file: expected \"RIFF\", found {0}")]
    InvalidRiffTag(ChunkIdentifier),
    #[error("Not a WAVE file: expected \"WAVE\", found {0}")]
    InvalidWaveTag(ChunkIdentifier),
    #[error("Unrecognised chunk {id} (size {size})")]
    UnknownChunk { id: ChunkIdentifier, size: u32 },
    #[error("Duplicate {0} chunk")]
    DuplicateChunk(ChunkIdentifier),
    #[error("fmt chunk declares {0} bytes, at least 16 are required")]
    FmtChunkTooSmall(u32),
    #[error("fact chunk declares {0} bytes, at least 4 are required")]
    FactChunkTooSmall(u32),
    #[error("File does not contain a fmt chunk before the data chunk")]
    MissingFmtChunk,
    #[error("Stream ended before a data chunk was found")]
    MissingDataChunk,
    #[error("fmt chunk with {channels} channels at {sample_rate} Hz and {bits_per_sample} bits per sample overflows its block align or byte rate")]
    FmtFieldOverflow {
        channels: u16,
        sample_rate: u32,
        bits_per_sample: u16,
    },
    #[error("Data size {0} does not fit in the output container")]
    DataSizeOverflow(u32),
}
