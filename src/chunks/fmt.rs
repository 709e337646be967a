use std::{
    fmt::{Display, Formatter},
    io::Read,
};

use byteorder::{ByteOrder, LittleEndian};
#[cfg(feature = "colored")]
use colored::Colorize;

use crate::{
    chunks::{skip, Chunk, ChunkHeader, FMT},
    error::FormatError,
    log,
    wav_type::{FormatCode, WavType},
    WavLawResult,
};

pub const FMT_SIZE_BASE_SIZE: usize = 16; // Standard wav file format size
pub const FMT_CB_SIZE: usize = 18; // Non-PCM formats carry a cbSize field giving the size of the extension, always 0 for G.711

/// The format chunk of a wav file.
///
/// ``format`` is kept as the raw code read from the file so that a valid file in an
/// encoding this crate cannot convert still parses; see [`FmtChunk::format_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FmtChunk {
    /// Format of the audio data. 1 for PCM, 6 for A-law, 7 for mu-law.
    pub format: u16,
    /// Number of channels in the audio data.
    pub channels: u16,
    /// Sample rate of the audio data.
    pub sample_rate: u32,
    /// Byte rate of the audio data.
    pub byte_rate: u32,
    /// Block align of the audio data.
    pub block_align: u16,
    /// Bits per sample of the audio data.
    pub bits_per_sample: u16,
}

impl FmtChunk {
    /// Constructs a new FmtChunk using the provided format, number of channels, sample rate and bits per sample.
    /// The remaining fields are calculated from these arguments and must fit their fields.
    pub fn new(
        format: FormatCode,
        channels: u16,
        sample_rate: u32,
        bits_per_sample: u16,
    ) -> WavLawResult<Self> {
        let (block_align, byte_rate) = derived_fields(channels, sample_rate, bits_per_sample)?;
        Ok(FmtChunk {
            format: format.into(),
            channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample,
        })
    }

    /// Function to update a FmtChunk to a new encoding, for example PCM to mu-law. Does this in-place.
    /// Channel count and sample rate carry over, the derived fields are recomputed. On overflow the
    /// chunk is left untouched.
    #[inline(always)]
    pub fn update_fmt_chunk(&mut self, new_type: WavType) -> WavLawResult<()> {
        let (new_format, new_bits_per_sample): (FormatCode, u16) = new_type.into();
        let (new_block_align, new_byte_rate) =
            derived_fields(self.channels, self.sample_rate, new_bits_per_sample)?;

        self.format = new_format.into();
        self.block_align = new_block_align;
        self.byte_rate = new_byte_rate;
        self.bits_per_sample = new_bits_per_sample;
        Ok(())
    }

    pub fn format_code(&self) -> WavLawResult<FormatCode> {
        FormatCode::try_from(self.format)
    }

    /// The sample encoding described by this chunk. Fails when the code is unknown or the
    /// bit depth does not fit the encoding.
    pub fn wav_type(&self) -> WavLawResult<WavType> {
        WavType::try_from((self.format_code()?, self.bits_per_sample))
    }

    /// PCM writes the plain 16 byte structure, every other encoding appends a zero cbSize.
    fn is_pcm(&self) -> bool {
        self.format == u16::from(FormatCode::WAV_FORMAT_PCM)
    }
}

impl Chunk for FmtChunk {
    fn size(&self) -> u32 {
        match self.is_pcm() {
            true => FMT_SIZE_BASE_SIZE as u32,
            false => FMT_CB_SIZE as u32,
        }
    }

    fn as_bytes(&self) -> Box<[u8]> {
        let size = self.size() as usize;
        let mut bytes = vec![0; 8 + size];
        bytes[0..4].copy_from_slice(&FMT);
        bytes[4..8].copy_from_slice(&self.size().to_le_bytes());
        let base: [u8; FMT_SIZE_BASE_SIZE] = (*self).into();
        bytes[8..8 + FMT_SIZE_BASE_SIZE].copy_from_slice(&base);
        // the cbSize field, when present, stays zero
        bytes.into_boxed_slice()
    }

    /// Reads the fixed structure and skips any extension bytes that follow it.
    fn from_reader<R: Read>(reader: &mut R, header: &ChunkHeader) -> WavLawResult<Self> {
        if (header.size as usize) < FMT_SIZE_BASE_SIZE {
            return Err(FormatError::FmtChunkTooSmall(header.size).into());
        }

        let mut fmt_buf = [0; FMT_SIZE_BASE_SIZE];
        reader.read_exact(&mut fmt_buf)?;
        let fmt_chunk = FmtChunk::from(fmt_buf);

        let extension = header.size as u64 - FMT_SIZE_BASE_SIZE as u64;
        if extension > 0 {
            log!(log::Level::Debug, "Skipping {} fmt extension bytes", extension);
            skip(reader, extension)?;
        }
        Ok(fmt_chunk)
    }
}

impl From<[u8; FMT_SIZE_BASE_SIZE]> for FmtChunk {
    fn from(value: [u8; FMT_SIZE_BASE_SIZE]) -> Self {
        FmtChunk {
            format: LittleEndian::read_u16(&value[0..2]),
            channels: LittleEndian::read_u16(&value[2..4]),
            sample_rate: LittleEndian::read_u32(&value[4..8]),
            byte_rate: LittleEndian::read_u32(&value[8..12]),
            block_align: LittleEndian::read_u16(&value[12..14]),
            bits_per_sample: LittleEndian::read_u16(&value[14..16]),
        }
    }
}

impl From<FmtChunk> for [u8; FMT_SIZE_BASE_SIZE] {
    fn from(value: FmtChunk) -> Self {
        let mut bytes = [0; FMT_SIZE_BASE_SIZE];
        LittleEndian::write_u16(&mut bytes[0..2], value.format);
        LittleEndian::write_u16(&mut bytes[2..4], value.channels);
        LittleEndian::write_u32(&mut bytes[4..8], value.sample_rate);
        LittleEndian::write_u32(&mut bytes[8..12], value.byte_rate);
        LittleEndian::write_u16(&mut bytes[12..14], value.block_align);
        LittleEndian::write_u16(&mut bytes[14..16], value.bits_per_sample);
        bytes
    }
}

/// Block align and byte rate of a layout. Channel counts and sample rates come straight from
/// the input file, so both products are checked.
fn derived_fields(
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
) -> WavLawResult<(u16, u32)> {
    let overflow = || FormatError::FmtFieldOverflow {
        channels,
        sample_rate,
        bits_per_sample,
    };
    let block_align = u16::try_from(u32::from(channels) * u32::from(bits_per_sample) / 8)
        .map_err(|_| overflow())?;
    let byte_rate = sample_rate
        .checked_mul(u32::from(block_align))
        .ok_or_else(overflow)?;
    Ok((block_align, byte_rate))
}

fn format_name(code: u16) -> String {
    match FormatCode::try_from(code) {
        Ok(format) => format.to_string(),
        Err(_) => format!("UNKNOWN({})", code),
    }
}

#[cfg(feature = "colored")]
impl Display for FmtChunk {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\n\t{} {}\n\t{} {}\n\t{} {} blocks/s\n\t{} {} bytes/s\n\t{} {} bytes\n\t{} {}",
            "FmtChunk: ".white().bold().underline(),
            "format:".green().bold(),
            format_name(self.format).white(),
            "channels:".green().bold(),
            self.channels.to_string().white(),
            "sample_rate:".green().bold(),
            self.sample_rate.to_string().white(),
            "byte_rate:".green().bold(),
            self.byte_rate.to_string().white(),
            "block_align:".green().bold(),
            self.block_align.to_string().white(),
            "bits_per_sample:".green().bold(),
            self.bits_per_sample.to_string().white()
        )
    }
}

#[cfg(not(feature = "colored"))]
impl Display for FmtChunk {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FmtChunk: format: {}, channels: {}, sample_rate: {} blocks/s, byte_rate: {} bytes/s, block_align: {} bytes, bits_per_sample: {}",
            format_name(self.format),
            self.channels,
            self.sample_rate,
            self.byte_rate,
            self.block_align,
            self.bits_per_sample
        )
    }
}

#[cfg(test)]
mod fmt_tests {
    use std::io::Cursor;

    use super::*;
    use crate::WavLawError;

    const ONE_CHANNEL_FMT_CHUNK: FmtChunk = FmtChunk {
        format: 1,
        channels: 1,
        sample_rate: 16000,
        byte_rate: 16000 * 2 * 1,
        block_align: 2,
        bits_per_sample: 16,
    };

    const ONE_CHANNEL_FMT_BYTES: [u8; FMT_SIZE_BASE_SIZE] = [
        0x01, 0x00, // PCM
        0x01, 0x00, // mono
        0x80, 0x3e, 0x00, 0x00, // 16000
        0x00, 0x7d, 0x00, 0x00, // 32000
        0x02, 0x00, // block align
        0x10, 0x00, // 16 bits
    ];

    #[test]
    fn new_derives_rates() {
        let fmt = FmtChunk::new(FormatCode::WAV_FORMAT_PCM, 1, 16000, 16).unwrap();
        assert_eq!(fmt, ONE_CHANNEL_FMT_CHUNK);
        let fmt = FmtChunk::new(FormatCode::WAVE_FORMAT_MULAW, 2, 8000, 8).unwrap();
        assert_eq!(fmt.block_align, 2);
        assert_eq!(fmt.byte_rate, 16000);
    }

    #[test]
    fn can_convert_to_and_from_bytes() {
        assert_eq!(FmtChunk::from(ONE_CHANNEL_FMT_BYTES), ONE_CHANNEL_FMT_CHUNK);
        let bytes: [u8; FMT_SIZE_BASE_SIZE] = ONE_CHANNEL_FMT_CHUNK.into();
        assert_eq!(bytes, ONE_CHANNEL_FMT_BYTES);
    }

    #[test]
    fn pcm_chunk_is_sixteen_bytes() {
        let bytes = ONE_CHANNEL_FMT_CHUNK.as_bytes();
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[0..8], b"fmt \x10\x00\x00\x00");
        assert_eq!(&bytes[8..], &ONE_CHANNEL_FMT_BYTES[..]);
    }

    #[test]
    fn mulaw_chunk_carries_zero_cb_size() {
        let fmt = FmtChunk::new(FormatCode::WAVE_FORMAT_MULAW, 1, 8000, 8).unwrap();
        let bytes = fmt.as_bytes();
        assert_eq!(fmt.size(), 18);
        assert_eq!(bytes.len(), 26);
        assert_eq!(&bytes[4..8], &18u32.to_le_bytes());
        assert_eq!(&bytes[8..10], &[7, 0]);
        assert_eq!(&bytes[24..26], &[0, 0]);
    }

    #[test]
    fn update_recomputes_derived_fields() {
        let mut fmt = FmtChunk::new(FormatCode::WAV_FORMAT_PCM, 1, 8000, 16).unwrap();
        fmt.update_fmt_chunk(WavType::MuLaw).unwrap();
        assert_eq!(fmt, FmtChunk::new(FormatCode::WAVE_FORMAT_MULAW, 1, 8000, 8).unwrap());
        fmt.update_fmt_chunk(WavType::Pcm16).unwrap();
        assert_eq!(fmt, FmtChunk::new(FormatCode::WAV_FORMAT_PCM, 1, 8000, 16).unwrap());
    }

    #[test]
    fn wide_layouts_use_checked_arithmetic() {
        // 4097 * 16 overflows u16 before the division by 8, the result does not
        let mut fmt = FmtChunk::new(FormatCode::WAVE_FORMAT_MULAW, 4097, 8000, 8).unwrap();
        fmt.update_fmt_chunk(WavType::Pcm16).unwrap();
        assert_eq!(fmt.block_align, 8194);
        assert_eq!(fmt.byte_rate, 8000 * 8194);
    }

    #[test]
    fn overflowing_layouts_are_rejected() {
        match FmtChunk::new(FormatCode::WAV_FORMAT_PCM, u16::MAX, 8000, 16) {
            Err(WavLawError::Format(FormatError::FmtFieldOverflow {
                channels,
                bits_per_sample,
                ..
            })) => {
                assert_eq!(channels, u16::MAX);
                assert_eq!(bits_per_sample, 16);
            }
            other => panic!("expected FmtFieldOverflow, got {:?}", other),
        }

        let mut fmt = FmtChunk::new(FormatCode::WAVE_FORMAT_MULAW, 1, 3_000_000_000, 8).unwrap();
        let before = fmt;
        assert!(matches!(
            fmt.update_fmt_chunk(WavType::Pcm16),
            Err(WavLawError::Format(FormatError::FmtFieldOverflow {
                sample_rate: 3_000_000_000,
                ..
            }))
        ));
        assert_eq!(fmt, before);
    }

    #[test]
    fn extension_bytes_are_skipped() {
        let mut payload = ONE_CHANNEL_FMT_BYTES.to_vec();
        payload.extend_from_slice(&[0, 0, 0xde, 0xad]);
        payload.extend_from_slice(b"data");
        let mut cursor = Cursor::new(payload);
        let fmt = FmtChunk::from_reader(&mut cursor, &ChunkHeader::new(FMT, 20)).unwrap();
        assert_eq!(fmt, ONE_CHANNEL_FMT_CHUNK);
        assert_eq!(cursor.position(), 20);
    }

    #[test]
    fn undersized_chunk_fails_before_reading() {
        let mut cursor = Cursor::new(ONE_CHANNEL_FMT_BYTES.to_vec());
        match FmtChunk::from_reader(&mut cursor, &ChunkHeader::new(FMT, 14)) {
            Err(WavLawError::Format(FormatError::FmtChunkTooSmall(14))) => (),
            other => panic!("expected FmtChunkTooSmall, got {:?}", other),
        }
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn unknown_code_still_parses() {
        let mut bytes = ONE_CHANNEL_FMT_BYTES;
        bytes[0] = 3;
        let fmt = FmtChunk::from(bytes);
        assert!(matches!(
            fmt.wav_type(),
            Err(WavLawError::UnknownFormatCode(3))
        ));
    }
}
