///
/// Module containing functions and structs for walking and synthesizing Wav file headers.
///
use std::{fmt::Display, io::Read};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::{
    chunks::{
        read_chunk, skip, Chunk, ChunkHeader, ChunkIdentifier, FactChunk, FmtChunk,
        CHUNK_HEADER_SIZE, DATA, FACT, FMT, RIFF, WAVE,
    },
    error::{FormatError, WavLawResult},
    log,
    wav_type::WavType,
};

pub const RIFF_SIZE: usize = 12;

/// The RIFF preamble: "RIFF", the size of everything after the size field, then "WAVE".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiffHeader {
    pub size: u32,
}

impl RiffHeader {
    pub fn new(size: u32) -> Self {
        RiffHeader { size }
    }

    /// Reads and validates the 12 byte RIFF header.
    pub fn from_reader<R: Read>(reader: &mut R) -> WavLawResult<Self> {
        let mut buf: [u8; 4] = [0; 4];
        reader.read_exact(&mut buf)?;
        if buf != RIFF {
            return Err(FormatError::InvalidRiffTag(buf.into()).into());
        }

        let size = reader.read_u32::<LittleEndian>()?;

        reader.read_exact(&mut buf)?;
        if buf != WAVE {
            return Err(FormatError::InvalidWaveTag(buf.into()).into());
        }
        Ok(RiffHeader { size })
    }

    pub fn as_bytes(&self) -> [u8; RIFF_SIZE] {
        let mut bytes = [0; RIFF_SIZE];
        bytes[0..4].copy_from_slice(&RIFF);
        bytes[4..8].copy_from_slice(&self.size.to_le_bytes());
        bytes[8..12].copy_from_slice(&WAVE);
        bytes
    }
}

/// A struct used to store the payload offset and size of a chunk
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HeaderEntryInfo {
    pub offset: usize,
    pub size: u32,
}

impl Display for HeaderEntryInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(offset: {}, size: {})", self.offset, self.size)
    }
}

impl HeaderEntryInfo {
    /// Constructs a new HeaderEntryInfo struct with a given offset and size.
    pub fn new(offset: usize, size: u32) -> Self {
        HeaderEntryInfo { offset, size }
    }
}

/// A struct representing everything in front of the sample data of a wav file: the RIFF header,
/// the format and fact chunks and the declared size of the data chunk. ``header_info`` records
/// the chunks in the order they appeared, with the offset of each payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavHeader {
    pub riff: RiffHeader,
    pub fmt_chunk: Option<FmtChunk>,
    pub fact_chunk: Option<FactChunk>,
    pub data_size: u32,
    pub(crate) header_info: Vec<(ChunkIdentifier, HeaderEntryInfo)>,
}

/// What the walker does after a chunk has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    ExpectChunk,
    Done,
}

type ChunkHandler<R> = fn(&mut WavHeader, &mut R, &ChunkHeader) -> WavLawResult<Walk>;

/// The one place that decides which chunks are understood. Anything not listed is rejected.
fn chunk_handlers<R: Read>() -> [([u8; 4], ChunkHandler<R>); 3] {
    [
        (FMT, on_fmt_chunk::<R> as ChunkHandler<R>),
        (FACT, on_fact_chunk::<R> as ChunkHandler<R>),
        (DATA, on_data_chunk::<R> as ChunkHandler<R>),
    ]
}

fn on_fmt_chunk<R: Read>(
    header: &mut WavHeader,
    reader: &mut R,
    chunk: &ChunkHeader,
) -> WavLawResult<Walk> {
    if header.fmt_chunk.is_some() {
        return Err(FormatError::DuplicateChunk(chunk.id).into());
    }
    let fmt_chunk: FmtChunk = read_chunk(reader, chunk)?;
    log!(log::Level::Debug, "{}", fmt_chunk);
    header.fmt_chunk = Some(fmt_chunk);
    Ok(Walk::ExpectChunk)
}

fn on_fact_chunk<R: Read>(
    header: &mut WavHeader,
    reader: &mut R,
    chunk: &ChunkHeader,
) -> WavLawResult<Walk> {
    if header.fact_chunk.is_some() {
        return Err(FormatError::DuplicateChunk(chunk.id).into());
    }
    let fact_chunk: FactChunk = read_chunk(reader, chunk)?;
    log!(log::Level::Debug, "{}", fact_chunk);
    header.fact_chunk = Some(fact_chunk);
    Ok(Walk::ExpectChunk)
}

// The payload is left in the reader for the sample loop.
fn on_data_chunk<R: Read>(
    header: &mut WavHeader,
    _reader: &mut R,
    chunk: &ChunkHeader,
) -> WavLawResult<Walk> {
    header.data_size = chunk.size;
    Ok(Walk::Done)
}

impl WavHeader {
    fn empty(riff: RiffHeader) -> Self {
        WavHeader {
            riff,
            fmt_chunk: None,
            fact_chunk: None,
            data_size: 0,
            header_info: Vec::new(),
        }
    }

    /// Walks the chunks of a wav stream up to and including the data chunk header.
    ///
    /// On success the reader is positioned at the first sample. Chunks may come in any order
    /// before the data chunk; an unrecognised chunk is an error rather than being skipped, since
    /// its size cannot be trusted to keep the reader aligned.
    pub fn from_reader<R: Read>(reader: &mut R) -> WavLawResult<Self> {
        let riff = RiffHeader::from_reader(reader)?;
        let mut header = WavHeader::empty(riff);
        let handlers = chunk_handlers::<R>();
        let mut offset = RIFF_SIZE;

        loop {
            let chunk = match ChunkHeader::read_next(reader)? {
                Some(chunk) => chunk,
                None => return Err(FormatError::MissingDataChunk.into()),
            };
            log!(log::Level::Debug, "Got {}", chunk);

            let handler = match handlers.iter().find(|(id, _)| chunk.id == *id) {
                Some((_, handler)) => *handler,
                None => {
                    return Err(FormatError::UnknownChunk {
                        id: chunk.id,
                        size: chunk.size,
                    }
                    .into())
                }
            };

            offset += CHUNK_HEADER_SIZE;
            header
                .header_info
                .push((chunk.id, HeaderEntryInfo::new(offset, chunk.size)));

            match handler(&mut header, reader, &chunk)? {
                Walk::Done => break,
                Walk::ExpectChunk => {
                    skip(reader, chunk.padding())?;
                    offset += chunk.size as usize + chunk.padding() as usize;
                }
            }
        }

        header.check_fact_presence();
        Ok(header)
    }

    fn check_fact_presence(&self) {
        let Some(wav_type) = self.fmt_chunk.and_then(|fmt| fmt.wav_type().ok()) else {
            return;
        };
        match (wav_type.is_compressed(), self.fact_chunk) {
            (true, None) => {
                log!(
                    log::Level::Warn,
                    "{} file has no fact chunk, using the data size",
                    wav_type
                );
            }
            (false, Some(_)) => {
                log!(log::Level::Warn, "Ignoring fact chunk in a PCM file");
            }
            _ => (),
        }
    }

    /// Builds a header from its parts, computing the RIFF size and the chunk offsets.
    /// The RIFF size counts the bytes after its own field, so it is 8 less than the file size.
    pub fn from_parts(
        fmt_chunk: FmtChunk,
        fact_chunk: Option<FactChunk>,
        data_size: u32,
    ) -> WavLawResult<Self> {
        let mut header_info: Vec<(ChunkIdentifier, HeaderEntryInfo)> = Vec::with_capacity(3);
        let mut offset = RIFF_SIZE;

        offset += CHUNK_HEADER_SIZE;
        header_info.push((FMT.into(), HeaderEntryInfo::new(offset, fmt_chunk.size())));
        offset += fmt_chunk.size() as usize;

        if let Some(fact) = fact_chunk {
            offset += CHUNK_HEADER_SIZE;
            header_info.push((FACT.into(), HeaderEntryInfo::new(offset, fact.size())));
            offset += fact.size() as usize;
        }

        offset += CHUNK_HEADER_SIZE;
        header_info.push((DATA.into(), HeaderEntryInfo::new(offset, data_size)));

        // Standard RIFF size: every byte after the size field (50 + N for mu-law, 36 + 2N for
        // PCM), not the whole-header-plus-data total of 58 + N / 44 + 2N.
        let riff_size = ((offset - 8) as u32)
            .checked_add(data_size)
            .ok_or(FormatError::DataSizeOverflow(data_size))?;

        Ok(WavHeader {
            riff: RiffHeader::new(riff_size),
            fmt_chunk: Some(fmt_chunk),
            fact_chunk,
            data_size,
            header_info,
        })
    }

    /// Synthesizes the header of the converted file: PCM becomes mu-law, G.711 becomes PCM.
    ///
    /// Channels and sample rate are copied, the derived format fields are recomputed, and the
    /// data size is halved or doubled to match the new sample width. A fact chunk is emitted
    /// only for the companded target.
    pub fn synthesize(&self) -> WavLawResult<WavHeader> {
        let source = self.wav_type()?;
        let target = source.transcode_target();

        let mut fmt_chunk = self.fmt_chunk.ok_or(FormatError::MissingFmtChunk)?;
        fmt_chunk.update_fmt_chunk(target)?;

        let data_size = match target {
            WavType::Pcm16 => self
                .data_size
                .checked_mul(2)
                .ok_or(FormatError::DataSizeOverflow(self.data_size))?,
            WavType::MuLaw | WavType::ALaw => self.data_size / 2,
        };
        let fact_chunk = target.is_compressed().then(|| FactChunk::new(data_size));

        WavHeader::from_parts(fmt_chunk, fact_chunk, data_size)
    }

    /// The sample encoding of the file. Fails if no fmt chunk was seen.
    pub fn wav_type(&self) -> WavLawResult<WavType> {
        self.fmt_chunk
            .ok_or(FormatError::MissingFmtChunk)?
            .wav_type()
    }

    /// Number of bytes in front of the sample data when this header is written out.
    pub fn header_size(&self) -> usize {
        match self.header_info.last() {
            Some((_, info)) => info.offset,
            None => RIFF_SIZE,
        }
    }

    /// Total size of the file this header describes.
    pub fn file_size(&self) -> usize {
        self.riff.size as usize + 8
    }

    /// Serializes the header up to and including the data chunk header.
    pub fn as_bytes(&self) -> WavLawResult<Box<[u8]>> {
        let fmt_chunk = self.fmt_chunk.ok_or(FormatError::MissingFmtChunk)?;

        let mut bytes = Vec::with_capacity(self.header_size());
        bytes.extend_from_slice(&self.riff.as_bytes());
        bytes.extend_from_slice(&fmt_chunk.as_bytes());
        if let Some(fact) = self.fact_chunk {
            bytes.extend_from_slice(&fact.as_bytes());
        }
        bytes.extend_from_slice(&ChunkHeader::new(DATA, self.data_size).as_bytes());
        Ok(bytes.into_boxed_slice())
    }

    pub fn get(&self, chunk_identifier: ChunkIdentifier) -> Option<&HeaderEntryInfo> {
        self.header_info
            .iter()
            .find(|(id, _)| *id == chunk_identifier)
            .map(|(_, info)| info)
    }

}

impl Display for WavHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "RIFF size: {}", self.riff.size)?;
        for (id, info) in &self.header_info {
            writeln!(f, "Chunk {} {}", id, info)?;
        }
        match &self.fmt_chunk {
            Some(fmt_chunk) => writeln!(f, "{}", fmt_chunk)?,
            None => writeln!(f, "FmtChunk: missing")?,
        }
        if let Some(fact_chunk) = &self.fact_chunk {
            writeln!(f, "{}", fact_chunk)?;
        }
        write!(f, "Data size: {} bytes", self.data_size)
    }
}

#[cfg(test)]
mod header_tests {
    use std::io::Cursor;

    use super::*;
    use crate::{wav_type::FormatCode, WavLawError};

    const PCM_FMT_CHUNK: FmtChunk = FmtChunk {
        format: 1,
        channels: 1,
        sample_rate: 8000,
        byte_rate: 16000,
        block_align: 2,
        bits_per_sample: 16,
    };

    const MULAW_FMT_CHUNK: FmtChunk = FmtChunk {
        format: 7,
        channels: 1,
        sample_rate: 8000,
        byte_rate: 8000,
        block_align: 1,
        bits_per_sample: 8,
    };

    fn chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut bytes = ChunkHeader::new(id, payload.len() as u32).as_bytes().to_vec();
        bytes.extend_from_slice(payload);
        bytes
    }

    fn fmt_payload(fmt: FmtChunk) -> Vec<u8> {
        let bytes: [u8; 16] = fmt.into();
        bytes.to_vec()
    }

    fn riff(chunks: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = chunks.concat();
        let mut bytes = RiffHeader::new(4 + body.len() as u32).as_bytes().to_vec();
        bytes.extend_from_slice(&body);
        bytes
    }

    fn data_header(size: u32) -> Vec<u8> {
        ChunkHeader::new(DATA, size).as_bytes().to_vec()
    }

    fn walk(bytes: Vec<u8>) -> WavLawResult<WavHeader> {
        WavHeader::from_reader(&mut Cursor::new(bytes))
    }

    #[test]
    fn walks_a_pcm_header() {
        let mut bytes = riff(&[chunk(&FMT, &fmt_payload(PCM_FMT_CHUNK)), data_header(8)]);
        bytes.extend_from_slice(&[1, 0, 2, 0, 3, 0, 4, 0]);
        let mut cursor = Cursor::new(bytes);

        let header = WavHeader::from_reader(&mut cursor).expect("Failed to read header");
        assert_eq!(header.fmt_chunk, Some(PCM_FMT_CHUNK));
        assert_eq!(header.fact_chunk, None);
        assert_eq!(header.data_size, 8);
        assert_eq!(header.wav_type().unwrap(), WavType::Pcm16);
        assert_eq!(cursor.position(), 44, "reader should stop at the first sample");
        assert_eq!(header.get(DATA.into()), Some(&HeaderEntryInfo::new(44, 8)));
    }

    #[test]
    fn chunk_order_does_not_matter() {
        let fmt = chunk(&FMT, &fmt_payload(MULAW_FMT_CHUNK));
        let fact = chunk(&FACT, &100u32.to_le_bytes());

        let fmt_first = walk(riff(&[fmt.clone(), fact.clone(), data_header(100)])).unwrap();
        let fact_first = walk(riff(&[fact, fmt, data_header(100)])).unwrap();

        for header in [&fmt_first, &fact_first] {
            assert_eq!(header.fmt_chunk, Some(MULAW_FMT_CHUNK));
            assert_eq!(header.fact_chunk, Some(FactChunk::new(100)));
            assert_eq!(header.data_size, 100);
        }
        assert_eq!(fact_first.get(FMT.into()).unwrap().offset, 32);
    }

    #[test]
    fn fmt_extension_is_skipped() {
        let mut payload = fmt_payload(MULAW_FMT_CHUNK);
        payload.extend_from_slice(&[0, 0]);
        let header = walk(riff(&[
            chunk(&FMT, &payload),
            chunk(&FACT, &4u32.to_le_bytes()),
            data_header(4),
        ]))
        .unwrap();
        assert_eq!(header.fmt_chunk, Some(MULAW_FMT_CHUNK));
        assert_eq!(header.fact_chunk, Some(FactChunk::new(4)));
    }

    #[test]
    fn odd_chunks_are_padded() {
        let mut payload = fmt_payload(MULAW_FMT_CHUNK);
        payload.push(0xAA);
        let mut fmt = chunk(&FMT, &payload);
        fmt.push(0); // pad byte
        let header = walk(riff(&[fmt, data_header(2)])).unwrap();
        assert_eq!(header.fmt_chunk, Some(MULAW_FMT_CHUNK));
        assert_eq!(header.get(DATA.into()).unwrap().offset, 46);
    }

    #[test]
    fn rejects_bad_riff_tag() {
        let mut bytes = riff(&[chunk(&FMT, &fmt_payload(PCM_FMT_CHUNK)), data_header(0)]);
        bytes[0..4].copy_from_slice(b"RIFX");
        match walk(bytes) {
            Err(WavLawError::Format(FormatError::InvalidRiffTag(id))) => {
                assert_eq!(id, ChunkIdentifier::new(*b"RIFX"))
            }
            other => panic!("expected InvalidRiffTag, got {:?}", other),
        }
    }

    #[test]
    fn rejects_bad_wave_tag() {
        let mut bytes = riff(&[data_header(0)]);
        bytes[8..12].copy_from_slice(b"AVI ");
        assert!(matches!(
            walk(bytes),
            Err(WavLawError::Format(FormatError::InvalidWaveTag(_)))
        ));
    }

    #[test]
    fn rejects_unknown_chunk() {
        let bytes = riff(&[
            chunk(&FMT, &fmt_payload(PCM_FMT_CHUNK)),
            chunk(b"LIST", b"INFOjunk"),
            data_header(0),
        ]);
        match walk(bytes) {
            Err(WavLawError::Format(FormatError::UnknownChunk { id, size })) => {
                assert_eq!(id, ChunkIdentifier::new(*b"LIST"));
                assert_eq!(size, 8);
            }
            other => panic!("expected UnknownChunk, got {:?}", other),
        }
    }

    #[test]
    fn rejects_undersized_fmt() {
        let payload = fmt_payload(PCM_FMT_CHUNK);
        let bytes = riff(&[chunk(&FMT, &payload[..12]), data_header(0)]);
        assert!(matches!(
            walk(bytes),
            Err(WavLawError::Format(FormatError::FmtChunkTooSmall(12)))
        ));
    }

    #[test]
    fn rejects_duplicate_fmt() {
        let fmt = chunk(&FMT, &fmt_payload(PCM_FMT_CHUNK));
        assert!(matches!(
            walk(riff(&[fmt.clone(), fmt, data_header(0)])),
            Err(WavLawError::Format(FormatError::DuplicateChunk(_)))
        ));
    }

    #[test]
    fn missing_data_chunk() {
        let bytes = riff(&[chunk(&FMT, &fmt_payload(PCM_FMT_CHUNK))]);
        assert!(matches!(
            walk(bytes),
            Err(WavLawError::Format(FormatError::MissingDataChunk))
        ));
    }

    #[test]
    fn truncated_fmt_is_an_io_error() {
        let mut bytes = riff(&[chunk(&FMT, &fmt_payload(PCM_FMT_CHUNK))]);
        bytes.truncate(30);
        assert!(matches!(walk(bytes), Err(WavLawError::IOError(_))));
    }

    #[test]
    fn data_before_fmt_fails_in_synthesis() {
        let header = walk(riff(&[data_header(4)])).expect("walk stops at data");
        assert_eq!(header.fmt_chunk, None);
        assert!(matches!(
            header.synthesize(),
            Err(WavLawError::Format(FormatError::MissingFmtChunk))
        ));
        assert!(matches!(
            header.as_bytes(),
            Err(WavLawError::Format(FormatError::MissingFmtChunk))
        ));
    }

    #[test]
    fn synthesizes_mulaw_from_pcm() {
        let source = walk(riff(&[chunk(&FMT, &fmt_payload(PCM_FMT_CHUNK)), data_header(200)])).unwrap();
        let target = source.synthesize().unwrap();

        assert_eq!(target.fmt_chunk, Some(MULAW_FMT_CHUNK));
        assert_eq!(target.fact_chunk, Some(FactChunk::new(100)));
        assert_eq!(target.data_size, 100);
        assert_eq!(target.header_size(), 58);
        assert_eq!(target.riff.size, 50 + 100);

        let bytes = target.as_bytes().unwrap();
        assert_eq!(bytes.len(), 58);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[4..8], &150u32.to_le_bytes());
        assert_eq!(&bytes[8..16], b"WAVEfmt ");
        assert_eq!(&bytes[16..20], &18u32.to_le_bytes());
        assert_eq!(&bytes[20..22], &FormatCode::WAVE_FORMAT_MULAW.to_le_bytes());
        assert_eq!(&bytes[34..36], &8u16.to_le_bytes());
        assert_eq!(&bytes[36..38], &[0, 0], "cbSize");
        assert_eq!(&bytes[38..46], b"fact\x04\x00\x00\x00");
        assert_eq!(&bytes[46..50], &100u32.to_le_bytes());
        assert_eq!(&bytes[50..58], b"data\x64\x00\x00\x00");
    }

    #[test]
    fn synthesizes_pcm_from_mulaw() {
        let source = walk(riff(&[
            chunk(&FMT, &fmt_payload(MULAW_FMT_CHUNK)),
            chunk(&FACT, &100u32.to_le_bytes()),
            data_header(100),
        ]))
        .unwrap();
        let target = source.synthesize().unwrap();

        assert_eq!(target.fmt_chunk, Some(PCM_FMT_CHUNK));
        assert_eq!(target.fact_chunk, None);
        assert_eq!(target.data_size, 200);
        assert_eq!(target.header_size(), 44);
        assert_eq!(target.file_size(), 244);

        let bytes = target.as_bytes().unwrap();
        assert_eq!(bytes.len(), 44);
        assert_eq!(&bytes[16..20], &16u32.to_le_bytes());
        assert_eq!(&bytes[36..44], b"data\xc8\x00\x00\x00");
    }

    #[test]
    fn synthesized_header_walks_back() {
        let target = WavHeader::from_parts(MULAW_FMT_CHUNK, Some(FactChunk::new(7)), 7).unwrap();
        let bytes = target.as_bytes().unwrap().to_vec();
        let reread = walk(bytes).unwrap();
        assert_eq!(reread, target);
    }

    #[test]
    fn stereo_fields_follow_channel_count() {
        let mut stereo = PCM_FMT_CHUNK;
        stereo.channels = 2;
        stereo.block_align = 4;
        stereo.byte_rate = 32000;
        let source = walk(riff(&[chunk(&FMT, &fmt_payload(stereo)), data_header(8)])).unwrap();
        let fmt = source.synthesize().unwrap().fmt_chunk.unwrap();
        assert_eq!(fmt.channels, 2);
        assert_eq!(fmt.block_align, 2);
        assert_eq!(fmt.byte_rate, 16000);
    }

    #[test]
    fn synthesis_rejects_overflowing_byte_rate() {
        let mut fast = MULAW_FMT_CHUNK;
        fast.sample_rate = 3_000_000_000;
        fast.byte_rate = 3_000_000_000;
        let source = walk(riff(&[
            chunk(&FMT, &fmt_payload(fast)),
            chunk(&FACT, &4u32.to_le_bytes()),
            data_header(4),
        ]))
        .unwrap();
        assert!(matches!(
            source.synthesize(),
            Err(WavLawError::Format(FormatError::FmtFieldOverflow { .. }))
        ));
    }

    #[test]
    fn oversized_data_overflows_cleanly() {
        let header = WavHeader::from_parts(MULAW_FMT_CHUNK, None, u32::MAX / 2 + 1).unwrap();
        assert!(matches!(
            header.synthesize(),
            Err(WavLawError::Format(FormatError::DataSizeOverflow(_)))
        ));
    }
}
