/// Module contains the core structs, ``ConversionPlan`` and ``Transcoder``, for converting wav streams.
use std::fmt::Display;
use std::io::{Read, Write};

use byteorder::{ByteOrder, LittleEndian};

use crate::codec::{Companding, G711};
use crate::error::{WavLawError, WavLawResult};
use crate::header::WavHeader;
use crate::log;
use crate::wav_type::WavType;

/// Number of samples moved through the codec per read.
pub const BLOCK_SIZE: usize = 4096;

/// Which way samples flow through a G.711 law.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// 16-bit PCM in, companded codes out.
    Encode(G711),
    /// Companded codes in, 16-bit PCM out.
    Decode(G711),
}

impl Direction {
    pub fn codec(&self) -> G711 {
        match self {
            Direction::Encode(codec) | Direction::Decode(codec) => *codec,
        }
    }
}

/// Everything decided before a single output byte is written: the parsed input header, the
/// synthesized output header and the codec direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionPlan {
    pub source: WavHeader,
    pub target: WavHeader,
    pub direction: Direction,
}

impl ConversionPlan {
    /// Plans the conversion of a walked header. Fails on a missing fmt chunk, an encoding with
    /// no implemented transform, or a data size the output container cannot hold.
    pub fn new(source: WavHeader) -> WavLawResult<Self> {
        let direction = match source.wav_type()? {
            WavType::Pcm16 => Direction::Encode(G711::MuLaw),
            WavType::MuLaw => Direction::Decode(G711::MuLaw),
            WavType::ALaw => Direction::Decode(G711::ALaw),
        };

        let codec = direction.codec();
        if !codec.is_supported() {
            return Err(WavLawError::UnsupportedEncoding(codec.format_code()));
        }

        let target = source.synthesize()?;
        Ok(ConversionPlan {
            source,
            target,
            direction,
        })
    }

    /// Number of samples the data chunk holds, counted in units of the source encoding.
    pub fn n_samples(&self) -> usize {
        match self.direction {
            Direction::Encode(_) => self.source.data_size as usize / 2,
            Direction::Decode(_) => self.source.data_size as usize,
        }
    }
}

/// The outcome of a finished conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionSummary {
    pub source: WavType,
    pub target: WavType,
    pub n_samples: usize,
    pub bytes_written: u64,
}

impl Display for ConversionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Converted {} samples from {} to {} ({} bytes written)",
            self.n_samples, self.source, self.target, self.bytes_written
        )
    }
}

/// Owns both ends of a conversion. The reader must be positioned at the first sample of the
/// data chunk described by the plan's source header.
pub struct Transcoder<R: Read, W: Write> {
    reader: R,
    writer: W,
    plan: ConversionPlan,
}

impl<R: Read, W: Write> Transcoder<R, W> {
    /// Walks the header of `reader` and plans the conversion.
    pub fn new(mut reader: R, writer: W) -> WavLawResult<Self> {
        let source = WavHeader::from_reader(&mut reader)?;
        let plan = ConversionPlan::new(source)?;
        Ok(Self::with_plan(reader, writer, plan))
    }

    pub fn with_plan(reader: R, writer: W, plan: ConversionPlan) -> Self {
        Transcoder {
            reader,
            writer,
            plan,
        }
    }

    pub fn plan(&self) -> &ConversionPlan {
        &self.plan
    }

    /// Writes the synthesized header followed by every converted sample.
    pub fn run(&mut self) -> WavLawResult<ConversionSummary> {
        let header_bytes = self.plan.target.as_bytes()?;
        self.writer.write_all(&header_bytes)?;

        let n_samples = match self.plan.direction {
            Direction::Encode(codec) => self.encode(codec)?,
            Direction::Decode(codec) => self.decode(codec)?,
        };
        self.writer.flush()?;

        let summary = ConversionSummary {
            source: self.plan.source.wav_type()?,
            target: self.plan.target.wav_type()?,
            n_samples,
            bytes_written: header_bytes.len() as u64 + self.plan.target.data_size as u64,
        };
        log!(log::Level::Info, "{}", summary);
        Ok(summary)
    }

    fn encode(&mut self, codec: G711) -> WavLawResult<usize> {
        let n_samples = self.plan.n_samples();
        if self.plan.source.data_size % 2 != 0 {
            log!(
                log::Level::Warn,
                "Data size {} is not a whole number of 16-bit samples, ignoring the last byte",
                self.plan.source.data_size
            );
        }

        let mut bytes = vec![0u8; BLOCK_SIZE * 2];
        let mut samples = vec![0i16; BLOCK_SIZE];
        let mut codes = Vec::with_capacity(BLOCK_SIZE);

        let mut remaining = n_samples;
        while remaining > 0 {
            let n = remaining.min(BLOCK_SIZE);
            self.reader.read_exact(&mut bytes[..n * 2])?;
            LittleEndian::read_i16_into(&bytes[..n * 2], &mut samples[..n]);

            codes.clear();
            codec.encode_into(&samples[..n], &mut codes)?;
            trace_block(&samples[..n], &codes);

            self.writer.write_all(&codes)?;
            remaining -= n;
        }
        Ok(n_samples)
    }

    fn decode(&mut self, codec: G711) -> WavLawResult<usize> {
        let n_samples = self.plan.n_samples();

        let mut codes = vec![0u8; BLOCK_SIZE];
        let mut samples = Vec::with_capacity(BLOCK_SIZE);
        let mut bytes = vec![0u8; BLOCK_SIZE * 2];

        let mut remaining = n_samples;
        while remaining > 0 {
            let n = remaining.min(BLOCK_SIZE);
            self.reader.read_exact(&mut codes[..n])?;

            samples.clear();
            codec.decode_into(&codes[..n], &mut samples)?;
            trace_block(&samples, &codes[..n]);

            LittleEndian::write_i16_into(&samples, &mut bytes[..n * 2]);
            self.writer.write_all(&bytes[..n * 2])?;
            remaining -= n;
        }
        Ok(n_samples)
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

#[cfg(feature = "logging")]
fn trace_block(samples: &[i16], codes: &[u8]) {
    if log::log_enabled!(log::Level::Trace) {
        for (sample, code) in samples.iter().zip(codes) {
            log::trace!("16-bit PCM {:04x} <-> {:02x} 8-bit ulaw", sample, code);
        }
    }
}

#[cfg(not(feature = "logging"))]
fn trace_block(_samples: &[i16], _codes: &[u8]) {}
