//! # WavLaw
//!
//! WavLaw converts RIFF/WAVE files between 16-bit linear PCM and 8-bit G.711 mu-law.
//!
//! The direction is chosen from the input: a PCM file is companded to mu-law, a mu-law file is
//! expanded back to PCM. The header of the output is synthesized from the input header, so
//! channel count and sample rate survive the trip while the derived format fields, the fact
//! chunk and the data size are rewritten for the new sample width.
//!
//! ## Core Features
//!
//! - **Strict chunk walking**: `fmt `, `fact` and `data` chunks in any order before the samples,
//!   with odd chunk padding and fmt/fact extensions skipped. Anything else is rejected.
//! - **Streaming conversion**: samples are moved in fixed-size blocks, so memory use does not
//!   depend on the length of the file.
//! - **No surprises on failure**: the input header is validated before the output file is
//!   created, and a partially written output is removed.
//!
//! - **Optional Features**:
//!   - `colored`: Enhanced debug output
//!   - `logging`: Detailed operation logging (enabled by default)
//!
//! ## Quick Examples
//!
//! ```no_run
//! use wavlaw::{convert_file, ConvertOptions};
//!
//! // PCM in, mu-law out
//! let summary = convert_file("speech.wav", "speech_ulaw.wav", &ConvertOptions::default())?;
//! println!("{}", summary);
//! # Ok::<(), wavlaw::WavLawError>(())
//! ```
//!
//! ```no_run
//! use wavlaw::read_header;
//!
//! let header = read_header("speech_ulaw.wav")?;
//! println!("{}", header);
//! # Ok::<(), wavlaw::WavLawError>(())
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return `WavLawResult<T>`. Structural problems with the input are reported
//! as `WavLawError::Format`, an encoding that is recognised but has no transform yet (A-law) as
//! `WavLawError::UnsupportedEncoding`.

pub mod chunks;
pub mod codec;
pub mod core;
pub mod error;
pub mod header;
pub mod wav_type;

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

pub use crate::chunks::{FactChunk, FmtChunk, DATA, FACT, FMT, RIFF, WAVE};
pub use crate::codec::{linear_to_ulaw, ulaw_to_linear, Companding, G711};
pub use crate::core::{ConversionPlan, ConversionSummary, Direction, Transcoder};
pub use crate::error::{FormatError, WavLawError, WavLawResult};
pub use crate::header::WavHeader;
pub use crate::wav_type::{FormatCode, WavType};

/// A macro for logging messages if the logging feature is enabled.
#[macro_export]
macro_rules! log {
    ($level:expr, $($arg:tt)+) => {
        #[cfg(feature = "logging")]
        log::log!($level, $($arg)+);
    };
}

/// Output path used by the command line tool when none is given.
pub const DEFAULT_OUTPUT: &str = "outfile.wav";

/// Options controlling how ``convert_file`` treats the output path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConvertOptions {
    /// Replace an existing output file instead of failing.
    pub overwrite: bool,
}

impl ConvertOptions {
    fn open_output(&self, path: &Path) -> io::Result<File> {
        let mut options = OpenOptions::new();
        options.write(true);
        if self.overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        options.open(path)
    }
}

/// Reads and validates the header of a wav file without touching its samples.
///
/// # Examples
///
/// ```no_run
/// use wavlaw::read_header;
///
/// let header = read_header("path/to/wav.wav").unwrap();
/// println!("{} bytes of sample data", header.data_size);
/// ```
pub fn read_header<P: AsRef<Path>>(path: P) -> WavLawResult<WavHeader> {
    let mut reader = BufReader::new(File::open(&path)?);
    let header = WavHeader::from_reader(&mut reader)?;
    log!(
        log::Level::Debug,
        "Read header from {}\n{}",
        path.as_ref().display(),
        header
    );
    Ok(header)
}

/// Converts the wav file at `input` and writes the result to `output`.
///
/// PCM input is encoded to mu-law, mu-law input is decoded to PCM. The input header is walked
/// and the conversion planned before `output` is opened, so a malformed or unsupported input
/// never creates the output file. If the conversion fails after that point the partial output
/// is removed.
pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &ConvertOptions,
) -> WavLawResult<ConversionSummary> {
    let input = input.as_ref();
    let output = output.as_ref();

    let mut reader = BufReader::new(File::open(input)?);
    let source = WavHeader::from_reader(&mut reader)?;
    log!(
        log::Level::Debug,
        "Read header from {}\n{}",
        input.display(),
        source
    );
    let plan = ConversionPlan::new(source)?;
    log!(
        log::Level::Debug,
        "Writing {} to {}\n{}",
        plan.target.wav_type()?,
        output.display(),
        plan.target
    );

    let writer = BufWriter::new(options.open_output(output)?);
    let result = Transcoder::with_plan(reader, writer, plan).run();
    if let Err(e) = &result {
        log!(
            log::Level::Warn,
            "Removing partial output {}: {}",
            output.display(),
            e
        );
        if let Err(remove_err) = std::fs::remove_file(output) {
            log!(
                log::Level::Warn,
                "Failed to remove {}: {}",
                output.display(),
                remove_err
            );
        }
    }
    result
}

/// Converts a complete wav file held in memory and returns the converted file.
pub fn convert(bytes: &[u8]) -> WavLawResult<Vec<u8>> {
    let mut transcoder = Transcoder::new(bytes, Vec::new())?;
    transcoder.run()?;
    let (_, output) = transcoder.into_inner();
    Ok(output)
}
