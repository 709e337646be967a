use std::fmt::Display;

use crate::{WavLawError, WavLawResult};

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatCode {
    WAV_FORMAT_PCM = 1,
    WAVE_FORMAT_ALAW = 6,
    WAVE_FORMAT_MULAW = 7,
}

impl FormatCode {
    pub const fn to_le_bytes(self) -> [u8; 2] {
        (self as u16).to_le_bytes()
    }

    /// True for the G.711 encodings, which carry a fact chunk.
    pub const fn is_compressed(self) -> bool {
        !matches!(self, FormatCode::WAV_FORMAT_PCM)
    }
}

impl Display for FormatCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatCode::WAV_FORMAT_PCM => write!(f, "WAV_FORMAT_PCM"),
            FormatCode::WAVE_FORMAT_ALAW => write!(f, "WAVE_FORMAT_ALAW"),
            FormatCode::WAVE_FORMAT_MULAW => write!(f, "WAVE_FORMAT_MULAW"),
        }
    }
}

impl TryFrom<u16> for FormatCode {
    type Error = WavLawError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(FormatCode::WAV_FORMAT_PCM),
            6 => Ok(FormatCode::WAVE_FORMAT_ALAW),
            7 => Ok(FormatCode::WAVE_FORMAT_MULAW),
            _ => Err(WavLawError::UnknownFormatCode(value)),
        }
    }
}

impl From<FormatCode> for u16 {
    fn from(value: FormatCode) -> Self {
        value as u16
    }
}

/// Enum representing the sample encoding of a wav file this crate can reason about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WavType {
    Pcm16,
    MuLaw,
    ALaw,
}

const PCM_16_BITS: u16 = (std::mem::size_of::<i16>() * 8) as u16;
const G711_BITS: u16 = (std::mem::size_of::<u8>() * 8) as u16;

impl WavType {
    pub fn n_bits(&self) -> u16 {
        match self {
            WavType::Pcm16 => PCM_16_BITS,
            WavType::MuLaw | WavType::ALaw => G711_BITS,
        }
    }

    pub fn format_code(&self) -> FormatCode {
        match self {
            WavType::Pcm16 => FormatCode::WAV_FORMAT_PCM,
            WavType::MuLaw => FormatCode::WAVE_FORMAT_MULAW,
            WavType::ALaw => FormatCode::WAVE_FORMAT_ALAW,
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.format_code().is_compressed()
    }

    /// The encoding a file of this type is converted into.
    /// Linear PCM is companded to mu-law, and either G.711 law expands to linear PCM.
    pub fn transcode_target(&self) -> WavType {
        match self {
            WavType::Pcm16 => WavType::MuLaw,
            WavType::MuLaw | WavType::ALaw => WavType::Pcm16,
        }
    }
}

impl Display for WavType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WavType::Pcm16 => write!(f, "PCM_16"),
            WavType::MuLaw => write!(f, "G711_MULAW"),
            WavType::ALaw => write!(f, "G711_ALAW"),
        }
    }
}

impl TryFrom<(FormatCode, u16)> for WavType {
    type Error = WavLawError;

    fn try_from(value: (FormatCode, u16)) -> WavLawResult<Self> {
        Ok(match value {
            (FormatCode::WAV_FORMAT_PCM, PCM_16_BITS) => WavType::Pcm16,
            (FormatCode::WAVE_FORMAT_MULAW, G711_BITS) => WavType::MuLaw,
            (FormatCode::WAVE_FORMAT_ALAW, G711_BITS) => WavType::ALaw,
            (format, bits_per_sample) => {
                return Err(WavLawError::InvalidLayout {
                    format,
                    bits_per_sample,
                })
            }
        })
    }
}

impl From<WavType> for (FormatCode, u16) {
    fn from(value: WavType) -> Self {
        (value.format_code(), value.n_bits())
    }
}
