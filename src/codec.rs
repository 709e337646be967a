//! ITU-T G.711 companding.
//!
//! A mu-law code is laid out as `seeemmmm` (sign, exponent, mantissa) and is sent with every
//! bit inverted. Linear samples are handled in the 14-bit domain the standard is defined on,
//! so encoding drops the two low bits of a 16-bit sample and decoding restores the scale.
//!
//! ```text
//!  biased linear (14b)   mu-law     decoded linear (14b)
//!  s00000001abcdx        s000abcd   s00000001abcd1
//!  s0000001abcdxx        s001abcd   s0000001abcd10
//!  s000001abcdxxx        s010abcd   s000001abcd100
//!  s00001abcdxxxx        s011abcd   s00001abcd1000
//!  s0001abcdxxxxx        s100abcd   s0001abcd10000
//!  s001abcdxxxxxx        s101abcd   s001abcd100000
//!  s01abcdxxxxxxx        s110abcd   s01abcd1000000
//!  s1abcdxxxxxxxx        s111abcd   s1abcd10000000
//! ```
use crate::{wav_type::FormatCode, WavLawError, WavLawResult};

pub const ULAW_BIAS: i32 = 33;
/// Largest biased magnitude, thirteen ones.
pub const ULAW_CLIP: i32 = 0x1FFF;

const SIGN_MASK: u8 = 0x80;
const EXP_MASK: u8 = 0x70;
const MANT_MASK: u8 = 0x0F;

/// Encodes a 16-bit linear sample as a mu-law code.
///
/// Over-range magnitudes saturate at the largest code of the matching sign.
#[inline]
pub fn linear_to_ulaw(sample: i16) -> u8 {
    let sign = if sample < 0 { SIGN_MASK } else { 0 };
    let magnitude = ((i32::from(sample).abs() >> 2) + ULAW_BIAS).min(ULAW_CLIP);

    let exponent = ulaw_exponent(magnitude);
    let mantissa = ((magnitude >> (exponent + 1)) as u8) & MANT_MASK;

    !(sign | ((exponent as u8) << 4) | mantissa)
}

/// Position of the highest set bit among bits 5 to 12, offset so bit 5 is exponent 0.
#[inline]
fn ulaw_exponent(biased: i32) -> u32 {
    (0..8u32)
        .rev()
        .find(|e| biased & (0x20 << e) != 0)
        .unwrap_or(0)
}

/// Decodes a mu-law code into a 16-bit linear sample.
#[inline]
pub fn ulaw_to_linear(ulaw: u8) -> i16 {
    let ulaw = !ulaw;
    let sign = ulaw & SIGN_MASK;
    let exponent = (ulaw & EXP_MASK) >> 4;
    let mantissa = ulaw & MANT_MASK;

    let mut magnitude = i32::from(mantissa) | 0x10; // abcd -> 1abcd
    magnitude = (magnitude << 1) | 1; // 1abcd -> 1abcd1
    magnitude <<= exponent;
    magnitude -= ULAW_BIAS;
    magnitude <<= 2;

    match sign {
        0 => magnitude as i16,
        _ => -magnitude as i16,
    }
}

/// A per-sample transform between linear PCM and a companded code.
pub trait Companding {
    fn encode_sample(&self, sample: i16) -> WavLawResult<u8>;

    fn decode_sample(&self, code: u8) -> WavLawResult<i16>;

    fn encode_into(&self, samples: &[i16], out: &mut Vec<u8>) -> WavLawResult<()> {
        out.reserve(samples.len());
        for &sample in samples {
            out.push(self.encode_sample(sample)?);
        }
        Ok(())
    }

    fn decode_into(&self, codes: &[u8], out: &mut Vec<i16>) -> WavLawResult<()> {
        out.reserve(codes.len());
        for &code in codes {
            out.push(self.decode_sample(code)?);
        }
        Ok(())
    }
}

/// The G.711 laws, selected from the format code of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum G711 {
    MuLaw,
    /// Recognised but not implemented: every call reports `UnsupportedEncoding`.
    ALaw,
}

impl G711 {
    pub fn from_format_code(code: FormatCode) -> Option<Self> {
        match code {
            FormatCode::WAVE_FORMAT_MULAW => Some(G711::MuLaw),
            FormatCode::WAVE_FORMAT_ALAW => Some(G711::ALaw),
            FormatCode::WAV_FORMAT_PCM => None,
        }
    }

    pub fn format_code(&self) -> FormatCode {
        match self {
            G711::MuLaw => FormatCode::WAVE_FORMAT_MULAW,
            G711::ALaw => FormatCode::WAVE_FORMAT_ALAW,
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, G711::MuLaw)
    }
}

impl Companding for G711 {
    #[inline]
    fn encode_sample(&self, sample: i16) -> WavLawResult<u8> {
        match self {
            G711::MuLaw => Ok(linear_to_ulaw(sample)),
            G711::ALaw => Err(WavLawError::UnsupportedEncoding(self.format_code())),
        }
    }

    #[inline]
    fn decode_sample(&self, code: u8) -> WavLawResult<i16> {
        match self {
            G711::MuLaw => Ok(ulaw_to_linear(code)),
            G711::ALaw => Err(WavLawError::UnsupportedEncoding(self.format_code())),
        }
    }
}
