//! WAV container layout for mono 16-bit PCM.
//!
//! Generates and parses the canonical 44-byte RIFF header that precedes the
//! sample data of every saved sound.

use crate::models::error::CaptureError;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

pub const BITS_PER_SAMPLE: u16 = 16;
pub const CHANNELS: u16 = 1;
pub const PCM_FORMAT: u16 = 1;
/// Bytes per mono 16-bit frame.
pub const BLOCK_ALIGN: u16 = CHANNELS * BITS_PER_SAMPLE / 8;
/// Highest sample rate whose byte rate still fits the header's 32-bit field.
pub const MAX_SAMPLE_RATE: u32 = u32::MAX / BLOCK_ALIGN as u32;

/// Generate a 44-byte WAV RIFF header for mono 16-bit PCM.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  1 (channels)
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * 2
/// [32-33]  block_align = 2
/// [34-35]  16 (bits per sample)
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
///
/// Out-of-range sizes saturate; callers check `sample_rate <= MAX_SAMPLE_RATE`
/// and `data_size <= u32::MAX - 36` first.
pub fn generate_wav_header(sample_rate: u32, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let byte_rate = sample_rate.saturating_mul(BLOCK_ALIGN as u32);
    let chunk_size = data_size.saturating_add(36);

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&PCM_FORMAT.to_le_bytes());
    header[22..24].copy_from_slice(&CHANNELS.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&BLOCK_ALIGN.to_le_bytes());
    header[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Decoded fields of a 44-byte WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub chunk_size: u32,
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl WavHeader {
    /// Parse a header, accepting only the mono 16-bit PCM layout this crate writes.
    ///
    /// The `RIFF` signature is checked first so that anything that is not a
    /// RIFF file is rejected before any field is looked at.
    pub fn parse(bytes: &[u8]) -> Result<Self, CaptureError> {
        if bytes.len() < WAV_HEADER_SIZE {
            return Err(CaptureError::MalformedHeader(format!(
                "header is {} bytes, expected {}",
                bytes.len(),
                WAV_HEADER_SIZE
            )));
        }
        if &bytes[0..4] != b"RIFF" {
            return Err(CaptureError::MalformedHeader("missing RIFF signature".into()));
        }
        if &bytes[8..12] != b"WAVE" {
            return Err(CaptureError::MalformedHeader("missing WAVE signature".into()));
        }
        if &bytes[12..16] != b"fmt " {
            return Err(CaptureError::MalformedHeader("missing fmt chunk".into()));
        }
        if &bytes[36..40] != b"data" {
            return Err(CaptureError::MalformedHeader("missing data chunk".into()));
        }

        let header = Self {
            chunk_size: read_u32(bytes, 4),
            audio_format: read_u16(bytes, 20),
            channels: read_u16(bytes, 22),
            sample_rate: read_u32(bytes, 24),
            byte_rate: read_u32(bytes, 28),
            block_align: read_u16(bytes, 32),
            bits_per_sample: read_u16(bytes, 34),
            data_size: read_u32(bytes, 40),
        };

        if header.audio_format != PCM_FORMAT {
            return Err(CaptureError::MalformedHeader(format!(
                "unsupported audio format {}",
                header.audio_format
            )));
        }
        if header.channels != CHANNELS {
            return Err(CaptureError::MalformedHeader(format!(
                "expected mono, found {} channels",
                header.channels
            )));
        }
        if header.bits_per_sample != BITS_PER_SAMPLE {
            return Err(CaptureError::MalformedHeader(format!(
                "expected 16-bit samples, found {}",
                header.bits_per_sample
            )));
        }
        Ok(header)
    }
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_riff_magic() {
        let header = generate_wav_header(44100, 0);
        assert_eq!(header.len(), 44);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");
    }

    #[test]
    fn header_44khz_mono_16bit_is_byte_exact() {
        let header = generate_wav_header(44100, 8);
        let expected: [u8; 44] = [
            b'R', b'I', b'F', b'F', 44, 0, 0, 0, // 36 + 8
            b'W', b'A', b'V', b'E', b'f', b'm', b't', b' ', //
            16, 0, 0, 0, // fmt chunk size
            1, 0, // PCM
            1, 0, // mono
            0x44, 0xAC, 0, 0, // 44100
            0x88, 0x58, 0x01, 0, // 88200
            2, 0, // block align
            16, 0, // bits per sample
            b'd', b'a', b't', b'a', 8, 0, 0, 0,
        ];
        assert_eq!(header, expected);
    }

    #[test]
    fn parse_reads_back_generated_fields() {
        let parsed = WavHeader::parse(&generate_wav_header(16000, 3200)).unwrap();
        assert_eq!(parsed.sample_rate, 16000);
        assert_eq!(parsed.byte_rate, 32000);
        assert_eq!(parsed.block_align, 2);
        assert_eq!(parsed.data_size, 3200);
        assert_eq!(parsed.chunk_size, 3236);
    }

    #[test]
    fn parse_rejects_non_riff() {
        let mut header = generate_wav_header(44100, 0);
        header[0..4].copy_from_slice(b"RIFX");
        assert!(matches!(WavHeader::parse(&header), Err(CaptureError::MalformedHeader(_))));

        let garbage = [0xAAu8; 44];
        assert!(matches!(WavHeader::parse(&garbage), Err(CaptureError::MalformedHeader(_))));
    }

    #[test]
    fn parse_rejects_short_input() {
        let header = generate_wav_header(44100, 0);
        assert!(matches!(
            WavHeader::parse(&header[..20]),
            Err(CaptureError::MalformedHeader(_))
        ));
    }

    #[test]
    fn parse_rejects_stereo() {
        let mut header = generate_wav_header(44100, 0);
        header[22..24].copy_from_slice(&2u16.to_le_bytes());
        assert!(matches!(WavHeader::parse(&header), Err(CaptureError::MalformedHeader(_))));
    }
}
