use std::io::{self, Read, Write};

use sha2::{Digest, Sha256};

use crate::models::error::CaptureError;
use crate::processing::clip::Clip;
use crate::processing::wav_format::{self, WavHeader, BLOCK_ALIGN, WAV_HEADER_SIZE};

/// What `encode` put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSummary {
    pub header: [u8; WAV_HEADER_SIZE],
    /// Header plus sample data.
    pub bytes_written: u64,
    /// SHA-256 hex digest of every byte written.
    pub checksum: String,
}

/// Result of `decode`: the raw and parsed header plus the clips read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub header: [u8; WAV_HEADER_SIZE],
    pub wav: WavHeader,
    pub clips: Vec<Clip>,
}

/// Write `clips` as one mono 16-bit WAV stream.
///
/// ## File Format
/// ```text
/// [44-byte WAV header]
/// [clip 0 samples, LE i16][clip 1 samples] ...
/// ```
pub fn encode<W: Write + ?Sized>(
    writer: &mut W,
    clips: &[Clip],
    sample_rate: u32,
) -> Result<EncodeSummary, CaptureError> {
    if sample_rate == 0 || sample_rate.checked_mul(BLOCK_ALIGN as u32).is_none() {
        return Err(CaptureError::InvalidArgument(format!(
            "sample rate {} has no valid WAV byte rate",
            sample_rate
        )));
    }
    let total_samples: usize = clips.iter().map(Clip::len).sum();
    let data_size = u32::try_from(total_samples * 2)
        .ok()
        .filter(|size| *size <= u32::MAX - 36)
        .ok_or_else(|| {
            CaptureError::InvalidArgument(format!("{} samples do not fit a WAV container", total_samples))
        })?;

    let header = wav_format::generate_wav_header(sample_rate, data_size);
    let mut hasher = Sha256::new();

    write_fully(writer, &header)?;
    hasher.update(header);
    let mut bytes_written = WAV_HEADER_SIZE as u64;

    for clip in clips {
        let bytes = clip.to_le_bytes();
        write_fully(writer, &bytes)?;
        hasher.update(&bytes);
        bytes_written += bytes.len() as u64;
    }

    writer
        .flush()
        .map_err(|e| CaptureError::WriteError(format!("flush failed: {}", e)))?;

    Ok(EncodeSummary {
        header,
        bytes_written,
        checksum: hex_encode(&hasher.finalize()),
    })
}

/// Read a WAV stream of `file_size` bytes back into clips of `clip_size` samples.
///
/// The sample count comes from the file size rather than the header's data
/// size field. Full clips come first, followed by one shorter clip holding
/// the remainder if there is one.
pub fn decode<R: Read + ?Sized>(reader: &mut R, file_size: u64, clip_size: usize) -> Result<Decoded, CaptureError> {
    if clip_size == 0 {
        return Err(CaptureError::InvalidArgument("clip size must be positive".into()));
    }

    let mut header = [0u8; WAV_HEADER_SIZE];
    reader.read_exact(&mut header).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => CaptureError::MalformedHeader(format!(
            "file is {} bytes, shorter than a {}-byte header",
            file_size, WAV_HEADER_SIZE
        )),
        _ => CaptureError::StorageError(format!("failed to read header: {}", e)),
    })?;
    let wav = WavHeader::parse(&header)?;

    let sample_count = (file_size.saturating_sub(WAV_HEADER_SIZE as u64) / 2) as usize;
    let full_clips = sample_count / clip_size;
    let tail = sample_count % clip_size;

    let mut clips = Vec::with_capacity(full_clips + usize::from(tail > 0));
    for _ in 0..full_clips {
        clips.push(load_clip(reader, clip_size)?);
    }
    if tail > 0 {
        clips.push(load_clip(reader, tail)?);
    }

    Ok(Decoded { header, wav, clips })
}

fn load_clip<R: Read + ?Sized>(reader: &mut R, count: usize) -> Result<Clip, CaptureError> {
    let mut clip = Clip::new(count);
    clip.load_from(reader, count)?;
    Ok(clip)
}

/// Write all of `data`, treating a write that accepts nothing as a short write.
pub(crate) fn write_fully<W: Write + ?Sized>(writer: &mut W, data: &[u8]) -> Result<(), CaptureError> {
    let mut written = 0;
    while written < data.len() {
        match writer.write(&data[written..]) {
            Ok(0) => {
                return Err(CaptureError::WriteError(format!(
                    "short write: {} of {} bytes",
                    written,
                    data.len()
                )))
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CaptureError::WriteError(format!("write failed: {}", e))),
        }
    }
    Ok(())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
