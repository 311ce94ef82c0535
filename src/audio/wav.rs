//! WAV file input for offline replay.

use crate::audio::frame::PcmFrame;
use crate::error::Result;
use std::io::Read;
use std::path::Path;

/// Read a 16-bit WAV file and split it into frames of `frame_ms`.
///
/// The final partial frame is kept. Format is preserved; no resampling.
pub fn read_frames(path: &Path, frame_ms: u32) -> Result<Vec<PcmFrame>> {
    let reader = hound::WavReader::open(path)?;
    frames_from_reader(reader, frame_ms)
}

/// Same as [`read_frames`] for any reader (tests, stdin).
pub fn read_frames_from<R: Read>(reader: R, frame_ms: u32) -> Result<Vec<PcmFrame>> {
    let reader = hound::WavReader::new(reader)?;
    frames_from_reader(reader, frame_ms)
}

fn frames_from_reader<R: Read>(
    mut reader: hound::WavReader<R>,
    frame_ms: u32,
) -> Result<Vec<PcmFrame>> {
    let spec = reader.spec();
    let samples: Vec<i16> = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let per_frame =
        ((spec.sample_rate as u64 * frame_ms as u64 / 1000) as usize * spec.channels as usize)
            .max(spec.channels as usize)
            .max(1);

    Ok(samples
        .chunks(per_frame)
        .map(|chunk| PcmFrame::new(chunk.to_vec(), spec.sample_rate, spec.channels))
        .collect())
}
