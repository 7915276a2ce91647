//! Utilities for creating `rodio` sinks from audio files.
//!
//! The helper here encapsulates opening/decoding a file and preparing a
//! paused `Sink` at the requested start position.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use rodio::decoder::DecoderError;
use rodio::{Decoder, OutputStream, Sink, Source};

use super::types::LoadFailure;

/// Create a paused `Sink` for the file at `path` that starts playback at
/// `start_at`. Also returns the decoder-reported total duration, when
/// the format knows it.
pub(super) fn create_sink_at(
    handle: &OutputStream,
    path: &Path,
    start_at: Duration,
) -> Result<(Sink, Option<Duration>), LoadFailure> {
    let file = File::open(path).map_err(|e| LoadFailure::Other(e.to_string()))?;

    let source = Decoder::new(BufReader::new(file)).map_err(classify_decode_error)?;
    let total = source.total_duration();

    // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
    let source = source.skip_duration(start_at);

    let sink = Sink::connect_new(handle.mixer());
    sink.append(source);
    sink.pause();
    Ok((sink, total))
}

pub(super) fn classify_decode_error(err: DecoderError) -> LoadFailure {
    match err {
        DecoderError::UnrecognizedFormat => LoadFailure::UnsupportedFormat,
        other => LoadFailure::Other(other.to_string()),
    }
}
