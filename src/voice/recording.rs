//! Recorded utterance validation and preparation for STT

use std::io::Cursor;

use crate::{Error, Result};

/// Sample rate expected by the transcriber (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// Whether the payload carries a RIFF/WAVE header
#[must_use]
pub fn is_wav(audio: &[u8]) -> bool {
    audio.len() >= 12 && &audio[0..4] == b"RIFF" && &audio[8..12] == b"WAVE"
}

/// Reject recordings the transcriber cannot use
///
/// Empty payloads always fail. WAV payloads must decode and contain samples;
/// other containers (webm, mp3) are left to the transcriber.
///
/// # Errors
///
/// Returns [`Error::Stt`] for empty audio and [`Error::Audio`] for
/// unreadable or silent-by-construction WAV data
pub fn validate_recording(audio: &[u8]) -> Result<()> {
    if audio.is_empty() {
        return Err(Error::Stt("audio is empty, please record again".to_string()));
    }

    if is_wav(audio) {
        let reader = hound::WavReader::new(Cursor::new(audio))
            .map_err(|e| Error::Audio(format!("unreadable WAV data: {e}")))?;
        if reader.duration() == 0 {
            return Err(Error::Audio("WAV recording has no samples".to_string()));
        }
    }

    Ok(())
}

/// Decode WAV bytes to mono f32 samples in `[-1.0, 1.0]`
///
/// # Errors
///
/// Returns error if the WAV data cannot be decoded
#[allow(clippy::cast_precision_loss)]
pub fn decode_wav(audio: &[u8]) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::new(Cursor::new(audio))
        .map_err(|e| Error::Audio(format!("unreadable WAV data: {e}")))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Audio(e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::Audio(e.to_string()))?
        }
    };

    let channels = usize::from(spec.channels.max(1));
    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    Ok((mono, spec.sample_rate))
}

/// Scale samples so the loudest one reaches full scale
pub fn peak_normalize(samples: &mut [f32]) {
    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak > 0.0 {
        for s in samples.iter_mut() {
            *s /= peak;
        }
    }
}

/// Input frames fed to the resampler per call
const RESAMPLE_CHUNK: usize = 1024;

/// Band-limited resample to `target_rate` using rubato
///
/// The trailing partial chunk is flushed and the resampler delay trimmed, so
/// the output covers the whole recording.
///
/// # Errors
///
/// Returns error if the resampler cannot be built or fails
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn resample(samples: &[f32], from_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    use rubato::{FftFixedIn, Resampler};

    if from_rate == target_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    if from_rate == 0 || target_rate == 0 {
        return Err(Error::Audio("sample rate must be non-zero".to_string()));
    }

    let mut resampler = FftFixedIn::<f64>::new(
        from_rate as usize,
        target_rate as usize,
        RESAMPLE_CHUNK,
        2,
        1,
    )
    .map_err(|e| Error::Audio(format!("resampler init failed: {e}")))?;

    let input: Vec<f64> = samples.iter().map(|&s| f64::from(s)).collect();
    let expected = (samples.len() as u64 * u64::from(target_rate)).div_ceil(u64::from(from_rate)) as usize;
    let delay = resampler.output_delay();

    let mut output = Vec::with_capacity(expected + delay);
    let mut chunks = input.chunks_exact(RESAMPLE_CHUNK);
    for chunk in &mut chunks {
        let result = resampler
            .process(&[chunk], None)
            .map_err(|e| Error::Audio(format!("resample failed: {e}")))?;
        output.extend_from_slice(&result[0]);
    }

    let rest = chunks.remainder();
    if !rest.is_empty() {
        let result = resampler
            .process_partial(Some(&[rest][..]), None)
            .map_err(|e| Error::Audio(format!("resample failed: {e}")))?;
        output.extend_from_slice(&result[0]);
    }

    // Drain what is still buffered inside the filter
    while output.len() < delay + expected {
        let result = resampler
            .process_partial(None::<&[&[f64]]>, None)
            .map_err(|e| Error::Audio(format!("resample failed: {e}")))?;
        if result[0].is_empty() {
            break;
        }
        output.extend_from_slice(&result[0]);
    }

    Ok(output
        .into_iter()
        .skip(delay)
        .take(expected)
        .map(|s| s as f32)
        .collect())
}

/// Convert f32 samples to 16-bit mono WAV bytes
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            // Convert f32 [-1.0, 1.0] to i16
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

/// Prepare a recording for transcription
///
/// WAV input is down-mixed to mono, peak-normalized and resampled to
/// [`SAMPLE_RATE`]; other formats pass through untouched.
///
/// # Errors
///
/// Returns error if the recording is empty or the WAV data is unreadable
pub fn prepare_for_transcription(audio: &[u8]) -> Result<Vec<u8>> {
    validate_recording(audio)?;

    if !is_wav(audio) {
        return Ok(audio.to_vec());
    }

    let (mut samples, rate) = decode_wav(audio)?;
    peak_normalize(&mut samples);
    let samples = resample(&samples, rate, SAMPLE_RATE)?;

    tracing::debug!(
        source_rate = rate,
        samples = samples.len(),
        "prepared recording for transcription"
    );

    samples_to_wav(&samples, SAMPLE_RATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn sine(rate: u32, secs: f32, freq: f32, amplitude: f32) -> Vec<f32> {
        let n = (rate as f32 * secs).round() as usize;
        (0..n)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / rate as f32).sin())
            .collect()
    }

    #[test]
    fn empty_audio_is_rejected() {
        assert!(matches!(validate_recording(&[]), Err(Error::Stt(_))));
    }

    #[test]
    fn truncated_wav_is_rejected() {
        let mut bytes = b"RIFF\0\0\0\0WAVE".to_vec();
        bytes.extend_from_slice(b"garbage");
        assert!(matches!(validate_recording(&bytes), Err(Error::Audio(_))));
    }

    #[test]
    fn wav_without_samples_is_rejected() {
        let wav = samples_to_wav(&[], SAMPLE_RATE).unwrap();
        assert!(validate_recording(&wav).is_err());
    }

    #[test]
    fn non_wav_payload_passes_through() {
        let webm = [0x1A, 0x45, 0xDF, 0xA3, 0x01, 0x02];
        assert!(validate_recording(&webm).is_ok());
        assert_eq!(prepare_for_transcription(&webm).unwrap(), webm);
    }

    #[allow(clippy::cast_precision_loss)]
    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len().max(1) as f32).sqrt()
    }

    #[test]
    fn resamples_to_speech_rate() {
        let out = resample(&sine(48000, 0.5, 440.0, 0.3), 48000, SAMPLE_RATE).unwrap();
        assert_eq!(out.len(), 8000);
    }

    #[test]
    fn resample_keeps_trailing_partial_chunk() {
        // 13230 frames: 12 full chunks plus a 942-frame remainder
        let out = resample(&sine(44100, 0.3, 440.0, 0.3), 44100, SAMPLE_RATE).unwrap();
        assert_eq!(out.len(), 4800);
        assert!(rms(&out[4000..]) > 0.1, "tail was dropped");
    }

    #[test]
    fn resample_keeps_speech_band() {
        let input = sine(48000, 0.5, 1000.0, 0.5);
        let out = resample(&input, 48000, SAMPLE_RATE).unwrap();
        let ratio = rms(&out[800..7200]) / rms(&input);
        assert!(ratio > 0.9, "in-band energy lost: {ratio}");
    }

    #[test]
    fn resample_filters_tones_above_output_nyquist() {
        // 12 kHz cannot be represented at 16 kHz and must not alias to 4 kHz
        let input = sine(48000, 0.5, 12000.0, 0.5);
        let out = resample(&input, 48000, SAMPLE_RATE).unwrap();
        let ratio = rms(&out[800..7200]) / rms(&input);
        assert!(ratio < 0.1, "aliased energy: {ratio}");
    }

    #[test]
    fn zero_rate_is_an_error() {
        assert!(matches!(resample(&[0.1, 0.2], 0, SAMPLE_RATE), Err(Error::Audio(_))));
    }

    #[test]
    fn same_rate_is_untouched() {
        let input = sine(SAMPLE_RATE, 0.1, 440.0, 0.3);
        assert_eq!(resample(&input, SAMPLE_RATE, SAMPLE_RATE).unwrap(), input);
    }

    #[test]
    fn peak_normalization_reaches_full_scale() {
        let mut samples = vec![0.1f32, -0.25, 0.05];
        peak_normalize(&mut samples);
        assert!((samples[1] + 1.0).abs() < f32::EPSILON);

        let mut silence = vec![0.0f32; 4];
        peak_normalize(&mut silence);
        assert!(silence.iter().all(|s| s.abs() < f32::EPSILON));
    }

    #[test]
    fn prepared_wav_is_mono_16khz() {
        let wav = samples_to_wav(&sine(44100, 0.25, 440.0, 0.2), 44100).unwrap();
        let prepared = prepare_for_transcription(&wav).unwrap();

        let reader = hound::WavReader::new(Cursor::new(prepared)).unwrap();
        assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
        assert_eq!(reader.spec().channels, 1);
        assert!(reader.duration() > 0);
    }
}
