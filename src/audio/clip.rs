//! Finished recordings as uploadable WAV clips.
//!
//! [`AudioClip`] is the opaque payload the speaking turn hands to the
//! backend: 16-bit mono PCM WAV bytes plus the duration the transcript
//! endpoint wants echoed back.  Encoding happens fully in memory via
//! `hound`; nothing touches the filesystem.

use std::io::Cursor;

// ---------------------------------------------------------------------------
// AudioClip
// ---------------------------------------------------------------------------

/// An encoded recording ready for upload.
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Complete WAV file bytes (RIFF header + 16-bit mono PCM).
    pub data: Vec<u8>,
    /// Recording length in milliseconds, derived from the sample count.
    pub duration_ms: u64,
    /// Sample rate the PCM was encoded at (Hz).
    pub sample_rate: u32,
}

impl AudioClip {
    /// Encode mono `f32` PCM in `[-1.0, 1.0]` as a 16-bit WAV clip.
    ///
    /// Samples outside the nominal range are clamped before conversion.
    ///
    /// # Errors
    ///
    /// Returns the underlying `hound` error when the spec is rejected or a
    /// sample fails to serialize (neither happens with a sane sample rate).
    pub fn from_pcm(samples: &[f32], sample_rate: u32) -> Result<Self, hound::Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
            for &s in samples {
                let clamped = s.clamp(-1.0, 1.0);
                writer.write_sample((clamped * i16::MAX as f32).round() as i16)?;
            }
            writer.finalize()?;
        }

        let duration_ms = if sample_rate == 0 {
            0
        } else {
            samples.len() as u64 * 1_000 / sample_rate as u64
        };

        Ok(Self {
            data: cursor.into_inner(),
            duration_ms,
            sample_rate,
        })
    }

    /// Recording length in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.duration_ms as f32 / 1_000.0
    }

    /// Size of the encoded WAV payload in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_carries_riff_wave_header() {
        let clip = AudioClip::from_pcm(&vec![0.1_f32; 160], 16_000).unwrap();
        assert_eq!(&clip.data[0..4], b"RIFF");
        assert_eq!(&clip.data[8..12], b"WAVE");
    }

    #[test]
    fn clip_decodes_as_16bit_mono() {
        let clip = AudioClip::from_pcm(&vec![0.25_f32; 320], 16_000).unwrap();

        let reader = hound::WavReader::new(Cursor::new(&clip.data)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len(), 320);
    }

    #[test]
    fn duration_derived_from_sample_count() {
        // 8000 samples @ 16 kHz = 500 ms
        let clip = AudioClip::from_pcm(&vec![0.1_f32; 8_000], 16_000).unwrap();
        assert_eq!(clip.duration_ms, 500);
        assert!((clip.duration_secs() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_samples_are_clamped() {
        let clip = AudioClip::from_pcm(&[2.0_f32, -2.0], 16_000).unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(&clip.data)).unwrap();
        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded[0], i16::MAX);
        assert_eq!(decoded[1], -i16::MAX);
    }

    #[test]
    fn empty_pcm_yields_header_only_clip() {
        let clip = AudioClip::from_pcm(&[], 16_000).unwrap();
        assert_eq!(clip.duration_ms, 0);
        // Header alone, no sample data
        assert!(clip.byte_len() >= 44);
        assert_eq!(&clip.data[0..4], b"RIFF");
    }
}
