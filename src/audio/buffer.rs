//! Bounded accumulation buffer for `f32` audio samples.
//!
//! Speaking practice cares about the start of an utterance — the learner's
//! answer begins at the beginning — so when the cap is hit, new samples are
//! **dropped** and a truncation flag is raised instead of displacing what
//! was already said.
//!
//! # Example
//!
//! ```rust
//! use vocatalk::audio::CaptureBuffer;
//!
//! let mut buf = CaptureBuffer::new(3);
//! buf.push_slice(&[0.1, 0.2, 0.3, 0.4]); // one more than fits
//! let (data, truncated) = buf.finalize();
//! assert_eq!(data, vec![0.1, 0.2, 0.3]);
//! assert!(truncated);
//! ```

// ---------------------------------------------------------------------------
// CaptureBuffer
// ---------------------------------------------------------------------------

/// A bounded, head-keeping sample buffer.
///
/// Once `max_samples` samples are stored the buffer saturates: later pushes
/// are discarded and remembered via [`truncated`](Self::truncated), while
/// everything recorded first stays put.  Storage never grows past the cap.
pub struct CaptureBuffer {
    samples: Vec<f32>,
    max_samples: usize,
    truncated: bool,
}

impl CaptureBuffer {
    /// Create a buffer that stores at most `max_samples` samples.
    ///
    /// # Panics
    ///
    /// Panics if `max_samples == 0`.
    pub fn new(max_samples: usize) -> Self {
        assert!(max_samples > 0, "CaptureBuffer max_samples must be > 0");
        Self {
            samples: Vec::new(),
            max_samples,
            truncated: false,
        }
    }

    /// Store `data`, keeping at most the configured number of samples.
    ///
    /// Whatever exceeds the cap is silently dropped and the truncated flag
    /// is raised; samples already stored are untouched.
    pub fn push_slice(&mut self, data: &[f32]) {
        let room = self.max_samples - self.samples.len();
        if data.len() <= room {
            self.samples.extend_from_slice(data);
            return;
        }

        self.samples.extend_from_slice(&data[..room]);
        self.truncated = true;
    }

    /// Take all stored samples in arrival order and reset the buffer.
    ///
    /// Returns the samples together with whether any overflow was dropped.
    /// After this call `len() == 0` and the truncated flag is cleared.
    pub fn finalize(&mut self) -> (Vec<f32>, bool) {
        let truncated = self.truncated;
        self.truncated = false;
        (std::mem::take(&mut self.samples), truncated)
    }

    /// Throw away everything stored and clear the truncated flag.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.truncated = false;
    }

    /// How many samples are stored right now.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer currently holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The configured cap on stored samples.
    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    /// `true` once the cap is reached; any further push is dropped.
    pub fn is_full(&self) -> bool {
        self.samples.len() == self.max_samples
    }

    /// `true` when at least one pushed sample was dropped.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Seconds of audio stored so far, treating the contents as mono at
    /// `sample_rate` Hz.
    pub fn duration_secs(&self, sample_rate: u32) -> f32 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / sample_rate as f32
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
