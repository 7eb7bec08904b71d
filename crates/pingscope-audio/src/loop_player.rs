//! Gapless looping playback of the transmit pulse.

use crate::SecondChannel;
use std::sync::Arc;

/// Plays one waveform back to back into interleaved output buffers.
///
/// Channel 0 carries the waveform unmodified; channel 1 follows
/// [`SecondChannel`]; any further channels are silent.
pub struct LoopPlayer {
    waveform: Arc<[f32]>,
    position: usize,
    second_channel: SecondChannel,
}

impl LoopPlayer {
    pub fn new(waveform: Arc<[f32]>, second_channel: SecondChannel) -> Self {
        Self {
            waveform,
            position: 0,
            second_channel,
        }
    }

    /// Sample index of the next frame within the pulse.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn period(&self) -> usize {
        self.waveform.len()
    }

    #[inline]
    pub fn fill(&mut self, output: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        if self.waveform.is_empty() {
            output.fill(0.0);
            return;
        }

        for frame in output.chunks_mut(channels) {
            let sample = self.waveform[self.position];
            self.position += 1;
            if self.position == self.waveform.len() {
                self.position = 0;
            }

            for (ch, out) in frame.iter_mut().enumerate() {
                *out = match (ch, self.second_channel) {
                    (0, _) => sample,
                    (1, SecondChannel::Mirror) => sample,
                    _ => 0.0,
                };
            }
        }
    }
}
