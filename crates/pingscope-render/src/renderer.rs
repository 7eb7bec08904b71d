//! Range-Doppler frame normalization and presentation.

use crate::{DisplaySurface, IntensityChannel, PixelBuffer};
use pingscope_core::{Error, Result};

/// Normalizes magnitude frames into a [`PixelBuffer`] and presents them.
///
/// Frame value `i` maps to pixel `(i % width, i / width)`: x is the fast-time
/// bin, y the Doppler row.
pub struct RangeDopplerRenderer<S: DisplaySurface> {
    surface: S,
    channel: IntensityChannel,
    buffer: Option<PixelBuffer>,
    frames_drawn: u64,
}

impl<S: DisplaySurface> RangeDopplerRenderer<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            channel: IntensityChannel::default(),
            buffer: None,
            frames_drawn: 0,
        }
    }

    /// Takes effect at the next `resize`.
    pub fn with_channel(mut self, channel: IntensityChannel) -> Self {
        self.channel = channel;
        self
    }

    /// Reallocate the buffer: alpha 255, every intensity 0.
    pub fn resize(&mut self, width: usize, height: usize) {
        tracing::debug!(width, height, "renderer resized");
        self.buffer = Some(PixelBuffer::new(width, height, self.channel));
    }

    pub fn dimensions(&self) -> Option<(usize, usize)> {
        self.buffer.as_ref().map(|b| (b.width(), b.height()))
    }

    pub fn buffer(&self) -> Option<&PixelBuffer> {
        self.buffer.as_ref()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Normalize `frame` by its maximum, write it and present.
    ///
    /// Returns the maximum. When it is zero or not finite every intensity
    /// is written as 0. On error the frame is dropped and the previous
    /// picture stays.
    pub fn draw(&mut self, frame: &[f32]) -> Result<f32> {
        let Some(buffer) = self.buffer.as_mut() else {
            return Err(Error::NotInitialized);
        };
        if frame.len() != buffer.len() {
            return Err(Error::DimensionMismatch {
                expected: buffer.len(),
                actual: frame.len(),
            });
        }

        let max = frame.iter().copied().fold(0.0f32, f32::max);
        if max > 0.0 && max.is_finite() {
            let scale = 255.0 / max;
            buffer.write_intensities(
                frame
                    .iter()
                    .map(|&v| (v * scale).round().clamp(0.0, 255.0) as u8),
            );
        } else {
            buffer.write_intensities(std::iter::repeat(0));
        }

        self.surface.present(buffer)?;
        self.frames_drawn += 1;
        Ok(max)
    }
}
