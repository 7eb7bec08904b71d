//! RGBA pixel storage for one range-Doppler frame.

use serde::{Deserialize, Serialize};

/// Colour channel that carries the normalized magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntensityChannel {
    #[default]
    Red,
    Green,
    Blue,
}

impl IntensityChannel {
    pub fn index(&self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }
}

/// Row-major RGBA buffer, `width` fast-time bins by `height` pulses.
///
/// Alpha is fixed at 255; only the intensity channel changes between draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    channel: IntensityChannel,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize, channel: IntensityChannel) -> Self {
        let mut data = vec![0u8; width * height * 4];
        for px in data.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Self {
            width,
            height,
            channel,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel count.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel(&self) -> IntensityChannel {
        self.channel
    }

    pub fn as_rgba(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    pub fn intensity(&self, x: usize, y: usize) -> Option<u8> {
        self.pixel(x, y).map(|px| px[self.channel.index()])
    }

    /// Intensities in pixel order.
    pub fn intensities(&self) -> impl Iterator<Item = u8> + '_ {
        let c = self.channel.index();
        self.data.chunks_exact(4).map(move |px| px[c])
    }

    /// Overwrite every intensity, pixel by pixel.
    pub(crate) fn write_intensities(&mut self, values: impl Iterator<Item = u8>) {
        let c = self.channel.index();
        for (px, v) in self.data.chunks_exact_mut(4).zip(values) {
            px[c] = v;
        }
    }
}
