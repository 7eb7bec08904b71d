//! Waterfall colour map: black, blue, cyan, green, yellow, white.

use crate::PixelBuffer;

/// Map a normalized value in [0, 1] to RGB.
pub fn colormap(value: f32) -> [u8; 3] {
    let v = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };

    let (r, g, b) = if v < 0.2 {
        (0.0, 0.0, v / 0.2)
    } else if v < 0.4 {
        (0.0, (v - 0.2) / 0.2, 1.0)
    } else if v < 0.6 {
        (0.0, 1.0, 1.0 - (v - 0.4) / 0.2)
    } else if v < 0.8 {
        ((v - 0.6) / 0.2, 1.0, 0.0)
    } else {
        (1.0, 1.0, (v - 0.8) / 0.2)
    };

    [to_byte(r), to_byte(g), to_byte(b)]
}

#[inline]
fn to_byte(x: f32) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Colour-mapped RGBA copy of `buffer`, driven by its intensity channel.
pub fn colorize(buffer: &PixelBuffer) -> Vec<u8> {
    let mut out = Vec::with_capacity(buffer.len() * 4);
    for intensity in buffer.intensities() {
        let [r, g, b] = colormap(intensity as f32 / 255.0);
        out.extend_from_slice(&[r, g, b, 255]);
    }
    out
}
