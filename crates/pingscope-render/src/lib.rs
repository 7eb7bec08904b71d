//! Range-Doppler map rendering.
//!
//! [`RangeDopplerRenderer`] normalizes each frame into the intensity channel
//! of an RGBA [`PixelBuffer`] and hands it to a [`DisplaySurface`].

mod pixel;
pub use pixel::{IntensityChannel, PixelBuffer};

mod colormap;
pub use colormap::{colorize, colormap};

mod surface;
#[cfg(feature = "png")]
pub use surface::PngSurface;
pub use surface::{DisplaySurface, NullSurface, SnapshotSurface};

mod renderer;
pub use renderer::RangeDopplerRenderer;
