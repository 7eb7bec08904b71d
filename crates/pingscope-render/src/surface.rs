//! Display surfaces the renderer presents to.

use crate::PixelBuffer;
use pingscope_core::Result;

/// Where a finished pixel buffer goes.
pub trait DisplaySurface {
    fn present(&mut self, buffer: &PixelBuffer) -> Result<()>;
}

/// Discards frames; counts them.
#[derive(Debug, Default)]
pub struct NullSurface {
    presented: u64,
}

impl NullSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl DisplaySurface for NullSurface {
    fn present(&mut self, _buffer: &PixelBuffer) -> Result<()> {
        self.presented += 1;
        Ok(())
    }
}

/// Keeps a copy of the last presented buffer.
#[derive(Debug, Default)]
pub struct SnapshotSurface {
    last: Option<PixelBuffer>,
    presented: u64,
}

impl SnapshotSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&PixelBuffer> {
        self.last.as_ref()
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl DisplaySurface for SnapshotSurface {
    fn present(&mut self, buffer: &PixelBuffer) -> Result<()> {
        match self.last.as_mut() {
            Some(last) if last.width() == buffer.width() && last.height() == buffer.height() => {
                last.clone_from(buffer);
            }
            _ => self.last = Some(buffer.clone()),
        }
        self.presented += 1;
        Ok(())
    }
}

impl<S: DisplaySurface + ?Sized> DisplaySurface for Box<S> {
    fn present(&mut self, buffer: &PixelBuffer) -> Result<()> {
        (**self).present(buffer)
    }
}

#[cfg(feature = "png")]
pub use png_surface::PngSurface;

#[cfg(feature = "png")]
mod png_surface {
    use super::DisplaySurface;
    use crate::{colorize, PixelBuffer};
    use pingscope_core::{Error, Result};
    use std::fs::File;
    use std::io::BufWriter;
    use std::path::{Path, PathBuf};

    /// Writes every `interval`-th frame to a PNG file, colour-mapped.
    /// The file is overwritten in place.
    #[derive(Debug)]
    pub struct PngSurface {
        path: PathBuf,
        interval: u64,
        presented: u64,
        written: u64,
    }

    impl PngSurface {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self {
                path: path.into(),
                interval: 1,
                presented: 0,
                written: 0,
            }
        }

        pub fn with_interval(mut self, interval: u64) -> Self {
            self.interval = interval.max(1);
            self
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        pub fn written(&self) -> u64 {
            self.written
        }

        fn write(&self, buffer: &PixelBuffer) -> Result<()> {
            let display_err = |e: &dyn std::fmt::Display| {
                Error::Display(format!("{}: {e}", self.path.display()))
            };
            let file = File::create(&self.path).map_err(|e| display_err(&e))?;
            let mut encoder = png::Encoder::new(
                BufWriter::new(file),
                buffer.width() as u32,
                buffer.height() as u32,
            );
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);

            let mut writer = encoder
                .write_header()
                .map_err(|e| display_err(&e))?;
            writer
                .write_image_data(&colorize(buffer))
                .map_err(|e| display_err(&e))?;
            writer.finish().map_err(|e| display_err(&e))
        }
    }

    impl DisplaySurface for PngSurface {
        fn present(&mut self, buffer: &PixelBuffer) -> Result<()> {
            let due = self.presented % self.interval == 0;
            self.presented += 1;
            if !due || buffer.is_empty() {
                return Ok(());
            }
            self.write(buffer)?;
            self.written += 1;
            Ok(())
        }
    }
}
