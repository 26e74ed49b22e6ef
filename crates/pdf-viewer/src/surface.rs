use image::{Rgba, RgbaImage};
use std::sync::Arc;
use tokio::sync::watch;

use crate::types::EngineError;

/// Resizable 2-D drawing target owned by the render pipeline
pub trait DrawingSurface: 'static {
    /// Host-side handle used to present what the surface shows
    type View: Clone;

    fn view(&self) -> Self::View;

    fn set_size(&mut self, width: u32, height: u32);

    /// Borrow a 2-D drawing context, or `None` if the surface cannot provide one
    fn context_2d(&mut self) -> Option<Canvas2d<'_>>;

    /// Called after a render completes successfully
    fn present(&mut self) {}
}

/// 2-D drawing context over an RGBA pixel buffer
pub struct Canvas2d<'a> {
    pixels: &'a mut RgbaImage,
}

impl<'a> Canvas2d<'a> {
    pub fn new(pixels: &'a mut RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn clear(&mut self, color: Rgba<u8>) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = color;
        }
    }

    /// Fill a rectangle, clipped to the canvas
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgba<u8>) {
        let x_end = x.saturating_add(width).min(self.width());
        let y_end = y.saturating_add(height).min(self.height());
        for py in y.min(y_end)..y_end {
            for px in x.min(x_end)..x_end {
                self.pixels.put_pixel(px, py, color);
            }
        }
    }

    /// Outline a rectangle with a line of `line_width` pixels
    pub fn stroke_rect(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        line_width: u32,
        color: Rgba<u8>,
    ) {
        let line = line_width.min(width).min(height);
        self.fill_rect(x, y, width, line, color);
        self.fill_rect(x, y + height.saturating_sub(line), width, line, color);
        self.fill_rect(x, y, line, height, color);
        self.fill_rect(x + width.saturating_sub(line), y, line, height, color);
    }

    /// Copy a whole RGBA image onto the canvas; sizes must match
    pub fn put_image(&mut self, image: &RgbaImage) -> Result<(), EngineError> {
        if image.dimensions() != self.pixels.dimensions() {
            return Err(EngineError::Unsupported(format!(
                "image is {}x{} but canvas is {}x{}",
                image.width(),
                image.height(),
                self.width(),
                self.height()
            )));
        }
        self.pixels.copy_from_slice(image.as_raw());
        Ok(())
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.pixels.get_pixel_checked(x, y).copied()
    }
}

/// Longest side a [`PixelSurface`] accepts, in pixels
pub const MAX_SURFACE_SIDE: u32 = 32_767;

/// Largest area a [`PixelSurface`] accepts, in pixels
pub const MAX_SURFACE_AREA: u64 = 268_435_456;

fn fits_surface(width: u32, height: u32) -> bool {
    width <= MAX_SURFACE_SIDE
        && height <= MAX_SURFACE_SIDE
        && u64::from(width) * u64::from(height) <= MAX_SURFACE_AREA
}

/// Immutable copy of the surface contents at the time it was presented
pub type Frame = Arc<RgbaImage>;

/// In-memory RGBA drawing surface.
///
/// Sizes beyond [`MAX_SURFACE_SIDE`] or [`MAX_SURFACE_AREA`] are not
/// allocated; the surface then has no 2-D context until it is resized to
/// something that fits.
pub struct PixelSurface {
    image: RgbaImage,
    oversized: bool,
    frames: watch::Sender<Option<Frame>>,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32) -> Self {
        let (frames, _) = watch::channel(None);
        let mut surface = Self {
            image: RgbaImage::new(1, 1),
            oversized: false,
            frames,
        };
        surface.set_size(width, height);
        surface
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

impl Default for PixelSurface {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl DrawingSurface for PixelSurface {
    type View = SurfaceView;

    fn view(&self) -> SurfaceView {
        SurfaceView {
            frames: self.frames.subscribe(),
        }
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.oversized = !fits_surface(width, height);
        if self.oversized {
            log::warn!("Surface of {}x{} pixels is too large", width, height);
            return;
        }
        if self.image.dimensions() != (width, height) {
            self.image = RgbaImage::new(width, height);
        }
    }

    fn context_2d(&mut self) -> Option<Canvas2d<'_>> {
        if self.oversized {
            return None;
        }
        Some(Canvas2d::new(&mut self.image))
    }

    fn present(&mut self) {
        self.frames.send_replace(Some(Arc::new(self.image.clone())));
    }
}

/// Host-side handle onto a [`PixelSurface`]
#[derive(Clone)]
pub struct SurfaceView {
    frames: watch::Receiver<Option<Frame>>,
}

impl SurfaceView {
    /// The most recently presented frame, if any render has completed
    pub fn latest(&self) -> Option<Frame> {
        self.frames.borrow().clone()
    }

    /// Wait until a new frame is presented. Returns `None` once the surface is gone.
    pub async fn changed(&mut self) -> Option<Frame> {
        self.frames.changed().await.ok()?;
        self.frames.borrow_and_update().clone()
    }
}
