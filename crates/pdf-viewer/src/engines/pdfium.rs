//! Rasterizing engine backed by the native Pdfium library.
//!
//! Pdfium objects borrow the library binding and cannot cross threads, so every
//! call binds the library inside a blocking task and reloads the document
//! from the bytes held by the handle.

use image::{RgbaImage, imageops};
use pdfium_render::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

use crate::engine::{DocumentHandle, PageHandle, RenderEngine};
use crate::surface::Canvas2d;
use crate::types::{DocumentSource, EngineError};
use crate::viewport::Viewport;

/// Where to find the Pdfium shared library
#[derive(Debug, Clone, Default)]
pub struct PdfiumConfig {
    /// Directory holding the platform library. Falls back to the system library when unset or missing.
    pub library_dir: Option<PathBuf>,
}

impl PdfiumConfig {
    /// `vendor/pdfium/lib` under the current directory, if it exists
    pub fn vendored() -> Self {
        let library_dir = std::env::current_dir().ok().and_then(|mut p| {
            p.push("vendor/pdfium/lib");
            if p.exists() { Some(p) } else { None }
        });
        Self { library_dir }
    }
}

fn bind(config: &PdfiumConfig) -> Result<Pdfium, PdfiumError> {
    if let Some(dir) = &config.library_dir {
        if let Ok(binding) =
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
        {
            return Ok(Pdfium::new(binding));
        }
    }

    // Fallback to system library or default search paths
    Pdfium::bind_to_system_library().map(Pdfium::new)
}

fn pdf_error(e: PdfiumError) -> EngineError {
    EngineError::Pdf(e.to_string())
}

#[derive(Debug, Clone)]
pub struct PdfiumEngine {
    config: Arc<PdfiumConfig>,
}

impl PdfiumEngine {
    /// Bind the library once up front so a missing library is reported at
    /// startup rather than on the first render.
    pub fn init(config: PdfiumConfig) -> Result<Self, EngineError> {
        bind(&config).map_err(pdf_error)?;
        log::info!("Pdfium initialized");
        Ok(Self {
            config: Arc::new(config),
        })
    }
}

impl RenderEngine for PdfiumEngine {
    type Document = PdfiumDocument;

    async fn open(&self, source: &DocumentSource) -> Result<PdfiumDocument, EngineError> {
        let bytes = source.read_bytes().await?;
        let config = Arc::clone(&self.config);
        let task_bytes = Arc::clone(&bytes);

        let page_sizes = tokio::task::spawn_blocking(move || {
            let pdfium = bind(&config)?;
            let document = pdfium.load_pdf_from_byte_slice(&task_bytes, None)?;
            let sizes = document
                .pages()
                .iter()
                .map(|page| (page.width().value, page.height().value))
                .collect::<Vec<_>>();
            Ok::<_, PdfiumError>(sizes)
        })
        .await?
        .map_err(pdf_error)?;

        Ok(PdfiumDocument {
            config: Arc::clone(&self.config),
            bytes,
            page_sizes,
        })
    }
}

pub struct PdfiumDocument {
    config: Arc<PdfiumConfig>,
    bytes: Arc<[u8]>,
    page_sizes: Vec<(f32, f32)>,
}

impl DocumentHandle for PdfiumDocument {
    type Page = PdfiumPage;

    fn page_count(&self) -> u32 {
        self.page_sizes.len() as u32
    }

    async fn get_page(&self, page_number: u32) -> Result<PdfiumPage, EngineError> {
        let out_of_range = || EngineError::PageOutOfRange {
            page: page_number,
            page_count: self.page_count(),
        };
        let index = page_number
            .checked_sub(1)
            .and_then(|i| u16::try_from(i).ok())
            .ok_or_else(out_of_range)?;
        let (width_pt, height_pt) = self
            .page_sizes
            .get(usize::from(index))
            .copied()
            .ok_or_else(out_of_range)?;

        Ok(PdfiumPage {
            config: Arc::clone(&self.config),
            bytes: Arc::clone(&self.bytes),
            index,
            width_pt,
            height_pt,
        })
    }

    fn release(self) {
        log::debug!("Released Pdfium document ({} bytes)", self.bytes.len());
    }
}

pub struct PdfiumPage {
    config: Arc<PdfiumConfig>,
    bytes: Arc<[u8]>,
    index: u16,
    width_pt: f32,
    height_pt: f32,
}

impl PageHandle for PdfiumPage {
    fn compute_viewport(&self, scale: f32, rotation_degrees: i32) -> Viewport {
        Viewport::new(self.width_pt, self.height_pt, scale, rotation_degrees)
    }

    async fn render_to(
        &self,
        mut canvas: Canvas2d<'_>,
        viewport: &Viewport,
    ) -> Result<(), EngineError> {
        // Render upright, then turn the bitmap
        let (width, height) = if viewport.is_quarter_turn() {
            (viewport.height, viewport.width)
        } else {
            (viewport.width, viewport.height)
        };

        let config = Arc::clone(&self.config);
        let bytes = Arc::clone(&self.bytes);
        let index = self.index;

        let (rgba_data, bitmap_width, bitmap_height) = tokio::task::spawn_blocking(move || {
            let pdfium = bind(&config)?;
            let document = pdfium.load_pdf_from_byte_slice(&bytes, None)?;
            let page = document.pages().get(index)?;

            let render_config = PdfRenderConfig::new()
                .set_target_width(width as i32)
                .set_target_height(height as i32);

            let bitmap = page.render_with_config(&render_config)?;
            let rgba_data = bitmap.as_rgba_bytes().to_vec();
            Ok::<_, PdfiumError>((rgba_data, bitmap.width() as u32, bitmap.height() as u32))
        })
        .await?
        .map_err(pdf_error)?;

        let upright = RgbaImage::from_raw(bitmap_width, bitmap_height, rgba_data).ok_or_else(
            || EngineError::Pdf("Bitmap size does not match its pixel data".to_string()),
        )?;

        let mut turned = match viewport.rotation {
            90 => imageops::rotate90(&upright),
            180 => imageops::rotate180(&upright),
            270 => imageops::rotate270(&upright),
            _ => upright,
        };

        if turned.dimensions() != (canvas.width(), canvas.height()) {
            turned = imageops::resize(
                &turned,
                canvas.width(),
                canvas.height(),
                imageops::FilterType::Triangle,
            );
        }

        canvas.put_image(&turned)
    }
}
