//! Page-box preview engine built on `lopdf`.
//!
//! Parses the document structure for page count and page sizes, and paints
//! each page as a blank sheet with its outline. It does not rasterize content.

use image::Rgba;
use lopdf::{Document, Object, ObjectId};
use std::sync::Arc;

use crate::engine::{DocumentHandle, PageHandle, RenderEngine};
use crate::surface::Canvas2d;
use crate::types::{DocumentSource, EngineError};
use crate::viewport::Viewport;

/// US Letter, used when a page carries no readable MediaBox
const DEFAULT_PAGE_SIZE: PageSize = PageSize {
    width_pt: 612.0,
    height_pt: 792.0,
};

/// How far up the page tree to look for an inherited MediaBox
const MAX_INHERITANCE_DEPTH: usize = 32;

const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);
const OUTLINE: Rgba<u8> = Rgba([160, 160, 160, 255]);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfEngine;

impl LopdfEngine {
    pub fn new() -> Self {
        Self
    }
}

impl RenderEngine for LopdfEngine {
    type Document = LopdfDocument;

    async fn open(&self, source: &DocumentSource) -> Result<LopdfDocument, EngineError> {
        let bytes = source.read_bytes().await?;

        // Parsing is CPU-bound, spawn blocking
        let page_sizes = tokio::task::spawn_blocking(move || {
            let document =
                Document::load_mem(&bytes).map_err(|e| EngineError::Pdf(e.to_string()))?;
            Ok::<_, EngineError>(collect_page_sizes(&document))
        })
        .await??;

        Ok(LopdfDocument {
            page_sizes: page_sizes.into(),
        })
    }
}

pub struct LopdfDocument {
    page_sizes: Arc<[PageSize]>,
}

impl LopdfDocument {
    pub fn page_size(&self, page_number: u32) -> Option<PageSize> {
        let index = usize::try_from(page_number.checked_sub(1)?).ok()?;
        self.page_sizes.get(index).copied()
    }
}

impl DocumentHandle for LopdfDocument {
    type Page = LopdfPage;

    fn page_count(&self) -> u32 {
        self.page_sizes.len() as u32
    }

    async fn get_page(&self, page_number: u32) -> Result<LopdfPage, EngineError> {
        let size = self
            .page_size(page_number)
            .ok_or(EngineError::PageOutOfRange {
                page: page_number,
                page_count: self.page_count(),
            })?;
        Ok(LopdfPage { size })
    }

    fn release(self) {}
}

pub struct LopdfPage {
    size: PageSize,
}

impl PageHandle for LopdfPage {
    fn compute_viewport(&self, scale: f32, rotation_degrees: i32) -> Viewport {
        Viewport::new(self.size.width_pt, self.size.height_pt, scale, rotation_degrees)
    }

    async fn render_to(
        &self,
        mut canvas: Canvas2d<'_>,
        viewport: &Viewport,
    ) -> Result<(), EngineError> {
        let line_width = ((2.0 * viewport.scale).round() as u32).max(1);
        canvas.clear(PAPER);
        canvas.stroke_rect(0, 0, canvas.width(), canvas.height(), line_width, OUTLINE);
        Ok(())
    }
}

fn collect_page_sizes(document: &Document) -> Vec<PageSize> {
    document
        .get_pages()
        .values()
        .map(|page_id| media_box_size(document, *page_id).unwrap_or(DEFAULT_PAGE_SIZE))
        .collect()
}

/// Read the page's MediaBox, following `/Parent` for inherited values
fn media_box_size(document: &Document, page_id: ObjectId) -> Option<PageSize> {
    let mut dict = document.get_dictionary(page_id).ok()?;

    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Some(size) = dict.get(b"MediaBox").ok().and_then(|obj| box_size(document, obj)) {
            return Some(size);
        }
        let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
        dict = document.get_dictionary(parent).ok()?;
    }

    None
}

fn box_size(document: &Document, object: &Object) -> Option<PageSize> {
    let values = match object {
        Object::Reference(id) => document.get_object(*id).ok()?.as_array().ok()?,
        other => other.as_array().ok()?,
    };
    if values.len() != 4 {
        return None;
    }

    let coords: Vec<f32> = values
        .iter()
        .map(|value| value.as_float().ok())
        .collect::<Option<_>>()?;
    let width_pt = (coords[2] - coords[0]).abs();
    let height_pt = (coords[3] - coords[1]).abs();

    (width_pt > 0.0 && height_pt > 0.0).then_some(PageSize {
        width_pt,
        height_pt,
    })
}
