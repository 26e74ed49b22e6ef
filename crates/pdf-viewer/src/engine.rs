//! Interfaces to the external document rendering engine.
//!
//! Futures returned here are polled on a single thread, so none of them
//! need to be `Send`.

use std::future::Future;

use crate::surface::Canvas2d;
use crate::types::{DocumentSource, EngineError};
use crate::viewport::Viewport;

pub trait RenderEngine: 'static {
    type Document: DocumentHandle;

    /// Open a source, failing if it is unreachable or not a valid document
    fn open(
        &self,
        source: &DocumentSource,
    ) -> impl Future<Output = Result<Self::Document, EngineError>>;
}

/// An opened document owned by the viewer
pub trait DocumentHandle: 'static {
    type Page: PageHandle;

    fn page_count(&self) -> u32;

    /// Fetch a page by its 1-based number
    fn get_page(&self, page_number: u32) -> impl Future<Output = Result<Self::Page, EngineError>>;

    /// Free engine resources. Taking `self` makes a second release impossible.
    fn release(self);
}

pub trait PageHandle {
    fn compute_viewport(&self, scale: f32, rotation_degrees: i32) -> Viewport;

    fn render_to(
        &self,
        canvas: Canvas2d<'_>,
        viewport: &Viewport,
    ) -> impl Future<Output = Result<(), EngineError>>;
}
