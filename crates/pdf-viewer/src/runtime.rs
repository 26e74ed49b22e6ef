use crate::coordinator::JobId;
use crate::types::{DocumentSource, ViewerError};

/// Everything the pipeline needs to paint one page
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTarget {
    pub source: DocumentSource,
    pub page: u32,
    pub zoom_percent: u32,
    pub rotation_degrees: i32,
}

impl RenderTarget {
    pub fn scale(&self) -> f32 {
        self.zoom_percent as f32 / 100.0
    }
}

/// Sent from the controller to the render worker
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub id: JobId,
    pub target: RenderTarget,
}

/// Pixel size of a finished render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderedPage {
    pub page: u32,
    pub width: u32,
    pub height: u32,
}

/// Updates sent from the render worker to the controller
#[derive(Debug)]
pub enum RenderUpdate {
    /// A new document was opened while serving `job`
    DocumentOpened { job: JobId, page_count: u32 },
    /// The pipeline run for `job` is over, successfully or not
    Finished {
        job: JobId,
        result: Result<RenderedPage, ViewerError>,
    },
}

impl RenderUpdate {
    pub fn job(&self) -> JobId {
        match self {
            RenderUpdate::DocumentOpened { job, .. } | RenderUpdate::Finished { job, .. } => *job,
        }
    }
}
