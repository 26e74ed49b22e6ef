use tokio::sync::mpsc;

use crate::document::DocumentSlot;
use crate::engine::{DocumentHandle, PageHandle, RenderEngine};
use crate::runtime::{RenderJob, RenderUpdate, RenderedPage};
use crate::surface::DrawingSurface;
use crate::types::*;

/// Render worker task. Owns the engine, the open document and the drawing
/// surface; processes one job at a time until the job channel closes, then
/// releases the document.
pub async fn render_worker<E, S>(
    engine: E,
    mut surface: S,
    mut job_rx: mpsc::UnboundedReceiver<RenderJob>,
    update_tx: mpsc::UnboundedSender<RenderUpdate>,
) where
    E: RenderEngine,
    S: DrawingSurface,
{
    let mut documents = DocumentSlot::new();

    while let Some(job) = job_rx.recv().await {
        let result = run_pipeline(&engine, &mut documents, &mut surface, &job, &update_tx).await;

        if let Err(e) = &result {
            log::warn!("Render of page {} failed: {}", job.target.page, e);
        }

        if update_tx
            .send(RenderUpdate::Finished { job: job.id, result })
            .is_err()
        {
            log::debug!("Controller is gone, stopping render worker");
            break;
        }
    }

    documents.release();
    log::debug!("Render worker stopped");
}

/// Open (if needed), fetch, size, check capability, render. The first failing
/// step short-circuits the rest.
pub async fn run_pipeline<E, S>(
    engine: &E,
    documents: &mut DocumentSlot<E::Document>,
    surface: &mut S,
    job: &RenderJob,
    update_tx: &mpsc::UnboundedSender<RenderUpdate>,
) -> Result<RenderedPage>
where
    E: RenderEngine,
    S: DrawingSurface,
{
    let target = &job.target;
    let opened = documents.ensure_open(engine, &target.source).await?;

    if let Some(page_count) = opened.newly_opened {
        let _ = update_tx.send(RenderUpdate::DocumentOpened {
            job: job.id,
            page_count,
        });
    }

    let document = opened.handle;
    let page_count = document.page_count();
    if target.page == 0 || target.page > page_count {
        return Err(ViewerError::PageFetch {
            page: target.page,
            source: EngineError::PageOutOfRange {
                page: target.page,
                page_count,
            },
        });
    }

    let page = document
        .get_page(target.page)
        .await
        .map_err(|source| ViewerError::PageFetch {
            page: target.page,
            source,
        })?;

    let viewport = page.compute_viewport(target.scale(), target.rotation_degrees);
    surface.set_size(viewport.width, viewport.height);

    let canvas = surface.context_2d().ok_or(ViewerError::Capability)?;
    page.render_to(canvas, &viewport)
        .await
        .map_err(ViewerError::RenderSubmit)?;

    surface.present();

    Ok(RenderedPage {
        page: target.page,
        width: viewport.width,
        height: viewport.height,
    })
}
