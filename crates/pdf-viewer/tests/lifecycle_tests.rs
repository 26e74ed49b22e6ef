mod common;

use common::*;
use pdf_viewer::*;

#[tokio::test]
async fn test_document_is_opened_once_and_reused() {
    run_local(async {
        let engine = MockEngine::with_document("a.pdf", 3);
        let mut viewer = viewer(&engine, "a.pdf");
        viewer.wait_idle().await;

        viewer.next_page();
        viewer.wait_idle().await;
        viewer.increase_zoom();
        viewer.wait_idle().await;
        viewer.rotate_right();
        viewer.wait_idle().await;

        assert_eq!(engine.state.render_calls().len(), 4);
        assert_eq!(engine.state.open_count(), 1);
        assert!(engine.state.released_ids().is_empty());
    })
    .await;
}

#[tokio::test]
async fn test_switching_documents_releases_previous_handle() {
    run_local(async {
        let engine = MockEngine::with_document("a.pdf", 3);
        engine.state.add_document("b.pdf", 2);
        let mut viewer = viewer(&engine, "a.pdf");
        viewer.wait_idle().await;

        viewer.go_to_page(3);
        viewer.wait_idle().await;

        viewer.open_source("b.pdf");
        viewer.wait_idle().await;

        let snapshot = viewer.snapshot();
        assert_eq!(snapshot.current_page, 1);
        assert_eq!(snapshot.total_pages, 2);
        assert_eq!(engine.state.open_count(), 2);
        assert_eq!(engine.state.released_ids(), vec![1]);

        viewer.dispose().await;
        assert_eq!(engine.state.released_ids(), vec![1, 2]);
    })
    .await;
}

#[tokio::test]
async fn test_failed_switch_keeps_previous_document() {
    run_local(async {
        let engine = MockEngine::with_document("a.pdf", 3);
        let mut viewer = viewer(&engine, "a.pdf");
        viewer.wait_idle().await;

        viewer.open_source("missing.pdf");
        viewer.wait_idle().await;

        let snapshot = viewer.snapshot();
        assert!(snapshot.last_error.contains("Failed to open document"));
        assert_eq!(snapshot.total_pages, 3);
        assert!(engine.state.released_ids().is_empty());

        viewer.dispose().await;
        assert_eq!(engine.state.released_ids(), vec![1]);
    })
    .await;
}

#[tokio::test]
async fn test_switch_while_rendering_is_coalesced() {
    run_local(async {
        let engine = MockEngine::with_document("a.pdf", 3);
        engine.state.add_document("b.pdf", 5);
        engine.state.close_gate();
        let mut viewer = viewer(&engine, "a.pdf");

        // Switch before the initial render of a.pdf has completed
        viewer.open_source("b.pdf");
        assert_eq!(viewer.render_state().pending(), Some(1));

        engine.state.release_renders(2);
        viewer.wait_idle().await;

        assert_eq!(viewer.snapshot().total_pages, 5);
        assert_eq!(engine.state.open_count(), 2);
        assert_eq!(engine.state.released_ids(), vec![1]);
    })
    .await;
}

#[tokio::test]
async fn test_dispose_without_completed_open_releases_nothing() {
    run_local(async {
        let engine = MockEngine::new();
        let mut viewer = viewer(&engine, "missing.pdf");
        viewer.wait_idle().await;

        viewer.dispose().await;
        assert!(engine.state.released_ids().is_empty());
    })
    .await;
}

#[tokio::test]
async fn test_dispose_while_rendering_releases_once() {
    run_local(async {
        let engine = MockEngine::with_document("a.pdf", 2);
        let viewer = viewer(&engine, "a.pdf");

        // The queued initial job still runs before the worker sees the closed channel
        viewer.dispose().await;

        assert_eq!(engine.state.open_count(), 1);
        assert_eq!(engine.state.released_ids(), vec![1]);
    })
    .await;
}

#[tokio::test]
async fn test_follow_up_after_switch_uses_clamped_page() {
    run_local(async {
        let engine = MockEngine::with_document("a.pdf", 5);
        engine.state.add_document("b.pdf", 1);
        let mut viewer = viewer(&engine, "a.pdf");
        viewer.wait_idle().await;

        viewer.open_source("b.pdf");
        // Still bounded by a.pdf until b.pdf has opened
        assert!(viewer.next_page());
        assert_eq!(viewer.render_state().pending(), Some(2));
        viewer.wait_idle().await;

        let snapshot = viewer.snapshot();
        assert_eq!(snapshot.current_page, 1);
        assert_eq!(snapshot.total_pages, 1);
        assert_eq!(snapshot.last_error, "");
        assert_eq!(engine.state.rendered_pages(), vec![1, 1, 1]);
    })
    .await;
}

#[tokio::test]
async fn test_document_slot_tracks_open_source() {
    let engine = MockEngine::with_document("a.pdf", 3);
    engine.state.add_document("b.pdf", 2);
    let a = DocumentSource::path("a.pdf");
    let b = DocumentSource::path("b.pdf");

    let mut slot = DocumentSlot::new();
    assert!(!slot.is_open());
    assert_eq!(slot.source(), None);

    let opened = slot.ensure_open(&engine, &a).await.unwrap();
    assert_eq!(opened.newly_opened, Some(3));

    let opened = slot.ensure_open(&engine, &a).await.unwrap();
    assert_eq!(opened.newly_opened, None);
    assert_eq!(opened.handle.page_count(), 3);
    assert!(slot.is_open());
    assert_eq!(slot.source(), Some(&a));

    let missing = DocumentSource::path("missing.pdf");
    assert!(slot.ensure_open(&engine, &missing).await.is_err());
    assert_eq!(slot.source(), Some(&a));

    let opened = slot.ensure_open(&engine, &b).await.unwrap();
    assert_eq!(opened.newly_opened, Some(2));
    assert_eq!(slot.source(), Some(&b));
    assert_eq!(engine.state.released_ids(), vec![1]);

    slot.release();
    assert!(!slot.is_open());
    drop(slot);
    assert_eq!(engine.state.released_ids(), vec![1, 2]);
}
