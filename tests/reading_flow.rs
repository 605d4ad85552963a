use std::time::{Duration, Instant};

use mangaview::Viewer;
use mangaview::event_source::KeyCode;
use mangaview::pdf::FitMode;
use mangaview::reader::{CanvasSlot, NavAction, PassOutcome, RENDER_DEBOUNCE, SpreadPages};
use mangaview::settings::{MemoryStore, ReadingDirection, ViewMode, ViewSettings};
use mangaview::test_utils::test_helpers::{key, pdf_file};
use mangaview::test_utils::{CompletionMode, FakeDocument, FakeEngine};

const GRACE: Duration = Duration::from_millis(10);

fn manga_viewer(engine: &FakeEngine) -> Viewer<MemoryStore> {
    let mut viewer = Viewer::new(MemoryStore::new(), Box::new(engine.clone()));
    viewer.set_view_mode(ViewMode::Spread);
    viewer.set_reading_direction(ReadingDirection::Rtl);
    viewer.set_treat_first_page_as_cover(true);
    viewer
}

fn control(viewer: &Viewer<MemoryStore>, action: NavAction) -> bool {
    viewer
        .controls()
        .iter()
        .find(|c| c.action == action)
        .map(|c| c.disabled)
        .unwrap_or(false)
}

#[test]
fn reading_a_volume_right_to_left() {
    let engine = FakeEngine::new(10);
    let mut viewer = manga_viewer(&engine);
    let t0 = Instant::now();

    viewer.load_file(pdf_file("volume-01.pdf"), t0).unwrap();
    assert_eq!(viewer.tick(t0).pass, Some(PassOutcome::Completed));

    // cover stands alone, its neighbour slot is blank
    assert_eq!(viewer.spread_pages(), SpreadPages { left: 1, right: 0 });
    assert_eq!(viewer.surface(CanvasSlot::Left).unwrap().page, Some(1));
    assert!(viewer.surface(CanvasSlot::Right).unwrap().is_blank());
    assert!(control(&viewer, NavAction::PreviousPage));
    assert!(control(&viewer, NavAction::FirstPage));

    // left arrow moves forward in right-to-left content
    assert!(viewer.handle_key(&key(KeyCode::Left), t0));
    assert_eq!(viewer.current_page(), 2);
    let t1 = t0 + Duration::from_millis(100);
    assert!(viewer.handle_key(&key(KeyCode::Left), t1));
    assert_eq!(viewer.current_page(), 4);

    // burst of page turns renders once, after the debounce
    assert_eq!(viewer.tick(t1).render_page, None);
    assert_eq!(viewer.render_page(), 1);
    let t2 = t1 + RENDER_DEBOUNCE;
    let report = viewer.tick(t2);
    assert_eq!(report.render_page, Some(4));
    assert_eq!(report.pass, None);
    assert!(viewer.is_rendering());
    assert_eq!(viewer.tick(t2 + GRACE).pass, Some(PassOutcome::Completed));

    assert_eq!(viewer.spread_pages(), SpreadPages { left: 5, right: 4 });
    assert_eq!(viewer.surface(CanvasSlot::Left).unwrap().page, Some(5));
    assert_eq!(viewer.surface(CanvasSlot::Right).unwrap().page, Some(4));
    let pages: Vec<usize> = engine.document().render_calls().iter().map(|c| c.0).collect();
    assert_eq!(pages, vec![1, 5, 4]);

    // last spread of a 10-page book with a cover starts at 9
    viewer.go_to_last_page(t2);
    assert_eq!(viewer.current_page(), 9);
    assert!(control(&viewer, NavAction::NextPage));
    assert!(control(&viewer, NavAction::LastPage));
    assert_eq!(viewer.go_to_next_page(t2), None);
    assert_eq!(viewer.current_page(), 9);

    viewer.go_to_previous_page(t2);
    assert_eq!(viewer.current_page(), 7);
    viewer.go_to_first_page(t2);
    assert_eq!(viewer.current_page(), 1);
}

#[test]
fn single_page_click_halves_follow_direction() {
    let engine = FakeEngine::new(5);
    let mut viewer = Viewer::new(MemoryStore::new(), Box::new(engine));
    viewer.set_view_mode(ViewMode::Single);
    viewer.set_reading_direction(ReadingDirection::Ltr);
    let now = Instant::now();
    viewer.load_file(pdf_file("strip.pdf"), now).unwrap();
    viewer.tick(now);

    let width = viewer.viewport().width;
    viewer.click(width * 0.9, now);
    assert_eq!(viewer.current_page(), 2);
    viewer.click(width * 0.1, now);
    assert_eq!(viewer.current_page(), 1);
    // nothing before page 1
    viewer.click(width * 0.1, now);
    assert_eq!(viewer.current_page(), 1);

    viewer.set_reading_direction(ReadingDirection::Rtl);
    viewer.click(width * 0.1, now);
    assert_eq!(viewer.current_page(), 2);
}

#[test]
fn page_turn_during_render_is_retried_after_cancellation() {
    let document = FakeDocument::uniform(5, 600.0, 900.0).with_mode(CompletionMode::Manual);
    let engine = FakeEngine::with_document(document);
    let mut viewer = Viewer::new(MemoryStore::new(), Box::new(engine.clone()));
    viewer.set_view_mode(ViewMode::Single);
    let t0 = Instant::now();

    viewer.load_file(pdf_file("slow.pdf"), t0).unwrap();
    assert_eq!(viewer.tick(t0).pass, None);
    assert!(viewer.is_rendering());

    viewer.go_to_page(3, t0);
    let t1 = t0 + RENDER_DEBOUNCE;
    let report = viewer.tick(t1);
    assert_eq!(report.render_page, Some(3));
    assert_eq!(report.pass, None);

    // the dropped request cancelled the running pass; no error is shown
    assert_eq!(viewer.tick(t1).pass, Some(PassOutcome::Cancelled));
    assert_eq!(viewer.render_error(), None);

    // the view no longer matches, so a new pass starts after the grace period
    assert_eq!(viewer.tick(t1 + GRACE).pass, None);
    engine.document().complete_all();
    assert_eq!(viewer.tick(t1 + GRACE).pass, Some(PassOutcome::Completed));

    let pages: Vec<usize> = engine.document().render_calls().iter().map(|c| c.0).collect();
    assert_eq!(pages, vec![1, 3]);
    assert_eq!(viewer.surface(CanvasSlot::Single).unwrap().page, Some(3));
    assert!(viewer.is_settled());
}

#[test]
fn hiding_chrome_rerenders_with_taller_container() {
    let engine = FakeEngine::new(3);
    let mut viewer = Viewer::new(MemoryStore::new(), Box::new(engine));
    viewer.set_view_mode(ViewMode::Single);
    let t0 = Instant::now();
    viewer.load_file(pdf_file("a.pdf"), t0).unwrap();
    viewer.tick(t0);
    // 800 - 32 margin - 120 chrome
    assert!((viewer.surface(CanvasSlot::Single).unwrap().css_height - 648.0).abs() < 0.01);

    let hidden_at = t0 + Duration::from_secs(3);
    let report = viewer.tick(hidden_at);
    assert!(report.ui_visibility_changed);
    assert!(!viewer.is_ui_visible());
    assert_eq!(viewer.tick(hidden_at + GRACE).pass, Some(PassOutcome::Completed));
    // 800 - 32 margin - 16 hidden chrome
    assert!((viewer.surface(CanvasSlot::Single).unwrap().css_height - 752.0).abs() < 0.01);
}

#[test]
fn zoom_keys_leave_fit_mode_and_reset_restores_it() {
    let engine = FakeEngine::new(3);
    let mut viewer = Viewer::new(MemoryStore::new(), Box::new(engine));
    viewer.set_view_mode(ViewMode::Single);
    let now = Instant::now();
    viewer.load_file(pdf_file("a.pdf"), now).unwrap();
    viewer.tick(now);

    assert!(viewer.handle_key(&key(KeyCode::Char('+')), now));
    assert_eq!(viewer.zoom().fit_mode(), FitMode::Custom);
    assert!(viewer.zoom().scale() > 648.0 / 900.0);

    viewer.reset_zoom();
    assert_eq!(viewer.zoom().fit_mode(), FitMode::Page);
    assert!(!viewer.zoom().is_custom());
}

#[test]
fn render_failure_shows_message_and_next_page_recovers() {
    let document = FakeDocument::uniform(4, 600.0, 900.0).failing_page(2);
    let engine = FakeEngine::with_document(document);
    let mut viewer = Viewer::new(MemoryStore::new(), Box::new(engine));
    viewer.set_view_mode(ViewMode::Single);
    let t0 = Instant::now();
    viewer.load_file(pdf_file("damaged.pdf"), t0).unwrap();
    viewer.tick(t0);

    viewer.go_to_next_page(t0);
    let t1 = t0 + RENDER_DEBOUNCE;
    viewer.tick(t1);
    assert_eq!(
        viewer.tick(t1 + GRACE).pass,
        Some(PassOutcome::Failed("Failed to render the PDF".to_string()))
    );
    assert_eq!(viewer.render_error(), Some("Failed to render the PDF"));

    viewer.go_to_next_page(t1);
    let t2 = t1 + RENDER_DEBOUNCE;
    viewer.tick(t2);
    assert_eq!(viewer.tick(t2 + GRACE).pass, Some(PassOutcome::Completed));
    assert_eq!(viewer.render_error(), None);
}

#[test]
fn default_settings_walkthrough() {
    let engine = FakeEngine::new(10);
    let mut viewer = Viewer::new(MemoryStore::new(), Box::new(engine));
    assert_eq!(viewer.settings(), &ViewSettings::default());
    assert_eq!(viewer.settings().view_mode, ViewMode::Single);
    assert_eq!(viewer.settings().reading_direction, ReadingDirection::Rtl);
    assert!(viewer.settings().treat_first_page_as_cover);

    let t0 = Instant::now();
    viewer.load_file(pdf_file("volume-02.pdf"), t0).unwrap();
    viewer.tick(t0);

    assert_eq!(viewer.go_to_next_page(t0), Some(2));
    assert_eq!(viewer.current_page(), 2);

    viewer.toggle_view_mode();
    assert_eq!(viewer.settings().view_mode, ViewMode::Spread);
    let t1 = t0 + RENDER_DEBOUNCE;
    assert_eq!(viewer.tick(t1).render_page, Some(2));
    assert_eq!(viewer.spread_pages(), SpreadPages { left: 3, right: 2 });
    assert_eq!(viewer.tick(t1 + GRACE).pass, Some(PassOutcome::Completed));
    assert_eq!(viewer.surface(CanvasSlot::Left).unwrap().page, Some(3));
    assert_eq!(viewer.surface(CanvasSlot::Right).unwrap().page, Some(2));

    viewer.go_to_last_page(t1);
    assert_eq!(viewer.current_page(), 9);
    viewer.go_to_first_page(t1);
    assert_eq!(viewer.current_page(), 1);
}

#[test]
fn layout_flipped_back_during_render_still_redraws() {
    let document = FakeDocument::uniform(4, 600.0, 900.0).with_mode(CompletionMode::Manual);
    let engine = FakeEngine::with_document(document);
    let mut viewer = Viewer::new(MemoryStore::new(), Box::new(engine.clone()));
    viewer.set_view_mode(ViewMode::Single);
    let t0 = Instant::now();

    viewer.load_file(pdf_file("flip.pdf"), t0).unwrap();
    assert_eq!(viewer.tick(t0).pass, None);

    // spread request arrives mid-pass and is dropped, cancelling the pass
    viewer.toggle_view_mode();
    assert_eq!(viewer.tick(t0).pass, None);
    // back to the inputs of the cancelled pass
    viewer.toggle_view_mode();
    assert_eq!(viewer.tick(t0).pass, Some(PassOutcome::Cancelled));
    assert!(viewer.is_rendering());
    assert!(!viewer.is_settled());

    assert_eq!(viewer.tick(t0 + GRACE).pass, None);
    engine.document().complete_all();
    assert_eq!(viewer.tick(t0 + GRACE).pass, Some(PassOutcome::Completed));

    assert!(viewer.is_settled());
    let surface = viewer.surface(CanvasSlot::Single).unwrap();
    assert_eq!(surface.page, Some(1));
    assert!(surface.raster.is_some());
    assert_eq!(viewer.snapshot().unwrap().dimensions(), (432, 648));
    let pages: Vec<usize> = engine.document().render_calls().iter().map(|c| c.0).collect();
    assert_eq!(pages, vec![1, 1]);
}
