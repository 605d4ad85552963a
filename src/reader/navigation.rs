//! Page navigation
//!
//! Turns "previous / next / first / last / go to N" requests into a valid
//! current page for the active layout (single or spread, reading direction,
//! cover page). Two page numbers are tracked:
//!
//! - `current_page` follows every request immediately and drives the page
//!   indicator.
//! - `render_page` trails it by a debounce window and drives rasterization,
//!   so a burst of requests (slider drag, held key) renders once.

use std::time::{Duration, Instant};

use log::debug;

use crate::settings::{ReadingDirection, ViewMode, ViewSettings};

/// Quiet period before `render_page` follows `current_page`
pub const RENDER_DEBOUNCE: Duration = Duration::from_millis(250);

/// The settings that shape navigation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PageLayout {
    pub view_mode: ViewMode,
    pub reading_direction: ReadingDirection,
    pub treat_first_page_as_cover: bool,
}

impl From<&ViewSettings> for PageLayout {
    fn from(settings: &ViewSettings) -> Self {
        Self {
            view_mode: settings.view_mode,
            reading_direction: settings.reading_direction,
            treat_first_page_as_cover: settings.treat_first_page_as_cover,
        }
    }
}

impl PageLayout {
    fn is_spread(&self) -> bool {
        self.view_mode == ViewMode::Spread
    }

    fn cover(&self) -> bool {
        self.treat_first_page_as_cover
    }
}

/// Page numbers shown in the left and right spread slots.
///
/// A number of 0 or past the end of the document means the slot is empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpreadPages {
    pub left: usize,
    pub right: usize,
}

impl SpreadPages {
    /// `page` if it names a real page of a `num_pages` document
    pub fn resolve(page: usize, num_pages: usize) -> Option<usize> {
        (1..=num_pages).contains(&page).then_some(page)
    }
}

/// Which pages share the spread that starts at `render_page`
pub fn calculate_spread_pages(render_page: usize, layout: &PageLayout) -> SpreadPages {
    if layout.cover() && render_page == 1 {
        return SpreadPages { left: 1, right: 0 };
    }
    match layout.reading_direction {
        ReadingDirection::Rtl => SpreadPages {
            left: render_page + 1,
            right: render_page,
        },
        ReadingDirection::Ltr => SpreadPages {
            left: render_page,
            right: render_page + 1,
        },
    }
}

/// Page that "go to last" lands on: the last page, or the first page of the
/// final spread
pub fn last_spread_start(num_pages: usize, layout: &PageLayout) -> usize {
    if !layout.is_spread() {
        return num_pages.max(1);
    }
    if layout.cover() {
        if num_pages <= 2 {
            num_pages.max(1)
        } else {
            (num_pages - 1).max(2)
        }
    } else if num_pages <= 1 {
        1
    } else if num_pages % 2 == 1 {
        num_pages
    } else {
        num_pages - 1
    }
}

#[derive(Clone, Copy, Debug)]
struct PendingRender {
    page: usize,
    due: Instant,
}

/// Navigation state for one viewer
#[derive(Debug)]
pub struct Navigator {
    layout: PageLayout,
    num_pages: Option<usize>,
    current_page: usize,
    render_page: usize,
    pending: Option<PendingRender>,
    debounce: Duration,
}

impl Navigator {
    pub fn new(layout: PageLayout) -> Self {
        Self::with_debounce(layout, RENDER_DEBOUNCE)
    }

    pub fn with_debounce(layout: PageLayout, debounce: Duration) -> Self {
        Self {
            layout,
            num_pages: None,
            current_page: 1,
            render_page: 1,
            pending: None,
            debounce,
        }
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn set_layout(&mut self, layout: PageLayout) {
        self.layout = layout;
    }

    pub fn num_pages(&self) -> Option<usize> {
        self.num_pages
    }

    pub fn is_loaded(&self) -> bool {
        self.num_pages.is_some()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn render_page(&self) -> usize {
        self.render_page
    }

    /// Start over at page 1 for a freshly loaded document
    pub fn load_document(&mut self, num_pages: usize) {
        self.num_pages = Some(num_pages.max(1));
        self.current_page = 1;
        self.render_page = 1;
        self.pending = None;
    }

    pub fn unload(&mut self) {
        self.num_pages = None;
        self.current_page = 1;
        self.render_page = 1;
        self.pending = None;
    }

    /// Clamp `target` into the document and make it the current page.
    ///
    /// `render_page` follows after the debounce window; every call restarts
    /// the window. Returns the page applied, or `None` without a document.
    pub fn handle_page_change(&mut self, target: usize, now: Instant) -> Option<usize> {
        let num_pages = self.num_pages?;
        let page = target.clamp(1, num_pages);
        self.current_page = page;
        self.pending = Some(PendingRender {
            page,
            due: now + self.debounce,
        });
        Some(page)
    }

    /// Page "previous" would go to, if anywhere
    pub fn previous_target(&self) -> Option<usize> {
        self.num_pages?;
        let current = self.current_page;
        let target = if !self.layout.is_spread() {
            current.saturating_sub(1)
        } else if self.layout.cover() {
            match current {
                1 | 2 => 1,
                _ => current.saturating_sub(2).max(2),
            }
        } else {
            current.saturating_sub(2).max(1)
        };
        Some(target)
    }

    /// Page "next" would go to; `None` when the last spread is showing
    pub fn next_target(&self) -> Option<usize> {
        let num_pages = self.num_pages?;
        let current = self.current_page;
        if !self.layout.is_spread() {
            return Some(current + 1);
        }
        if self.layout.cover() && current == 1 {
            return Some(2);
        }
        let candidate = current + 2;
        (candidate <= num_pages).then_some(candidate)
    }

    pub fn go_to_previous_page(&mut self, now: Instant) -> Option<usize> {
        let target = self.previous_target()?;
        self.handle_page_change(target, now)
    }

    pub fn go_to_next_page(&mut self, now: Instant) -> Option<usize> {
        let target = self.next_target()?;
        self.handle_page_change(target, now)
    }

    pub fn go_to_first_page(&mut self, now: Instant) -> Option<usize> {
        self.handle_page_change(1, now)
    }

    pub fn go_to_last_page(&mut self, now: Instant) -> Option<usize> {
        let num_pages = self.num_pages?;
        let target = last_spread_start(num_pages, &self.layout);
        self.handle_page_change(target, now)
    }

    /// First page of the final spread (or the last page in single mode)
    pub fn last_page_target(&self) -> Option<usize> {
        self.num_pages
            .map(|num_pages| last_spread_start(num_pages, &self.layout))
    }

    /// Page a click at horizontal `position` (0.0 left edge, 1.0 right edge)
    /// would go to.
    ///
    /// The forward half is the left one for right-to-left content and the
    /// right one for left-to-right content. Targets outside the document
    /// are dropped.
    pub fn click_target(&self, position: f32) -> Option<usize> {
        let num_pages = self.num_pages?;
        let current = self.current_page;
        let forward = match self.layout.reading_direction {
            ReadingDirection::Rtl => position < 0.5,
            ReadingDirection::Ltr => position >= 0.5,
        };

        if !self.layout.is_spread() {
            return if forward {
                (current < num_pages).then(|| current + 1)
            } else {
                (current > 1).then(|| current - 1)
            };
        }

        if forward {
            let next = if self.layout.cover() && current == 1 {
                2
            } else {
                current + 2
            };
            (next <= num_pages).then_some(next)
        } else if self.layout.cover() && current <= 2 {
            Some(1)
        } else {
            current.checked_sub(2).filter(|page| *page >= 1)
        }
    }

    pub fn navigate_click(&mut self, position: f32, now: Instant) -> Option<usize> {
        let target = self.click_target(position)?;
        self.handle_page_change(target, now)
    }

    /// Left/right pages for the spread at `render_page`
    pub fn spread_pages(&self) -> SpreadPages {
        calculate_spread_pages(self.render_page, &self.layout)
    }

    /// Apply a due debounced update. Returns the new `render_page` if it fired.
    pub fn poll(&mut self, now: Instant) -> Option<usize> {
        let pending = self.pending?;
        if now < pending.due {
            return None;
        }
        self.pending = None;
        self.render_page = pending.page;
        debug!("Render page now {}", pending.page);
        Some(pending.page)
    }

    /// When [`Navigator::poll`] next has work, for event-loop timeouts
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.due)
    }

    /// Drop any pending debounced update so nothing fires after teardown
    pub fn dispose(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(view_mode: ViewMode, direction: ReadingDirection, cover: bool) -> PageLayout {
        PageLayout {
            view_mode,
            reading_direction: direction,
            treat_first_page_as_cover: cover,
        }
    }

    fn single() -> PageLayout {
        layout(ViewMode::Single, ReadingDirection::Rtl, true)
    }

    fn spread_cover() -> PageLayout {
        layout(ViewMode::Spread, ReadingDirection::Rtl, true)
    }

    fn spread_plain() -> PageLayout {
        layout(ViewMode::Spread, ReadingDirection::Rtl, false)
    }

    fn loaded(layout: PageLayout, num_pages: usize, page: usize) -> Navigator {
        let mut nav = Navigator::new(layout);
        nav.load_document(num_pages);
        nav.handle_page_change(page, Instant::now());
        nav
    }

    #[test]
    fn navigation_is_noop_without_document() {
        let mut nav = Navigator::new(single());
        let now = Instant::now();
        assert_eq!(nav.handle_page_change(5, now), None);
        assert_eq!(nav.go_to_next_page(now), None);
        assert_eq!(nav.go_to_last_page(now), None);
        assert_eq!(nav.current_page(), 1);
        assert_eq!(nav.render_page(), 1);
        assert_eq!(nav.next_deadline(), None);
    }

    #[test]
    fn page_change_is_clamped() {
        for n in 1..=12 {
            let mut nav = loaded(single(), n, 1);
            let now = Instant::now();
            assert_eq!(nav.handle_page_change(0, now), Some(1));
            assert_eq!(nav.handle_page_change(n + 7, now), Some(n));
            assert_eq!(nav.current_page(), n);
        }
    }

    #[test]
    fn single_mode_edges_are_noops() {
        for n in 1..=12 {
            let mut nav = loaded(single(), n, n);
            nav.go_to_next_page(Instant::now());
            assert_eq!(nav.current_page(), n);

            let mut nav = loaded(single(), n, 1);
            nav.go_to_previous_page(Instant::now());
            assert_eq!(nav.current_page(), 1);
        }
    }

    #[test]
    fn single_mode_steps_by_one() {
        let mut nav = loaded(single(), 10, 4);
        nav.go_to_next_page(Instant::now());
        assert_eq!(nav.current_page(), 5);
        nav.go_to_previous_page(Instant::now());
        nav.go_to_previous_page(Instant::now());
        assert_eq!(nav.current_page(), 3);
    }

    #[test]
    fn cover_spread_previous_rules() {
        for n in 2..=12 {
            let mut nav = loaded(spread_cover(), n, 2);
            nav.go_to_previous_page(Instant::now());
            assert_eq!(nav.current_page(), 1);

            nav.go_to_previous_page(Instant::now());
            assert_eq!(nav.current_page(), 1);
        }

        let mut nav = loaded(spread_cover(), 10, 3);
        nav.go_to_previous_page(Instant::now());
        assert_eq!(nav.current_page(), 2);

        let mut nav = loaded(spread_cover(), 10, 8);
        nav.go_to_previous_page(Instant::now());
        assert_eq!(nav.current_page(), 6);
    }

    #[test]
    fn cover_spread_next_rules() {
        for n in 2..=12 {
            let mut nav = loaded(spread_cover(), n, 1);
            nav.go_to_next_page(Instant::now());
            assert_eq!(nav.current_page(), 2);
        }

        let mut nav = loaded(spread_cover(), 10, 2);
        nav.go_to_next_page(Instant::now());
        assert_eq!(nav.current_page(), 4);

        // 9 + 2 > 10: last spread already showing
        let mut nav = loaded(spread_cover(), 10, 9);
        assert_eq!(nav.go_to_next_page(Instant::now()), None);
        assert_eq!(nav.current_page(), 9);
    }

    #[test]
    fn plain_spread_steps_by_two() {
        let mut nav = loaded(spread_plain(), 10, 1);
        nav.go_to_next_page(Instant::now());
        assert_eq!(nav.current_page(), 3);
        nav.go_to_previous_page(Instant::now());
        assert_eq!(nav.current_page(), 1);
        nav.go_to_previous_page(Instant::now());
        assert_eq!(nav.current_page(), 1);

        let mut nav = loaded(spread_plain(), 10, 9);
        assert_eq!(nav.go_to_next_page(Instant::now()), None);

        let mut nav = loaded(spread_plain(), 10, 2);
        nav.go_to_previous_page(Instant::now());
        assert_eq!(nav.current_page(), 1);
    }

    #[test]
    fn last_page_targets() {
        assert_eq!(last_spread_start(10, &single()), 10);
        assert_eq!(last_spread_start(10, &spread_cover()), 9);
        assert_eq!(last_spread_start(3, &spread_cover()), 2);
        assert_eq!(last_spread_start(2, &spread_cover()), 2);
        assert_eq!(last_spread_start(1, &spread_cover()), 1);
        assert_eq!(last_spread_start(10, &spread_plain()), 9);
        assert_eq!(last_spread_start(11, &spread_plain()), 11);
        assert_eq!(last_spread_start(1, &spread_plain()), 1);

        let mut nav = loaded(spread_cover(), 10, 1);
        nav.go_to_last_page(Instant::now());
        assert_eq!(nav.current_page(), 9);
        nav.go_to_first_page(Instant::now());
        assert_eq!(nav.current_page(), 1);
    }

    #[test]
    fn spread_pairing() {
        let rtl = spread_cover();
        let ltr = layout(ViewMode::Spread, ReadingDirection::Ltr, true);

        assert_eq!(calculate_spread_pages(1, &rtl), SpreadPages { left: 1, right: 0 });
        assert_eq!(calculate_spread_pages(1, &ltr), SpreadPages { left: 1, right: 0 });
        for page in 2..20 {
            assert_eq!(
                calculate_spread_pages(page, &rtl),
                SpreadPages { left: page + 1, right: page }
            );
            assert_eq!(
                calculate_spread_pages(page, &ltr),
                SpreadPages { left: page, right: page + 1 }
            );
        }

        let plain_rtl = spread_plain();
        assert_eq!(calculate_spread_pages(1, &plain_rtl), SpreadPages { left: 2, right: 1 });
    }

    #[test]
    fn empty_slots_resolve_to_none() {
        assert_eq!(SpreadPages::resolve(0, 10), None);
        assert_eq!(SpreadPages::resolve(11, 10), None);
        assert_eq!(SpreadPages::resolve(10, 10), Some(10));
    }

    #[test]
    fn render_page_follows_after_quiet_period() {
        let mut nav = Navigator::new(single());
        nav.load_document(10);
        let start = Instant::now();

        nav.handle_page_change(3, start);
        nav.handle_page_change(4, start + Duration::from_millis(100));
        nav.handle_page_change(5, start + Duration::from_millis(200));
        assert_eq!(nav.current_page(), 5);
        assert_eq!(nav.render_page(), 1);

        // first call's window has passed, but the last call restarted it
        assert_eq!(nav.poll(start + Duration::from_millis(300)), None);
        assert_eq!(nav.render_page(), 1);

        assert_eq!(nav.poll(start + Duration::from_millis(450)), Some(5));
        assert_eq!(nav.render_page(), 5);
        assert_eq!(nav.poll(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn dispose_cancels_pending_render() {
        let mut nav = Navigator::new(single());
        nav.load_document(10);
        let start = Instant::now();
        nav.handle_page_change(7, start);
        nav.dispose();
        assert_eq!(nav.poll(start + Duration::from_secs(1)), None);
        assert_eq!(nav.render_page(), 1);
        assert_eq!(nav.current_page(), 7);
    }

    #[test]
    fn loading_resets_both_pages() {
        let mut nav = loaded(single(), 10, 6);
        nav.poll(Instant::now() + Duration::from_secs(1));
        assert_eq!(nav.render_page(), 6);

        nav.load_document(4);
        assert_eq!(nav.current_page(), 1);
        assert_eq!(nav.render_page(), 1);
        assert_eq!(nav.num_pages(), Some(4));
    }

    #[test]
    fn click_single_mode_follows_reading_direction() {
        let nav = loaded(single(), 10, 5);
        assert_eq!(nav.click_target(0.2), Some(6));
        assert_eq!(nav.click_target(0.5), Some(4));
        assert_eq!(nav.click_target(0.9), Some(4));

        let nav = loaded(layout(ViewMode::Single, ReadingDirection::Ltr, true), 10, 5);
        assert_eq!(nav.click_target(0.2), Some(4));
        assert_eq!(nav.click_target(0.5), Some(6));
    }

    #[test]
    fn click_single_mode_respects_edges() {
        let nav = loaded(single(), 10, 10);
        assert_eq!(nav.click_target(0.1), None);
        let nav = loaded(single(), 10, 1);
        assert_eq!(nav.click_target(0.9), None);
    }

    #[test]
    fn click_spread_mode() {
        let nav = loaded(spread_cover(), 10, 1);
        assert_eq!(nav.click_target(0.1), Some(2));
        assert_eq!(nav.click_target(0.9), Some(1));

        let nav = loaded(spread_cover(), 10, 4);
        assert_eq!(nav.click_target(0.1), Some(6));
        assert_eq!(nav.click_target(0.9), Some(2));

        let nav = loaded(spread_cover(), 10, 9);
        assert_eq!(nav.click_target(0.1), None);

        let nav = loaded(layout(ViewMode::Spread, ReadingDirection::Ltr, false), 10, 1);
        assert_eq!(nav.click_target(0.9), Some(3));
        assert_eq!(nav.click_target(0.1), None);
    }
}
