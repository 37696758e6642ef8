//! Pagination state bookkeeping

use tokio::sync::watch;

use taskcache_core::QueryParams;

/// Snapshot of one surface's pagination
///
/// Derived fields are recomputed together on every mutation, so a published
/// state is never partially updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    /// 1-based
    pub current_page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationState {
    pub fn new(page_size: u64) -> Self {
        let mut state = Self {
            current_page: 1,
            page_size: page_size.max(1),
            total_items: 0,
            total_pages: 0,
            has_next: false,
            has_prev: false,
        };
        state.recompute();
        state
    }

    /// Derive page count and flags, clamping the current page into range
    fn recompute(&mut self) {
        self.total_pages = self.total_items.div_ceil(self.page_size);
        self.current_page = self.current_page.clamp(1, self.total_pages.max(1));
        self.has_next = self.current_page < self.total_pages;
        self.has_prev = self.current_page > 1;
    }
}

/// Owns current page, size and total for one consuming surface
///
/// Subscribers see every committed state through [`subscribe`](Self::subscribe).
#[derive(Debug)]
pub struct PaginationCoordinator {
    state: watch::Sender<PaginationState>,
    initial_size: u64,
}

impl PaginationCoordinator {
    pub fn new(page_size: u64) -> Self {
        let (state, _) = watch::channel(PaginationState::new(page_size));
        Self {
            state,
            initial_size: page_size.max(1),
        }
    }

    /// Current state
    pub fn state(&self) -> PaginationState {
        *self.state.borrow()
    }

    /// Live view of the state
    pub fn subscribe(&self) -> watch::Receiver<PaginationState> {
        self.state.subscribe()
    }

    fn mutate(&self, f: impl FnOnce(&mut PaginationState)) -> bool {
        self.state.send_if_modified(|state| {
            let before = *state;
            f(state);
            state.recompute();
            *state != before
        })
    }

    /// Move to page `n`; ignored if `n` is outside `1..=total_pages`
    pub fn go_to_page(&self, n: u64) -> bool {
        let state = self.state();
        if n < 1 || n > state.total_pages {
            return false;
        }
        self.mutate(|state| state.current_page = n)
    }

    pub fn next_page(&self) -> bool {
        let state = self.state();
        state.has_next && self.go_to_page(state.current_page + 1)
    }

    pub fn previous_page(&self) -> bool {
        let state = self.state();
        state.has_prev && self.go_to_page(state.current_page - 1)
    }

    pub fn first_page(&self) -> bool {
        self.go_to_page(1)
    }

    pub fn last_page(&self) -> bool {
        self.go_to_page(self.state().total_pages)
    }

    /// Change the page size and return to the first page; zero is ignored
    pub fn set_page_size(&self, size: u64) -> bool {
        if size == 0 {
            return false;
        }
        self.mutate(|state| {
            state.page_size = size;
            state.current_page = 1;
        })
    }

    /// Record a new collection size, clamping the current page if it fell off the end
    pub fn update_total_items(&self, total: u64) -> bool {
        self.mutate(|state| state.total_items = total)
    }

    /// Adjust the total by a signed delta, saturating at zero
    pub fn adjust_total_items(&self, delta: i64) -> bool {
        self.mutate(|state| {
            state.total_items = state.total_items.saturating_add_signed(delta);
        })
    }

    /// Back to page 1 of an empty collection at the initial page size
    pub fn reset(&self) {
        self.state.send_replace(PaginationState::new(self.initial_size));
    }

    /// 1-based inclusive range of items on the current page; `(0, 0)` when empty
    pub fn display_range(&self) -> (u64, u64) {
        let state = self.state();
        if state.total_items == 0 {
            return (0, 0);
        }
        let start = (state.current_page - 1) * state.page_size + 1;
        let end = (state.current_page * state.page_size).min(state.total_items);
        (start, end)
    }

    /// Window of at most `max_visible` page numbers around the current page
    pub fn page_numbers(&self, max_visible: u64) -> Vec<u64> {
        let state = self.state();
        if max_visible == 0 || state.total_pages == 0 {
            return Vec::new();
        }
        if state.total_pages <= max_visible {
            return (1..=state.total_pages).collect();
        }

        let half = max_visible / 2;
        let mut start = state.current_page.saturating_sub(half).max(1);
        let end = (start + max_visible - 1).min(state.total_pages);
        if end - start + 1 < max_visible {
            start = (end + 1).saturating_sub(max_visible).max(1);
        }
        (start..=end).collect()
    }

    /// Backend paging parameters; the backend counts pages from zero
    pub fn request_params(&self) -> QueryParams {
        let state = self.state();
        QueryParams::new()
            .with("page", state.current_page - 1)
            .with("size", state.page_size)
    }

    /// Whether the current page exists in the collection
    pub fn is_current_page_valid(&self) -> bool {
        let state = self.state();
        state.current_page >= 1 && state.current_page <= state.total_pages
    }
}

impl Default for PaginationCoordinator {
    fn default() -> Self {
        Self::new(20)
    }
}
