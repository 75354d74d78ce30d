/// Zero-indexed offset pagination state for a "load more" surface.
///
/// The store sends no has-more flag; a page shorter than `page_size`
/// marks the end of the data.
#[derive(Debug, Clone)]
pub struct Pager {
    pub offset: usize,
    pub page_size: usize,
    exhausted: bool,
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self {
            offset: 0,
            page_size,
            exhausted: false,
        }
    }

    pub fn has_more(&self) -> bool {
        !self.exhausted
    }

    /// Advance past a fetched page.
    pub fn record_page(&mut self, returned: usize) {
        self.offset += returned;
        if returned < self.page_size {
            self.exhausted = true;
        }
    }
}

/// Percent of the article body scrolled past, clamped to 0..100.
pub fn reading_progress(scroll_top: f64, viewport: f64, total_height: f64) -> f64 {
    let scrollable = total_height - viewport;
    if scrollable <= 0.0 {
        return 100.0;
    }
    ((scroll_top / scrollable) * 100.0).clamp(0.0, 100.0)
}
