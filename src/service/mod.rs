//! Service layer: business operations over the slot store.
//!
//! - [`SlotService`]: owner operations on slots.
//! - [`SwapService`]: the swap orchestrator (propose, respond).
//! - [`QueryService`]: read-only views.
//!
//! Services hold the shared [`crate::persistence::SlotStore`] and publish
//! a [`crate::domain::SwapEvent`] through the [`crate::domain::EventBus`]
//! after every committed write.

pub mod query_service;
pub mod slot_service;
pub mod swap_service;

pub use query_service::{Dashboard, QueryService};
pub use slot_service::SlotService;
pub use swap_service::SwapService;

/// Largest page size any list operation returns.
pub const MAX_PER_PAGE: u32 = 100;

/// 1-indexed page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number, starting at 1.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl PageRequest {
    /// Builds a request, clamping `page` to at least 1 and `per_page` to
    /// `1..=MAX_PER_PAGE`.
    #[must_use]
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Cuts the requested page out of a fully ordered result set.
    #[must_use]
    pub fn slice<T>(self, items: Vec<T>) -> Page<T> {
        let total = u32::try_from(items.len()).unwrap_or(u32::MAX);
        let skip = usize::try_from(
            u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page),
        )
        .unwrap_or(usize::MAX);
        let items = items
            .into_iter()
            .skip(skip)
            .take(self.per_page as usize)
            .collect();
        Page {
            items,
            page: self.page,
            per_page: self.per_page,
            total,
        }
    }
}

/// One page of an ordered result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Page number.
    pub page: u32,
    /// Requested page size.
    pub per_page: u32,
    /// Size of the whole result set.
    pub total: u32,
}

impl<T> Page<T> {
    /// Number of pages in the whole result set.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        if self.total == 0 {
            0
        } else {
            self.total.div_ceil(self.per_page.max(1))
        }
    }

    /// Maps every item, keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}
