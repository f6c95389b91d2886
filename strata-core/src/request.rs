//! The paging/sorting/date-range request shape.

use serde::{Deserialize, Serialize};

use crate::record::Timestamp;

/// Hard cap on the page size, sixteen-bit signed max.
pub const MAX_PAGE_SIZE: u16 = i16::MAX as u16;

const DEFAULT_PAGE_SIZE: u16 = 1000;

/// Sorting, date-range, and paging directives for list/search/count.
/// Never persisted; consumed only by the read pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageRequest {
    /// Comma-separated `"field [asc|desc]"` tokens.
    pub sorting: Option<String>,
    /// Inclusive lower bound on the creation timestamp.
    pub from_date: Option<Timestamp>,
    /// Inclusive upper bound on the creation timestamp.
    pub to_date: Option<Timestamp>,
    /// One-based page index.
    pub page_index: u16,
    pub page_size: u16,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            sorting: None,
            from_date: None,
            to_date: None,
            page_index: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Skip/take pair with the index floored at 1 and the size clamped to
    /// `[1, MAX_PAGE_SIZE]`.
    pub fn skip_take(&self) -> (usize, usize) {
        let size = self.page_size.clamp(1, MAX_PAGE_SIZE) as usize;
        let index = self.page_index.max(1) as usize;
        (size * (index - 1), size)
    }

    /// The sort spec, if one was supplied and is non-blank.
    pub fn sort_spec(&self) -> Option<&str> {
        self.sorting
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Request types that embed a [`PageRequest`]; the service layer is generic
/// over this so richer filter shapes can carry extra fields.
pub trait Pageable {
    fn page(&self) -> &PageRequest;
}

impl Pageable for PageRequest {
    fn page(&self) -> &PageRequest {
        self
    }
}
