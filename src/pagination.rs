//! Shared pagination shapes for list queries.

/// Default page size when the caller does not pass one.
pub const DEFAULT_LIMIT: u64 = 20;

/// Sort direction for paginated queries that accept one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Caller-supplied paging knobs. Unset fields fall back to
/// `limit = 20, offset = 0`.
#[derive(Debug, Clone, Default)]
pub struct PaginationOptions {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub direction: Option<SortDirection>,
}

impl PaginationOptions {
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }

    #[must_use]
    pub fn direction(&self) -> SortDirection {
        self.direction.unwrap_or_default()
    }
}

/// One page of results plus the bookkeeping the caller needs to fetch more.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Assembles a page, deriving `has_more = offset + limit < total`.
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, limit: u64, offset: u64) -> Self {
        Page {
            items,
            total,
            limit,
            offset,
            has_more: offset + limit < total,
        }
    }
}
