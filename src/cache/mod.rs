//! In-process cache of rendered wiki pages.
//!
//! Entries are rebuilt whenever the page source on disk carries a newer
//! modification time than the one recorded when the entry was built. Nothing
//! is persisted across restarts.

mod lock;
mod page_cache;

pub(crate) use lock::RecoverPoison;
pub use page_cache::{
    METRIC_PAGE_CACHE_HIT, METRIC_PAGE_CACHE_MISS, METRIC_PAGE_CACHE_REFRESH,
    METRIC_PAGE_CACHE_REMOVED, PageCache, PageError,
};
