//! Rendered-page cache keyed by page name, invalidated by source mtime.
//!
//! Every lookup holds one mutex for the whole check-and-rebuild sequence, for
//! all page names. A rebuild of one page therefore blocks lookups of every
//! other page. [`PageCache::save`] takes the same mutex.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use metrics::counter;
use thiserror::Error;
use tracing::{debug, info};

use crate::application::metadata::{self, MetadataDecodeError};
use crate::application::render::Renderer;
use crate::application::repos::{PageStore, StoreError};
use crate::domain::pages::{PageMetadata, PageName, RenderedPage};

use super::lock::RecoverPoison;

const SOURCE: &str = "cache::page_cache";

pub const METRIC_PAGE_CACHE_HIT: &str = "wijiwiki_page_cache_hit_total";
pub const METRIC_PAGE_CACHE_MISS: &str = "wijiwiki_page_cache_miss_total";
pub const METRIC_PAGE_CACHE_REFRESH: &str = "wijiwiki_page_cache_refresh_total";
pub const METRIC_PAGE_CACHE_REMOVED: &str = "wijiwiki_page_cache_removed_total";

#[derive(Debug, Error)]
pub enum PageError {
    #[error("page `{name}` not found")]
    NotFound { name: String },
    #[error("page `{name}` was removed")]
    PageRemoved { name: String },
    #[error(transparent)]
    Metadata(#[from] MetadataDecodeError),
    #[error("page storage failed: {0}")]
    Store(#[source] StoreError),
}

impl PageError {
    /// Whether callers should answer as if the page does not exist.
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            PageError::NotFound { .. } | PageError::PageRemoved { .. }
        )
    }
}

impl From<StoreError> for PageError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { name } => PageError::NotFound { name },
            other => PageError::Store(other),
        }
    }
}

struct CacheEntry {
    metadata: PageMetadata,
    page: RenderedPage,
    /// Source mtime the entry is known to reflect.
    observed_at: SystemTime,
}

pub struct PageCache {
    store: Arc<dyn PageStore>,
    renderer: Arc<dyn Renderer>,
    entries: Mutex<HashMap<PageName, CacheEntry>>,
}

impl PageCache {
    pub fn new(store: Arc<dyn PageStore>, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            store,
            renderer,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Rendered page and metadata for `name`, rebuilt when the source changed.
    ///
    /// A cache hit costs one stat of the source. A failed build leaves the
    /// cache untouched.
    pub fn get(&self, name: &PageName) -> Result<(RenderedPage, PageMetadata), PageError> {
        let mut entries = self.entries.lock().recover(SOURCE, "get");

        let observed_at = entries.get(name).map(|entry| entry.observed_at);
        if let Some(observed_at) = observed_at {
            let current = match self.store.mod_time(name) {
                Ok(current) => current,
                Err(err) => {
                    entries.remove(name);
                    counter!(METRIC_PAGE_CACHE_REMOVED).increment(1);
                    info!(
                        target = "wijiwiki::cache",
                        page = %name,
                        error = %err,
                        "Removing page from cache: couldn't stat"
                    );
                    return Err(if err.is_not_found() {
                        PageError::PageRemoved {
                            name: name.as_str().to_string(),
                        }
                    } else {
                        PageError::Store(err)
                    });
                }
            };

            if current <= observed_at
                && let Some(entry) = entries.get(name)
            {
                counter!(METRIC_PAGE_CACHE_HIT).increment(1);
                debug!(target = "wijiwiki::cache", page = %name, "Reading page from cache");
                return Ok((
                    entry.page.clone().with_title_from(name),
                    entry.metadata.clone(),
                ));
            }

            info!(
                target = "wijiwiki::cache",
                page = %name,
                "Page was modified, updating cache"
            );
            let entry = self.build(name)?;
            counter!(METRIC_PAGE_CACHE_REFRESH).increment(1);
            return Ok(Self::insert(&mut entries, name, entry));
        }

        let entry = self.build(name)?;
        counter!(METRIC_PAGE_CACHE_MISS).increment(1);
        info!(
            target = "wijiwiki::cache",
            page = %name,
            "Creating and caching page"
        );
        Ok(Self::insert(&mut entries, name, entry))
    }

    /// Raw source and metadata, straight from the store.
    ///
    /// Never reads, fills, or evicts cache entries.
    pub fn get_source(&self, name: &PageName) -> Result<(Vec<u8>, PageMetadata), PageError> {
        let raw = self.store.read(name)?;
        let (metadata, _) = metadata::parse_bytes(&raw)?;
        Ok((raw, metadata))
    }

    /// Persist new source for `name`.
    ///
    /// The cached entry is left alone; the next [`PageCache::get`] sees the
    /// newer mtime and rebuilds. Saves wait for any rebuild in progress.
    pub fn save(&self, name: &PageName, contents: &[u8]) -> Result<(), PageError> {
        // Held across the write so no rebuild in `get` can straddle it.
        let _entries = self.entries.lock().recover(SOURCE, "save");
        self.store.write(name, contents)?;
        info!(
            target = "wijiwiki::cache",
            page = %name,
            bytes = contents.len(),
            "Saved page source"
        );
        Ok(())
    }

    pub fn contains(&self, name: &PageName) -> bool {
        self.entries
            .lock()
            .recover(SOURCE, "contains")
            .contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().recover(SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn build(&self, name: &PageName) -> Result<CacheEntry, PageError> {
        let before = self.store.mod_time(name)?;
        let raw = self.store.read(name)?;
        let (metadata, offset) = metadata::parse_bytes(&raw)?;
        let body = String::from_utf8_lossy(&raw[offset..]);
        let contents_html = self.renderer.render(&body);
        let page = RenderedPage::new(name, &metadata, contents_html);

        // An outside write that moved the mtime during the read leaves the
        // entry stamped with the older time, so the next lookup rebuilds.
        // Writes within the filesystem's mtime granularity can still go
        // unnoticed.
        let after = self.store.mod_time(name)?;
        let observed_at = before.min(after);

        Ok(CacheEntry {
            metadata,
            page,
            observed_at,
        })
    }

    fn insert(
        entries: &mut HashMap<PageName, CacheEntry>,
        name: &PageName,
        entry: CacheEntry,
    ) -> (RenderedPage, PageMetadata) {
        let result = (entry.page.clone(), entry.metadata.clone());
        entries.insert(name.clone(), entry);
        result
    }
}
