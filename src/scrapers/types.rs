use std::path::PathBuf;
use std::time::Duration;

/// Fotocasa rentals in Barcelona province, newest first
pub const DEFAULT_INDEX_URL: &str = "https://www.fotocasa.es/es/alquiler/viviendas/barcelona-provincia/todas-las-zonas/l/{page}?sortType=publicationDate";

/// Placeholder replaced by the page number in the index url template
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// Settings for listing enumeration and extraction
#[derive(Debug, Clone)]
pub struct CollectorOptions {
    /// Index url template containing [`PAGE_PLACEHOLDER`]
    pub index_url: String,
    /// Last index page to visit (1-based, inclusive)
    pub max_pages: u32,
    /// Pixels scrolled per step while loading an index page
    pub scroll_step: u64,
    /// Fraction of the page height to scroll through
    pub scroll_fraction: f64,
    /// Upper bound of the random pause between scroll steps
    pub max_scroll_delay: Duration,
    /// Where to dump the HTML of block pages, if anywhere
    pub debug_dir: Option<PathBuf>,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            max_pages: 50,
            scroll_step: 500,
            scroll_fraction: 0.8,
            max_scroll_delay: Duration::from_millis(700),
            debug_dir: None,
        }
    }
}

impl CollectorOptions {
    /// Url of index page `page`
    pub fn page_url(&self, page: u32) -> String {
        self.index_url.replace(PAGE_PLACEHOLDER, &page.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_url_fills_placeholder() {
        let options = CollectorOptions::default();
        assert_eq!(
            options.page_url(3),
            "https://www.fotocasa.es/es/alquiler/viviendas/barcelona-provincia/todas-las-zonas/l/3?sortType=publicationDate"
        );
    }
}
