use super::markup::{is_block_title, Markup, COOKIE_ACCEPT_BUTTON};
use super::traits::PageDriver;
use super::types::CollectorOptions;
use crate::error::ScrapeError;
use crate::models::{listing_id, ListingRecord};
use anyhow::{Context, Result};
use chrono::Utc;
use scraper::Html;
use std::collections::VecDeque;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// What a revisit of a stored listing found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Active,
    Removed,
}

/// Drives a browser through fotocasa index pages and listing pages
pub struct ListingCollector<D> {
    driver: D,
    markup: Markup,
    options: CollectorOptions,
    pages_visited: u32,
}

impl<D: PageDriver> ListingCollector<D> {
    pub fn new(driver: D, options: CollectorOptions) -> Result<Self> {
        Ok(Self {
            driver,
            markup: Markup::fotocasa()?,
            options,
            pages_visited: 0,
        })
    }

    pub fn options(&self) -> &CollectorOptions {
        &self.options
    }

    #[cfg(test)]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Index pages loaded so far
    pub fn pages_visited(&self) -> u32 {
        self.pages_visited
    }

    /// Lazily walk index pages `1..=max_pages`, yielding listing urls.
    ///
    /// Stops early at the first page showing the no-results marker. The
    /// sequence ends after yielding an error.
    pub fn enumerate(&mut self, max_pages: u32) -> ListingUrls<'_, D> {
        ListingUrls {
            collector: self,
            next_page: 1,
            max_pages,
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Visit a listing page and extract its record.
    ///
    /// `Ok(None)` means the listing is not usable (no price, or no id in the
    /// url). A block page is returned as [`ScrapeError::Blocked`].
    pub fn extract(&mut self, url: &str, is_first: bool) -> Result<Option<ListingRecord>, ScrapeError> {
        let Some(id) = listing_id(url) else {
            warn!("Cannot derive a listing id from {}, skipping", url);
            return Ok(None);
        };

        let doc = self.load(url, is_first)?;
        Ok(self.markup.parse_listing(id, url, &doc, Utc::now()))
    }

    /// Revisit a listing only to learn whether it is still published
    pub fn probe(&mut self, url: &str, is_first: bool) -> Result<Liveness, ScrapeError> {
        let doc = self.load(url, is_first)?;
        if self.markup.is_removed(&doc) {
            Ok(Liveness::Removed)
        } else {
            Ok(Liveness::Active)
        }
    }

    /// Load one index page. `None` when it carries the no-results marker.
    fn index_page(&mut self, page: u32) -> Result<Option<Vec<String>>, ScrapeError> {
        let url = self.options.page_url(page);
        info!("Getting page {}", page);

        let base = Url::parse(&url).with_context(|| format!("Invalid index url {url}"))?;
        let doc = self.load(&url, page == 1)?;
        self.pages_visited += 1;

        if self.markup.has_no_results(&doc) {
            info!("Page {} has no results, stopping enumeration", page);
            return Ok(None);
        }

        // Cards are lazy-loaded, so the page has to be scrolled before the
        // HTML is read again.
        self.scroll_through()?;
        let doc = Html::parse_document(&self.driver.html()?);

        let links = self.markup.card_links(&doc, &base);
        debug!("Page {} listed {} cards", page, links.len());
        Ok(Some(links))
    }

    /// Navigate, accept cookies on the first visit of a run and check for the
    /// block page before handing back the parsed document.
    fn load(&mut self, url: &str, accept_cookies: bool) -> Result<Html, ScrapeError> {
        self.driver.navigate(url)?;

        if accept_cookies {
            self.accept_cookies()?;
        }

        let title = self.driver.title()?;
        let html = self.driver.html()?;

        if is_block_title(&title) {
            error!("Block page served at {}", url);
            self.dump_block_page(&html);
            return Err(ScrapeError::Blocked { title });
        }

        Ok(Html::parse_document(&html))
    }

    fn accept_cookies(&mut self) -> Result<()> {
        info!("Accepting cookies");
        if !self.driver.click(COOKIE_ACCEPT_BUTTON)? {
            debug!("No cookie dialog shown");
        }
        Ok(())
    }

    fn scroll_through(&mut self) -> Result<()> {
        let height = self.driver.scroll_height()?;
        let limit = (height as f64 * self.options.scroll_fraction) as u64;
        let step = self.options.scroll_step.max(1);

        let mut y = 0;
        while y < limit {
            self.driver.scroll_to(y)?;
            thread::sleep(self.scroll_pause());
            y += step;
        }

        self.driver.scroll_to(0)
    }

    fn scroll_pause(&self) -> Duration {
        let max = self.options.max_scroll_delay.as_millis() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(fastrand::u64(0..=max))
    }

    fn dump_block_page(&self, html: &str) {
        let Some(dir) = &self.options.debug_dir else {
            return;
        };

        let path = dir.join(format!("blocked_{}.html", Utc::now().format("%Y%m%dT%H%M%S")));
        let written = std::fs::create_dir_all(dir).and_then(|_| std::fs::write(&path, html));
        match written {
            Ok(()) => info!("Saved block page HTML to {}", path.display()),
            Err(e) => warn!("Could not save block page HTML: {}", e),
        }
    }
}

/// Listing urls from consecutive index pages, see [`ListingCollector::enumerate`]
pub struct ListingUrls<'a, D> {
    collector: &'a mut ListingCollector<D>,
    next_page: u32,
    max_pages: u32,
    pending: VecDeque<String>,
    finished: bool,
}

impl<D: PageDriver> Iterator for ListingUrls<'_, D> {
    type Item = Result<String, ScrapeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(url) = self.pending.pop_front() {
                return Some(Ok(url));
            }

            if self.finished || self.next_page > self.max_pages {
                return None;
            }

            let page = self.next_page;
            self.next_page += 1;

            match self.collector.index_page(page) {
                Ok(Some(urls)) => self.pending.extend(urls),
                Ok(None) => self.finished = true,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
