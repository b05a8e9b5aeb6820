use thiserror::Error;

/// Errors raised while driving the portal.
///
/// `Blocked` is the only error that means "stop everything now": the portal
/// has detected the scraper and no listing-level retry will help.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The portal served its block page
    #[error("the website has blocked the scraper (page title: {title:?})")]
    Blocked { title: String },

    /// Browser automation failed (launch, navigation, script evaluation)
    #[error("browser error: {0:#}")]
    Browser(#[from] anyhow::Error),
}

impl ScrapeError {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}
