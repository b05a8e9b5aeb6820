use anyhow::Result;

/// The browser operations the collector needs.
///
/// Implemented by [`ChromeDriver`](super::ChromeDriver) for real runs; tests
/// swap in a driver serving canned pages.
pub trait PageDriver {
    /// Navigate to `url` and wait until the navigation settles
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Title of the current document
    fn title(&mut self) -> Result<String>;

    /// Outer HTML of the current document
    fn html(&mut self) -> Result<String>;

    /// Click the first element matching `selector`. Returns `false` when
    /// nothing matched.
    fn click(&mut self, selector: &str) -> Result<bool>;

    /// Full scrollable height of the current document in pixels
    fn scroll_height(&mut self) -> Result<u64>;

    /// Scroll the window to vertical offset `y`
    fn scroll_to(&mut self, y: u64) -> Result<()>;
}
