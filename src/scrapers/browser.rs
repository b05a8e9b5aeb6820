use super::traits::PageDriver;
use anyhow::{Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::sync::Arc;
use tracing::{debug, info};

/// Browser launch settings
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub user_agent: String,
}

/// [`PageDriver`] backed by a single headless Chrome tab
pub struct ChromeDriver {
    // Keeps the Chrome process alive for as long as the tab is in use.
    browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeDriver {
    /// Launch Chrome and open the tab every navigation goes through
    pub fn launch(options: &BrowserOptions) -> Result<Self> {
        info!("Launching Chrome (headless: {})...", options.headless);

        let launch = LaunchOptions::default_builder()
            .headless(options.headless)
            .window_size(Some((1366, 900)))
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(launch).context("Failed to launch Chrome browser")?;

        let tab = browser.new_tab().context("Failed to open browser tab")?;
        tab.set_user_agent(&options.user_agent, Some("es-ES,es;q=0.9"), None)
            .context("Failed to set user agent")?;

        debug!("Browser ready");
        Ok(Self { browser, tab })
    }

    /// Quit the browser. Dropping the driver has the same effect; this only
    /// makes the release explicit in the logs.
    pub fn quit(self) {
        drop(self.tab);
        drop(self.browser);
        info!("Browser closed");
    }

    fn evaluate(&self, script: &str) -> Result<Option<serde_json::Value>> {
        let result = self
            .tab
            .evaluate(script, false)
            .with_context(|| format!("Failed to evaluate script: {script}"))?;
        Ok(result.value)
    }
}

impl PageDriver for ChromeDriver {
    fn navigate(&mut self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.tab
            .navigate_to(url)
            .with_context(|| format!("Failed to navigate to {url}"))?
            .wait_until_navigated()
            .with_context(|| format!("Navigation to {url} did not finish"))?;
        Ok(())
    }

    fn title(&mut self) -> Result<String> {
        self.tab.get_title().context("Failed to read page title")
    }

    fn html(&mut self) -> Result<String> {
        self.tab.get_content().context("Failed to read page HTML")
    }

    fn click(&mut self, selector: &str) -> Result<bool> {
        let quoted = serde_json::to_string(selector)?;
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({quoted});
                if (!el) return false;
                el.click();
                return true;
            }})()"#
        );

        let clicked = self
            .evaluate(&script)?
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        Ok(clicked)
    }

    fn scroll_height(&mut self) -> Result<u64> {
        let height = self
            .evaluate("document.body.scrollHeight")?
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        Ok(height.max(0.0) as u64)
    }

    fn scroll_to(&mut self, y: u64) -> Result<()> {
        self.evaluate(&format!("window.scrollTo(0, {y});"))?;
        Ok(())
    }
}
