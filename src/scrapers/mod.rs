pub mod browser;
pub mod features;
pub mod fotocasa;
pub mod markup;
pub mod traits;
pub mod types;

#[cfg(test)]
pub mod fake;

pub use browser::{BrowserOptions, ChromeDriver};
pub use fotocasa::{ListingCollector, Liveness};
pub use traits::PageDriver;
pub use types::CollectorOptions;
