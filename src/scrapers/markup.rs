//! Everything tied to the portal's markup: css class names, marker texts
//! and how header fields are read out of them.

use super::features::collect_features;
use crate::models::{Features, ListingRecord};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

/// Consent dialog button, clicked once per run
pub const COOKIE_ACCEPT_BUTTON: &str = "#didomi-notice-agree-button";

const REMOVED_MODAL_TEXT: &str = "Anuncio no disponible";
const NOT_FOUND_TEXT: &str = "La página no existe";

/// Titles of the page served once the scraper has been detected. The second
/// one is the same text read through a latin-1 decode.
const BLOCKED_TITLES: &[&str] = &["SENTIMOS LA INTERRUPCIÓN", "SENTIMOS LA INTERRUPCIÃ\u{93}N"];

/// Values the portal shows instead of a number
const PLACEHOLDERS: &[&str] = &["a consultar", "on request"];

pub fn is_block_title(title: &str) -> bool {
    BLOCKED_TITLES.contains(&title.trim())
}

/// First number embedded in `text`, with `.` thousands separators removed.
///
/// Returns `None` for placeholder texts and for texts without digits.
pub fn parse_number(text: &str) -> Option<i64> {
    let lower = text.trim().to_lowercase();
    if PLACEHOLDERS.iter().any(|p| lower.contains(p)) {
        return None;
    }

    let start = text.find(|c: char| c.is_ascii_digit())?;
    let mut digits = String::new();
    let mut chars = text[start..].chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if c == '.' && chars.peek().is_some_and(|n| n.is_ascii_digit()) {
            continue;
        } else {
            break;
        }
    }

    digits.parse().ok()
}

/// Parsed selectors for the listing portal
pub struct Markup {
    no_results: Selector,
    card_link: Selector,
    removed_modal: Selector,
    not_found_title: Selector,
    price: Selector,
    rooms: Selector,
    bathrooms: Selector,
    surface: Selector,
    feature_entry: Selector,
    property_title: Selector,
    municipality: Selector,
}

fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {css:?}: {e}"))
}

impl Markup {
    pub fn fotocasa() -> Result<Self> {
        Ok(Self {
            no_results: selector(".re-SearchNoResults")?,
            card_link: selector(".re-CardPackMinimal a.re-CardPackMinimal-slider")?,
            removed_modal: selector(".sui-MoleculeModal-header")?,
            not_found_title: selector(".re-Error404Title")?,
            price: selector(".re-DetailHeader-price")?,
            rooms: selector(".re-DetailHeader-rooms")?,
            bathrooms: selector(".re-DetailHeader-bathrooms")?,
            surface: selector(".re-DetailHeader-surface")?,
            feature_entry: selector(".re-DetailFeaturesList-featureContent")?,
            property_title: selector(".re-DetailHeader-propertyTitle")?,
            municipality: selector(".re-DetailHeader-municipalityTitle")?,
        })
    }

    /// Whether an index page says the search has no (more) results
    pub fn has_no_results(&self, doc: &Html) -> bool {
        doc.select(&self.no_results).next().is_some()
    }

    /// Absolute urls of every listing card on an index page
    pub fn card_links(&self, doc: &Html, base: &Url) -> Vec<String> {
        doc.select(&self.card_link)
            .filter_map(|card| card.value().attr("href"))
            .filter_map(|href| match base.join(href) {
                Ok(url) => Some(url.to_string()),
                Err(e) => {
                    warn!("Skipping card with bad href {:?}: {}", href, e);
                    None
                }
            })
            .collect()
    }

    /// Whether a listing page reports the listing as gone
    pub fn is_removed(&self, doc: &Html) -> bool {
        let modal = first_text(doc, &self.removed_modal);
        let not_found = first_text(doc, &self.not_found_title);

        modal.as_deref() == Some(REMOVED_MODAL_TEXT) || not_found.as_deref() == Some(NOT_FOUND_TEXT)
    }

    /// Build the record for a listing page.
    ///
    /// Returns `None` when a live listing shows no usable price.
    pub fn parse_listing(
        &self,
        id: String,
        url: &str,
        doc: &Html,
        observed_at: DateTime<Utc>,
    ) -> Option<ListingRecord> {
        let mut record = if self.is_removed(doc) {
            info!("Listing {} is no longer available", id);
            ListingRecord::inactive(id, url.to_string(), observed_at)
        } else {
            let Some(price) = self.number(doc, &self.price) else {
                info!("Listing {} has no price, skipping", id);
                return None;
            };

            let mut features = Features::new();
            let entries: Vec<String> = doc
                .select(&self.feature_entry)
                .map(|e| text_lines(e).join("\n"))
                .collect();
            collect_features(entries.iter().map(String::as_str), &mut features);

            ListingRecord {
                id,
                url: url.to_string(),
                active: true,
                price: Some(price),
                rooms: self.number(doc, &self.rooms),
                bathrooms: self.number(doc, &self.bathrooms),
                surface: self.number(doc, &self.surface),
                street_name: String::new(),
                city: String::new(),
                full_address: String::new(),
                features,
                observed_at,
            }
        };

        let full_address = first_text(doc, &self.property_title)
            .map(|title| address_from_title(&title))
            .unwrap_or_default();
        record.street_name = full_address.split(',').next().unwrap_or_default().trim().to_string();
        record.full_address = full_address;
        record.city = first_text(doc, &self.municipality).unwrap_or_default();

        if record.full_address.is_empty() {
            debug!("Listing {} shows no address", record.id);
        }

        Some(record)
    }

    fn number(&self, doc: &Html, selector: &Selector) -> Option<i64> {
        first_text(doc, selector).and_then(|text| parse_number(&text))
    }
}

/// `"Piso en Carrer de Sants, Sants-Montjuïc"` becomes
/// `"Carrer de Sants, Sants-Montjuïc"`
fn address_from_title(title: &str) -> String {
    match title.split(" en ").nth(1) {
        Some(address) => address.trim().to_string(),
        None => title.trim().to_string(),
    }
}

fn first_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .map(|e| text_lines(e).join(" "))
}

fn text_lines(element: ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
