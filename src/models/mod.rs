use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Categorical features read from a listing's free-text feature list.
/// A missing key means the page did not show that feature.
pub type Features = BTreeMap<String, String>;

/// One listing as observed at `observed_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: String,
    pub url: String,
    pub active: bool,
    pub price: Option<i64>,
    pub rooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub surface: Option<i64>,
    pub street_name: String,
    pub city: String,
    pub full_address: String,
    pub features: Features,
    pub observed_at: DateTime<Utc>,
}

impl ListingRecord {
    /// A record for a listing the portal reports as removed. Only identity,
    /// address chrome and the observation time are filled in.
    pub fn inactive(id: String, url: String, observed_at: DateTime<Utc>) -> Self {
        Self {
            id,
            url,
            active: false,
            price: None,
            rooms: None,
            bathrooms: None,
            surface: None,
            street_name: String::new(),
            city: String::new(),
            full_address: String::new(),
            features: Features::new(),
            observed_at,
        }
    }
}

/// Id and url of a listing the store still considers active
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveListing {
    pub id: String,
    pub url: String,
}

/// Derive the listing id from its url: the second-to-last path segment.
///
/// `https://www.fotocasa.es/es/alquiler/vivienda/barcelona-capital/calefaccion/182329868/d`
/// yields `182329868`. Query string and fragment are ignored.
pub fn listing_id(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let mut segments = path.rsplit('/');
    segments.next()?;
    let id = segments.next()?;

    if id.is_empty() || id.contains(':') {
        return None;
    }

    Some(id.to_string())
}
