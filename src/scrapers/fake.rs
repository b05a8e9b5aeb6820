//! In-memory [`PageDriver`] and page fixtures shaped like the portal's markup.

use super::traits::PageDriver;
use anyhow::{bail, Result};
use std::collections::HashMap;

pub const INDEX_URL: &str = "https://www.fotocasa.es/es/alquiler/viviendas/barcelona-provincia/todas-las-zonas/l/{page}";

struct FakePage {
    title: String,
    html: String,
}

#[derive(Default)]
pub struct FakeDriver {
    pages: HashMap<String, FakePage>,
    current: Option<String>,
    pub visited: Vec<String>,
    pub clicks: Vec<String>,
    pub scrolls: Vec<u64>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, title: &str, html: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            FakePage {
                title: title.to_string(),
                html: html.to_string(),
            },
        );
        self
    }

    fn page(&self) -> Result<&FakePage> {
        match self.current.as_ref().and_then(|url| self.pages.get(url)) {
            Some(page) => Ok(page),
            None => bail!("no page loaded"),
        }
    }
}

impl PageDriver for FakeDriver {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.visited.push(url.to_string());
        if !self.pages.contains_key(url) {
            bail!("unexpected navigation to {url}");
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    fn title(&mut self) -> Result<String> {
        Ok(self.page()?.title.clone())
    }

    fn html(&mut self) -> Result<String> {
        Ok(self.page()?.html.clone())
    }

    fn click(&mut self, selector: &str) -> Result<bool> {
        self.clicks.push(selector.to_string());
        Ok(true)
    }

    fn scroll_height(&mut self) -> Result<u64> {
        Ok(1200)
    }

    fn scroll_to(&mut self, y: u64) -> Result<()> {
        self.scrolls.push(y);
        Ok(())
    }
}

pub fn index_url(page: u32) -> String {
    INDEX_URL.replace("{page}", &page.to_string())
}

pub fn listing_url(id: u64) -> String {
    format!("https://www.fotocasa.es/es/alquiler/vivienda/barcelona-capital/ascensor/{id}/d")
}

pub fn index_page(ids: &[u64]) -> String {
    let cards: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<article class="re-CardPackMinimal">
                     <a class="re-CardPackMinimal-slider" href="/es/alquiler/vivienda/barcelona-capital/ascensor/{id}/d"></a>
                   </article>"#
            )
        })
        .collect();
    format!("<html><body><section>{cards}</section></body></html>")
}

pub fn no_results_page() -> String {
    r#"<html><body><div class="re-SearchNoResults">No hay resultados</div></body></html>"#.to_string()
}

const ADDRESS_CHROME: &str = r#"
    <h1 class="re-DetailHeader-propertyTitle">Piso en Carrer de Sants, Sants-Montjuïc</h1>
    <p class="re-DetailHeader-municipalityTitle">Barcelona Capital</p>
"#;

pub fn listing_page(price: &str) -> String {
    format!(
        r#"<html><head><title>Piso</title></head><body>
          {ADDRESS_CHROME}
          <span class="re-DetailHeader-price">{price}</span>
          <ul>
            <li class="re-DetailHeader-rooms"><span>3 habs.</span></li>
            <li class="re-DetailHeader-bathrooms"><span>2 baños</span></li>
            <li class="re-DetailHeader-surface"><span>85 m²</span></li>
          </ul>
          <ul class="re-DetailFeaturesList">
            <li><div class="re-DetailFeaturesList-featureContent">
              <p class="re-DetailFeaturesList-featureLabel">Tipo de inmueble</p>
              <p class="re-DetailFeaturesList-featureValue">Piso</p>
            </div></li>
            <li><div class="re-DetailFeaturesList-featureContent">
              <p>Ascensor</p><p>Sí</p>
            </div></li>
            <li><div class="re-DetailFeaturesList-featureContent">
              <p>Consumo energía</p><p>E</p><p>150 kWh m2 / año</p>
            </div></li>
            <li><div class="re-DetailFeaturesList-featureContent">
              <p>Terraza</p><p>Sí</p>
            </div></li>
          </ul>
        </body></html>"#
    )
}

/// A live listing with a price but no rooms, a placeholder surface and no
/// address chrome
pub fn sparse_listing_page() -> String {
    r#"<html><body>
      <span class="re-DetailHeader-price">950 €</span>
      <ul>
        <li class="re-DetailHeader-bathrooms"><span>1 baño</span></li>
        <li class="re-DetailHeader-surface"><span>A consultar</span></li>
      </ul>
    </body></html>"#
        .to_string()
}

pub fn removed_page() -> String {
    format!(
        r#"<html><body>
          {ADDRESS_CHROME}
          <div class="sui-MoleculeModal-header">Anuncio no disponible</div>
          <span class="re-DetailHeader-price">1.000 €/mes</span>
        </body></html>"#
    )
}

pub fn not_found_page() -> String {
    r#"<html><body><h1 class="re-Error404Title">La página no existe</h1></body></html>"#.to_string()
}
