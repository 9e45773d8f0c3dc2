//! Price estimates and quote requests. The catalog and the quote store are
//! external collaborators behind `CatalogSource` and `QuoteSink`.

use std::{
    fs::OpenOptions,
    io::Write,
    path::PathBuf,
    sync::Mutex,
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, WallMaskError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub price_per_area: f64,
    #[serde(rename = "textureImageURL")]
    pub texture_image_url: String,
}

pub trait CatalogSource: Send + Sync {
    /// Items ordered by recency, newest first.
    fn fetch(&self) -> Result<Vec<CatalogItem>>;
}

/// Catalog failures never stop the simulator; they degrade to an empty list.
pub fn fetch_catalog_or_empty(source: &dyn CatalogSource) -> Vec<CatalogItem> {
    match source.fetch() {
        Ok(items) => items,
        Err(e) => {
            warn!("Catalog fetch failed: {e}");
            Vec::new()
        }
    }
}

/// A fixed in-process catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    items: Vec<CatalogItem>,
}

impl StaticCatalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }

    /// The sample papers shipped with the demo.
    pub fn sample() -> Self {
        const SAMPLE: &[(&str, &str, f64, &str)] = &[
            ("sala-1", "Classic Beige Linen", 45.90, "photo-1615800098779-1be8287d6b0d"),
            ("sala-2", "Carrara Marble", 89.90, "photo-1563297063-8e7cffc81f7d"),
            ("sala-3", "Burnt Cement", 55.00, "photo-1517504734802-7e374ff9ce9b"),
            ("office-1", "Modern 3D Geometric", 72.50, "photo-1521997092953-d083bc749023"),
            ("office-2", "Industrial Brick", 64.90, "photo-1582738411706-bfc88730e875"),
            ("office-3", "Navy Stripes", 49.90, "photo-1549402434-585a06553896"),
            ("kids-1", "Watercolour Clouds", 58.00, "photo-1520699918507-3c3e05c46bda"),
            ("kids-2", "Coloured Dots", 44.50, "photo-1515169273894-7e876dcf13da"),
            ("kids-3", "Enchanted Forest", 62.90, "photo-1455582916367-25f75bfc6710"),
        ];
        Self::new(
            SAMPLE
                .iter()
                .map(|&(id, name, price, photo)| CatalogItem {
                    id: id.to_string(),
                    name: name.to_string(),
                    price_per_area: price,
                    texture_image_url: format!(
                        "https://images.unsplash.com/{photo}?auto=format&fit=crop&q=80&w=1200"
                    ),
                })
                .collect(),
        )
    }

    pub fn find(&self, id: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

impl CatalogSource for StaticCatalog {
    fn fetch(&self) -> Result<Vec<CatalogItem>> {
        Ok(self.items.clone())
    }
}

/// Area × unit price for a wall measured in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceEstimate {
    pub width_meters: f64,
    pub height_meters: f64,
    pub area: f64,
    pub price_per_area: f64,
    pub total_price: f64,
}

impl PriceEstimate {
    /// `None` until both dimensions are positive.
    pub fn new(width_meters: f64, height_meters: f64, price_per_area: f64) -> Option<Self> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(width_meters) || !valid(height_meters) || !price_per_area.is_finite() {
            return None;
        }
        let area = width_meters * height_meters;
        Some(Self {
            width_meters,
            height_meters,
            area,
            price_per_area,
            total_price: area * price_per_area,
        })
    }

    pub fn for_item(width_meters: f64, height_meters: f64, item: &CatalogItem) -> Option<Self> {
        Self::new(width_meters, height_meters, item.price_per_area)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_paper_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_name: Option<String>,
    pub width_meters: f64,
    pub height_meters: f64,
    pub total_price: f64,
    pub contact_name: String,
    pub contact_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendered_image_reference: Option<String>,
}

impl QuoteRequest {
    /// Build a request from an estimate. Name and phone are required.
    pub fn new(
        estimate: &PriceEstimate,
        item: Option<&CatalogItem>,
        contact_name: &str,
        contact_phone: &str,
    ) -> Result<Self> {
        let contact_name = contact_name.trim();
        let contact_phone = contact_phone.trim();
        if contact_name.is_empty() {
            return Err(WallMaskError::InvalidQuote("contact name is required".into()));
        }
        if contact_phone.is_empty() {
            return Err(WallMaskError::InvalidQuote("contact phone is required".into()));
        }
        Ok(Self {
            selected_paper_id: item.map(|i| i.id.clone()),
            paper_name: item.map(|i| i.name.clone()),
            width_meters: estimate.width_meters,
            height_meters: estimate.height_meters,
            total_price: estimate.total_price,
            contact_name: contact_name.to_string(),
            contact_phone: contact_phone.to_string(),
            contact_email: None,
            notes: None,
            rendered_image_reference: None,
        })
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.contact_email = Some(email.into()).filter(|e: &String| !e.trim().is_empty());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into()).filter(|n: &String| !n.trim().is_empty());
        self
    }

    pub fn with_rendered_image(mut self, reference: impl Into<String>) -> Self {
        self.rendered_image_reference = Some(reference.into());
        self
    }
}

pub trait QuoteSink: Send + Sync {
    /// Failures are `WallMaskError::Submission`; the caller keeps its state
    /// and may resubmit the same request.
    fn submit(&self, request: &QuoteRequest) -> Result<()>;
}

/// Submit and log the outcome.
pub fn submit_quote(sink: &dyn QuoteSink, request: &QuoteRequest) -> Result<()> {
    match sink.submit(request) {
        Ok(()) => {
            info!(total = request.total_price, "Quote submitted");
            Ok(())
        }
        Err(e) => {
            warn!("Quote submission failed: {e}");
            Err(e)
        }
    }
}

/// Keeps submissions in memory. Can be switched offline to simulate an
/// unreachable store.
#[derive(Debug, Default)]
pub struct MemoryQuoteSink {
    submitted: Mutex<Vec<QuoteRequest>>,
    offline: Mutex<bool>,
}

impl MemoryQuoteSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut flag) = self.offline.lock() {
            *flag = offline;
        }
    }

    pub fn submitted(&self) -> Vec<QuoteRequest> {
        self.submitted.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl QuoteSink for MemoryQuoteSink {
    fn submit(&self, request: &QuoteRequest) -> Result<()> {
        let offline = self.offline.lock().map(|f| *f).unwrap_or(true);
        if offline {
            return Err(WallMaskError::Submission {
                message: "quote store unreachable".into(),
                retryable: true,
            });
        }
        let mut submitted = self.submitted.lock().map_err(|_| WallMaskError::Submission {
            message: "quote store poisoned".into(),
            retryable: false,
        })?;
        submitted.push(request.clone());
        Ok(())
    }
}

/// Appends one JSON object per line to a file.
#[derive(Debug, Clone)]
pub struct JsonLinesQuoteSink {
    path: PathBuf,
}

impl JsonLinesQuoteSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl QuoteSink for JsonLinesQuoteSink {
    fn submit(&self, request: &QuoteRequest) -> Result<()> {
        let line = serde_json::to_string(request)?;
        let retryable = |e: std::io::Error| WallMaskError::Submission {
            message: format!("{}: {e}", self.path.display()),
            retryable: true,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(retryable)?;
        writeln!(file, "{line}").map_err(retryable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct BrokenCatalog;

    impl CatalogSource for BrokenCatalog {
        fn fetch(&self) -> Result<Vec<CatalogItem>> {
            Err(WallMaskError::Catalog("connection refused".into()))
        }
    }

    fn estimate() -> PriceEstimate {
        let catalog = StaticCatalog::sample();
        let item = catalog.find("sala-1").unwrap();
        PriceEstimate::for_item(3.0, 2.5, item).unwrap()
    }

    #[test]
    fn estimate_is_area_times_price() {
        let e = estimate();
        assert_relative_eq!(e.area, 7.5);
        assert_relative_eq!(e.total_price, 7.5 * 45.90, epsilon = 1e-9);
        assert!(PriceEstimate::new(0.0, 2.0, 10.0).is_none());
        assert!(PriceEstimate::new(f64::NAN, 2.0, 10.0).is_none());
    }

    #[test]
    fn catalog_failure_degrades_to_empty() {
        assert!(fetch_catalog_or_empty(&BrokenCatalog).is_empty());
        assert_eq!(fetch_catalog_or_empty(&StaticCatalog::sample()).len(), 9);
    }

    #[test]
    fn catalog_item_uses_external_field_names() {
        let json = serde_json::to_value(&StaticCatalog::sample().fetch().unwrap()[0]).unwrap();
        assert_eq!(json["pricePerArea"], 45.90);
        assert!(json["textureImageURL"].as_str().unwrap().starts_with("https://"));
    }

    #[test]
    fn quote_requires_name_and_phone() {
        let e = estimate();
        assert!(matches!(
            QuoteRequest::new(&e, None, "  ", "555"),
            Err(WallMaskError::InvalidQuote(_))
        ));
        assert!(QuoteRequest::new(&e, None, "Ana", "").is_err());
        let quote = QuoteRequest::new(&e, None, "Ana", "555").unwrap().with_email(" ");
        assert_eq!(quote.contact_email, None);
    }

    #[test]
    fn failed_submission_is_retryable() {
        let catalog = StaticCatalog::sample();
        let item = catalog.find("kids-2");
        let quote = QuoteRequest::new(&estimate(), item, "Ana", "555").unwrap();
        let sink = MemoryQuoteSink::new();
        sink.set_offline(true);
        let err = submit_quote(&sink, &quote).unwrap_err();
        assert!(err.is_retryable());
        assert!(sink.submitted().is_empty());

        sink.set_offline(false);
        submit_quote(&sink, &quote).unwrap();
        assert_eq!(sink.submitted()[0].selected_paper_id.as_deref(), Some("kids-2"));
    }

    #[test]
    fn json_lines_sink_appends() {
        let path = std::env::temp_dir().join(format!("wallmask-quotes-{}.jsonl", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let sink = JsonLinesQuoteSink::new(&path);
        let quote = QuoteRequest::new(&estimate(), None, "Ana", "555").unwrap();
        sink.submit(&quote).unwrap();
        sink.submit(&quote).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        let first: QuoteRequest = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(first, quote);
        let _ = std::fs::remove_file(&path);
    }
}
