//! Page content verification against expected-content fixtures.
//!
//! Marketing rewrites product pages without telling anyone; the fixtures
//! pin the copy and imagery each section must still carry. Text matching is
//! whitespace/dash/case insensitive, image matching is by substring of the
//! resolved `src`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::driver::StoreDriver;
use crate::export::SheetRow;
use crate::locator::Selector;
use crate::result::{CartprobeError, CartprobeResult};

/// Expected contents of one page section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionExpectation {
    /// Section name (report row label)
    pub name: String,
    /// Root element of the section
    pub root: Selector,
    /// Text snippets the section must contain
    #[serde(default)]
    pub texts: Vec<String>,
    /// Substrings of image `src` attributes the section must contain
    #[serde(default)]
    pub images: Vec<String>,
}

/// Expected content of one product page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentExpectation {
    /// Product name, for reporting
    pub product: String,
    /// Page path relative to the site base URL (or an absolute URL)
    pub url_path: String,
    /// Sections to verify
    pub sections: Vec<SectionExpectation>,
}

impl ContentExpectation {
    /// Parse an expectation from JSON text
    pub fn from_json_str(json: &str) -> CartprobeResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| CartprobeError::fixture(format!("content expectation: {e}")))
    }

    /// Load an expectation from a JSON file
    pub fn from_path(path: &Path) -> CartprobeResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CartprobeError::fixture(format!("content expectation {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    /// Resolve the page URL against a base URL
    #[must_use]
    pub fn url(&self, base_url: &str) -> String {
        if self.url_path.starts_with("http") {
            self.url_path.clone()
        } else {
            format!("{base_url}{}", self.url_path)
        }
    }
}

/// Normalise copy for comparison: collapse whitespace, unify dashes,
/// lowercase
#[must_use]
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(['\u{2013}', '\u{2014}'], "-")
        .to_lowercase()
}

/// Verification result for one section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionReport {
    /// Section name
    pub section: String,
    /// Number of items checked
    pub checked: usize,
    /// Expected text snippets that were not found
    pub missing_texts: Vec<String>,
    /// Expected image substrings that were not found
    pub missing_images: Vec<String>,
}

impl SectionReport {
    /// Whether everything expected was present
    #[must_use]
    pub fn is_passed(&self) -> bool {
        self.missing_texts.is_empty() && self.missing_images.is_empty()
    }

    /// Flatten into an exportable record
    #[must_use]
    pub fn to_sheet_row(&self) -> SheetRow {
        let missing: Vec<String> = self
            .missing_texts
            .iter()
            .chain(self.missing_images.iter())
            .cloned()
            .collect();
        SheetRow::new()
            .with("Section", &self.section)
            .with("Checked", self.checked.to_string())
            .with(
                "Status",
                if self.is_passed() {
                    "OK".to_string()
                } else {
                    format!("Missing {} item(s)", missing.len())
                },
            )
            .with("Missing", missing.join("; "))
    }
}

fn image_sources_script(root: &Selector) -> String {
    format!(
        "(() => {{ const root = {q}; if (!root) return []; \
         return Array.from(root.querySelectorAll('img')).map(i => i.src); }})()",
        q = root.to_query()
    )
}

/// Verifier running one expectation against a live page
#[derive(Debug)]
pub struct ContentVerifier<'a> {
    expectation: &'a ContentExpectation,
}

impl<'a> ContentVerifier<'a> {
    /// Create a verifier
    #[must_use]
    pub const fn new(expectation: &'a ContentExpectation) -> Self {
        Self { expectation }
    }

    /// Navigate to the page and check every section.
    ///
    /// A section whose root cannot be read reports all of its expectations
    /// as missing rather than failing the run.
    pub async fn verify<D: StoreDriver>(
        &self,
        driver: &D,
        base_url: &str,
    ) -> CartprobeResult<Vec<SectionReport>> {
        let url = self.expectation.url(base_url);
        info!(%url, product = %self.expectation.product, "verifying page content");
        driver.navigate(&url).await?;

        let mut reports = Vec::with_capacity(self.expectation.sections.len());
        for section in &self.expectation.sections {
            reports.push(self.verify_section(driver, section).await);
        }
        Ok(reports)
    }

    async fn verify_section<D: StoreDriver>(
        &self,
        driver: &D,
        section: &SectionExpectation,
    ) -> SectionReport {
        let haystack = match driver.text_of(&section.root).await {
            Ok(text) => normalize(&text),
            Err(e) => {
                warn!(section = %section.name, error = %e, "section root unreadable");
                String::new()
            }
        };
        let missing_texts: Vec<String> = section
            .texts
            .iter()
            .filter(|t| !haystack.contains(&normalize(t.as_str())))
            .cloned()
            .collect();

        let sources: Vec<String> = match driver.evaluate(&image_sources_script(&section.root)).await
        {
            Ok(serde_json::Value::Array(values)) => values
                .into_iter()
                .filter_map(|v| v.as_str().map(ToString::to_string))
                .collect(),
            Ok(_) => Vec::new(),
            Err(e) => {
                warn!(section = %section.name, error = %e, "image collection failed");
                Vec::new()
            }
        };
        let missing_images: Vec<String> = section
            .images
            .iter()
            .filter(|img| !sources.iter().any(|src| src.contains(img.as_str())))
            .cloned()
            .collect();

        SectionReport {
            section: section.name.clone(),
            checked: section.texts.len() + section.images.len(),
            missing_texts,
            missing_images,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement};

    fn expectation() -> ContentExpectation {
        ContentExpectation {
            product: "Magnetic Badges".to_string(),
            url_path: "badges/magnetic-badge".to_string(),
            sections: vec![SectionExpectation {
                name: "Content Section".to_string(),
                root: Selector::css(".product-content-container"),
                texts: vec![
                    "Custom Magnetic Badges".to_string(),
                    "no pins, no holes".to_string(),
                ],
                images: vec!["magnetic-strength-thickness.webp".to_string()],
            }],
        }
    }

    #[tokio::test]
    async fn test_all_present_passes() {
        let exp = expectation();
        let driver = MockDriver::new().with_element(
            &exp.sections[0].root,
            MockElement::visible(
                "Custom   Magnetic Badges \u{2014} reusable, no pins, no holes needed",
            ),
        );
        driver.push_eval_result(serde_json::json!([
            "https://cdn.shop.test/img/magnetic-strength-thickness.webp"
        ]));

        let reports = ContentVerifier::new(&exp)
            .verify(&driver, "https://www.ozstickerprinting.com/")
            .await
            .unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].is_passed());
        assert!(driver.was_called("navigate:https://www.ozstickerprinting.com/badges/magnetic-badge"));
    }

    #[tokio::test]
    async fn test_missing_text_and_image_reported() {
        let exp = expectation();
        let driver = MockDriver::new().with_element(
            &exp.sections[0].root,
            MockElement::visible("Custom Magnetic Badges only"),
        );
        driver.push_eval_result(serde_json::json!([]));

        let reports = ContentVerifier::new(&exp)
            .verify(&driver, "https://www.ozstickerprinting.com/")
            .await
            .unwrap();
        let report = &reports[0];
        assert!(!report.is_passed());
        assert_eq!(report.missing_texts, vec!["no pins, no holes".to_string()]);
        assert_eq!(
            report.missing_images,
            vec!["magnetic-strength-thickness.webp".to_string()]
        );
        let row = report.to_sheet_row();
        assert_eq!(row.get("Status"), Some("Missing 2 item(s)"));
    }

    #[tokio::test]
    async fn test_unreadable_section_reports_everything_missing() {
        let exp = expectation();
        let driver = MockDriver::new();
        let reports = ContentVerifier::new(&exp)
            .verify(&driver, "https://shop.test/")
            .await
            .unwrap();
        assert_eq!(reports[0].missing_texts.len(), 2);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize("  Magnetic \u{2013} Strength\n and   Thickness "),
            "magnetic - strength and thickness"
        );
    }

    #[test]
    fn test_fixture_round_trip() {
        let exp = expectation();
        let json = serde_json::to_string(&exp).unwrap();
        let back = ContentExpectation::from_json_str(&json).unwrap();
        assert_eq!(exp, back);
    }
}
