use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::catalog::types::{CatalogProvider, CatalogSnapshot};

/// Upper bound for the single outbound feed request. A hanging fetch must
/// never stall a check cycle.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct StorefrontProvider {
    mode: Mode,
}

enum Mode {
    Http {
        url: String,
        client: reqwest::Client,
    },
    Fixture(String),
}

impl StorefrontProvider {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            mode: Mode::Http {
                url: url.into(),
                client: reqwest::Client::new(),
            },
        }
    }

    /// Feed a canned JSON document instead of hitting the network.
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    fn parse_snapshot(s: &str) -> Result<CatalogSnapshot> {
        serde_json::from_str(s).context("parsing catalog feed json")
    }
}

#[async_trait]
impl CatalogProvider for StorefrontProvider {
    async fn fetch_snapshot(&self) -> Result<CatalogSnapshot> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_snapshot(s),

            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .timeout(FETCH_TIMEOUT)
                    .send()
                    .await
                    .context("catalog feed get()")?
                    .error_for_status()
                    .context("catalog feed non-2xx")?
                    .text()
                    .await
                    .context("catalog feed .text()")?;
                Self::parse_snapshot(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "steam-featured"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_snapshot_parses_specials() {
        let json = r#"{
            "specials": { "items": [
                { "id": 100, "name": "A", "discount_percent": 100, "final_price": 0, "original_price": 500 }
            ]},
            "featured_win": []
        }"#;
        let p = StorefrontProvider::from_fixture_str(json);
        let snap = p.fetch_snapshot().await.unwrap();
        let items = snap.specials.unwrap().items;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id.as_deref(), Some("100"));
    }

    #[tokio::test]
    async fn document_without_specials_is_valid() {
        let p = StorefrontProvider::from_fixture_str(r#"{ "featured_win": [] }"#);
        let snap = p.fetch_snapshot().await.unwrap();
        assert!(snap.specials.is_none());
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let p = StorefrontProvider::from_fixture_str("<html>rate limited</html>");
        assert!(p.fetch_snapshot().await.is_err());
    }
}
