// src/catalog/types.rs
use anyhow::Result;
use serde::{Deserialize, Deserializer};

/// One raw entry of the storefront feed. Numeric prices are minor currency
/// units (cents); absent numeric fields deserialize to 0.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogEntry {
    #[serde(default, deserialize_with = "de_entry_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub discount_percent: u32,
    #[serde(default)]
    pub final_price: u64,
    #[serde(default)]
    pub original_price: u64,
}

/// The feed serves ids as numbers; tolerate strings too.
fn de_entry_id<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Num(u64),
        Str(String),
    }

    let raw: Option<RawId> = Option::deserialize(de)?;
    Ok(raw.map(|r| match r {
        RawId::Num(n) => n.to_string(),
        RawId::Str(s) => s,
    }))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecialsSection {
    #[serde(default)]
    pub items: Vec<CatalogEntry>,
}

/// Deserialized feed document. The `specials` section is the only part we
/// read; a document without it is valid and simply yields no candidates.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub specials: Option<SpecialsSection>,
}

/// An entry that passed the genuine-promotion filter, ready for notification.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionCandidate {
    pub app_id: String,
    pub name: String,
    /// Original price converted to major currency units.
    pub initial_price: f64,
    pub url: String,
}

#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<CatalogSnapshot>;
    fn name(&self) -> &'static str;
}
