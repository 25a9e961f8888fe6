// src/catalog/mod.rs
pub mod denylist;
pub mod providers;
pub mod types;

use crate::catalog::denylist::Denylist;
use crate::catalog::types::{CatalogSnapshot, PromotionCandidate};

pub const STORE_PAGE_BASE: &str = "https://store.steampowered.com/app";

/// Minimum original price (minor units) for a promotion to count as genuine.
/// Anything at or below one major unit is nominally-priced noise.
pub const MIN_ORIGINAL_PRICE: u64 = 100;

/// Normalize a display name coming from the feed: decode HTML entities,
/// strip stray tags, collapse whitespace, trim.
pub fn normalize_name(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// Turn a raw feed snapshot into the ordered list of genuine free-promotion
/// candidates. Pure: the ledger is consulted only through `already_notified`.
///
/// An entry qualifies iff all of:
/// - discount is exactly -100% (deep discounts like -95% never qualify),
/// - final price is zero,
/// - original price is above [`MIN_ORIGINAL_PRICE`],
/// - it carries a non-empty id,
/// - it has not been announced before,
/// - it is not a known free-to-play title from the denylist.
pub fn filter_candidates<F>(
    snapshot: &CatalogSnapshot,
    already_notified: F,
    denylist: &Denylist,
) -> Vec<PromotionCandidate>
where
    F: Fn(&str) -> bool,
{
    let Some(specials) = &snapshot.specials else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for entry in &specials.items {
        if entry.discount_percent != 100 || entry.final_price != 0 {
            continue;
        }
        if entry.original_price <= MIN_ORIGINAL_PRICE {
            continue;
        }
        let Some(app_id) = entry.id.as_deref().filter(|s| !s.is_empty()) else {
            continue;
        };
        if already_notified(app_id) {
            continue;
        }
        if denylist.contains(app_id) {
            tracing::info!(app_id, "free-to-play title excluded");
            continue;
        }

        let name = match entry.name.as_deref().map(normalize_name) {
            Some(n) if !n.is_empty() => n,
            _ => format!("Game {app_id}"),
        };

        out.push(PromotionCandidate {
            app_id: app_id.to_string(),
            name,
            initial_price: entry.original_price as f64 / 100.0,
            url: format!("{STORE_PAGE_BASE}/{app_id}/"),
        });
    }
    out
}
