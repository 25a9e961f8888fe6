// src/catalog/denylist.rs
//! Known free-to-play titles that show up in the specials section with a
//! nominal -100% tag even though they never cost anything. Kept as an
//! injectable config list (TOML or JSON) with a built-in seed fallback.

use anyhow::{anyhow, Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_PATH: &str = "PROMO_DENYLIST_PATH";

#[derive(Debug, Clone, Default)]
pub struct Denylist {
    ids: BTreeSet<String>,
}

impl Denylist {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, app_id: &str) -> bool {
        self.ids.contains(app_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Built-in seed with the well-known permanently-free titles.
    /// Used as fallback if no config is found.
    pub fn default_seed() -> Self {
        Self::from_ids([
            "730", "440", "570", "238960", "386360", "444090", "578080", "1222670", "359550",
            "252490",
        ])
    }

    /// Load the denylist from an explicit path. Supports TOML (`ids = [...]`)
    /// or a bare JSON array of ids.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading denylist from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        parse_denylist(&content, ext.as_str()).map(Self::from_ids)
    }

    /// Resolve the denylist at startup:
    /// 1) explicit path (usually from $PROMO_DENYLIST_PATH)
    /// 2) config/denylist.toml
    /// 3) config/denylist.json
    /// 4) built-in seed
    ///
    /// Any read/parse failure logs a warning and falls back to the seed;
    /// startup never fails on a bad denylist file.
    pub fn load(path_override: Option<&Path>) -> Self {
        let candidates: Vec<PathBuf> = match path_override {
            Some(p) => vec![p.to_path_buf()],
            None => vec![
                PathBuf::from("config/denylist.toml"),
                PathBuf::from("config/denylist.json"),
            ],
        };

        for p in candidates {
            if !p.exists() {
                continue;
            }
            match Self::load_from(&p) {
                Ok(dl) => {
                    tracing::info!(path = %p.display(), ids = dl.len(), "denylist loaded");
                    return dl;
                }
                Err(e) => {
                    tracing::warn!(error = ?e, path = %p.display(), "denylist unreadable, using seed");
                    return Self::default_seed();
                }
            }
        }
        Self::default_seed()
    }
}

fn parse_denylist(s: &str, hint_ext: &str) -> Result<Vec<String>> {
    let try_toml = hint_ext == "toml" || s.contains("ids");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported denylist format"))
}

fn parse_toml(s: &str) -> Result<Vec<String>> {
    #[derive(serde::Deserialize)]
    struct TomlDl {
        ids: Vec<IdEntry>,
    }
    let v: TomlDl = toml::from_str(s)?;
    Ok(clean_list(v.ids))
}

fn parse_json(s: &str) -> Result<Vec<String>> {
    let v: Vec<IdEntry> = serde_json::from_str(s)?;
    Ok(clean_list(v))
}

/// Ids may be written as strings or bare numbers.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum IdEntry {
    Num(u64),
    Str(String),
}

fn clean_list(items: Vec<IdEntry>) -> Vec<String> {
    let mut set = BTreeSet::new();
    for it in items {
        let s = match it {
            IdEntry::Num(n) => n.to_string(),
            IdEntry::Str(s) => s.trim().to_string(),
        };
        if !s.is_empty() {
            set.insert(s);
        }
    }
    set.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_covers_the_known_free_to_play_titles() {
        let dl = Denylist::default_seed();
        assert!(dl.contains("730"));
        assert!(dl.contains("570"));
        assert!(!dl.contains("999999"));
        assert_eq!(dl.len(), 10);
    }

    #[test]
    fn dedup_trim_and_formats_work() {
        let toml = r#"ids = [" 730 ", "", "440", "440"]"#;
        let json = r#"[570, "  730  ", ""]"#;
        let toml_out = parse_toml(toml).unwrap();
        assert_eq!(toml_out, vec!["440".to_string(), "730".to_string()]);
        let json_out = parse_json(json).unwrap();
        assert_eq!(json_out, vec!["570".to_string(), "730".to_string()]);
    }

    #[test]
    fn garbage_input_is_rejected() {
        assert!(parse_denylist("not a list at all", "txt").is_err());
    }

    #[test]
    fn load_from_reads_both_formats() {
        let dir = tempfile::tempdir().unwrap();

        let p_toml = dir.path().join("denylist.toml");
        fs::write(&p_toml, r#"ids = ["730", "440"]"#).unwrap();
        let dl = Denylist::load_from(&p_toml).unwrap();
        assert!(dl.contains("730") && dl.contains("440"));

        let p_json = dir.path().join("denylist.json");
        fs::write(&p_json, r#"["570"]"#).unwrap();
        let dl = Denylist::load_from(&p_json).unwrap();
        assert!(dl.contains("570"));
        assert_eq!(dl.len(), 1);
    }

    #[test]
    fn load_falls_back_to_seed_when_file_is_bad() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("denylist.toml");
        fs::write(&p, "][ totally broken").unwrap();
        let dl = Denylist::load(Some(&p));
        assert_eq!(dl.len(), Denylist::default_seed().len());
    }

    #[test]
    fn load_with_missing_override_uses_seed() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("does-not-exist.toml");
        let dl = Denylist::load(Some(&p));
        assert!(dl.contains("730"));
    }
}
