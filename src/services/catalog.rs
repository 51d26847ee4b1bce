//! CatalogStore: the current remote listing plus derived, filtered and
//! sorted views.
//!
//! The listing is held as an `Arc<Vec<FileEntry>>` behind a lock and is
//! swapped wholesale on refresh, so every reader sees either the old or the
//! new complete snapshot.

use std::cmp::Ordering;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::api::FileHostApi;
use crate::models::file::{FileEntry, TypeBucket};
use crate::services::notifier::{Notification, Notifier};

const KIB: f64 = 1024.0;

static SIZE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)([\d.]+)\s*(KB|MB|GB|B)?").ok());

/// Parse a display size such as `"12.4 MB"` into bytes.
///
/// Tolerant: an optional decimal value followed by an optional unit
/// (`B`, `KB`, `MB`, `GB`, case-insensitive, default `B`). Anything
/// unparsable yields 0.
pub fn parse_size(display: &str) -> u64 {
    let Some(re) = SIZE_PATTERN.as_ref() else {
        return 0;
    };
    let Some(caps) = re.captures(display) else {
        return 0;
    };
    let Some(value) = caps.get(1).and_then(|m| leading_decimal(m.as_str())) else {
        return 0;
    };
    let multiplier = match caps
        .get(2)
        .map(|m| m.as_str().to_ascii_uppercase())
        .as_deref()
    {
        Some("GB") => KIB * KIB * KIB,
        Some("MB") => KIB * KIB,
        Some("KB") => KIB,
        _ => 1.0,
    };
    (value * multiplier).round() as u64
}

/// Longest prefix of digits with at most one `.` that parses as a number.
/// `"1.2.3"` reads as `1.2`.
fn leading_decimal(text: &str) -> Option<f64> {
    let mut seen_dot = false;
    let end = text
        .char_indices()
        .find(|&(_, c)| {
            if c == '.' {
                if seen_dot {
                    return true;
                }
                seen_dot = true;
                return false;
            }
            !c.is_ascii_digit()
        })
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text[..end].parse::<f64>().ok()
}

/// Inclusive byte bounds; `None` leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeRange {
    pub min_bytes: Option<u64>,
    pub max_bytes: Option<u64>,
}

impl SizeRange {
    /// Bounds given in kilobytes, as typed into the filter panel. Fractions
    /// are allowed and rounded to whole bytes; negatives clamp to zero.
    pub fn from_kb(min_kb: Option<f64>, max_kb: Option<f64>) -> Self {
        Self {
            min_bytes: min_kb.map(kb_to_bytes),
            max_bytes: max_kb.map(kb_to_bytes),
        }
    }

    pub fn contains(&self, bytes: u64) -> bool {
        self.min_bytes.is_none_or(|min| bytes >= min) && self.max_bytes.is_none_or(|max| bytes <= max)
    }
}

fn kb_to_bytes(kb: f64) -> u64 {
    // `as` saturates and maps NaN to 0.
    (kb * 1024.0).round() as u64
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFilter {
    /// Case-insensitive substring of the name. Empty matches everything.
    pub search: String,
    /// `None` means all buckets.
    pub bucket: Option<TypeBucket>,
    pub size: SizeRange,
}

impl CatalogFilter {
    pub fn matches(&self, entry: &FileEntry) -> bool {
        if !self.search.is_empty()
            && !entry
                .name
                .to_lowercase()
                .contains(&self.search.to_lowercase())
        {
            return false;
        }
        if let Some(bucket) = self.bucket {
            if TypeBucket::from_name(&entry.name) != bucket {
                return false;
            }
        }
        if self.size != SizeRange::default() && !self.size.contains(parse_size(&entry.size_display))
        {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NameAsc,
    NameDesc,
    SizeAsc,
    SizeDesc,
}

/// Case-folded comparison first, raw code points to break case-only ties.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Filter and sort `entries` into a new vector. The input is untouched and
/// entries with equal sort keys keep their relative order.
pub fn apply_query(entries: &[FileEntry], filter: &CatalogFilter, sort: SortOrder) -> Vec<FileEntry> {
    let mut keyed: Vec<(u64, &FileEntry)> = entries
        .iter()
        .filter(|e| filter.matches(e))
        .map(|e| (parse_size(&e.size_display), e))
        .collect();

    // `sort_by` is stable.
    match sort {
        SortOrder::NameAsc => keyed.sort_by(|a, b| compare_names(&a.1.name, &b.1.name)),
        SortOrder::NameDesc => keyed.sort_by(|a, b| compare_names(&b.1.name, &a.1.name)),
        SortOrder::SizeAsc => keyed.sort_by(|a, b| a.0.cmp(&b.0)),
        SortOrder::SizeDesc => keyed.sort_by(|a, b| b.0.cmp(&a.0)),
    }

    keyed.into_iter().map(|(_, e)| e.clone()).collect()
}

pub struct CatalogStore<A: FileHostApi> {
    api: Arc<A>,
    notifier: Arc<dyn Notifier>,
    snapshot: RwLock<Arc<Vec<FileEntry>>>,
}

impl<A: FileHostApi> CatalogStore<A> {
    pub fn new(api: Arc<A>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            snapshot: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Fetch the full listing and swap it in. On failure the previous
    /// snapshot stays in place and the notifier is told. Returns whether
    /// the refresh succeeded.
    pub async fn refresh(&self) -> bool {
        match self.api.list_files().await {
            Ok(files) => {
                log::info!("Catalog refreshed: entries={}", files.len());
                *self.snapshot.write().await = Arc::new(files);
                true
            }
            Err(e) => {
                log::error!("Catalog refresh failed: error={}", e);
                self.notifier
                    .notify(Notification::error(format!("Failed to load files: {}", e)));
                false
            }
        }
    }

    /// Current complete snapshot.
    pub async fn snapshot(&self) -> Arc<Vec<FileEntry>> {
        self.snapshot.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<FileEntry> {
        self.snapshot().await.iter().find(|e| e.id == id).cloned()
    }

    pub async fn query(&self, filter: &CatalogFilter, sort: SortOrder) -> Vec<FileEntry> {
        let snapshot = self.snapshot().await;
        apply_query(&snapshot, filter, sort)
    }
}
