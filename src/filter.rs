//! List Filtering
//!
//! Search, switch-type filter and sort over a cache snapshot. Pending
//! placeholders are never filtered out and always trail the confirmed items.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::models::{Entry, InventoryItem, SwitchType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Server order, oldest first
    #[default]
    Oldest,
    Newest,
    NameAsc,
    NameDesc,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "oldest" => Ok(SortKey::Oldest),
            "newest" => Ok(SortKey::Newest),
            "name" | "name-asc" => Ok(SortKey::NameAsc),
            "name-desc" => Ok(SortKey::NameDesc),
            other => Err(format!("unknown sort key '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    /// Case-insensitive match on name or note text
    pub search: Option<String>,
    /// Only applies to switch entries
    pub switch_type: Option<SwitchType>,
    pub sort: SortKey,
}

impl ListQuery {
    fn matches(&self, item: &InventoryItem) -> bool {
        if let (Some(wanted), Some(actual)) = (self.switch_type, item.details.switch_type()) {
            if wanted != actual {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                item.name.to_lowercase().contains(&needle)
                    || item.notes.iter().any(|note| note.text.to_lowercase().contains(&needle))
            }
            _ => true,
        }
    }
}

fn by_name(a: &InventoryItem, b: &InventoryItem) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.id.as_str().cmp(b.id.as_str()))
}

/// Filtered, sorted view of `entries`
pub fn apply(entries: &[Entry], query: &ListQuery) -> Vec<Entry> {
    let mut confirmed: Vec<&InventoryItem> = entries
        .iter()
        .filter_map(Entry::as_confirmed)
        .filter(|item| query.matches(item))
        .collect();

    match query.sort {
        SortKey::Oldest => confirmed.sort_by_key(|item| item.created_at),
        SortKey::Newest => confirmed.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::NameAsc => confirmed.sort_by(|a, b| by_name(a, b)),
        SortKey::NameDesc => confirmed.sort_by(|a, b| by_name(b, a)),
    }

    confirmed
        .into_iter()
        .cloned()
        .map(Entry::Confirmed)
        .chain(entries.iter().filter(|e| e.is_loading()).cloned())
        .collect()
}
