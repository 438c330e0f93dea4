//! Inventory Models
//!
//! Records as the persistence service returns them, the forms that create
//! them, and the placeholder shape that only ever lives in the client cache.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub use crate::ids::{ItemId, NoteId, TempId, UserId};

// ========================
// Inventory Types
// ========================

/// The three kinds of collection a user keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryType {
    Keycaps,
    Switches,
    Keyboards,
}

impl InventoryType {
    pub const ALL: [InventoryType; 3] = [
        InventoryType::Keycaps,
        InventoryType::Switches,
        InventoryType::Keyboards,
    ];

    /// Collection name on the persistence service
    pub fn collection(&self) -> &'static str {
        match self {
            InventoryType::Keycaps => "keycaps",
            InventoryType::Switches => "switches",
            InventoryType::Keyboards => "keyboards",
        }
    }

    /// Category tag for uploaded images
    pub fn asset_folder(&self) -> &'static str {
        match self {
            InventoryType::Keycaps => "hobb-keycaps",
            InventoryType::Switches => "hobb-switches",
            InventoryType::Keyboards => "hobb-keyboards",
        }
    }
}

impl std::fmt::Display for InventoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.collection())
    }
}

impl FromStr for InventoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keycaps" | "keycap" => Ok(InventoryType::Keycaps),
            "switches" | "switch" => Ok(InventoryType::Switches),
            "keyboards" | "keyboard" => Ok(InventoryType::Keyboards),
            other => Err(format!("unknown inventory type '{}'", other)),
        }
    }
}

/// Switch actuation feel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchType {
    Linear,
    Tactile,
    Clicky,
    Silent,
}

impl SwitchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwitchType::Linear => "linear",
            SwitchType::Tactile => "tactile",
            SwitchType::Clicky => "clicky",
            SwitchType::Silent => "silent",
        }
    }
}

impl std::fmt::Display for SwitchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwitchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(SwitchType::Linear),
            "tactile" => Ok(SwitchType::Tactile),
            "clicky" => Ok(SwitchType::Clicky),
            "silent" => Ok(SwitchType::Silent),
            other => Err(format!("unknown switch type '{}'", other)),
        }
    }
}

// ========================
// Records
// ========================

/// Free-text note attached to an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeycapDetails {
    pub manufacturer: Option<String>,
    /// Sculpt profile, e.g. Cherry, SA, MT3
    pub profile: Option<String>,
    pub material: Option<String>,
    /// Hex colors, `#RRGGBB`
    pub colors: Vec<String>,
    /// Kits owned from the set (base, novelties, ...)
    pub kits: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchDetails {
    pub switch_type: SwitchType,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
    /// Bottom-out force in grams
    #[serde(default)]
    pub spring_weight: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyboardDetails {
    pub designer: Option<String>,
    /// e.g. 60%, 65%, TKL
    pub layout: String,
    pub case_material: Option<String>,
    pub plate: Option<String>,
    pub switches: Option<String>,
    pub keycaps: Option<String>,
    pub built_on: Option<NaiveDate>,
}

/// Variant-specific fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ItemDetails {
    Keycap(KeycapDetails),
    Switch(SwitchDetails),
    Keyboard(KeyboardDetails),
}

impl ItemDetails {
    pub fn inventory_type(&self) -> InventoryType {
        match self {
            ItemDetails::Keycap(_) => InventoryType::Keycaps,
            ItemDetails::Switch(_) => InventoryType::Switches,
            ItemDetails::Keyboard(_) => InventoryType::Keyboards,
        }
    }

    pub fn switch_type(&self) -> Option<SwitchType> {
        match self {
            ItemDetails::Switch(details) => Some(details.switch_type),
            _ => None,
        }
    }
}

/// Server-confirmed inventory record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    #[serde(rename = "_id")]
    pub id: ItemId,
    pub user_id: UserId,
    pub name: String,
    /// Resolved asset URL
    pub image: String,
    #[serde(default)]
    pub notes: Vec<Note>,
    pub details: ItemDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create payload: the record before the server assigns an id
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    pub user_id: UserId,
    pub name: String,
    pub image: String,
    pub notes: Vec<Note>,
    pub details: ItemDetails,
}

// ========================
// Forms
// ========================

/// Image picked from disk
#[derive(Clone, PartialEq)]
pub struct ImageFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn content_type(&self) -> mime_guess::Mime {
        mime_guess::from_path(&self.file_name).first_or_octet_stream()
    }
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Where the item's image comes from
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Uploaded to the asset host before the record is created
    File(ImageFile),
    /// Used as-is
    Url(String),
}

/// Add-item form as submitted
#[derive(Debug, Clone, PartialEq)]
pub struct NewItemForm {
    pub name: String,
    pub image: ImageSource,
    pub details: ItemDetails,
}

/// Edit-mode changes; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub image: Option<String>,
    pub details: Option<ItemDetails>,
}

impl ItemPatch {
    pub fn apply(self, item: &InventoryItem) -> InventoryItem {
        InventoryItem {
            name: self.name.unwrap_or_else(|| item.name.clone()),
            image: self.image.unwrap_or_else(|| item.image.clone()),
            details: self.details.unwrap_or_else(|| item.details.clone()),
            ..item.clone()
        }
    }
}

// ========================
// Cache Entries
// ========================

/// Provisional record shown while an add is in flight
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placeholder {
    #[serde(rename = "_id")]
    pub temp_id: TempId,
    pub user_id: UserId,
    pub name: String,
    /// Direct image URL, when the form gave one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub details: ItemDetails,
    pub submitted_at: DateTime<Utc>,
    is_loading: bool,
}

impl Placeholder {
    pub fn new(temp_id: TempId, user_id: UserId, form: &NewItemForm) -> Self {
        let image = match &form.image {
            ImageSource::Url(url) => Some(url.clone()),
            ImageSource::File(_) => None,
        };
        Self {
            temp_id,
            user_id,
            name: form.name.trim().to_string(),
            image,
            details: form.details.clone(),
            submitted_at: Utc::now(),
            is_loading: true,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }
}

/// One row of the client collection cache
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Entry {
    Pending(Placeholder),
    Confirmed(InventoryItem),
}

impl Entry {
    pub fn is_loading(&self) -> bool {
        match self {
            Entry::Pending(p) => p.is_loading(),
            Entry::Confirmed(_) => false,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entry::Pending(p) => &p.name,
            Entry::Confirmed(item) => &item.name,
        }
    }

    pub fn details(&self) -> &ItemDetails {
        match self {
            Entry::Pending(p) => &p.details,
            Entry::Confirmed(item) => &item.details,
        }
    }

    pub fn temp_id(&self) -> Option<&TempId> {
        match self {
            Entry::Pending(p) => Some(&p.temp_id),
            Entry::Confirmed(_) => None,
        }
    }

    pub fn item_id(&self) -> Option<&ItemId> {
        match self {
            Entry::Pending(_) => None,
            Entry::Confirmed(item) => Some(&item.id),
        }
    }

    pub fn as_confirmed(&self) -> Option<&InventoryItem> {
        match self {
            Entry::Pending(_) => None,
            Entry::Confirmed(item) => Some(item),
        }
    }
}
