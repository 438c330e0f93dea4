//! Form Validation
//!
//! Client-side checks run before a placeholder exists. Nothing here touches
//! the cache or the network.

use regex::Regex;
use std::sync::OnceLock;

use crate::config::ClientConfig;
use crate::error::ValidationError;
use crate::models::{ImageFile, ImageSource, InventoryItem, InventoryType, ItemDetails, NewItemForm};

/// Remote links need a host; `file://` is what local asset storage hands out
const IMAGE_URL_PATTERN: &str = r"(?i)^(https?://[^\s/?#]+|file://)[^\s?#]*\.(png|jpe?g|gif|webp|avif)(\?\S*)?$";
const COLOR_PATTERN: &str = r"^#[0-9a-fA-F]{6}$";

fn image_url_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(IMAGE_URL_PATTERN).ok()).as_ref()
}

fn color_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(COLOR_PATTERN).ok()).as_ref()
}

/// Validate an add-item form for the given collection
pub fn validate_form(form: &NewItemForm, kind: InventoryType, config: &ClientConfig) -> Result<(), ValidationError> {
    validate_name(&form.name, config)?;
    match &form.image {
        ImageSource::File(file) => validate_image_file(file, config)?,
        ImageSource::Url(url) => validate_image_url(url)?,
    }
    validate_details(&form.details, kind)
}

/// Validate a record about to be sent with an edit.
///
/// The stored image link is not re-checked; a replaced link is validated
/// where the patch is applied.
pub fn validate_item(item: &InventoryItem, kind: InventoryType, config: &ClientConfig) -> Result<(), ValidationError> {
    validate_name(&item.name, config)?;
    for note in &item.notes {
        validate_note_text(&note.text, config)?;
    }
    validate_details(&item.details, kind)
}

pub fn validate_name(name: &str, config: &ClientConfig) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing { field: "name" });
    }
    if trimmed.chars().count() > config.max_name_len {
        return Err(ValidationError::TooLong {
            field: "name",
            max: config.max_name_len,
        });
    }
    Ok(())
}

pub fn validate_image_url(url: &str) -> Result<(), ValidationError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ValidationError::Missing { field: "image" });
    }
    match image_url_regex() {
        Some(re) if re.is_match(url) => Ok(()),
        _ => Err(ValidationError::InvalidImageUrl(url.to_string())),
    }
}

/// Size is a client-detectable precondition; the asset host is never asked
pub fn validate_image_file(file: &ImageFile, config: &ClientConfig) -> Result<(), ValidationError> {
    if file.is_empty() {
        return Err(ValidationError::EmptyFile);
    }
    if file.len() > config.max_upload_bytes {
        return Err(ValidationError::FileTooLarge {
            size: file.len(),
            limit: config.max_upload_bytes,
        });
    }
    if file.content_type().type_() != mime_guess::mime::IMAGE {
        return Err(ValidationError::NotAnImage(file.file_name.clone()));
    }
    Ok(())
}

pub fn validate_note_text(text: &str, config: &ClientConfig) -> Result<(), ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing { field: "note" });
    }
    if trimmed.chars().count() > config.max_note_len {
        return Err(ValidationError::TooLong {
            field: "note",
            max: config.max_note_len,
        });
    }
    Ok(())
}

pub fn validate_details(details: &ItemDetails, kind: InventoryType) -> Result<(), ValidationError> {
    if details.inventory_type() != kind {
        return Err(ValidationError::WrongKind {
            expected: kind,
            actual: details.inventory_type(),
        });
    }

    match details {
        ItemDetails::Keycap(keycap) => {
            for color in &keycap.colors {
                let valid = color_regex().map(|re| re.is_match(color)).unwrap_or(false);
                if !valid {
                    return Err(ValidationError::InvalidColor(color.clone()));
                }
            }
            if keycap.kits.iter().any(|kit| kit.trim().is_empty()) {
                return Err(ValidationError::Missing { field: "kit name" });
            }
        }
        ItemDetails::Switch(switch) => {
            if switch.quantity == Some(0) {
                return Err(ValidationError::OutOfRange { field: "quantity" });
            }
            if let Some(weight) = switch.spring_weight {
                if !(1..=200).contains(&weight) {
                    return Err(ValidationError::OutOfRange { field: "spring weight" });
                }
            }
        }
        ItemDetails::Keyboard(keyboard) => {
            if keyboard.layout.trim().is_empty() {
                return Err(ValidationError::Missing { field: "layout" });
            }
        }
    }
    Ok(())
}
