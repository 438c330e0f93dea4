//! Temporary Record Inserter
//!
//! Validates the form and splices a pending placeholder into the cache
//! before anything touches the network.

use crate::config::ClientConfig;
use crate::error::ValidationError;
use crate::models::{NewItemForm, Placeholder, TempId, UserId};
use crate::store::{push_placeholder, CollectionCache};
use crate::validation::validate_form;

/// Insert a placeholder for `form`; nothing is inserted if validation fails
pub fn insert_placeholder(
    cache: &CollectionCache,
    config: &ClientConfig,
    user: &UserId,
    form: &NewItemForm,
) -> Result<TempId, ValidationError> {
    validate_form(form, cache.kind(), config)?;

    let temp_id = TempId::generate(config.temp_id_len);
    let placeholder = Placeholder::new(temp_id.clone(), user.clone(), form);
    cache.mutate(|entries| push_placeholder(entries, placeholder), false);

    tracing::debug!(kind = %cache.kind(), temp_id = %temp_id, name = %form.name.trim(), "Placeholder inserted");
    Ok(temp_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageFile, ImageSource, InventoryType};
    use crate::testing::{switch_form, MemoryPersistence};
    use std::sync::Arc;

    fn cache() -> CollectionCache {
        CollectionCache::new(
            InventoryType::Switches,
            UserId::from("user-1"),
            Arc::new(MemoryPersistence::default()),
        )
    }

    #[test]
    fn test_placeholder_visible_immediately() {
        let cache = cache();
        let temp_id = insert_placeholder(&cache, &ClientConfig::default(), cache.user(), &switch_form("Boba U4"))
            .expect("valid form");

        let entries = cache.read();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_loading());
        assert_eq!(entries[0].name(), "Boba U4");
        assert_eq!(entries[0].temp_id(), Some(&temp_id));
        assert!(temp_id.as_str().len() >= 21);
    }

    #[test]
    fn test_invalid_form_leaves_cache_untouched() {
        let cache = cache();
        let mut form = switch_form("Boba U4");
        form.image = ImageSource::File(ImageFile::new("u4.png", vec![0; 11]));
        let config = ClientConfig {
            max_upload_bytes: 10,
            ..ClientConfig::default()
        };

        let err = insert_placeholder(&cache, &config, cache.user(), &form).unwrap_err();
        assert_eq!(err, ValidationError::FileTooLarge { size: 11, limit: 10 });
        assert!(cache.read().is_empty());
    }

    #[test]
    fn test_concurrent_inserts_get_distinct_ids() {
        let cache = cache();
        let config = ClientConfig::default();
        let a = insert_placeholder(&cache, &config, cache.user(), &switch_form("Same")).unwrap();
        let b = insert_placeholder(&cache, &config, cache.user(), &switch_form("Same")).unwrap();

        assert_ne!(a, b);
        assert_eq!(cache.read().len(), 2);
    }
}
