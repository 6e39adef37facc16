//! Shared field metadata.
//!
//! A [`FieldMetadataCache`] remembers what the backend knows about each field
//! (its canonical name and type). Many queries resolve against the same cache
//! concurrently, so it sits behind a read/write lock and is shared as an
//! `Arc`.

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::context::{FieldResolver, QueryContext, Resolution};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Keyword,
    Number,
    Date,
    Boolean,
    GeoPoint,
    Nested,
    Object,
}

impl FieldType {
    /// Types whose subfields are addressed with dotted paths.
    pub fn has_properties(self) -> bool {
        matches!(self, FieldType::Nested | FieldType::Object)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
    /// Canonical spelling of the field.
    pub name: String,
    pub field_type: FieldType,
}

impl FieldMetadata {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        FieldMetadata {
            name: name.into(),
            field_type,
        }
    }
}

/// Thread-safe field metadata table, keyed case-insensitively.
#[derive(Debug, Default)]
pub struct FieldMetadataCache {
    fields: RwLock<HashMap<String, FieldMetadata>>,
}

impl FieldMetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, metadata: FieldMetadata) {
        let key = metadata.name.to_lowercase();
        self.fields.write().insert(key, metadata);
    }

    pub fn get(&self, field: &str) -> Option<FieldMetadata> {
        self.fields.read().get(&field.to_lowercase()).cloned()
    }

    pub fn remove(&self, field: &str) -> Option<FieldMetadata> {
        self.fields.write().remove(&field.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.fields.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.read().is_empty()
    }

    pub fn clear(&self) {
        self.fields.write().clear();
    }

    /// Canonical name for `field`.
    ///
    /// An exact (case-insensitive) match wins. Otherwise the longest known
    /// object or nested prefix is used and the rest of the path is kept as
    /// written, since subfields of dynamic objects are not all known.
    pub fn resolve(&self, field: &str) -> Option<String> {
        let fields = self.fields.read();
        if let Some(metadata) = fields.get(&field.to_lowercase()) {
            return Some(metadata.name.clone());
        }

        // Split on the original text; lowercasing can change byte lengths.
        let mut end = field.len();
        while let Some(index) = field[..end].rfind('.') {
            match fields.get(&field[..index].to_lowercase()) {
                Some(metadata) if metadata.field_type.has_properties() => {
                    trace!(%field, parent = %metadata.name, "resolved through parent object");
                    return Some(format!("{}{}", metadata.name, &field[index..]));
                }
                _ => end = index,
            }
        }
        None
    }

    /// Adapts the cache into a [`FieldResolver`] sharing the same table.
    pub fn resolver(self: &Arc<Self>) -> FieldResolver {
        let cache = Arc::clone(self);
        Arc::new(move |field: &str, _: &QueryContext| -> Resolution {
            cache.resolve(field).into()
        })
    }
}
