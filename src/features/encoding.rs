// src/features/encoding.rs
use log::debug;

use crate::features::schema::FeatureSchema;

/// One-hot layout for a single categorical field.
///
/// Training produced dummy columns named `<Field>_<Category>` (with the
/// reference category dropped), so the slots for a field are recovered from
/// the schema itself. Matching is case-insensitive on the category suffix.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalEncoding {
    field: String,
    /// (lowercased category, schema slot name)
    slots: Vec<(String, String)>,
}

impl CategoricalEncoding {
    pub fn from_schema(field: &str, schema: &FeatureSchema) -> Self {
        let prefix = format!("{}_", field);
        let slots: Vec<(String, String)> = schema
            .features()
            .iter()
            .filter_map(|name| {
                name.strip_prefix(&prefix)
                    .filter(|category| !category.is_empty())
                    .map(|category| (category.to_lowercase(), name.clone()))
            })
            .collect();

        if slots.is_empty() {
            debug!(
                "Categorical field '{}' has no one-hot slots in the feature schema",
                field
            );
        }

        Self {
            field: field.to_string(),
            slots,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn slot_names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|(_, slot)| slot.as_str())
    }

    /// `(slot, 0.0 | 1.0)` for every slot of this field. Unseen or missing
    /// values leave every slot at zero.
    pub fn encode(&self, value: Option<&str>) -> Vec<(&str, f64)> {
        let normalized = value.map(|v| v.trim().to_lowercase());
        self.slots
            .iter()
            .map(|(category, slot)| {
                let hit = normalized.as_deref() == Some(category.as_str());
                (slot.as_str(), if hit { 1.0 } else { 0.0 })
            })
            .collect()
    }
}
