// src/features/mod.rs
pub mod encoding;
pub mod preprocessor;
pub mod schema;
pub mod vector;

pub use encoding::CategoricalEncoding;
pub use preprocessor::{parse_blood_pressure, FieldLayout, Preprocessor};
pub use schema::{FeatureSchema, TARGET_COLUMN};
pub use vector::FeatureVector;
