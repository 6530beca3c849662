// src/features/preprocessor.rs
use log::{debug, trace};
use std::collections::HashMap;

use crate::error::{RiskError, RiskResult};
use crate::features::encoding::CategoricalEncoding;
use crate::features::schema::{FeatureSchema, TARGET_COLUMN};
use crate::features::vector::FeatureVector;
use crate::models::patient::{PatientRecord, PATIENT_ID_FIELD};

/// Names of the raw fields the preprocessor treats specially.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldLayout {
    pub id_field: String,
    /// Identifiers and non-predictive fields that never reach the vector.
    pub dropped_fields: Vec<String>,
    /// Composite `"systolic/diastolic"` field.
    pub blood_pressure_field: String,
    pub systolic_slot: String,
    pub diastolic_slot: String,
    pub categorical_fields: Vec<String>,
}

impl Default for FieldLayout {
    fn default() -> Self {
        Self {
            id_field: PATIENT_ID_FIELD.to_string(),
            dropped_fields: vec![
                PATIENT_ID_FIELD.to_string(),
                "Country".to_string(),
                "Continent".to_string(),
                "Hemisphere".to_string(),
                TARGET_COLUMN.to_string(),
            ],
            blood_pressure_field: "Blood Pressure".to_string(),
            systolic_slot: "BP_Systolic".to_string(),
            diastolic_slot: "BP_Diastolic".to_string(),
            categorical_fields: vec!["Sex".to_string(), "Diet".to_string()],
        }
    }
}

/// Turns raw aggregated patient records into schema-aligned feature vectors.
///
/// Built for one schema; every `transform` call is handed the schema again and
/// refuses to run against a different version.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    layout: FieldLayout,
    schema_version: String,
    encodings: Vec<CategoricalEncoding>,
}

impl Preprocessor {
    pub fn new(layout: FieldLayout, schema: &FeatureSchema) -> Self {
        let encodings = layout
            .categorical_fields
            .iter()
            .map(|field| CategoricalEncoding::from_schema(field, schema))
            .collect();
        Self {
            layout,
            schema_version: schema.version().to_string(),
            encodings,
        }
    }

    pub fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    pub fn encodings(&self) -> &[CategoricalEncoding] {
        &self.encodings
    }

    pub fn patient_id(&self, record: &PatientRecord) -> String {
        record.patient_id(&self.layout.id_field)
    }

    /// Pure transform: record -> vector in exact schema order.
    ///
    /// Missing fields and untriggered one-hot slots are zero; fields the schema
    /// does not know are ignored. Only a present but unparseable blood pressure
    /// fails the row.
    pub fn transform(
        &self,
        record: &PatientRecord,
        schema: &FeatureSchema,
    ) -> RiskResult<FeatureVector> {
        if schema.version() != self.schema_version {
            return Err(RiskError::SchemaMismatch(format!(
                "preprocessor was built for schema {} but was handed schema {}",
                self.schema_version,
                schema.version()
            )));
        }

        if let Some(field) = record
            .undecodable_fields()
            .iter()
            .find(|f| !self.layout.dropped_fields.contains(*f))
        {
            return Err(RiskError::malformed(
                field,
                record.get(field).unwrap_or(""),
                "value is not valid UTF-8",
            ));
        }

        let mut values: HashMap<&str, f64> = HashMap::with_capacity(record.len() + 4);

        for (field, raw) in record.fields() {
            if self.is_special(field) {
                continue;
            }
            match parse_numeric(raw) {
                Some(v) => {
                    values.insert(field, v);
                }
                None => trace!(
                    "Field '{}' value {:?} is not numeric; treating as missing",
                    field,
                    raw
                ),
            }
        }

        if let Some(raw) = record.get_non_blank(&self.layout.blood_pressure_field) {
            let (systolic, diastolic) =
                parse_blood_pressure(&self.layout.blood_pressure_field, raw)?;
            values.insert(self.layout.systolic_slot.as_str(), systolic);
            values.insert(self.layout.diastolic_slot.as_str(), diastolic);
        }

        for encoding in &self.encodings {
            for (slot, v) in encoding.encode(record.get_non_blank(encoding.field())) {
                values.insert(slot, v);
            }
        }

        let ignored = values.keys().filter(|k| !schema.contains(k)).count();
        if ignored > 0 {
            debug!(
                "Ignoring {} field(s) not present in feature schema for {}",
                ignored,
                self.patient_id(record)
            );
        }

        let aligned: Vec<f64> = schema
            .features()
            .iter()
            .map(|name| values.get(name.as_str()).copied().unwrap_or(0.0))
            .collect();

        FeatureVector::new(schema, aligned)
    }

    fn is_special(&self, field: &str) -> bool {
        field == self.layout.blood_pressure_field
            || self.layout.dropped_fields.iter().any(|f| f == field)
            || self.layout.categorical_fields.iter().any(|f| f == field)
    }
}

fn parse_numeric(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Splits `"<int>/<int>"` into (systolic, diastolic).
pub fn parse_blood_pressure(field: &str, raw: &str) -> RiskResult<(f64, f64)> {
    let (sys, dia) = raw
        .split_once('/')
        .ok_or_else(|| RiskError::malformed(field, raw, "expected \"<int>/<int>\""))?;
    let systolic: u32 = sys
        .trim()
        .parse()
        .map_err(|_| RiskError::malformed(field, raw, "systolic part is not an integer"))?;
    let diastolic: u32 = dia
        .trim()
        .parse()
        .map_err(|_| RiskError::malformed(field, raw, "diastolic part is not an integer"))?;
    Ok((systolic as f64, diastolic as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FeatureSchema {
        FeatureSchema::new([
            "Age",
            "Cholesterol",
            "Heart Rate",
            "Sleep Hours Per Day",
            "Physical Activity Days Per Week",
            "Sex_Male",
            "Diet_Healthy",
            "Diet_Unhealthy",
            "BP_Systolic",
            "BP_Diastolic",
        ])
        .unwrap()
    }

    fn record(pairs: &[(&str, &str)]) -> PatientRecord {
        PatientRecord::from_pairs(1, pairs.iter().copied())
    }

    #[test]
    fn test_full_record_in_schema_order() {
        let schema = schema();
        let pre = Preprocessor::new(FieldLayout::default(), &schema);
        let rec = record(&[
            ("Patient ID", "P1"),
            ("Country", "Argentina"),
            ("Continent", "South America"),
            ("Hemisphere", "Southern Hemisphere"),
            ("Blood Pressure", "140/90"),
            ("Heart Rate", "80"),
            ("Sex", "Male"),
            ("Diet", "Unhealthy"),
            ("Age", "67"),
            ("Cholesterol", "208"),
            ("Sleep Hours Per Day", "6.5"),
            ("Physical Activity Days Per Week", "3"),
        ]);

        let vector = pre.transform(&rec, &schema).unwrap();
        assert_eq!(vector.len(), schema.len());
        assert_eq!(
            vector.values(),
            &[67.0, 208.0, 80.0, 6.5, 3.0, 1.0, 0.0, 1.0, 140.0, 90.0]
        );
        assert_eq!(vector.schema_version(), schema.version());
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let schema = schema();
        let pre = Preprocessor::new(FieldLayout::default(), &schema);
        let rec = record(&[("Patient ID", "P2"), ("Heart Rate", "72")]);

        let vector = pre.transform(&rec, &schema).unwrap();
        assert_eq!(
            vector.values(),
            &[0.0, 0.0, 72.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_unseen_category_gives_zero_slots() {
        let schema = schema();
        let pre = Preprocessor::new(FieldLayout::default(), &schema);
        let rec = record(&[
            ("Blood Pressure", "120/80"),
            ("Sex", "Intersex"),
            ("Diet", "Carnivore"),
        ]);

        let vector = pre.transform(&rec, &schema).unwrap();
        let sex_male = schema.position("Sex_Male").unwrap();
        let healthy = schema.position("Diet_Healthy").unwrap();
        let unhealthy = schema.position("Diet_Unhealthy").unwrap();
        assert_eq!(vector.values()[sex_male], 0.0);
        assert_eq!(vector.values()[healthy], 0.0);
        assert_eq!(vector.values()[unhealthy], 0.0);
        assert_eq!(vector.len(), schema.len());
    }

    #[test]
    fn test_extra_and_identifier_fields_ignored() {
        let schema = schema();
        let pre = Preprocessor::new(FieldLayout::default(), &schema);
        let rec = record(&[
            ("Patient ID", "12345"),
            ("Country", "1"),
            ("Income", "261404"),
            ("Heart Attack Risk", "1"),
            ("Age", "50"),
        ]);

        let vector = pre.transform(&rec, &schema).unwrap();
        assert_eq!(vector.values()[0], 50.0);
        assert_eq!(vector.values().iter().sum::<f64>(), 50.0);
    }

    #[test]
    fn test_non_numeric_values_treated_as_missing() {
        let schema = schema();
        let pre = Preprocessor::new(FieldLayout::default(), &schema);
        let rec = record(&[("Age", "unknown"), ("Cholesterol", "NaN"), ("Heart Rate", " 77 ")]);

        let vector = pre.transform(&rec, &schema).unwrap();
        assert_eq!(vector.values()[0], 0.0);
        assert_eq!(vector.values()[1], 0.0);
        assert_eq!(vector.values()[2], 77.0);
    }

    #[test]
    fn test_malformed_blood_pressure() {
        let schema = schema();
        let pre = Preprocessor::new(FieldLayout::default(), &schema);
        for bad in ["abc", "140", "140/", "/90", "140/abc", "140.5/90", "140/90/60"] {
            let rec = record(&[("Patient ID", "P3"), ("Blood Pressure", bad)]);
            let err = pre.transform(&rec, &schema).unwrap_err();
            assert!(
                matches!(err, RiskError::MalformedField { ref field, .. } if field == "Blood Pressure"),
                "expected MalformedField for {:?}, got {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_blank_blood_pressure_is_missing() {
        let schema = schema();
        let pre = Preprocessor::new(FieldLayout::default(), &schema);
        let rec = record(&[("Blood Pressure", "  "), ("Age", "40")]);
        let vector = pre.transform(&rec, &schema).unwrap();
        let sys = schema.position("BP_Systolic").unwrap();
        assert_eq!(vector.values()[sys], 0.0);
    }

    #[test]
    fn test_undecodable_field_is_malformed() {
        let schema = schema();
        let pre = Preprocessor::new(FieldLayout::default(), &schema);
        let rec = record(&[("Patient ID", "P2"), ("Heart Rate", "\u{fffd}\u{fffd}")])
            .with_undecodable(vec!["Heart Rate".to_string()]);
        assert!(matches!(
            pre.transform(&rec, &schema),
            Err(RiskError::MalformedField { ref field, .. }) if field == "Heart Rate"
        ));

        let dropped = record(&[("Country", "\u{fffd}"), ("Age", "40")])
            .with_undecodable(vec!["Country".to_string()]);
        assert!(pre.transform(&dropped, &schema).is_ok());
    }

    #[test]
    fn test_blood_pressure_with_spaces() {
        assert_eq!(
            parse_blood_pressure("Blood Pressure", " 158 / 88 ").unwrap(),
            (158.0, 88.0)
        );
    }

    #[test]
    fn test_transform_rejects_other_schema() {
        let schema = schema();
        let pre = Preprocessor::new(FieldLayout::default(), &schema);
        let other = FeatureSchema::new(["Age", "Cholesterol"]).unwrap();
        let rec = record(&[("Age", "40")]);
        assert!(matches!(
            pre.transform(&rec, &other),
            Err(RiskError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_split_blood_pressure_overrides_raw_slot_columns() {
        let schema = schema();
        let pre = Preprocessor::new(FieldLayout::default(), &schema);
        let rec = record(&[("BP_Systolic", "999"), ("Blood Pressure", "130/85")]);
        let vector = pre.transform(&rec, &schema).unwrap();
        let sys = schema.position("BP_Systolic").unwrap();
        let dia = schema.position("BP_Diastolic").unwrap();
        assert_eq!(vector.values()[sys], 130.0);
        assert_eq!(vector.values()[dia], 85.0);
    }
}
