//! Ordered feature schema shared by the form, the collector and the model
//!
//! The order of [`PATIENT_SCHEMA`] is the column order the classifier was
//! trained on and the column order of the exported report.

use crate::error::{PredictorError, Result};
use serde::Serialize;

/// Numeric kind of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Integer,
    Float,
}

/// Declaration of one input field
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldSpec {
    /// Column name expected by the model
    pub name: &'static str,
    /// Human readable label shown next to the control
    pub label: &'static str,
    pub kind: FieldKind,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub step: f64,
}

impl FieldSpec {
    const fn integer(name: &'static str, label: &'static str, min: f64, max: f64, default: f64) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Integer,
            min,
            max,
            default,
            step: 1.0,
        }
    }

    const fn float(name: &'static str, label: &'static str, min: f64, max: f64, default: f64) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Float,
            min,
            max,
            default,
            step: 0.01,
        }
    }

    /// Check a value against the field's bounds and kind
    pub fn check(&self, value: f64) -> Result<f64> {
        if !value.is_finite() || value < self.min || value > self.max {
            return Err(PredictorError::OutOfRange {
                field: self.name,
                value,
                min: self.min,
                max: self.max,
            });
        }
        if self.kind == FieldKind::Integer && value.fract() != 0.0 {
            return Err(PredictorError::NotAnInteger {
                field: self.name,
                value,
            });
        }
        Ok(value)
    }

    /// Format a value the way the form and sidebar show it
    pub fn display(&self, value: f64) -> String {
        match self.kind {
            FieldKind::Integer => format!("{}", value as i64),
            FieldKind::Float => format!("{:.2}", value),
        }
    }
}

pub const PREGNANCIES: &str = "Pregnancies";
pub const GLUCOSE: &str = "Glucose";
pub const BLOOD_PRESSURE: &str = "BloodPressure";
pub const SKIN_THICKNESS: &str = "SkinThickness";
pub const INSULIN: &str = "Insulin";
pub const BMI: &str = "BMI";
pub const DIABETES_PEDIGREE_FUNCTION: &str = "DiabetesPedigreeFunction";
pub const AGE: &str = "Age";

/// Number of model input features
pub const NUM_FEATURES: usize = 8;

/// Input fields in model column order
pub const PATIENT_SCHEMA: [FieldSpec; NUM_FEATURES] = [
    FieldSpec::integer(PREGNANCIES, "Pregnancies", 0.0, 20.0, 2.0),
    FieldSpec::integer(GLUCOSE, "Glucose Level (mg/dL)", 0.0, 300.0, 120.0),
    FieldSpec::integer(BLOOD_PRESSURE, "Blood Pressure (mm Hg)", 0.0, 200.0, 80.0),
    FieldSpec::integer(SKIN_THICKNESS, "Skin Thickness (mm)", 0.0, 100.0, 20.0),
    FieldSpec::integer(INSULIN, "Insulin Level (µU/mL)", 0.0, 900.0, 85.0),
    FieldSpec::float(BMI, "BMI (Body Mass Index)", 0.0, 70.0, 26.0),
    FieldSpec::float(DIABETES_PEDIGREE_FUNCTION, "Diabetes Pedigree Function", 0.0, 2.5, 0.5),
    FieldSpec::integer(AGE, "Age (years)", 1.0, 120.0, 33.0),
];

/// Look up a field by its column name
pub fn field(name: &str) -> Option<&'static FieldSpec> {
    PATIENT_SCHEMA.iter().find(|spec| spec.name == name)
}

/// Column names in model order
pub fn feature_names() -> [&'static str; NUM_FEATURES] {
    PATIENT_SCHEMA.map(|spec| spec.name)
}

/// Verify a model's declared feature names against the schema
pub fn validate_feature_names<S: AsRef<str>>(declared: &[S]) -> Result<()> {
    if declared.len() != NUM_FEATURES {
        return Err(PredictorError::InputMismatch(format!(
            "model declares {} features, schema has {}",
            declared.len(),
            NUM_FEATURES
        )));
    }
    for (position, (spec, name)) in PATIENT_SCHEMA.iter().zip(declared).enumerate() {
        if spec.name != name.as_ref() {
            return Err(PredictorError::InputMismatch(format!(
                "feature {} is '{}' in the model but '{}' in the schema",
                position,
                name.as_ref(),
                spec.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_order_matches_training_columns() {
        assert_eq!(
            feature_names(),
            [
                "Pregnancies",
                "Glucose",
                "BloodPressure",
                "SkinThickness",
                "Insulin",
                "BMI",
                "DiabetesPedigreeFunction",
                "Age"
            ]
        );
    }

    #[test]
    fn test_defaults_within_bounds() {
        for spec in PATIENT_SCHEMA.iter() {
            assert!(spec.check(spec.default).is_ok(), "{} default out of range", spec.name);
        }
    }

    #[test]
    fn test_check_rejects_out_of_range() {
        let age = field(AGE).unwrap();
        assert!(matches!(age.check(0.0), Err(PredictorError::OutOfRange { .. })));
        assert!(matches!(age.check(121.0), Err(PredictorError::OutOfRange { .. })));
        assert!(matches!(age.check(f64::NAN), Err(PredictorError::OutOfRange { .. })));
        assert!(age.check(1.0).is_ok());
        assert!(age.check(120.0).is_ok());
    }

    #[test]
    fn test_check_rejects_fractional_integer() {
        let glucose = field(GLUCOSE).unwrap();
        assert!(matches!(
            glucose.check(120.5),
            Err(PredictorError::NotAnInteger { .. })
        ));

        let bmi = field(BMI).unwrap();
        assert_eq!(bmi.check(26.75).unwrap(), 26.75);
    }

    #[test]
    fn test_validate_feature_names() {
        assert!(validate_feature_names(&feature_names()).is_ok());

        let mut swapped = feature_names();
        swapped.swap(0, 1);
        let err = validate_feature_names(&swapped).unwrap_err();
        assert_eq!(err.code(), "MODEL_INPUT_MISMATCH");

        let names = feature_names();
        assert!(validate_feature_names(&names[..7]).is_err());
    }

    #[test]
    fn test_display_by_kind() {
        assert_eq!(field(INSULIN).unwrap().display(85.0), "85");
        assert_eq!(field(BMI).unwrap().display(26.0), "26.00");
    }
}
