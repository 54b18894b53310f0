//! Core data models for the predictor

use crate::error::{PredictorError, Result};
use crate::schema::{FieldSpec, NUM_FEATURES, PATIENT_SCHEMA};
use serde::{Deserialize, Serialize};

/// Tolerance for probability vectors that should sum to one
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// The eight patient metrics fed to the classifier
///
/// Fields are private: a record never changes after it is built, and
/// [`PatientRecord::with_value`] hands back a new record instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(rename = "Pregnancies")]
    pregnancies: u32,
    #[serde(rename = "Glucose")]
    glucose: u32,
    #[serde(rename = "BloodPressure")]
    blood_pressure: u32,
    #[serde(rename = "SkinThickness")]
    skin_thickness: u32,
    #[serde(rename = "Insulin")]
    insulin: u32,
    #[serde(rename = "BMI")]
    bmi: f64,
    #[serde(rename = "DiabetesPedigreeFunction")]
    diabetes_pedigree_function: f64,
    #[serde(rename = "Age")]
    age: u32,
}

impl Default for PatientRecord {
    /// Every field at its schema default
    fn default() -> Self {
        Self::from_values(PATIENT_SCHEMA.map(|spec| spec.default))
    }
}

impl PatientRecord {
    /// Build a record from a name/value mapping such as a form post
    ///
    /// Unknown, duplicated or missing names are a contract break between the
    /// caller and the model and fail with `InputMismatch`.
    pub fn from_named_values<I, K>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut slots: [Option<f64>; NUM_FEATURES] = [None; NUM_FEATURES];

        for (name, value) in pairs {
            let name = name.as_ref();
            let index = PATIENT_SCHEMA
                .iter()
                .position(|spec| spec.name == name)
                .ok_or_else(|| PredictorError::InputMismatch(format!("unknown field '{}'", name)))?;
            if slots[index].is_some() {
                return Err(PredictorError::InputMismatch(format!(
                    "field '{}' given more than once",
                    name
                )));
            }
            slots[index] = Some(PATIENT_SCHEMA[index].check(value)?);
        }

        let mut values = [0.0; NUM_FEATURES];
        for (index, slot) in slots.iter().enumerate() {
            values[index] = slot.ok_or_else(|| {
                PredictorError::InputMismatch(format!(
                    "missing field '{}'",
                    PATIENT_SCHEMA[index].name
                ))
            })?;
        }

        Ok(Self::from_values(values))
    }

    /// Return a copy with one field replaced
    pub fn with_value(&self, name: &str, value: f64) -> Result<Self> {
        let index = PATIENT_SCHEMA
            .iter()
            .position(|spec| spec.name == name)
            .ok_or_else(|| PredictorError::InputMismatch(format!("unknown field '{}'", name)))?;
        let mut values = self.values();
        values[index] = PATIENT_SCHEMA[index].check(value)?;
        Ok(Self::from_values(values))
    }

    /// Values must already be checked against the schema
    fn from_values(values: [f64; NUM_FEATURES]) -> Self {
        Self {
            pregnancies: values[0] as u32,
            glucose: values[1] as u32,
            blood_pressure: values[2] as u32,
            skin_thickness: values[3] as u32,
            insulin: values[4] as u32,
            bmi: values[5],
            diabetes_pedigree_function: values[6],
            age: values[7] as u32,
        }
    }

    /// Field values in schema order
    pub fn values(&self) -> [f64; NUM_FEATURES] {
        [
            self.pregnancies as f64,
            self.glucose as f64,
            self.blood_pressure as f64,
            self.skin_thickness as f64,
            self.insulin as f64,
            self.bmi,
            self.diabetes_pedigree_function,
            self.age as f64,
        ]
    }

    /// Look up a value by column name
    pub fn get(&self, name: &str) -> Option<f64> {
        PATIENT_SCHEMA
            .iter()
            .position(|spec| spec.name == name)
            .map(|index| self.values()[index])
    }

    /// Ordered (name, value) row handed to the classifier
    pub fn to_feature_row(&self) -> FeatureRow {
        FeatureRow::new(
            PATIENT_SCHEMA
                .iter()
                .zip(self.values())
                .map(|(spec, value)| (spec.name.to_string(), value))
                .collect(),
        )
    }

    /// (label, formatted value) pairs for the patient summary
    pub fn summary(&self) -> Vec<(&'static FieldSpec, String)> {
        PATIENT_SCHEMA
            .iter()
            .zip(self.values())
            .map(|(spec, value)| (spec, spec.display(value)))
            .collect()
    }

    pub fn pregnancies(&self) -> u32 {
        self.pregnancies
    }

    pub fn glucose(&self) -> u32 {
        self.glucose
    }

    pub fn blood_pressure(&self) -> u32 {
        self.blood_pressure
    }

    pub fn skin_thickness(&self) -> u32 {
        self.skin_thickness
    }

    pub fn insulin(&self) -> u32 {
        self.insulin
    }

    pub fn bmi(&self) -> f64 {
        self.bmi
    }

    pub fn diabetes_pedigree_function(&self) -> f64 {
        self.diabetes_pedigree_function
    }

    pub fn age(&self) -> u32 {
        self.age
    }
}

/// Named feature columns in the order they are presented to a model
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    columns: Vec<(String, f64)>,
}

impl FeatureRow {
    pub fn new(columns: Vec<(String, f64)>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Values as the f32 tensor data models consume
    pub fn to_f32(&self) -> Vec<f32> {
        self.columns.iter().map(|(_, value)| *value as f32).collect()
    }
}

/// Binary classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "No Diabetes")]
    NoDiabetes,
    #[serde(rename = "Diabetes")]
    Diabetes,
}

impl Outcome {
    /// Class index as used by the model
    pub fn label(&self) -> usize {
        match self {
            Outcome::NoDiabetes => 0,
            Outcome::Diabetes => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::NoDiabetes => "No Diabetes",
            Outcome::Diabetes => "Diabetes",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one classification call
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    pub outcome: Outcome,
    /// Probability per class, indexed by [`Outcome::label`]
    pub probabilities: [f64; 2],
}

impl PredictionResult {
    /// Build a result from raw class probabilities
    ///
    /// Entries must be finite and non-negative; the vector is rescaled to sum
    /// to one. The predicted class is the argmax, ties going to class 0.
    pub fn from_probabilities(raw: [f64; 2]) -> Result<Self> {
        if raw.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(PredictorError::Inference(format!(
                "invalid class probabilities {:?}",
                raw
            )));
        }
        let total = raw[0] + raw[1];
        if total <= 0.0 {
            return Err(PredictorError::Inference(format!(
                "class probabilities sum to {}",
                total
            )));
        }
        let probabilities = [raw[0] / total, raw[1] / total];
        let outcome = if probabilities[1] > probabilities[0] {
            Outcome::Diabetes
        } else {
            Outcome::NoDiabetes
        };
        Ok(Self {
            outcome,
            probabilities,
        })
    }

    /// Probability the model assigns to its own prediction
    pub fn confidence(&self) -> f64 {
        self.probabilities[self.outcome.label()]
    }

    /// Confidence as a percentage rounded to two decimals
    pub fn confidence_percent(&self) -> f64 {
        round2(self.confidence() * 100.0)
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
