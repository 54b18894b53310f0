//! Turns a classification into what the user sees
//!
//! A [`Verdict`] is one of two variants, each carrying its confidence and its
//! fixed advice list. The chart always shows both class probabilities.

mod chart;

pub use chart::{PieChart, PieSlice, NO_DIABETES_COLOR, DIABETES_COLOR};

use crate::models::{round2, Outcome, PatientRecord, PredictionResult};
use serde::{Deserialize, Serialize};

/// Fixed health advice shown with a verdict
#[derive(Debug, PartialEq, Eq)]
pub struct Advice {
    pub title: &'static str,
    pub tips: [&'static str; 5],
}

pub const DIABETES_ADVICE: Advice = Advice {
    title: "Health Tips for Managing Diabetes",
    tips: [
        "Eat healthy: focus on vegetables, fruits & whole grains.",
        "Exercise daily: try brisk walking or yoga for 30 minutes.",
        "Stay hydrated and avoid sugary drinks.",
        "Monitor blood sugar and take medicines regularly.",
        "Avoid smoking & limit alcohol.",
    ],
};

pub const WELLNESS_ADVICE: Advice = Advice {
    title: "Tips to Stay Healthy",
    tips: [
        "Maintain a balanced diet with enough fiber.",
        "Stay active: walk, jog, or do light exercises.",
        "Drink plenty of water.",
        "Go for routine checkups.",
        "Sleep well & manage stress.",
    ],
};

/// Visual state of the result panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Success,
}

/// Presented outcome of one prediction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    NoDiabetes {
        confidence: f64,
        advice: &'static Advice,
    },
    Diabetes {
        confidence: f64,
        advice: &'static Advice,
    },
}

impl Verdict {
    pub fn from_result(result: &PredictionResult) -> Self {
        let confidence = result.confidence();
        match result.outcome {
            Outcome::NoDiabetes => Verdict::NoDiabetes {
                confidence,
                advice: &WELLNESS_ADVICE,
            },
            Outcome::Diabetes => Verdict::Diabetes {
                confidence,
                advice: &DIABETES_ADVICE,
            },
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            Verdict::NoDiabetes { .. } => Outcome::NoDiabetes,
            Verdict::Diabetes { .. } => Outcome::Diabetes,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Verdict::NoDiabetes { .. } => Severity::Success,
            Verdict::Diabetes { .. } => Severity::Warning,
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Verdict::NoDiabetes { .. } => "The patient is not likely to have diabetes.",
            Verdict::Diabetes { .. } => "The patient is likely to have diabetes.",
        }
    }

    pub fn advice(&self) -> &'static Advice {
        match self {
            Verdict::NoDiabetes { advice, .. } | Verdict::Diabetes { advice, .. } => advice,
        }
    }

    /// Confidence as displayed: percent, two decimals
    pub fn confidence_percent(&self) -> f64 {
        match self {
            Verdict::NoDiabetes { confidence, .. } | Verdict::Diabetes { confidence, .. } => {
                round2(confidence * 100.0)
            }
        }
    }
}

/// Wire form of a rendered prediction, shared by the JSON API and the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub label: usize,
    pub prediction: Outcome,
    pub probabilities: [f64; 2],
    pub confidence_percent: f64,
    pub severity: Severity,
    pub headline: String,
    pub advice_title: String,
    pub tips: Vec<String>,
    pub record: PatientRecord,
}

impl PredictionResponse {
    pub fn new(record: PatientRecord, result: &PredictionResult) -> Self {
        let verdict = Verdict::from_result(result);
        let advice = verdict.advice();
        Self {
            label: result.outcome.label(),
            prediction: result.outcome,
            probabilities: result.probabilities,
            confidence_percent: verdict.confidence_percent(),
            severity: verdict.severity(),
            headline: verdict.headline().to_string(),
            advice_title: advice.title.to_string(),
            tips: advice.tips.iter().map(|tip| tip.to_string()).collect(),
            record,
        }
    }
}
