//! Oracle response schema and sample validation
//!
//! The oracle answers with untyped JSON. Everything crossing that boundary goes
//! through [`validate_sample`] before it is treated as a [`Sample`].

use crate::error::AnalysisError;
use crate::models::Sample;
use crate::Result;
use serde_json::{json, Value};

const REQUIRED_FIELDS: &[&str] = &[
    "overallScore",
    "verdict",
    "brutalHonesty",
    "detectedKey",
    "careerDecision",
    "identifiedArtist",
    "metrics",
    "musicalTheoryAnalysis",
    "productionAnalysis",
    "strengths",
    "industryViability",
    "redirectionAdvice",
    "recommendedPath",
];

const ARTIST_FIELDS: &[&str] = &["name", "confidence", "isOriginal", "signatureReasoning", "notes"];
const METRIC_FIELDS: &[&str] = &["label", "score", "description"];
const THEORY_FIELDS: &[&str] = &["pitch", "timing", "timbre", "tonalConsistency"];
const PRODUCTION_FIELDS: &[&str] = &["mixing", "levelization", "processing"];

/// Structured-output schema sent with every oracle request
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "overallScore": { "type": "NUMBER" },
            "verdict": { "type": "STRING" },
            "brutalHonesty": { "type": "STRING" },
            "detectedKey": { "type": "STRING" },
            "careerDecision": {
                "type": "STRING",
                "description": "Must be one of: PROCEED, TRAIN, PIVOT, STOP."
            },
            "identifiedArtist": {
                "type": "OBJECT",
                "properties": {
                    "name": {
                        "type": "STRING",
                        "description": "Name of the artist if recognized (e.g. Ado, Billie Eilish, etc.)."
                    },
                    "confidence": {
                        "type": "NUMBER",
                        "description": "Confidence in identity from 0-100."
                    },
                    "isOriginal": {
                        "type": "BOOLEAN",
                        "description": "True ONLY if this is the official studio master of the original artist."
                    },
                    "signatureReasoning": {
                        "type": "STRING",
                        "description": "Technical reasoning for this ID, e.g. a specific resonance or growl texture."
                    },
                    "notes": {
                        "type": "STRING",
                        "description": "Details on if it's a cover, AI-generated, or pitch-shifted."
                    }
                },
                "required": ARTIST_FIELDS
            },
            "metrics": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "label": { "type": "STRING" },
                        "score": { "type": "NUMBER" },
                        "description": { "type": "STRING" }
                    },
                    "required": METRIC_FIELDS
                }
            },
            "musicalTheoryAnalysis": {
                "type": "OBJECT",
                "properties": {
                    "pitch": { "type": "STRING" },
                    "timing": { "type": "STRING" },
                    "timbre": { "type": "STRING" },
                    "tonalConsistency": { "type": "STRING" }
                },
                "required": THEORY_FIELDS
            },
            "productionAnalysis": {
                "type": "OBJECT",
                "properties": {
                    "mixing": { "type": "STRING" },
                    "levelization": { "type": "STRING" },
                    "processing": { "type": "STRING" }
                },
                "required": PRODUCTION_FIELDS
            },
            "strengths": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            },
            "industryViability": { "type": "STRING" },
            "redirectionAdvice": { "type": "STRING" },
            "recommendedPath": { "type": "STRING" }
        },
        "required": REQUIRED_FIELDS
    })
}

/// Parse the oracle's raw text answer as JSON and validate it.
///
/// Tolerates a surrounding markdown code fence.
pub fn parse_sample(raw: &str) -> Result<Sample> {
    let cleaned = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let value: Value = serde_json::from_str(cleaned).map_err(|e| {
        AnalysisError::SchemaValidation(format!("response is not valid JSON: {}", e))
    })?;

    validate_sample(value)
}

/// Validate an untyped oracle value against the sample schema
pub fn validate_sample(value: Value) -> Result<Sample> {
    require_fields(&value, "", REQUIRED_FIELDS)?;
    require_fields(&value["identifiedArtist"], "identifiedArtist.", ARTIST_FIELDS)?;
    require_fields(&value["musicalTheoryAnalysis"], "musicalTheoryAnalysis.", THEORY_FIELDS)?;
    require_fields(&value["productionAnalysis"], "productionAnalysis.", PRODUCTION_FIELDS)?;

    if let Some(metrics) = value["metrics"].as_array() {
        for (idx, metric) in metrics.iter().enumerate() {
            require_fields(metric, &format!("metrics[{}].", idx), METRIC_FIELDS)?;
        }
    }

    let sample: Sample = serde_json::from_value(value)
        .map_err(|e| AnalysisError::SchemaValidation(format!("type mismatch: {}", e)))?;

    check_score("overallScore", sample.overall_score)?;
    check_score("identifiedArtist.confidence", sample.identified_artist.confidence)?;
    for (idx, metric) in sample.metrics.iter().enumerate() {
        check_score(&format!("metrics[{}].score", idx), metric.score)?;
    }

    Ok(sample)
}

fn require_fields(value: &Value, prefix: &str, fields: &[&str]) -> Result<()> {
    let object = value.as_object().ok_or_else(|| {
        AnalysisError::SchemaValidation(format!(
            "expected object at '{}'",
            prefix.trim_end_matches('.')
        ))
    })?;

    for field in fields {
        match object.get(*field) {
            None | Some(Value::Null) => {
                return Err(AnalysisError::SchemaValidation(format!(
                    "missing required field '{}{}'",
                    prefix, field
                )));
            }
            Some(_) => {}
        }
    }

    Ok(())
}

fn check_score(field: &str, score: f64) -> Result<()> {
    if score.is_finite() && (0.0..=100.0).contains(&score) {
        Ok(())
    } else {
        Err(AnalysisError::SchemaValidation(format!(
            "'{}' out of range [0, 100]: {}",
            field, score
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::CareerDecision;

    fn valid_value() -> Value {
        json!({
            "overallScore": 78,
            "verdict": "Promising but unpolished",
            "brutalHonesty": "Pitch drifts flat on sustained notes.",
            "detectedKey": "F# minor",
            "careerDecision": "TRAIN",
            "identifiedArtist": {
                "name": "Ado",
                "confidence": 64.5,
                "isOriginal": false,
                "signatureReasoning": "Growl texture resembles but lacks the 2kHz resonance.",
                "notes": "Likely a cover."
            },
            "metrics": [
                { "label": "Pitch Accuracy", "score": 72, "description": "Mostly centered." },
                { "label": "Breath Control", "score": 81, "description": "Solid support." }
            ],
            "musicalTheoryAnalysis": {
                "pitch": "Flat by ~15 cents on the chorus.",
                "timing": "Rushes the pickup.",
                "timbre": "Bright, forward placement.",
                "tonalConsistency": "Stable through the verse."
            },
            "productionAnalysis": {
                "mixing": "Vocal sits slightly low.",
                "levelization": "Peaks at -1 dBFS.",
                "processing": "Light compression."
            },
            "strengths": ["Range", "Diction"],
            "industryViability": "Niche appeal.",
            "redirectionAdvice": "Focus on intonation drills.",
            "recommendedPath": "Six months of coaching, then re-record."
        })
    }

    #[test]
    fn test_valid_sample_passes() {
        let sample = validate_sample(valid_value()).unwrap();
        assert_eq!(sample.overall_score, 78.0);
        assert_eq!(sample.career_decision, CareerDecision::Train);
        assert_eq!(sample.metrics.len(), 2);
        assert_eq!(sample.identified_artist.name, "Ado");
    }

    #[test]
    fn test_missing_field_is_schema_failure() {
        let mut value = valid_value();
        value.as_object_mut().unwrap().remove("verdict");

        let err = validate_sample(value).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaValidation);
        assert!(err.to_string().contains("verdict"));
    }

    #[test]
    fn test_missing_nested_field_is_schema_failure() {
        let mut value = valid_value();
        value["identifiedArtist"]
            .as_object_mut()
            .unwrap()
            .remove("isOriginal");

        let err = validate_sample(value).unwrap_err();
        assert!(err.to_string().contains("identifiedArtist.isOriginal"));
    }

    #[test]
    fn test_out_of_range_scores_rejected() {
        let mut value = valid_value();
        value["overallScore"] = json!(101);
        assert!(validate_sample(value).is_err());

        let mut value = valid_value();
        value["metrics"][1]["score"] = json!(-3);
        let err = validate_sample(value).unwrap_err();
        assert!(err.to_string().contains("metrics[1].score"));

        let mut value = valid_value();
        value["identifiedArtist"]["confidence"] = json!(250);
        assert!(validate_sample(value).is_err());
    }

    #[test]
    fn test_unknown_decision_rejected() {
        let mut value = valid_value();
        value["careerDecision"] = json!("RETIRE");

        let err = validate_sample(value).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaValidation);
    }

    #[test]
    fn test_null_is_not_a_default() {
        let mut value = valid_value();
        value["detectedKey"] = Value::Null;
        assert!(validate_sample(value).is_err());
    }

    #[test]
    fn test_parse_sample_strips_fence() {
        let raw = format!("```json\n{}\n```", valid_value());
        assert!(parse_sample(&raw).is_ok());

        let err = parse_sample("the singer is great").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaValidation);
    }

    #[test]
    fn test_schema_lists_every_required_field() {
        let schema = response_schema();
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), REQUIRED_FIELDS.len());
        for field in REQUIRED_FIELDS {
            assert!(schema["properties"].get(*field).is_some(), "{}", field);
        }
    }
}
