//! Post-processing: turn the model's JSON text into a [`ReportCardData`].
//!
//! `responseMimeType: application/json` makes Gemini answer with bare JSON
//! almost always, but models still occasionally wrap the object in
//! ` ```json ` fences or return numbers as strings ("7,5"). These rules are
//! deterministic and each is tested on its own.
//!
//! ## Score rules
//!
//! - JSON numbers are taken as-is.
//! - Numeric strings are parsed, accepting a decimal comma.
//! - `null`, a missing field, or anything else is "not identified".
//! - Values outside the plausible range for the subject are "not
//!   identified" too: a 250 in Matemática is a misread, not a score.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::error::BoletimError;
use crate::output::{ReportCardData, Score, Subject};
use crate::prompts::STUDENT_NAME_FIELD;

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?\s*\n?(.*?)\n?```$").unwrap());

/// Strip code fences and any prose around the outermost JSON object.
pub fn clean_response(input: &str) -> &str {
    let trimmed = input.trim().trim_start_matches('\u{FEFF}');
    let unfenced = match RE_OUTER_FENCES.captures(trimmed) {
        Some(caps) => caps.get(1).map_or(trimmed, |m| m.as_str().trim()),
        None => trimmed,
    };
    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => unfenced,
    }
}

/// Parse the model's response text into scores and derive `is_passing`.
pub fn parse_report_card(text: &str) -> Result<ReportCardData, BoletimError> {
    let cleaned = clean_response(text);
    let value: Value =
        serde_json::from_str(cleaned).map_err(|e| BoletimError::MalformedResponse {
            detail: format!("invalid JSON: {e}"),
        })?;
    let obj = value
        .as_object()
        .ok_or_else(|| BoletimError::MalformedResponse {
            detail: format!("expected a JSON object, got {}", json_kind(&value)),
        })?;

    let score = |subject: Subject| score_from_value(subject, obj.get(subject.wire_name()));
    let student_name = obj
        .get(STUDENT_NAME_FIELD)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(ReportCardData::new(
        score(Subject::NaturalSciences),
        score(Subject::HumanSciences),
        score(Subject::Languages),
        score(Subject::Mathematics),
        score(Subject::Essay),
        student_name,
    ))
}

fn score_from_value(subject: Subject, value: Option<&Value>) -> Option<Score> {
    let raw = match value? {
        Value::Null => return None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        other => {
            warn!("{}: ignoring {} value", subject.wire_name(), json_kind(other));
            return None;
        }
    };
    let Some(raw) = raw else {
        warn!("{}: unreadable score {:?}", subject.wire_name(), value);
        return None;
    };
    let score = Score::for_subject(subject, raw);
    if score.is_none() {
        warn!(
            "{}: {} is outside the plausible range {:?}, treating as not identified",
            subject.wire_name(),
            raw,
            subject.plausible_range()
        );
    }
    score
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(data: &ReportCardData) -> Vec<Option<f64>> {
        Subject::ALL
            .iter()
            .map(|&s| data.score(s).map(Score::value))
            .collect()
    }

    #[test]
    fn parses_plain_json() {
        let data = parse_report_card(
            r#"{"naturalSciences":120,"humanSciences":90,"languages":150,"mathematics":100,"essay":6}"#,
        )
        .unwrap();
        assert_eq!(
            values(&data),
            vec![Some(120.0), Some(90.0), Some(150.0), Some(100.0), Some(6.0)]
        );
        assert!(!data.is_passing);
        assert_eq!(data.student_name, None);
    }

    #[test]
    fn all_null_is_a_vacuous_pass() {
        let data = parse_report_card(
            r#"{"naturalSciences":null,"humanSciences":null,"languages":null,"mathematics":null,"essay":null}"#,
        )
        .unwrap();
        assert!(values(&data).iter().all(Option::is_none));
        assert!(data.is_passing);
    }

    #[test]
    fn missing_fields_are_unknown() {
        let data = parse_report_card(r#"{"essay": 8}"#).unwrap();
        assert_eq!(values(&data), vec![None, None, None, None, Some(8.0)]);
    }

    #[test]
    fn strips_json_fences() {
        let text = "```json\n{\"mathematics\": 140, \"studentName\": \"  Ana Souza \"}\n```";
        let data = parse_report_card(text).unwrap();
        assert_eq!(data.mathematics.map(Score::value), Some(140.0));
        assert_eq!(data.student_name.as_deref(), Some("Ana Souza"));
    }

    #[test]
    fn strips_surrounding_prose() {
        assert_eq!(clean_response("Aqui está: {\"a\":1} obrigado"), "{\"a\":1}");
    }

    #[test]
    fn numeric_strings_with_decimal_comma() {
        let data = parse_report_card(r#"{"essay": "7,5", "languages": "130"}"#).unwrap();
        assert_eq!(data.essay.map(Score::value), Some(7.5));
        assert_eq!(data.languages.map(Score::value), Some(130.0));
    }

    #[test]
    fn implausible_scores_become_unknown() {
        let data = parse_report_card(r#"{"mathematics": 999, "essay": -1}"#).unwrap();
        assert_eq!(data.mathematics, None);
        assert_eq!(data.essay, None);
    }

    #[test]
    fn blank_name_is_dropped() {
        let data = parse_report_card(r#"{"studentName": "   "}"#).unwrap();
        assert_eq!(data.student_name, None);
    }

    #[test]
    fn rejects_non_object() {
        let err = parse_report_card("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, BoletimError::MalformedResponse { .. }));
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_report_card("não consegui ler o documento").unwrap_err();
        assert!(matches!(err, BoletimError::MalformedResponse { .. }));
    }
}
