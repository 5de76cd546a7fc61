//! Data types produced by the extraction pipeline and consumed by the flow.

use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::RangeInclusive;

use crate::messages;

/// Passing threshold for the four objective subjects.
pub const OBJECTIVE_PASSING_SCORE: f64 = 100.0;
/// Passing threshold for the essay.
pub const ESSAY_PASSING_SCORE: f64 = 5.0;

/// The five areas printed on an Encceja boletim, in review order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    NaturalSciences,
    HumanSciences,
    Languages,
    Mathematics,
    Essay,
}

impl Subject {
    /// All subjects in the order they are shown and submitted.
    pub const ALL: [Subject; 5] = [
        Subject::NaturalSciences,
        Subject::HumanSciences,
        Subject::Languages,
        Subject::Mathematics,
        Subject::Essay,
    ];

    /// Field name in the extraction response schema.
    pub fn wire_name(self) -> &'static str {
        match self {
            Subject::NaturalSciences => "naturalSciences",
            Subject::HumanSciences => "humanSciences",
            Subject::Languages => "languages",
            Subject::Mathematics => "mathematics",
            Subject::Essay => "essay",
        }
    }

    /// Label shown on the review screen.
    pub fn label(self) -> &'static str {
        match self {
            Subject::NaturalSciences => messages::LABEL_NATURAL_SCIENCES,
            Subject::HumanSciences => messages::LABEL_HUMAN_SCIENCES,
            Subject::Languages => messages::LABEL_LANGUAGES,
            Subject::Mathematics => messages::LABEL_MATHEMATICS,
            Subject::Essay => messages::LABEL_ESSAY,
        }
    }

    /// Minimum score that counts as passing.
    pub fn passing_score(self) -> f64 {
        match self {
            Subject::Essay => ESSAY_PASSING_SCORE,
            _ => OBJECTIVE_PASSING_SCORE,
        }
    }

    /// Range a legible score can fall in (objective 60–180, essay 0–10).
    pub fn plausible_range(self) -> RangeInclusive<f64> {
        match self {
            Subject::Essay => 0.0..=10.0,
            _ => 60.0..=180.0,
        }
    }
}

/// A score that was read from the boletim.
///
/// Always finite. Integral values print and serialise without a fractional
/// part so the spreadsheet receives `120`, not `120.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Score(f64);

impl Score {
    /// Accept `value` for `subject` when it is finite and plausible.
    pub fn for_subject(subject: Subject, value: f64) -> Option<Self> {
        (value.is_finite() && subject.plausible_range().contains(&value)).then_some(Score(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    fn as_integer(self) -> Option<i64> {
        (self.0.fract() == 0.0 && self.0.abs() < i64::MAX as f64).then_some(self.0 as i64)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_integer() {
            Some(n) => write!(f, "{n}"),
            None => write!(f, "{}", self.0),
        }
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_integer() {
            Some(n) => serializer.serialize_i64(n),
            None => serializer.serialize_f64(self.0),
        }
    }
}

/// Scores read from one boletim.
///
/// Built once per analysis by [`crate::pipeline::postprocess::parse_report_card`]
/// and read-only afterwards. `None` means the score was not legible.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCardData {
    pub natural_sciences: Option<Score>,
    pub human_sciences: Option<Score>,
    pub languages: Option<Score>,
    pub mathematics: Option<Score>,
    pub essay: Option<Score>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    pub is_passing: bool,
}

impl ReportCardData {
    /// Assemble a report card and derive `is_passing` from the scores.
    pub fn new(
        natural_sciences: Option<Score>,
        human_sciences: Option<Score>,
        languages: Option<Score>,
        mathematics: Option<Score>,
        essay: Option<Score>,
        student_name: Option<String>,
    ) -> Self {
        let mut data = Self {
            natural_sciences,
            human_sciences,
            languages,
            mathematics,
            essay,
            student_name,
            is_passing: false,
        };
        data.is_passing = Subject::ALL
            .iter()
            .all(|&s| data.score(s).is_none_or(|v| v.value() >= s.passing_score()));
        data
    }

    pub fn score(&self, subject: Subject) -> Option<Score> {
        match subject {
            Subject::NaturalSciences => self.natural_sciences,
            Subject::HumanSciences => self.human_sciences,
            Subject::Languages => self.languages,
            Subject::Mathematics => self.mathematics,
            Subject::Essay => self.essay,
        }
    }
}

/// Current screen of the intake flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStep {
    #[default]
    Form,
    Analyzing,
    Review,
    Success,
}

impl fmt::Display for AppStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppStep::Form => "form",
            AppStep::Analyzing => "analyzing",
            AppStep::Review => "review",
            AppStep::Success => "success",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(v: f64) -> Option<Score> {
        Score::for_subject(Subject::Mathematics, v)
    }

    fn essay(v: f64) -> Option<Score> {
        Score::for_subject(Subject::Essay, v)
    }

    #[test]
    fn one_failing_subject_fails_the_card() {
        let data = ReportCardData::new(obj(120.0), obj(90.0), obj(150.0), obj(100.0), essay(6.0), None);
        assert!(!data.is_passing);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let data = ReportCardData::new(obj(100.0), obj(100.0), obj(100.0), obj(100.0), essay(5.0), None);
        assert!(data.is_passing);
    }

    #[test]
    fn low_essay_fails_the_card() {
        let data = ReportCardData::new(obj(170.0), obj(170.0), obj(170.0), obj(170.0), essay(4.5), None);
        assert!(!data.is_passing);
    }

    #[test]
    fn unknown_scores_do_not_block_passing() {
        let data = ReportCardData::new(None, None, None, None, None, None);
        assert!(data.is_passing);
    }

    #[test]
    fn implausible_values_are_rejected() {
        assert!(Score::for_subject(Subject::Languages, 250.0).is_none());
        assert!(Score::for_subject(Subject::Essay, 11.0).is_none());
        assert!(Score::for_subject(Subject::Essay, f64::NAN).is_none());
        assert!(Score::for_subject(Subject::Essay, 0.0).is_some());
    }

    #[test]
    fn integral_scores_display_without_fraction() {
        assert_eq!(obj(120.0).unwrap().to_string(), "120");
        assert_eq!(essay(7.5).unwrap().to_string(), "7.5");
    }

    #[test]
    fn serialises_with_wire_names() {
        let data = ReportCardData::new(obj(120.0), None, None, None, essay(7.5), Some("Maria".into()));
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["naturalSciences"], serde_json::json!(120));
        assert_eq!(json["humanSciences"], serde_json::Value::Null);
        assert_eq!(json["essay"], serde_json::json!(7.5));
        assert_eq!(json["studentName"], "Maria");
        assert_eq!(json["isPassing"], true);
    }
}
