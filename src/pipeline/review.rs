//! Review presentation: one row per subject for the confirmation screen.

use std::fmt;

use crate::messages;
use crate::output::{ReportCardData, Score, Subject};

/// Pass/fail mark shown next to a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Pass,
    Fail,
    /// The score could not be read; no mark is shown.
    Unknown,
}

/// A single line of the "Resumo das Notas" table.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRow {
    pub subject: Subject,
    pub score: Option<Score>,
    pub status: RowStatus,
}

impl ScoreRow {
    pub fn new(subject: Subject, score: Option<Score>) -> Self {
        let status = match score {
            None => RowStatus::Unknown,
            Some(s) if s.value() >= subject.passing_score() => RowStatus::Pass,
            Some(_) => RowStatus::Fail,
        };
        Self {
            subject,
            score,
            status,
        }
    }

    pub fn label(&self) -> &'static str {
        self.subject.label()
    }

    /// The score, or "Não identificado".
    pub fn value_text(&self) -> String {
        self.score
            .map(|s| s.to_string())
            .unwrap_or_else(|| messages::NOT_IDENTIFIED.to_string())
    }
}

impl fmt::Display for ScoreRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = match self.status {
            RowStatus::Pass => " ✓",
            RowStatus::Fail => " ✗",
            RowStatus::Unknown => "",
        };
        write!(f, "{:<22}{:>18}{}", self.label(), self.value_text(), mark)
    }
}

/// Rows in display order: the four objective areas, then Redação.
pub fn review_rows(data: &ReportCardData) -> [ScoreRow; 5] {
    Subject::ALL.map(|s| ScoreRow::new(s, data.score(s)))
}

/// What the participant chose on the review screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewIntent {
    /// "CONFIRMAR E ENVIAR"
    Confirm,
    /// "A imagem não ficou boa? Tentar novamente"
    Retake,
}
