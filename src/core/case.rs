//! Case and section data structures

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LgError;

/// A legal case record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    /// Unique case ID (`Case_<n>`)
    pub id: String,
    pub title: String,
    /// Case type, e.g. "Tax" or "Land&Property"
    #[serde(rename = "type")]
    pub case_type: String,
    pub court: String,
}

impl Case {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            case_type: String::new(),
            court: String::new(),
        }
    }

    #[must_use]
    pub fn with_type(mut self, case_type: impl Into<String>) -> Self {
        self.case_type = case_type.into();
        self
    }

    #[must_use]
    pub fn with_court(mut self, court: impl Into<String>) -> Self {
        self.court = court.into();
        self
    }

    /// Build the section of the given type owned by this case.
    pub fn section(&self, section_type: SectionType, content: impl Into<String>) -> Section {
        Section::new(&self.id, section_type, content)
    }
}

/// Structural section types of a judgment.
///
/// The canonical label is the short field name used by the source dataset;
/// the title is the human-readable heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SectionType {
    Facts,
    Issues,
    PetitionerArgument,
    RespondentArgument,
    LegalAnalysis,
    PrecedentAnalysis,
    CourtReasoning,
    Conclusion,
}

impl SectionType {
    pub const ALL: [Self; 8] = [
        Self::Facts,
        Self::Issues,
        Self::PetitionerArgument,
        Self::RespondentArgument,
        Self::LegalAnalysis,
        Self::PrecedentAnalysis,
        Self::CourtReasoning,
        Self::Conclusion,
    ];

    /// Canonical label stored on sections and edges.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Facts => "Facts",
            Self::Issues => "Issues",
            Self::PetitionerArgument => "PetArg",
            Self::RespondentArgument => "RespArg",
            Self::LegalAnalysis => "Section",
            Self::PrecedentAnalysis => "Precedent",
            Self::CourtReasoning => "CDiscource",
            Self::Conclusion => "Conclusion",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Facts => "Fact",
            Self::Issues => "Issue",
            Self::PetitionerArgument => "Petitioner's Argument",
            Self::RespondentArgument => "Respondent's Argument",
            Self::LegalAnalysis => "Analysis of the law",
            Self::PrecedentAnalysis => "Precedent Analysis",
            Self::CourtReasoning => "Court's Reasoning",
            Self::Conclusion => "Conclusion",
        }
    }

    /// Resolve a label or title, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let needle = value.trim();
        Self::ALL.into_iter().find(|ty| {
            ty.label().eq_ignore_ascii_case(needle) || ty.title().eq_ignore_ascii_case(needle)
        })
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SectionType {
    type Err = LgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| LgError::InvalidInput(format!("unknown section type: {s}")))
    }
}

/// A labeled excerpt of a case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Derived from owning case id and label; see [`section_id`]
    pub id: String,
    pub case_id: String,
    pub section_type: SectionType,
    pub content: String,
}

impl Section {
    pub fn new(case_id: &str, section_type: SectionType, content: impl Into<String>) -> Self {
        Self {
            id: section_id(case_id, section_type),
            case_id: case_id.to_string(),
            section_type,
            content: content.into(),
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.section_type.label()
    }

    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// Deterministic section id for a (case, section type) pair.
#[must_use]
pub fn section_id(case_id: &str, section_type: SectionType) -> String {
    format!("{case_id}_{}", section_type.label())
}
