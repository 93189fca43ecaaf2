//! Case record loading
//!
//! Input is JSON Lines, one judgment per line. Keys follow the column names
//! of the scraped case table (`Titles`, `Case_Type`, `Court_Name` and the
//! eight section columns); lowercase field names are accepted too.
//!
//! ```json
//! {"Titles": "CIT v. Arora", "Case_Type": "Tax", "Court_Name": "Delhi High Court",
//!  "Facts": "...", "Issues": "...", "Conclusion": "nan"}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::core::{Case, Section, SectionType};
use crate::error::{LgError, Result};

/// One raw case row
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CaseRecord {
    #[serde(default, alias = "Titles", alias = "Title")]
    pub title: Option<String>,
    #[serde(default, alias = "Case_Type", alias = "type")]
    pub case_type: Option<String>,
    #[serde(default, alias = "Court_Name")]
    pub court: Option<String>,
    #[serde(default, alias = "Facts")]
    pub facts: Option<String>,
    #[serde(default, alias = "Issues")]
    pub issues: Option<String>,
    #[serde(default, alias = "PetArg")]
    pub petitioner_argument: Option<String>,
    #[serde(default, alias = "RespArg")]
    pub respondent_argument: Option<String>,
    #[serde(default, alias = "Section")]
    pub legal_analysis: Option<String>,
    #[serde(default, alias = "Precedent")]
    pub precedent_analysis: Option<String>,
    #[serde(default, alias = "CDiscource")]
    pub court_reasoning: Option<String>,
    #[serde(default, alias = "Conclusion")]
    pub conclusion: Option<String>,
}

impl CaseRecord {
    fn raw_section(&self, section_type: SectionType) -> Option<&String> {
        match section_type {
            SectionType::Facts => self.facts.as_ref(),
            SectionType::Issues => self.issues.as_ref(),
            SectionType::PetitionerArgument => self.petitioner_argument.as_ref(),
            SectionType::RespondentArgument => self.respondent_argument.as_ref(),
            SectionType::LegalAnalysis => self.legal_analysis.as_ref(),
            SectionType::PrecedentAnalysis => self.precedent_analysis.as_ref(),
            SectionType::CourtReasoning => self.court_reasoning.as_ref(),
            SectionType::Conclusion => self.conclusion.as_ref(),
        }
    }

    /// Trimmed section text, `None` when missing, blank or `nan`.
    #[must_use]
    pub fn section_text(&self, section_type: SectionType) -> Option<&str> {
        self.raw_section(section_type)
            .map(|value| value.trim())
            .filter(|value| !is_blank(value))
    }

    /// Whether any of the eight section fields has content.
    #[must_use]
    pub fn has_sections(&self) -> bool {
        SectionType::ALL
            .iter()
            .any(|ty| self.section_text(*ty).is_some())
    }

    /// Build the case and its non-empty sections under `case_id`.
    #[must_use]
    pub fn to_case(&self, case_id: &str) -> (Case, Vec<Section>) {
        let case = Case::new(case_id, clean_field(self.title.as_deref()))
            .with_type(clean_field(self.case_type.as_deref()))
            .with_court(clean_field(self.court.as_deref()));
        let sections = SectionType::ALL
            .iter()
            .filter_map(|ty| self.section_text(*ty).map(|text| case.section(*ty, text)))
            .collect();
        (case, sections)
    }
}

/// Cases loaded from a record file
#[derive(Debug, Clone, Default)]
pub struct LoadedCases {
    pub cases: Vec<(Case, Vec<Section>)>,
    /// Records read, including dropped ones
    pub records: usize,
    /// Records with no section content
    pub dropped: usize,
}

impl LoadedCases {
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.cases.iter().map(|(_, sections)| sections.len()).sum()
    }
}

/// Parse JSON Lines records; blank lines are skipped.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<CaseRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: CaseRecord = serde_json::from_str(&line).map_err(|err| {
            LgError::InvalidInput(format!("record on line {}: {err}", idx + 1))
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Drop records without section content and assign `Case_<n>` ids in order.
#[must_use]
pub fn assemble_cases(records: &[CaseRecord]) -> LoadedCases {
    let kept: Vec<&CaseRecord> = records.iter().filter(|r| r.has_sections()).collect();
    let dropped = records.len() - kept.len();
    let cases = kept
        .into_iter()
        .enumerate()
        .map(|(idx, record)| record.to_case(&format!("Case_{idx}")))
        .collect();

    LoadedCases {
        cases,
        records: records.len(),
        dropped,
    }
}

/// Read and assemble a record file.
pub fn load_cases(path: &Path) -> Result<LoadedCases> {
    let file = File::open(path).map_err(|err| {
        LgError::NotFound(format!("case records {}: {err}", path.display()))
    })?;
    let records = read_records(BufReader::new(file))?;
    let loaded = assemble_cases(&records);
    debug!(path = %path.display(), "read case records");
    info!(
        records = loaded.records,
        dropped = loaded.dropped,
        cases = loaded.cases.len(),
        sections = loaded.section_count(),
        "loaded case records"
    );
    Ok(loaded)
}

fn is_blank(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("nan")
}

fn clean_field(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !is_blank(v))
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const SAMPLE: &str = r#"{"Titles": "CIT v. Arora", "Case_Type": "Tax", "Court_Name": "Delhi High Court", "Facts": "Assessee sold land.", "Issues": "Whether gains are taxable.", "Conclusion": "nan"}

{"Titles": "Empty row", "Case_Type": "Tax", "Facts": "  ", "Issues": "NaN"}
{"title": "Verma v. Singh", "type": "Land&Property", "court": "nan", "CDiscource": "Tenant defaulted on rent.", "Precedent": null}
"#;

    #[test]
    fn reads_source_column_names() {
        let records = read_records(Cursor::new(SAMPLE)).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].title.as_deref(), Some("CIT v. Arora"));
        assert_eq!(records[0].court.as_deref(), Some("Delhi High Court"));
        assert_eq!(records[2].case_type.as_deref(), Some("Land&Property"));
    }

    #[test]
    fn nan_and_blank_sections_are_empty() {
        let records = read_records(Cursor::new(SAMPLE)).unwrap();
        assert!(records[0].section_text(SectionType::Conclusion).is_none());
        assert!(!records[1].has_sections());
        assert_eq!(
            records[2].section_text(SectionType::CourtReasoning),
            Some("Tenant defaulted on rent.")
        );
    }

    #[test]
    fn assemble_drops_empty_rows_and_numbers_kept_ones() {
        let records = read_records(Cursor::new(SAMPLE)).unwrap();
        let loaded = assemble_cases(&records);
        assert_eq!(loaded.records, 3);
        assert_eq!(loaded.dropped, 1);
        assert_eq!(loaded.cases.len(), 2);

        let (first, sections) = &loaded.cases[0];
        assert_eq!(first.id, "Case_0");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].id, "Case_0_Facts");

        let (second, sections) = &loaded.cases[1];
        assert_eq!(second.id, "Case_1");
        assert_eq!(second.court, "");
        assert_eq!(sections[0].id, "Case_1_CDiscource");
        assert_eq!(loaded.section_count(), 3);
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let err = read_records(Cursor::new("{\"Titles\": \"ok\"}\n{not json}\n")).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_cases(&dir.path().join("cases.jsonl")).unwrap_err();
        assert!(matches!(err, LgError::NotFound(_)));
    }
}
