use std::path::PathBuf;

use serde_json::{Value, json};
use tempfile::TempDir;

/// Test fixture providing an isolated lexgraph root.
pub struct CaseFixture {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl CaseFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();

        println!("[FIXTURE] Created temp directory: {root:?}");

        Self { temp_dir, root }
    }

    /// Path of the default database under the fixture root.
    pub fn db_path(&self) -> PathBuf {
        self.root.join("lexgraph.db")
    }

    /// Create a test file with content.
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.root.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        println!(
            "[FIXTURE] Created file: {:?} ({} bytes)",
            full_path,
            content.len()
        );
        full_path
    }

    /// Write `records` as JSON Lines.
    pub fn create_cases(&self, relative_path: &str, records: &[Value]) -> PathBuf {
        let body = records
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        self.create_file(relative_path, &format!("{body}\n"))
    }
}

impl Default for CaseFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CaseFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up temp directory: {:?}", self.root);
    }
}

/// Four judgments; the third has no section content and is dropped on load,
/// so the rest become `Case_0`, `Case_1` and `Case_2`.
pub fn sample_records() -> Vec<Value> {
    vec![
        json!({
            "Titles": "CIT v. Arora Traders",
            "Case_Type": "Tax",
            "Court_Name": "Delhi High Court",
            "Facts": "The assessee concealed income from undisclosed sales and the assessing officer levied a penalty",
            "Issues": "Whether the penalty for concealment of income was rightly levied on the assessee",
            "Conclusion": "The appeal of the revenue is allowed and the penalty is restored",
        }),
        json!({
            "Titles": "State v. Mehra",
            "Case_Type": "Criminal",
            "Court_Name": "Bombay High Court",
            "Facts": "The accused was arrested for theft of jewellery from a residential flat",
            "Issues": "Whether the accused is entitled to bail pending trial",
            "PetArg": "The petitioner argued that the recovery was planted by the police",
        }),
        json!({
            "Titles": "Withdrawn matter",
            "Case_Type": "Civil",
            "Court_Name": "Madras High Court",
            "Facts": "nan",
        }),
        json!({
            "Titles": "Sharma v. Union of India",
            "Case_Type": "Property",
            "Court_Name": "Supreme Court of India",
            "Facts": "The land owner challenged the acquisition of agricultural land for a highway",
            "Issues": "Whether compensation for the acquisition was assessed at market value",
            "Precedent": "The court relied on earlier rulings on compensation under the acquisition act",
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_cases_writes_one_line_per_record() {
        let fixture = CaseFixture::new();
        let path = fixture.create_cases("data/cases.jsonl", &sample_records());
        let raw = std::fs::read_to_string(path).unwrap();
        assert_eq!(raw.lines().count(), 4);
        assert!(raw.ends_with('\n'));
    }
}
