use serde::{Deserialize, Serialize};

pub const CITATION_COLUMNS: [&str; 5] = [
    "Citation",
    "Citation Page",
    "Inferred Section Name",
    "Context",
    "URL",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationRecord {
    pub citation: String,
    pub citation_page: String,
    pub section: String,
    pub context: String,
    pub source_url: String,
}

impl CitationRecord {
    pub fn into_row(self) -> [String; 5] {
        [
            self.citation,
            self.citation_page,
            self.section,
            self.context,
            self.source_url,
        ]
    }
}

pub fn page_anchor(url: &str, page_number: u32) -> String {
    format!("{url}#page={page_number}")
}

#[derive(Debug, Clone, Serialize)]
pub struct CitationRunPaths {
    pub output_path: String,
    pub failed_downloads_path: String,
    pub manifest_path: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CitationRunCounts {
    pub url_count: usize,
    pub downloaded_count: usize,
    pub failed_download_count: usize,
    pub extraction_failure_count: usize,
    pub page_count: usize,
    pub skipped_page_count: usize,
    pub toc_entry_count: usize,
    pub citation_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CitationRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub completed_at: String,
    pub paths: CitationRunPaths,
    pub counts: CitationRunCounts,
    pub failed_urls: Vec<String>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_anchor_appends_fragment() {
        assert_eq!(
            page_anchor("https://www.fsis.usda.gov/7000.1.pdf", 3),
            "https://www.fsis.usda.gov/7000.1.pdf#page=3"
        );
    }
}
