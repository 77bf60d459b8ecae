use std::fs;
use std::path::Path;
use std::time::Duration;

use super::fetch::DocumentFetcher;
use super::pipeline::{CitationScanner, DocumentError, process_url};
use super::run::parse_url_list;
use super::section::UNKNOWN_SECTION;
use super::sink::{citation_table, write_citations};
use crate::http::RetryPolicy;
use crate::model::CitationRecord;
use crate::sheet::load_table;

const SOURCE_URL: &str = "https://www.fsis.usda.gov/policy/fsis-directives/7000.1.pdf";

fn scanner() -> CitationScanner {
    CitationScanner::new(10, 100).expect("scanner builds")
}

fn spawn_server(status: u16, body: &'static [u8]) -> String {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("bind test server");
    let addr = server.server_addr().to_ip().expect("tcp listener");
    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            let response = tiny_http::Response::from_data(body.to_vec())
                .with_status_code(tiny_http::StatusCode(status));
            let _ = request.respond(response);
        }
    });
    format!("http://{addr}/directive.pdf")
}

fn fetcher(dir: &Path) -> DocumentFetcher {
    DocumentFetcher::new(Duration::from_secs(5), RetryPolicy::new(1, Duration::ZERO))
        .expect("client builds")
        .with_temp_dir(dir)
}

#[test]
fn single_page_without_toc_yields_unknown_sections() {
    let pages = vec![Some("Title 9 and 9 CFR 1.2 apply.")];
    let scan = scanner().scan_pages(SOURCE_URL, &pages);

    assert_eq!(scan.page_count, 1);
    assert_eq!(scan.toc_entry_count, 0);
    assert_eq!(scan.records.len(), 2);

    let citations = scan
        .records
        .iter()
        .map(|record| record.citation.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(citations, vec!["Title 9", "9 CFR 1.2"]);

    for record in &scan.records {
        assert_eq!(record.section, UNKNOWN_SECTION);
        assert_eq!(record.citation_page, format!("{SOURCE_URL}#page=1"));
        assert_eq!(record.source_url, SOURCE_URL);
        assert_eq!(record.context, "Title 9 and 9 CFR 1.2 apply.");
    }
}

#[test]
fn toc_sections_apply_to_later_pages() {
    let pages = vec![
        Some("Table of Contents\nIntroduction 1\nSanitation 2".to_string()),
        Some("Sanitation\nEstablishments must meet\n9 C.F.R. § 416.2 at all times.".to_string()),
        None,
    ];

    let scan = scanner().scan_pages(SOURCE_URL, &pages);

    assert_eq!(scan.toc_entry_count, 2);
    assert_eq!(scan.skipped_page_count, 1);
    assert_eq!(scan.records.len(), 1);

    let record = &scan.records[0];
    assert_eq!(record.citation, "9 CFR 416.2");
    assert_eq!(record.section, "Sanitation");
    assert_eq!(record.citation_page, format!("{SOURCE_URL}#page=2"));
    assert_eq!(
        record.context,
        "Sanitation Establishments must meet 9 C.F.R. § 416.2 at all times."
    );
}

#[test]
fn context_window_is_bounded_by_configured_radius() {
    let page = format!("{} 42 U.S.C. 1395 {}", "a".repeat(300), "b".repeat(300));
    let scanner = CitationScanner::new(10, 5).expect("scanner builds");

    let scan = scanner.scan_pages(SOURCE_URL, &[Some(page)]);

    assert_eq!(scan.records.len(), 1);
    assert_eq!(scan.records[0].context, "aaaa 42 U.S.C. 1395 bbbb");
    assert_eq!(scan.records[0].citation, "42 USC 1395");
}

#[test]
fn citation_table_normalizes_cells_and_citations() {
    let scanner = scanner();
    let table = citation_table(
        vec![CitationRecord {
            citation: "E.O.\n14147".to_string(),
            citation_page: format!("{SOURCE_URL}#page=4"),
            section: "  Scope\n".to_string(),
            context: "per\r\nE.O. 14147".to_string(),
            source_url: SOURCE_URL.to_string(),
        }],
        scanner.matcher(),
    );

    assert_eq!(
        table.rows[0],
        vec![
            "Executive Order 14147".to_string(),
            format!("{SOURCE_URL}#page=4"),
            "Scope".to_string(),
            "per E.O. 14147".to_string(),
            SOURCE_URL.to_string(),
        ]
    );
}

#[test]
fn written_citations_load_back_with_header() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("citations.xlsx");
    let scanner = scanner();
    let scan = scanner.scan_pages(SOURCE_URL, &[Some("Refer to P.L. 113-79.")]);

    write_citations(&path, scan.records, scanner.matcher()).expect("write workbook");
    let table = load_table(&path).expect("load workbook");

    assert_eq!(
        table.headers,
        vec!["Citation", "Citation Page", "Inferred Section Name", "Context", "URL"]
    );
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.cell(0, 0), "Public Law 113-79");
    assert_eq!(table.cell(0, 2), UNKNOWN_SECTION);
}

#[test]
fn failed_download_surfaces_fetch_error() {
    let url = spawn_server(503, b"down");
    let dir = tempfile::tempdir().expect("tempdir");

    let error = process_url(&fetcher(dir.path()), &scanner(), &url).expect_err("503");

    assert!(matches!(error, DocumentError::Fetch(_)));
    assert!(fs::read_dir(dir.path()).expect("read dir").next().is_none());
}

#[test]
fn unreadable_document_is_removed_after_extraction_failure() {
    let url = spawn_server(200, b"<html>not a pdf</html>");
    let dir = tempfile::tempdir().expect("tempdir");

    let error = process_url(&fetcher(dir.path()), &scanner(), &url).expect_err("not a pdf");

    assert!(matches!(error, DocumentError::Extract { .. }));
    assert!(fs::read_dir(dir.path()).expect("read dir").next().is_none());
}

#[test]
fn url_list_skips_comments_and_blank_lines() {
    let raw = "# FSIS directives\nhttps://a.example/1.pdf\n\n  https://a.example/2.pdf  \n";
    assert_eq!(
        parse_url_list(raw),
        vec!["https://a.example/1.pdf", "https://a.example/2.pdf"]
    );
}
