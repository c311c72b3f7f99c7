// End-to-end tests for the regcheck binary.

use std::path::Path;
use std::process::{Command, Output};

use httpmock::prelude::*;
use regcheck_engine::{CellValue, Sheet, Workbook};
use regcheck_io::xlsx;
use tempfile::TempDir;

fn regcheck(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_regcheck"))
        .args(args)
        .env_remove("REGCHECK_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run regcheck")
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn write_book(path: &Path, licences: &[&str]) {
    let mut sheet = Sheet::from_rows(
        "QBCC Individual",
        [["Name", "Licence Number", "Status", "Last Checked"]],
    );
    for (i, licence) in licences.iter().enumerate() {
        sheet.set(i + 1, 0, CellValue::text(format!("Holder {i}")));
        if !licence.is_empty() {
            sheet.set(i + 1, 1, CellValue::text(*licence));
        }
    }
    xlsx::export(&Workbook::from_sheets(vec![sheet]), path).unwrap();
}

fn write_config(dir: &TempDir, extra: &str) -> String {
    let path = dir.path().join("regcheck.toml");
    let body = format!(
        "skip_days = 0\n\n[sheets_config.qbcc]\nlicense_index = 1\nstatus_index = 2\nlast_checked_index = 3\n\n{extra}"
    );
    std::fs::write(&path, body).unwrap();
    path.display().to_string()
}

fn read_back(path: &Path) -> Sheet {
    let (workbook, _) = xlsx::import(path).unwrap();
    workbook.sheet(0).unwrap().clone()
}

#[test]
fn explicit_missing_config_exits_with_config_code() {
    let dir = TempDir::new().unwrap();
    let book = dir.path().join("book.xlsx");
    write_book(&book, &["15000001"]);

    let out = regcheck(&[
        "run",
        book.to_str().unwrap(),
        "--config",
        dir.path().join("absent.toml").to_str().unwrap(),
    ]);
    assert_eq!(out.status.code(), Some(4), "{}", stderr(&out));
    assert!(stderr(&out).contains("config file not found"));
}

#[test]
fn non_xlsx_workbook_is_rejected_untouched() {
    let dir = TempDir::new().unwrap();
    let book = dir.path().join("book.xls");
    std::fs::write(&book, b"legacy workbook").unwrap();
    let config = write_config(&dir, "");

    let out = regcheck(&["run", book.to_str().unwrap(), "--config", &config]);
    assert_eq!(out.status.code(), Some(3), "{}", stderr(&out));
    assert!(stderr(&out).contains(".xlsx"));
    assert_eq!(std::fs::read(&book).unwrap(), b"legacy workbook");
}

#[test]
fn registries_lists_every_adapter() {
    let out = regcheck(&["registries"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let text = stdout(&out);
    for name in ["pool-safety", "qbcc-individual", "qbcc-company", "surveyors", "engineers"] {
        assert!(text.contains(name), "missing {name} in:\n{text}");
    }

    let out = regcheck(&["registries", "--json"]);
    let entries: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 7);
    assert_eq!(entries[0]["name"], "pool-safety");
}

#[test]
fn unknown_registry_is_usage_error() {
    let out = regcheck(&["lookup", "plumbers", "123"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("hint:"));
}

#[test]
fn blank_licences_are_marked_without_network() {
    let dir = TempDir::new().unwrap();
    let book = dir.path().join("book.xlsx");
    write_book(&book, &["", "  "]);
    let config = write_config(&dir, "");

    let out = regcheck(&["run", book.to_str().unwrap(), "--config", &config, "--json"]);
    assert!(out.status.success(), "{}", stderr(&out));

    let summary: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(summary["sheets"][0]["registry"], "qbcc-individual");
    assert_eq!(summary["sheets"][0]["blank_identifier"], 2);

    let sheet = read_back(&book);
    for row in 1..=2 {
        assert_eq!(
            sheet.get(row, 2),
            &CellValue::text("Licence Number is Blank!")
        );
        assert!(matches!(sheet.get(row, 3), CellValue::DateTime(_)));
    }
}

#[test]
fn run_uses_configured_base_url() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/SearchBSALicenseeContent.aspx");
        then.status(200).body("<html></html>");
    });
    let detail = server.mock(|when, then| {
        when.method(GET)
            .path("/ShowDetailResultContent.aspx")
            .query_param("LicNO", "15000001");
        then.status(200).body(
            r#"<table id="ctl00_generalContentPlaceHolder_LicenceInfoControl1_gvLicenceClass">
<tr><td>Builder</td><td>Low Rise</td><td>01/01/2020</td><td>Current</td></tr></table>"#,
        );
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/ShowDetailResultContent.aspx")
            .query_param("LicNO", "15000002");
        then.status(200).body("<html><body>No records</body></html>");
    });

    let dir = TempDir::new().unwrap();
    let book = dir.path().join("book.xlsx");
    write_book(&book, &["15000001", "15000002"]);
    let config = write_config(
        &dir,
        &format!("[registries.qbcc-individual]\nbase_url = \"{}\"\n", server.base_url()),
    );

    let out = regcheck(&[
        "run",
        book.to_str().unwrap(),
        "--config",
        &config,
        "--registry",
        "qbcc-individual",
    ]);
    assert!(out.status.success(), "{}", stderr(&out));
    detail.assert();

    let sheet = read_back(&book);
    assert_eq!(sheet.get(1, 2), &CellValue::text("Current"));
    assert_eq!(sheet.get(2, 2), &CellValue::text("Missing in Register"));
    assert!(stderr(&out).contains("2 rows checked"));
}

#[test]
fn lookup_not_found_exit_code() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/SearchBSALicenseeContent.aspx");
        then.status(200).body("<html></html>");
    });
    server.mock(|when, then| {
        when.method(GET).path("/ShowDetailResultContent.aspx");
        then.status(200).body("<html><body>No records</body></html>");
    });

    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        &format!("[registries.qbcc-company]\nbase_url = \"{}\"\n", server.base_url()),
    );

    let out = regcheck(&["lookup", "qbcc-company", "999", "--config", &config]);
    assert_eq!(out.status.code(), Some(50), "{}", stderr(&out));
    assert!(stdout(&out).contains("not found"));
}
