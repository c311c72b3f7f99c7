//! QBCC online licence search (contractors, companies, certifiers).

use std::cell::Cell;

use regcheck_recon::registry::LICENSE;
use regcheck_recon::{Finding, IdentifierSpec, LookupResult, Registry};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use scraper::Html;

use super::common::{element_text, selector, Endpoint, FetchClient, FetchError};

pub const QBCC_BASE: &str =
    "https://www.onlineservices.qbcc.qld.gov.au/OnlineLicenceSearch/VisualElements";

const WARM_UP_PATH: &str = "SearchBSALicenseeContent.aspx";
const DETAIL_PATH: &str = "ShowDetailResultContent.aspx";

const CLASS_CELLS: &str =
    "table#ctl00_generalContentPlaceHolder_LicenceInfoControl1_gvLicenceClass td";
const LICENSEE_NAME: &str = "#ctl00_generalContentPlaceHolder_LicenceInfoControl1_lbLicenceName";

/// Cells per licence-class row: class, grade, granted, status.
const CELLS_PER_CLASS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QbccKind {
    Individual,
    Company,
    Certifier,
}

impl QbccKind {
    pub fn name(self) -> &'static str {
        match self {
            QbccKind::Individual => "qbcc-individual",
            QbccKind::Company => "qbcc-company",
            QbccKind::Certifier => "qbcc-certifier",
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            QbccKind::Individual => &["qbcc", "individual"],
            QbccKind::Company => &["qbcc", "company"],
            QbccKind::Certifier => &["qbcc", "certifier"],
        }
    }

    /// `searchType` / `FromPage` pair the detail page expects.
    fn search_params(self) -> (&'static str, &'static str) {
        match self {
            QbccKind::Individual => ("Contractor", "SearchContr"),
            QbccKind::Company => ("Company", "SearchComp"),
            QbccKind::Certifier => ("Certifier", "SearchCert"),
        }
    }
}

/// One row of the licence-class table.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LicenceClass {
    class: String,
    grade: String,
    granted: String,
    status: String,
}

pub struct QbccRegistry {
    kind: QbccKind,
    endpoint: Endpoint,
    client: FetchClient,
    warmed: Cell<bool>,
}

impl QbccRegistry {
    pub fn new(kind: QbccKind, endpoint: Endpoint) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml"));
        let client = FetchClient::new(kind.name(), endpoint.timeout, headers, true)?;
        Ok(Self {
            kind,
            endpoint,
            client,
            warmed: Cell::new(false),
        })
    }

    pub fn with_base_url(kind: QbccKind, base_url: String) -> Result<Self, FetchError> {
        Self::new(kind, Endpoint::new(base_url))
    }

    /// Open the search page once so the session cookie is set. Failure is
    /// logged and ignored.
    fn warm_up(&self) {
        if self.warmed.replace(true) {
            return;
        }
        if let Err(e) = self.client.get_text(&self.endpoint.url(WARM_UP_PATH), &[]) {
            tracing::debug!(registry = self.kind.name(), error = %e, "warm-up request failed");
        }
    }
}

impl Registry for QbccRegistry {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn keywords(&self) -> &[&'static str] {
        self.kind.keywords()
    }

    fn identifier(&self) -> IdentifierSpec {
        IdentifierSpec::Column {
            column: LICENSE,
            label: "Licence Number",
        }
    }

    fn lookup(&self, key: &str) -> LookupResult {
        self.warm_up();
        let (search_type, from_page) = self.kind.search_params();
        let query = [
            ("LicNO", key),
            ("licCat", "LIC"),
            ("name", ""),
            ("firstName", ""),
            ("searchType", search_type),
            ("FromPage", from_page),
        ];
        match self.client.get_text(&self.endpoint.url(DETAIL_PATH), &query) {
            Ok(html) => parse_detail_page(&html),
            Err(e) => e.into(),
        }
    }
}

/// Read the licence-class table. The first class row carries the status
/// written to the sheet; every class is listed in the finding.
pub(crate) fn parse_detail_page(html: &str) -> LookupResult {
    let doc = Html::parse_document(html);
    let classes = match parse_classes(&doc) {
        Ok(classes) => classes,
        Err(result) => return result,
    };
    let Some(first) = classes.first() else {
        return LookupResult::NotFound;
    };
    if first.status.is_empty() {
        return LookupResult::query_error("licence class row has no status");
    }

    let mut finding = Finding::new(first.status.clone())
        .with_field("class", first.class.clone())
        .with_field("grade", first.grade.clone())
        .with_field("granted", first.granted.clone());
    if let Ok(name_sel) = selector(LICENSEE_NAME) {
        if let Some(name) = doc.select(&name_sel).next().map(element_text) {
            if !name.is_empty() {
                finding = finding.with_field("licensee", name);
            }
        }
    }
    if classes.len() > 1 {
        let all = classes
            .iter()
            .map(|c| format!("{} ({})", c.class, c.status))
            .collect::<Vec<_>>()
            .join("; ");
        finding = finding.with_field("classes", all);
    }
    LookupResult::Found(finding)
}

fn parse_classes(doc: &Html) -> Result<Vec<LicenceClass>, LookupResult> {
    let cells_sel = selector(CLASS_CELLS)?;
    let cells: Vec<String> = doc.select(&cells_sel).map(element_text).collect();

    if cells.len() % CELLS_PER_CLASS != 0 {
        return Err(LookupResult::query_error(format!(
            "licence class table has {} cells, expected a multiple of {CELLS_PER_CLASS}",
            cells.len()
        )));
    }

    Ok(cells
        .chunks(CELLS_PER_CLASS)
        .map(|row| LicenceClass {
            class: row[0].clone(),
            grade: row[1].clone(),
            granted: row[2].clone(),
            status: row[3].clone(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn detail_page(rows: &[[&str; 4]]) -> String {
        let body: String = rows
            .iter()
            .map(|r| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>\r\n\t {} </td></tr>",
                    r[0], r[1], r[2], r[3]
                )
            })
            .collect();
        format!(
            r#"<html><body>
<span id="ctl00_generalContentPlaceHolder_LicenceInfoControl1_lbLicenceName">ACME  BUILDERS PTY LTD</span>
<table id="ctl00_generalContentPlaceHolder_LicenceInfoControl1_gvLicenceClass">
<tr><th>Class</th><th>Grade</th><th>Granted</th><th>Status</th></tr>
{body}
</table></body></html>"#
        )
    }

    // ── Parsing ─────────────────────────────────────────────────────

    #[test]
    fn test_parse_single_class() {
        let html = detail_page(&[["Builder - Low Rise", "Medium", "01/02/2015", "current"]]);
        let LookupResult::Found(finding) = parse_detail_page(&html) else {
            panic!("expected Found");
        };
        assert_eq!(finding.status, "current");
        assert_eq!(finding.fields["class"], "Builder - Low Rise");
        assert_eq!(finding.fields["licensee"], "ACME BUILDERS PTY LTD");
        assert!(!finding.fields.contains_key("classes"));
    }

    #[test]
    fn test_first_class_row_wins() {
        let html = detail_page(&[
            ["Carpentry", "", "03/04/2010", "Cancelled"],
            ["Builder - Open", "", "05/06/2012", "Current"],
        ]);
        let LookupResult::Found(finding) = parse_detail_page(&html) else {
            panic!("expected Found");
        };
        assert_eq!(finding.status, "Cancelled");
        assert_eq!(
            finding.fields["classes"],
            "Carpentry (Cancelled); Builder - Open (Current)"
        );
    }

    #[test]
    fn test_no_table_is_not_found() {
        let html = "<html><body><p>No licence found</p></body></html>";
        assert_eq!(parse_detail_page(html), LookupResult::NotFound);
    }

    #[test]
    fn test_ragged_table_is_query_error() {
        let html = r#"<table id="ctl00_generalContentPlaceHolder_LicenceInfoControl1_gvLicenceClass">
<tr><td>Builder</td><td>Medium</td><td>Current</td></tr></table>"#;
        assert!(matches!(
            parse_detail_page(html),
            LookupResult::QueryError { .. }
        ));
    }

    #[test]
    fn test_kind_params() {
        assert_eq!(QbccKind::Individual.search_params(), ("Contractor", "SearchContr"));
        assert_eq!(QbccKind::Company.keywords(), &["qbcc", "company"]);
        assert_eq!(QbccKind::Certifier.name(), "qbcc-certifier");
    }

    // ── HTTP ────────────────────────────────────────────────────────

    #[test]
    fn test_lookup_sends_licence_query() {
        let server = MockServer::start();

        let warm_up = server.mock(|when, then| {
            when.method(GET).path("/SearchBSALicenseeContent.aspx");
            then.status(200).body("<html></html>");
        });
        let detail = server.mock(|when, then| {
            when.method(GET)
                .path("/ShowDetailResultContent.aspx")
                .query_param("LicNO", "15000001")
                .query_param("licCat", "LIC")
                .query_param("searchType", "Contractor")
                .query_param("FromPage", "SearchContr");
            then.status(200)
                .header("content-type", "text/html")
                .body(detail_page(&[["Builder", "Low Rise", "01/01/2020", "Current"]]));
        });

        let registry = QbccRegistry::with_base_url(QbccKind::Individual, server.base_url()).unwrap();
        let first = registry.lookup("15000001");
        let second = registry.lookup("15000001");

        warm_up.assert_hits(1);
        detail.assert_hits(2);
        assert!(matches!(first, LookupResult::Found(ref f) if f.status == "Current"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_warm_up_failure_is_ignored() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/SearchBSALicenseeContent.aspx");
            then.status(500);
        });
        server.mock(|when, then| {
            when.method(GET).path("/ShowDetailResultContent.aspx");
            then.status(200).body("<html><body></body></html>");
        });

        let registry = QbccRegistry::with_base_url(QbccKind::Company, server.base_url()).unwrap();
        assert_eq!(registry.lookup("1234567"), LookupResult::NotFound);
    }

    #[test]
    fn test_server_error_is_query_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/ShowDetailResultContent.aspx");
            then.status(503);
        });

        let registry = QbccRegistry::with_base_url(QbccKind::Individual, server.base_url()).unwrap();
        let LookupResult::QueryError { message } = registry.lookup("15000001") else {
            panic!("expected QueryError");
        };
        assert!(message.contains("HTTP 503"), "{message}");
    }
}
