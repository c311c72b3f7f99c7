//! Board of Architects and Board of Professional Engineers registers.
//!
//! Both boards publish a search page that returns an HTML results table.
//! The page is reached through [`SearchPage`], so a rendered-browser
//! backend can replace the form POST without touching the parsing.

use regcheck_recon::registry::REGISTRATION;
use regcheck_recon::{Finding, IdentifierSpec, LookupResult, Registry};
use scraper::Html;

use super::common::{element_text, selector, Endpoint, FetchError};
use super::search_page::{HttpFormSearch, SearchPage};

pub const ARCHITECTS_BASE: &str = "https://www.boaq.qld.gov.au";
pub const ENGINEERS_BASE: &str = "https://www.bpeq.qld.gov.au";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Board {
    Architects,
    Engineers,
}

impl Board {
    pub fn name(self) -> &'static str {
        match self {
            Board::Architects => "architects",
            Board::Engineers => "engineers",
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Board::Architects => &["architects"],
            Board::Engineers => &["engineers"],
        }
    }

    /// Search path, query field and fixed form fields.
    fn form(self) -> (&'static str, &'static str, &'static [(&'static str, &'static str)]) {
        match self {
            Board::Architects => ("search-the-register", "keyword", &[("register", "architects")]),
            Board::Engineers => ("registers/search", "search", &[("type", "rpeq")]),
        }
    }
}

pub struct BoardRegistry<P = HttpFormSearch> {
    board: Board,
    page: P,
}

impl BoardRegistry<HttpFormSearch> {
    pub fn new(board: Board, endpoint: Endpoint) -> Result<Self, FetchError> {
        let (path, field, fixed) = board.form();
        let page = HttpFormSearch::new(board.name(), &endpoint, path, field, fixed)?;
        Ok(Self { board, page })
    }
}

impl<P: SearchPage> BoardRegistry<P> {
    pub fn with_page(board: Board, page: P) -> Self {
        Self { board, page }
    }
}

impl<P: SearchPage> Registry for BoardRegistry<P> {
    fn name(&self) -> &str {
        self.board.name()
    }

    fn keywords(&self) -> &[&'static str] {
        self.board.keywords()
    }

    fn identifier(&self) -> IdentifierSpec {
        IdentifierSpec::Column {
            column: REGISTRATION,
            label: "Registration Number",
        }
    }

    fn lookup(&self, key: &str) -> LookupResult {
        match self.page.submit_search(key) {
            Ok(html) => parse_results_table(&html, key),
            Err(e) => e.into(),
        }
    }
}

/// Find the row for `key` in the first table with headers.
///
/// A row matches on registration number or name (case-insensitive). With
/// no exact match, a single row whose number or name contains the key is
/// taken as the answer. Rows that never mention the key, or several partial
/// matches, mean the register has no answer for it.
pub(crate) fn parse_results_table(html: &str, key: &str) -> LookupResult {
    let doc = Html::parse_document(html);
    let (Ok(table_sel), Ok(th_sel), Ok(tr_sel), Ok(td_sel)) =
        (selector("table"), selector("th"), selector("tr"), selector("td"))
    else {
        return LookupResult::query_error("board selectors failed to parse");
    };

    let Some(table) = doc
        .select(&table_sel)
        .find(|t| t.select(&th_sel).next().is_some())
    else {
        return LookupResult::NotFound;
    };

    let headers: Vec<String> = table
        .select(&th_sel)
        .map(|th| element_text(th).to_lowercase())
        .collect();
    let column = |needle: &str| headers.iter().position(|h| h.contains(needle));
    let Some(status_col) = column("status") else {
        return LookupResult::query_error("results table has no status column");
    };
    let number_col = column("registration").or_else(|| column("number"));
    let name_col = column("name");

    let rows: Vec<Vec<String>> = table
        .select(&tr_sel)
        .map(|tr| tr.select(&td_sel).map(element_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect();

    let cell = |row: &[String], col: Option<usize>| -> Option<String> {
        col.and_then(|c| row.get(c)).cloned()
    };
    let needle = key.to_lowercase();
    let key_cells = |row: &Vec<String>| -> Vec<String> {
        [number_col, name_col]
            .into_iter()
            .filter_map(|col| cell(row.as_slice(), col))
            .collect()
    };

    let exact = rows
        .iter()
        .find(|row| key_cells(row).iter().any(|v| v.eq_ignore_ascii_case(key)));
    let row = match exact {
        Some(row) => row,
        None => {
            let mut partial = rows.iter().filter(|row| {
                key_cells(row)
                    .iter()
                    .any(|v| v.to_lowercase().contains(&needle))
            });
            match (partial.next(), partial.next()) {
                (Some(row), None) => row,
                _ => return LookupResult::NotFound,
            }
        }
    };

    let Some(status) = cell(row.as_slice(), Some(status_col)).filter(|s| !s.is_empty()) else {
        return LookupResult::query_error("matched row has no status");
    };
    let mut finding = Finding::new(status);
    if let Some(name) = cell(row.as_slice(), name_col) {
        finding = finding.with_field("name", name);
    }
    if let Some(number) = cell(row.as_slice(), number_col) {
        finding = finding.with_field("registration", number);
    }
    LookupResult::Found(finding)
}
