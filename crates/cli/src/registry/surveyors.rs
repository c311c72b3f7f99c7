//! Surveyors board register: search by person, then by company.

use regcheck_recon::{Finding, IdentifierSpec, LookupResult, Registry};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use scraper::{ElementRef, Html};

use super::common::{element_text, selector, Endpoint, FetchClient, FetchError};

pub const SURVEYORS_BASE: &str = "https://www.sbq.com.au";

const SEARCH_PATH: &str = "find-a-surveyor/";
const REGISTERED: &str = "Registered";

pub struct SurveyorsRegistry {
    endpoint: Endpoint,
    client: FetchClient,
}

impl SurveyorsRegistry {
    pub fn new(endpoint: Endpoint) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html"));
        let client = FetchClient::new("surveyors", endpoint.timeout, headers, false)?;
        Ok(Self { endpoint, client })
    }

    pub fn with_base_url(base_url: String) -> Result<Self, FetchError> {
        Self::new(Endpoint::new(base_url))
    }
}

impl Registry for SurveyorsRegistry {
    fn name(&self) -> &str {
        "surveyors"
    }

    fn keywords(&self) -> &[&'static str] {
        &["surveyor"]
    }

    fn identifier(&self) -> IdentifierSpec {
        IdentifierSpec::NameOrCompany {
            label: "Surveyor Name",
        }
    }

    fn header_sentinel(&self) -> Option<&str> {
        Some("surname")
    }

    fn lookup(&self, key: &str) -> LookupResult {
        let url = self.endpoint.url(SEARCH_PATH);
        match self.client.get_text(&url, &[("name", key)]) {
            Ok(html) => parse_results(&html),
            Err(e) => e.into(),
        }
    }
}

/// Read the first `.search-results` entry: name, registration types and
/// contact rows.
pub(crate) fn parse_results(html: &str) -> LookupResult {
    let doc = Html::parse_document(html);
    let sels = (
        selector(".search-results"),
        selector("h4"),
        selector("div.types span"),
        selector("tr"),
        selector("td"),
    );
    let (Ok(results_sel), Ok(heading_sel), Ok(types_sel), Ok(rows_sel), Ok(cells_sel)) = sels else {
        return LookupResult::query_error("surveyor selectors failed to parse");
    };

    let Some(entry) = doc.select(&results_sel).next() else {
        return LookupResult::NotFound;
    };
    let Some(name) = entry.select(&heading_sel).next().map(first_line) else {
        return LookupResult::NotFound;
    };
    if name.is_empty() {
        return LookupResult::query_error("surveyor entry has an empty name");
    }

    let mut finding = Finding::new(REGISTERED).with_field("name", name);

    let types: Vec<String> = entry
        .select(&types_sel)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect();
    if !types.is_empty() {
        finding = finding.with_field("types", types.join(", "));
    }

    for row in entry.select(&rows_sel) {
        let mut tds = row.select(&cells_sel);
        let (Some(label), Some(value)) = (tds.next(), tds.next()) else {
            continue;
        };
        let key = element_text(label).to_lowercase();
        let value = value
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        if matches!(key.as_str(), "phone" | "email" | "address") && !value.is_empty() {
            finding = finding.with_field(&key, value);
        }
    }

    LookupResult::Found(finding)
}

/// Heading text up to the first line break, whitespace collapsed.
fn first_line(h4: ElementRef<'_>) -> String {
    h4.text()
        .next()
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const RESULT_PAGE: &str = r#"<html><body>
<div class="search-results">
  <h4>  Jo
      Smith <br/> Registered Surveyor</h4>
  <div class="types"><span>Cadastral</span><span>Engineering</span></div>
  <table>
    <tr><td>Phone </td><td>07 3000 0000</td></tr>
    <tr><td>Email </td><td>jo@example.test</td></tr>
    <tr><td>Address</td><td>1 Main St<br/>Brisbane QLD</td></tr>
  </table>
</div>
</body></html>"#;

    #[test]
    fn test_parse_result_entry() {
        let LookupResult::Found(f) = parse_results(RESULT_PAGE) else {
            panic!("expected Found");
        };
        assert_eq!(f.status, "Registered");
        assert_eq!(f.fields["name"], "Jo Smith");
        assert_eq!(f.fields["types"], "Cadastral, Engineering");
        assert_eq!(f.fields["phone"], "07 3000 0000");
        assert_eq!(f.fields["email"], "jo@example.test");
        assert_eq!(f.fields["address"], "1 Main St, Brisbane QLD");
    }

    #[test]
    fn test_no_results() {
        assert_eq!(
            parse_results("<html><body><p>No surveyors found</p></body></html>"),
            LookupResult::NotFound
        );
        assert_eq!(
            parse_results(r#"<div class="search-results"></div>"#),
            LookupResult::NotFound
        );
    }

    #[test]
    fn test_name_then_company_over_http() {
        let server = MockServer::start();
        let by_name = server.mock(|when, then| {
            when.method(GET)
                .path("/find-a-surveyor/")
                .query_param("name", "Al Brown");
            then.status(200).body("<html><body>No results</body></html>");
        });
        let by_company = server.mock(|when, then| {
            when.method(GET)
                .path("/find-a-surveyor/")
                .query_param("name", "Acme Surveying");
            then.status(200).body(RESULT_PAGE);
        });

        let registry = SurveyorsRegistry::with_base_url(server.base_url()).unwrap();
        let result = registry.resolve(&regcheck_recon::Identifier::NameOrCompany {
            name: "Al Brown".into(),
            company: "Acme Surveying".into(),
        });

        by_name.assert();
        by_company.assert();
        assert!(matches!(result, LookupResult::Found(_)));
    }
}
