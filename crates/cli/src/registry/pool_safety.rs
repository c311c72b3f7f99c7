//! QBCC pool safety inspector register (JSON).

use chrono::{NaiveDate, NaiveDateTime};
use regcheck_recon::registry::LICENSE;
use regcheck_recon::{Finding, IdentifierSpec, LookupResult, Registry};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::Value;

use super::common::{Endpoint, FetchClient, FetchError};

pub const POOL_SAFETY_BASE: &str =
    "https://www.onlineservices.qbcc.qld.gov.au/OnlineLicenceSearch/api/PoolSafetyInspector";

const SEARCH_PATH: &str = "search";
const ACTIVE: &str = "Active";

pub struct PoolSafetyRegistry {
    endpoint: Endpoint,
    client: FetchClient,
}

impl PoolSafetyRegistry {
    pub fn new(endpoint: Endpoint) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = FetchClient::new("pool-safety", endpoint.timeout, headers, false)?;
        Ok(Self { endpoint, client })
    }

    pub fn with_base_url(base_url: String) -> Result<Self, FetchError> {
        Self::new(Endpoint::new(base_url))
    }
}

impl Registry for PoolSafetyRegistry {
    fn name(&self) -> &str {
        "pool-safety"
    }

    fn keywords(&self) -> &[&'static str] {
        &["qbcc", "pool", "safety"]
    }

    fn identifier(&self) -> IdentifierSpec {
        IdentifierSpec::Column {
            column: LICENSE,
            label: "Licence Number",
        }
    }

    fn lookup(&self, key: &str) -> LookupResult {
        let url = self.endpoint.url(SEARCH_PATH);
        match self.client.get_json(&url, &[("licenceNumber", key)]) {
            Ok(body) => parse_inspectors(&body, key, chrono::Local::now().date_naive()),
            Err(e) => e.into(),
        }
    }
}

/// Pick the inspector record for `key` and classify its expiry. Records
/// for other licence numbers never answer for `key`.
pub(crate) fn parse_inspectors(body: &Value, key: &str, today: NaiveDate) -> LookupResult {
    let records = match body
        .as_array()
        .or_else(|| body.get("results").and_then(Value::as_array))
        .or_else(|| body.get("data").and_then(Value::as_array))
    {
        Some(records) => records,
        None => return LookupResult::query_error("pool safety response has no record list"),
    };

    let Some(record) = records.iter().find(|r| {
        r.get("licenceNumber")
            .and_then(value_text)
            .is_some_and(|n| n.eq_ignore_ascii_case(key))
    }) else {
        return LookupResult::NotFound;
    };

    let Some(raw_expiry) = record.get("expiryDate").and_then(Value::as_str) else {
        return LookupResult::query_error("pool safety record has no expiryDate");
    };
    let Some(expiry) = parse_expiry(raw_expiry) else {
        return LookupResult::query_error(format!("unreadable expiryDate {raw_expiry:?}"));
    };

    let mut finding = Finding::new(ACTIVE).with_field("expiry", expiry.format("%Y-%m-%d").to_string());
    if let Some(name) = record.get("name").and_then(Value::as_str) {
        finding = finding.with_field("name", name.trim());
    }
    if let Some(number) = record.get("licenceNumber").and_then(value_text) {
        finding = finding.with_field("licence", number);
    }

    if is_expired(expiry, today) {
        LookupResult::Expired(finding)
    } else {
        LookupResult::Found(finding)
    }
}

/// Expired once the expiry date is strictly before today.
pub(crate) fn is_expired(expiry: NaiveDate, today: NaiveDate) -> bool {
    expiry < today
}

fn parse_expiry(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%d/%m/%Y") {
        return Some(d);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

fn value_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
