use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};

use super::common::{Endpoint, FetchClient, FetchError};

/// A register whose search is a page: submit a query, get the result HTML.
pub trait SearchPage {
    fn submit_search(&self, query: &str) -> Result<String, FetchError>;
}

/// Search page driven by a plain form POST.
pub struct HttpFormSearch {
    client: FetchClient,
    url: String,
    field: &'static str,
    fixed: &'static [(&'static str, &'static str)],
}

impl HttpFormSearch {
    pub fn new(
        source: &'static str,
        endpoint: &Endpoint,
        path: &str,
        field: &'static str,
        fixed: &'static [(&'static str, &'static str)],
    ) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html"));
        let client = FetchClient::new(source, endpoint.timeout, headers, true)?;
        Ok(Self {
            client,
            url: endpoint.url(path),
            field,
            fixed,
        })
    }
}

impl SearchPage for HttpFormSearch {
    fn submit_search(&self, query: &str) -> Result<String, FetchError> {
        let mut form: Vec<(&str, &str)> = self.fixed.to_vec();
        form.push((self.field, query));
        self.client.post_form(&self.url, &form)
    }
}
