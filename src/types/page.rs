//! Paginated list responses

use serde::Deserialize;

/// One page of a list endpoint: `{next, previous, count, results}`
#[derive(Debug, Clone, Deserialize)]
pub struct Page<R> {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
    /// Missing `results` is an empty page
    #[serde(default = "Vec::new")]
    pub results: Vec<R>,
}

impl<R> Default for Page<R> {
    fn default() -> Self {
        Self {
            next: None,
            previous: None,
            count: None,
            results: Vec::new(),
        }
    }
}

/// A list endpoint may answer with a page object or, when pagination is
/// disabled, a bare JSON array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<R> {
    Page(Page<R>),
    Plain(Vec<R>),
}

impl<R> ListResponse<R> {
    pub fn into_page(self) -> Page<R> {
        match self {
            ListResponse::Page(page) => page,
            ListResponse::Plain(results) => Page {
                count: Some(results.len() as u64),
                results,
                ..Page::default()
            },
        }
    }
}
