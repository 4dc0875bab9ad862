//! Pagination helpers for provider APIs
//!
//! GitHub paginates with RFC 5988 `Link` headers; requesting one item per
//! page turns the `rel="last"` page number into an item count. Bitbucket
//! Server wraps pages in a JSON envelope with `isLastPage`/`nextPageStart`.

use serde::{Deserialize, Serialize};

/// Largest page Bitbucket Server accepts by default.
pub const BITBUCKET_PAGE_LIMIT: usize = 1000;

/// Page number of the `rel="last"` link in a GitHub `Link` header.
///
/// Returns `None` when there is no last link, which means everything fit on
/// the current page.
pub fn last_page_from_link(link: &str) -> Option<u64> {
    link.split(',')
        .map(str::trim)
        .find(|part| part.contains(r#"rel="last""#))
        .and_then(|part| {
            let url = part.split(';').next()?.trim();
            let url = url.trim_start_matches('<').trim_end_matches('>');
            let query = url.split_once('?')?.1;
            query
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(key, _)| *key == "page")
                .and_then(|(_, value)| value.parse().ok())
        })
}

/// One page of a Bitbucket Server collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,

    /// Items on this page
    #[serde(default)]
    pub size: usize,

    #[serde(default = "default_true")]
    pub is_last_page: bool,

    /// Start offset for the following request
    #[serde(default)]
    pub next_page_start: Option<u64>,
}

fn default_true() -> bool {
    true
}

impl<T> PagedResponse<T> {
    /// Item count on this page, preferring `size` over the values length.
    pub fn page_len(&self) -> u64 {
        self.size.max(self.values.len()) as u64
    }

    /// Offset of the next page, or `None` after the last page.
    pub fn next_start(&self) -> Option<u64> {
        if self.is_last_page {
            None
        } else {
            self.next_page_start
        }
    }
}
