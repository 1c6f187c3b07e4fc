//! crates/legalyze_core/src/links.rs
//!
//! Builds and reads the links that carry a document identifier between views.
//!
//! `contract_id` is the canonical query parameter. `job` and `id` are still
//! accepted when reading a link but are deprecated; new links only ever use
//! the canonical name.

use crate::domain::{DocumentId, JobId};
use tracing::warn;
use url::{form_urlencoded, Url};

/// The query parameter written into every results link.
pub const CANONICAL_ID_PARAM: &str = "contract_id";

/// Older parameter names, in the order they are consulted.
pub const DEPRECATED_ID_PARAMS: [&str; 2] = ["job", "id"];

/// Schemes read as links. Anything else with a colon is a bare identifier.
const LINK_SCHEMES: [&str; 3] = ["http", "https", "file"];

/// The view shown once an analysis job completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsView {
    pub job_id: JobId,
}

impl ResultsView {
    pub fn new(job_id: JobId) -> Self {
        Self { job_id }
    }

    pub fn link(&self, results_page: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(self.job_id.as_str().as_bytes()).collect();
        format!("{}?{}={}", results_page, CANONICAL_ID_PARAM, encoded)
    }
}

/// Resolves a document identifier from a results link, a relative
/// `page?query` string, or a bare identifier.
pub fn resolve_document_id(link: &str) -> Option<DocumentId> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }
    if let Some(url) = Url::parse(link).ok().filter(|url| LINK_SCHEMES.contains(&url.scheme())) {
        return document_id_from_query(url.query().unwrap_or_default());
    }
    if let Some((_, rest)) = link.split_once('?') {
        let query = rest.split('#').next().unwrap_or_default();
        return document_id_from_query(query);
    }
    Some(DocumentId::new(link))
}

/// Looks up the identifier in a raw query string. Empty values count as absent.
pub fn document_id_from_query(query: &str) -> Option<DocumentId> {
    let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    let lookup = |name: &str| {
        pairs
            .iter()
            .find(|(key, value)| key == name && !value.trim().is_empty())
            .map(|(_, value)| value.trim().to_string())
    };

    if let Some(value) = lookup(CANONICAL_ID_PARAM) {
        return Some(DocumentId::new(value));
    }
    for alias in DEPRECATED_ID_PARAMS {
        if let Some(value) = lookup(alias) {
            warn!(
                "Query parameter '{}' is deprecated, use '{}' instead.",
                alias, CANONICAL_ID_PARAM
            );
            return Some(DocumentId::new(value));
        }
    }
    None
}

/// Public link for sharing an analysis.
pub fn share_link(origin: &str, document_id: &DocumentId) -> String {
    format!("{}/shared/{}", origin.trim_end_matches('/'), document_id)
}
