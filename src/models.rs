use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::host::Notice;

/// Literal `src` value of an `<img>` element, exactly as the parser reported it.
pub type ImageReference = String;

/// Body and content-type hint of one fetched image.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// One successfully localized image: the URL found in the document and the
/// path that replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionEntry {
    pub original_url: String,
    pub local_path: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LocalizeReport {
    /// Remote image references found in the document.
    pub candidates: usize,
    pub entries: Vec<LocalizeEntry>,
    pub failures: Vec<String>,
    /// Attribute occurrences rewritten in the document.
    pub replacements: usize,
    /// Whether a new document text was applied.
    pub rewritten: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalizeEntry {
    pub url: String,
    pub file: String,
    pub local_path: String,
}

impl From<&SubstitutionEntry> for LocalizeEntry {
    fn from(entry: &SubstitutionEntry) -> Self {
        let file = entry
            .local_path
            .rsplit('/')
            .next()
            .unwrap_or(&entry.local_path)
            .to_string();
        Self {
            url: entry.original_url.clone(),
            file,
            local_path: entry.local_path.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LocalizeRequest {
    pub text: Option<String>,
    pub document_path: Option<String>,
    #[serde(default)]
    pub workspace_roots: Vec<String>,
    pub images_dir: Option<String>,
    #[serde(default)]
    pub dedup: bool,
}

#[derive(Debug, Serialize)]
pub struct LocalizeResponse {
    /// Rewritten document text, or `None` when the document was left as is.
    pub text: Option<String>,
    pub localized: usize,
    pub notices: Vec<Notice>,
    pub report: LocalizeReport,
}
