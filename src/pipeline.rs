use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::LocalizeOptions;
use crate::extract::{dedup_preserving_order, remote_image_sources};
use crate::fetch::{FetchError, Fetcher};
use crate::host::{DocumentHandle, EditError, Notice, Notifier, WorkspaceRoot};
use crate::models::{LocalizeEntry, LocalizeReport, SubstitutionEntry};
use crate::naming::image_filename;
use crate::rewrite::rewrite_sources;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("No active editor found.")]
    NoActiveDocument,
    #[error("No workspace folder open.")]
    NoWorkspace,
}

/// Failure of a single image; never aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("saving {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors that stop the command.
#[derive(Debug, thiserror::Error)]
pub enum LocalizeError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    #[error("images directory {0:?} must be a relative path inside the workspace")]
    InvalidImagesDir(String),
    #[error("creating {path}: {source}")]
    ImagesDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to replace image URLs in document: {0}")]
    EditApplication(#[source] EditError),
}

const NOTHING_FOUND: &str = "No remote images found to localize.";
const EDIT_FAILED: &str = "Failed to replace image URLs in document.";
const NOTHING_REWRITTEN: &str = "Downloaded images, but no matching src attributes were rewritten.";

/// Download every remote `<img>` of `document` into the first workspace's
/// images directory and point the document at the local copies.
///
/// Images are fetched one after another. Per-image failures are reported and
/// skipped; files already saved stay on disk even if the final edit fails.
pub async fn localize_images(
    document: Option<&mut dyn DocumentHandle>,
    workspaces: &[WorkspaceRoot],
    fetcher: &dyn Fetcher,
    options: &LocalizeOptions,
    notifier: &mut dyn Notifier,
) -> Result<LocalizeReport, LocalizeError> {
    let Some(document) = document else {
        return Err(precondition(notifier, PreconditionError::NoActiveDocument));
    };
    let Some(workspace) = workspaces.first() else {
        return Err(precondition(notifier, PreconditionError::NoWorkspace));
    };

    if !is_contained_dir(&options.images_dir) {
        notifier.notify(Notice::error(format!(
            "Invalid images directory: {}",
            options.images_dir
        )));
        return Err(LocalizeError::InvalidImagesDir(options.images_dir.clone()));
    }

    let mut sources = remote_image_sources(document.text());
    if options.dedup {
        sources = dedup_preserving_order(sources);
    }
    debug!(count = sources.len(), "remote images found");

    let mut report = LocalizeReport {
        candidates: sources.len(),
        ..LocalizeReport::default()
    };

    let mut entries: Vec<SubstitutionEntry> = Vec::new();
    if !sources.is_empty() {
        // Relative paths resolve against the process directory.
        let cwd = std::env::current_dir().unwrap_or_default();
        let workspace_dir = anchor(workspace.path(), &cwd);
        let images_dir = workspace_dir.join(&options.images_dir);
        tokio::fs::create_dir_all(&images_dir)
            .await
            .map_err(|source| LocalizeError::ImagesDir {
                path: images_dir.clone(),
                source,
            })?;

        let link_base = document
            .path()
            .and_then(Path::parent)
            .map(|dir| anchor(dir, &cwd))
            .unwrap_or(workspace_dir);

        for url in &sources {
            notifier.notify(Notice::info(format!("Processing: {}", url)));
            match download_image(fetcher, url, &images_dir).await {
                Ok((filename, saved)) => {
                    let local_path = relative_link(&saved, &link_base);
                    info!(url = %url, file = %filename, "image saved");
                    notifier.notify(Notice::info(format!("Downloaded: {}", filename)));
                    entries.push(SubstitutionEntry {
                        original_url: url.clone(),
                        local_path,
                    });
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "image skipped");
                    notifier.notify(Notice::warning(format!("Failed to download: {}", url)));
                    report.failures.push(url.clone());
                }
            }
        }
    }

    report.entries = entries.iter().map(LocalizeEntry::from).collect();

    if entries.is_empty() {
        notifier.notify(Notice::info(NOTHING_FOUND));
        return Ok(report);
    }

    let rewrite = rewrite_sources(document.text(), &entries);
    report.replacements = rewrite.replacements;

    if rewrite.replacements == 0 {
        warn!(entries = entries.len(), "no src attribute matched a downloaded url");
        notifier.notify(Notice::warning(NOTHING_REWRITTEN));
        return Ok(report);
    }

    if let Err(e) = document.replace_full_text(rewrite.text) {
        notifier.notify(Notice::error(EDIT_FAILED));
        return Err(LocalizeError::EditApplication(e));
    }
    report.rewritten = true;

    notifier.notify(Notice::info(format!("Localized {} images.", entries.len())));
    Ok(report)
}

fn precondition(notifier: &mut dyn Notifier, err: PreconditionError) -> LocalizeError {
    notifier.notify(Notice::error(err.to_string()));
    err.into()
}

async fn download_image(
    fetcher: &dyn Fetcher,
    url: &str,
    images_dir: &Path,
) -> Result<(String, PathBuf), ImageError> {
    let download = fetcher.fetch(url).await?;
    let filename = image_filename(url, download.content_type.as_deref());
    let path = images_dir.join(&filename);
    tokio::fs::write(&path, &download.bytes)
        .await
        .map_err(|source| ImageError::Save {
            path: path.clone(),
            source,
        })?;
    Ok((filename, path))
}

/// A single relative directory name such as `images` or `assets/img`.
fn is_contained_dir(dir: &str) -> bool {
    let path = Path::new(dir);
    path.components().next().is_some()
        && path.components().all(|c| matches!(c, Component::Normal(_)))
}

/// `path` made absolute against `cwd`, with `.` and `..` folded lexically.
fn anchor(path: &Path, cwd: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Path of `target` as seen from `base`, with forward slashes.
fn relative_link(target: &Path, base: &Path) -> String {
    pathdiff::diff_paths(target, base)
        .unwrap_or_else(|| target.to_path_buf())
        .to_string_lossy()
        .replace('\\', "/")
}
