use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("{0} is not valid UTF-8 text")]
    NotUtf8(PathBuf),
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The document the command operates on.
pub trait DocumentHandle: Send {
    fn text(&self) -> &str;

    /// Backing file, if the document has one.
    fn path(&self) -> Option<&Path>;

    /// Replace the whole text, start to end, as a single edit.
    fn replace_full_text(&mut self, text: String) -> Result<(), EditError>;
}

/// An HTML file on disk.
#[derive(Debug)]
pub struct FileDocument {
    path: PathBuf,
    text: String,
}

impl FileDocument {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, OpenError> {
        let path = path.into();
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Self { path, text }),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => Err(OpenError::NotUtf8(path)),
            Err(source) => Err(OpenError::Io { path, source }),
        }
    }
}

impl DocumentHandle for FileDocument {
    fn text(&self) -> &str {
        &self.text
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    /// Written to `<file>.part` first and renamed over the original.
    fn replace_full_text(&mut self, text: String) -> Result<(), EditError> {
        let temp = temp_path(&self.path);
        let io_err = |source| EditError::Io {
            path: self.path.clone(),
            source,
        };
        fs::write(&temp, text.as_bytes()).map_err(io_err)?;
        if let Err(e) = fs::rename(&temp, &self.path) {
            let _ = fs::remove_file(&temp);
            return Err(io_err(e));
        }
        self.text = text;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut o = path.as_os_str().to_owned();
    o.push(".part");
    PathBuf::from(o)
}

/// In-memory document whose owner applies the result itself.
#[derive(Debug, Default)]
pub struct BufferDocument {
    text: String,
    path: Option<PathBuf>,
    edited: bool,
}

impl BufferDocument {
    pub fn new(text: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self {
            text: text.into(),
            path,
            edited: false,
        }
    }

    /// Final text, if an edit was applied.
    pub fn into_edited_text(self) -> Option<String> {
        self.edited.then_some(self.text)
    }
}

impl DocumentHandle for BufferDocument {
    fn text(&self) -> &str {
        &self.text
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn replace_full_text(&mut self, text: String) -> Result<(), EditError> {
        self.text = text;
        self.edited = true;
        Ok(())
    }
}

/// Root of an open workspace; images are saved beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceRoot(PathBuf);

impl WorkspaceRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message for the person who ran the command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// User feedback channel. Advisory only.
pub trait Notifier: Send {
    fn notify(&mut self, notice: Notice);
}

/// Shows notices through the log output.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!("{}", notice.message),
            NoticeLevel::Warning => warn!("{}", notice.message),
            NoticeLevel::Error => error!("{}", notice.message),
        }
    }
}

impl Notifier for Vec<Notice> {
    fn notify(&mut self, notice: Notice) {
        self.push(notice);
    }
}
