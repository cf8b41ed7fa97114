//! Filesystem events as seen by the watch loop.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::EventKind;

/// The kinds of directory entry change the loop distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Create,
    Modify,
    Delete,
    /// Access and metadata-only notifications.
    Other,
}

/// A single change to one directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub kind: FileEventKind,
    pub path: PathBuf,
}

impl FileEvent {
    #[must_use]
    pub fn new(kind: FileEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// Split a notify event into one event per affected path.
    ///
    /// Renames become a delete of the old name and a create of the new one.
    #[must_use]
    pub fn from_notify(event: &notify::Event) -> Vec<Self> {
        match event.kind {
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => event
                .paths
                .iter()
                .enumerate()
                .map(|(i, path)| {
                    let kind = if i == 0 {
                        FileEventKind::Delete
                    } else {
                        FileEventKind::Create
                    };
                    Self::new(kind, path.clone())
                })
                .collect(),
            kind => {
                let kind = classify(kind);
                event
                    .paths
                    .iter()
                    .map(|path| Self::new(kind, path.clone()))
                    .collect()
            }
        }
    }

    /// Entry name relative to the watched directory.
    #[must_use]
    pub fn name(&self) -> Option<&OsStr> {
        self.path.file_name()
    }

    /// Whether this is a content change of the entry called `target`.
    #[must_use]
    pub fn is_modify_of(&self, target: &str) -> bool {
        self.kind == FileEventKind::Modify && self.name() == Some(OsStr::new(target))
    }

    /// Whether this event reports the removal of `directory` itself.
    #[must_use]
    pub fn is_removal_of(&self, directory: &Path) -> bool {
        self.kind == FileEventKind::Delete && self.path == directory
    }
}

fn classify(kind: EventKind) -> FileEventKind {
    match kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            FileEventKind::Create
        }
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            FileEventKind::Delete
        }
        EventKind::Modify(ModifyKind::Metadata(_) | ModifyKind::Name(_)) => FileEventKind::Other,
        EventKind::Modify(_) => FileEventKind::Modify,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => FileEventKind::Other,
    }
}
