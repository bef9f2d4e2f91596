//! Files seen during a resolution session.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::span::{FileId, Span};

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// File contents, when the session read them itself.
    pub text: Option<Arc<str>>,
}

/// Maps [`FileId`]s to paths and text.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    files: BTreeMap<FileId, SourceFile>,
    next: u32,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file under a fresh id.
    pub fn add(&mut self, path: impl Into<PathBuf>, text: Option<Arc<str>>) -> FileId {
        let id = FileId(self.next);
        self.insert(id, path, text);
        id
    }

    /// Register a file under an id it already carries.
    pub fn insert(&mut self, id: FileId, path: impl Into<PathBuf>, text: Option<Arc<str>>) {
        self.next = self.next.max(id.0 + 1);
        self.files.insert(
            id,
            SourceFile {
                path: path.into(),
                text,
            },
        );
    }

    pub fn get(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(&id)
    }

    pub fn path(&self, id: FileId) -> Option<&Path> {
        self.files.get(&id).map(|f| f.path.as_path())
    }

    /// `path:line:column` for a span, falling back to the file id.
    pub fn describe(&self, span: &Span) -> String {
        match self.path(span.file) {
            Some(path) => format!("{}:{}", path.display(), span),
            None => format!("{}:{}", span.file, span),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_continue_after_inserted_root() {
        let mut map = SourceMap::new();
        map.insert(FileId(4), "/src/Kconfig", None);
        let next = map.add("/src/arch/Kconfig", None);
        assert_eq!(next, FileId(5));
        assert_eq!(map.path(FileId(4)), Some(Path::new("/src/Kconfig")));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn describe_uses_path() {
        let mut map = SourceMap::new();
        let id = map.add("drivers/Kconfig", None);
        let span = Span {
            file: id,
            start: 0,
            end: 1,
            line: 3,
            column: 5,
        };
        assert_eq!(map.describe(&span), "drivers/Kconfig:3:5");
    }
}
