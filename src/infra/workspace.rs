//! Working-tree documents served from the filesystem.

use crate::application::{ArtifactResolver, DocumentReader};
use crate::domain::{ArtifactUri, DocumentId};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Documents are paths relative to `root`; each document is its own
/// artifact.
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: PathBuf,
}

impl FsWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Workspace over the canonical form of `root`, so absolute paths from
    /// logs and the command line can be made relative to it.
    pub fn open(root: &Path) -> Result<Self> {
        let root = std::fs::canonicalize(root)
            .with_context(|| format!("resolve repository {}", root.display()))?;
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Document id for `path`, relative to the root when it lies inside it.
    pub fn document_for(&self, path: &Path) -> DocumentId {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        DocumentId::new(relative.to_string_lossy().replace('\\', "/"))
    }

    /// Document id for an artifact uri: `file://` uris are percent-decoded
    /// and made relative to the root; plain uris are taken as relative paths.
    pub fn document_for_uri(&self, uri: &ArtifactUri) -> DocumentId {
        let Some(encoded) = uri.as_str().strip_prefix("file://") else {
            return DocumentId::new(uri.as_str().trim_start_matches("./"));
        };
        let decoded = match urlencoding::decode(encoded) {
            Ok(decoded) => decoded.into_owned(),
            Err(err) => {
                log::warn!("Keeping undecodable uri {} as is: {}", uri, err);
                encoded.to_string()
            }
        };
        // file:///C:/src/a.rs names C:/src/a.rs
        let path = match decoded.as_bytes() {
            [b'/', drive, b':', ..] if drive.is_ascii_alphabetic() => &decoded[1..],
            _ => decoded.as_str(),
        };
        self.document_for(Path::new(path))
    }
}

#[async_trait]
impl ArtifactResolver for FsWorkspace {
    async fn resolve_artifact(&self, document: &DocumentId) -> Option<ArtifactUri> {
        let exists = tokio::fs::try_exists(self.root.join(document.as_str()))
            .await
            .unwrap_or(false);
        exists.then(|| ArtifactUri::new(document.as_str()))
    }
}

#[async_trait]
impl DocumentReader for FsWorkspace {
    async fn read_text(&self, document: &DocumentId) -> Result<String> {
        let path = self.root.join(document.as_str());
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("read {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_workspace_reads_and_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/a.rs"), "fn a() {}\n").unwrap();
        let workspace = FsWorkspace::new(dir.path());

        let doc = workspace.document_for(&dir.path().join("src/a.rs"));
        assert_eq!(doc, DocumentId::new("src/a.rs"));
        assert_eq!(workspace.read_text(&doc).await.unwrap(), "fn a() {}\n");
        assert_eq!(
            workspace.resolve_artifact(&doc).await,
            Some(ArtifactUri::new("src/a.rs"))
        );

        let uri = format!("file://{}/src/a%20b.rs", dir.path().display());
        assert_eq!(
            workspace.document_for_uri(&ArtifactUri::new(uri)),
            DocumentId::new("src/a b.rs")
        );
        assert_eq!(
            workspace.document_for_uri(&ArtifactUri::new("./src/a.rs")),
            DocumentId::new("src/a.rs")
        );

        let missing = DocumentId::new("src/b.rs");
        assert!(workspace.resolve_artifact(&missing).await.is_none());
        assert!(workspace.read_text(&missing).await.is_err());
    }

    #[test]
    fn test_open_canonicalizes_relative_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("repo/src")).unwrap();
        let root = std::fs::canonicalize(dir.path().join("repo")).unwrap();

        let workspace = FsWorkspace::open(&dir.path().join("repo/src/..")).unwrap();

        assert_eq!(workspace.root(), root);
        let uri = ArtifactUri::new(format!("file://{}/src/main.c", root.display()));
        assert_eq!(workspace.document_for_uri(&uri), DocumentId::new("src/main.c"));
        assert!(FsWorkspace::open(&dir.path().join("nope")).is_err());
    }
}
