//! Bundled asset lookup.
//!
//! The splash only ever reads two fixed paths. Hosts normally register them
//! with [`StaticAssets`] and `include_bytes!`; [`DirAssets`] serves the same
//! paths from disk during development.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

/// Read-only namespace of bundled files.
pub trait AssetSource {
    /// Return the bytes stored at `path`, or `None` if there is no such file.
    fn read(&self, path: &str) -> Option<Cow<'_, [u8]>>;
}

/// Resource paths may be written with a leading `/`; both forms are the
/// same file.
fn normalize(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// In-memory asset table.
///
/// ```
/// # use splash_overlay_glow::{AssetSource, StaticAssets};
/// let assets = StaticAssets::new().with("assets/readme.txt", &b"hello"[..]);
/// assert_eq!(assets.read("/assets/readme.txt").as_deref(), Some(&b"hello"[..]));
/// ```
#[derive(Clone, Debug, Default)]
pub struct StaticAssets {
    files: HashMap<String, Cow<'static, [u8]>>,
}

impl StaticAssets {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, path: impl AsRef<str>, bytes: impl Into<Cow<'static, [u8]>>) -> Self {
        self.insert(path, bytes);
        self
    }

    /// Register `bytes` under `path`, replacing any previous entry.
    pub fn insert(&mut self, path: impl AsRef<str>, bytes: impl Into<Cow<'static, [u8]>>) {
        self.files
            .insert(normalize(path.as_ref()).to_owned(), bytes.into());
    }
}

impl AssetSource for StaticAssets {
    fn read(&self, path: &str) -> Option<Cow<'_, [u8]>> {
        self.files
            .get(normalize(path))
            .map(|bytes| Cow::Borrowed(bytes.as_ref()))
    }
}

/// Assets read from a directory on disk.
#[derive(Clone, Debug)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    /// Serve files below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for DirAssets {
    fn read(&self, path: &str) -> Option<Cow<'_, [u8]>> {
        let full = self.root.join(normalize(path));
        match std::fs::read(&full) {
            Ok(bytes) => Some(Cow::Owned(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                log::warn!("failed to read asset {}: {err}", full.display());
                None
            }
        }
    }
}
