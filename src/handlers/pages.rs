//! Static pages, the directory listing and raw file reads.

use crate::errors::ErrorKind;
use std::{
    io,
    path::{Component, Path, PathBuf},
};
use tokio::fs;

/// Placeholder in `root.html` replaced by the directory listing.
pub const LINKS_PLACEHOLDER: &str = "${links}";

/// Page served for the empty target.
pub const ROOT_PAGE: &str = "root.html";

/// Page served for `random`.
pub const RANDOM_PAGE: &str = "index.html";

/// Filesystem side of the page endpoints.
#[derive(Debug, Clone)]
pub struct Pages {
    www_dir: PathBuf,
    file_root: PathBuf,
}

impl Pages {
    pub fn new<W: Into<PathBuf>, F: Into<PathBuf>>(www_dir: W, file_root: F) -> Self {
        Self {
            www_dir: www_dir.into(),
            file_root: file_root.into(),
        }
    }

    /// `root.html` with its links placeholder replaced by the listing of the
    /// static directory.
    pub async fn root(&self) -> Result<String, ErrorKind> {
        let page = fs::read(self.www_dir.join(ROOT_PAGE)).await?;
        let links = build_file_list(&self.www_dir).await?;

        Ok(String::from_utf8_lossy(&page).replace(LINKS_PLACEHOLDER, &links))
    }

    /// `index.html`, unmodified.
    pub async fn random(&self) -> Result<Vec<u8>, ErrorKind> {
        Ok(fs::read(self.www_dir.join(RANDOM_PAGE)).await?)
    }

    /// Raw bytes of `path`, resolved against the file root.
    ///
    /// # Errors
    /// [`ErrorKind::FileNotFound`] carrying `path` as requested when the file
    /// does not exist or `path` tries to leave the file root.
    pub async fn file(&self, path: &str) -> Result<Vec<u8>, ErrorKind> {
        let not_found = || ErrorKind::FileNotFound(path.to_owned());

        if path.is_empty() || !stays_inside(Path::new(path)) {
            return Err(not_found());
        }

        match fs::read(self.file_root.join(path)).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(not_found()),
            Err(err) => Err(err.into()),
        }
    }
}

#[inline]
fn stays_inside(path: &Path) -> bool {
    path.components()
        .all(|part| matches!(part, Component::Normal(_) | Component::CurDir))
}

/// Lists the entries of `dir` as `<ul>\n<li>a</li><li>b</li></ul>\n`, or
/// `No files in directory` when it is empty.
///
/// Entries are sorted by name so the page is stable across platforms.
pub async fn build_file_list(dir: &Path) -> Result<String, ErrorKind> {
    let mut entries = fs::read_dir(dir).await?;
    let mut names = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }

    if names.is_empty() {
        return Ok("No files in directory".to_owned());
    }

    names.sort_unstable();

    let mut list = String::from("<ul>\n");
    for name in &names {
        list.push_str("<li>");
        list.push_str(name);
        list.push_str("</li>");
    }
    list.push_str("</ul>\n");

    Ok(list)
}
