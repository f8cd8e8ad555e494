//! Small shared enums: languages, file kinds and content-page types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two languages the legacy site is published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    /// Italian, the primary language; every record has an Italian side.
    It,
    /// English, optional.
    En,
}

impl Lang {
    /// Language code, also the root folder of the localized tree.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::It => "it",
            Self::En => "en",
        }
    }

    /// Normalized breadcrumb label of the language's home page.
    ///
    /// Breadcrumbs start from the home page; this segment is replaced by
    /// [`Lang::code`] when building localized paths.
    #[must_use]
    pub const fn home_sentinel(self) -> &'static str {
        match self {
            Self::It => "home",
            Self::En => "home-eng",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Kind of a downloadable asset, detected by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    /// gif, png, jpg, jpeg.
    Image,
    /// pdf, doc, docx.
    File,
}

const IMAGE_EXTENSIONS: &[&str] = &["gif", "png", "jpg", "jpeg"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

impl FileKind {
    /// Detect the asset kind of a URL or path, ignoring any query string.
    ///
    /// ```rust
    /// use sitemig_core::FileKind;
    ///
    /// assert_eq!(FileKind::detect("/a/foto.JPG?x=1"), Some(FileKind::Image));
    /// assert_eq!(FileKind::detect("/a/bando.pdf"), Some(FileKind::File));
    /// assert_eq!(FileKind::detect("/a/pagina.html"), None);
    /// ```
    #[must_use]
    pub fn detect(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let last = path.rsplit('/').next().unwrap_or(path);
        let (_, ext) = last.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Image)
        } else if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::File)
        } else {
            None
        }
    }
}

/// Content type tag of a crawled page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageType {
    /// A regular page.
    #[default]
    #[serde(rename = "contenutoordinario")]
    Ordinary,
    /// A page listing other items.
    #[serde(rename = "automaticsummary")]
    Summary,
}
