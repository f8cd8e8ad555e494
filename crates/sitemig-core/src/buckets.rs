//! Destination folders for migrated assets.
//!
//! The legacy site scatters images and documents over a handful of upload
//! folders. On the new site they live in one bucket per (asset kind,
//! language) pair. [`BucketRules`] is that table: an image's first upload
//! folder is swapped for the image bucket of its language. Documents stay
//! in their folder; only those under `/allegati/` move to the attachment
//! bucket.
//!
//! ```rust
//! use sitemig_core::{BucketRules, FileKind, Lang};
//!
//! let rules = BucketRules::default();
//! assert_eq!(
//!     rules.destination("/allegati/foto.jpg", FileKind::Image, Lang::It),
//!     "/it/immagini/migrazione/foto.jpg"
//! );
//! assert_eq!(
//!     rules.destination("/allegati/bando.pdf", FileKind::File, Lang::En),
//!     "/en/attachments/migration/bando.pdf"
//! );
//! ```

use crate::{FileKind, Lang};

/// Declarative (kind, language) → destination prefix table.
#[derive(Debug, Clone)]
pub struct BucketRules {
    source_folders: Vec<&'static str>,
    destinations: Vec<(FileKind, Lang, &'static str)>,
}

impl Default for BucketRules {
    fn default() -> Self {
        Self {
            source_folders: vec!["/allegati/", "/immagini/", "/images/", "/s2magazine/"],
            destinations: vec![
                (FileKind::Image, Lang::It, "/it/immagini/migrazione/"),
                (FileKind::Image, Lang::En, "/en/images/migration/"),
                (FileKind::File, Lang::It, "/it/allegati/migrazione/"),
                (FileKind::File, Lang::En, "/en/attachments/migration/"),
            ],
        }
    }
}

impl BucketRules {
    /// Language-neutral bucket folder of an asset kind.
    #[must_use]
    pub const fn canonical_folder(kind: FileKind) -> &'static str {
        match kind {
            FileKind::Image => "/immagini/",
            FileKind::File => "/allegati/",
        }
    }

    /// Move an image path out of whichever upload folder it came from into
    /// the canonical image folder. Document paths are returned unchanged.
    #[must_use]
    pub fn relocate(&self, path: &str, kind: FileKind) -> String {
        match kind {
            FileKind::Image => self.swap_source_folder(path, Self::canonical_folder(kind)),
            FileKind::File => path.to_string(),
        }
    }

    /// Final, localized destination of an asset path.
    #[must_use]
    pub fn destination(&self, path: &str, kind: FileKind, lang: Lang) -> String {
        let relocated = self.relocate(path, kind);
        match self.prefix(kind, lang) {
            Some(prefix) => relocated.replacen(Self::canonical_folder(kind), prefix, 1),
            None => relocated,
        }
    }

    /// Whether `path` already sits in one of the destination buckets.
    #[must_use]
    pub fn is_localized(&self, path: &str) -> bool {
        self.destinations
            .iter()
            .any(|(_, _, prefix)| path.starts_with(prefix))
    }

    /// Whether a bare path segment names an upload folder.
    #[must_use]
    pub fn is_bucket_folder(&self, segment: &str) -> bool {
        !segment.is_empty()
            && self
                .source_folders
                .iter()
                .any(|folder| folder.trim_matches('/') == segment)
    }

    fn prefix(&self, kind: FileKind, lang: Lang) -> Option<&'static str> {
        self.destinations
            .iter()
            .find(|(k, l, _)| *k == kind && *l == lang)
            .map(|(_, _, prefix)| *prefix)
    }

    fn swap_source_folder(&self, path: &str, folder: &str) -> String {
        let first = self
            .source_folders
            .iter()
            .filter_map(|source| path.find(source).map(|at| (at, *source)))
            .min_by_key(|(at, _)| *at);
        match first {
            Some((at, source)) => {
                let mut out = String::with_capacity(path.len() + folder.len());
                out.push_str(&path[..at]);
                out.push_str(folder);
                out.push_str(&path[at + source.len()..]);
                out
            },
            None => path.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::disallowed_macros)]
mod tests {
    use super::*;

    #[test]
    fn test_image_under_allegati_moves_to_immagini_first() {
        let rules = BucketRules::default();
        assert_eq!(
            rules.relocate("/allegati/foo.jpg", FileKind::Image),
            "/immagini/foo.jpg"
        );
        assert_eq!(
            rules.destination("/allegati/foo.jpg", FileKind::Image, Lang::It),
            "/it/immagini/migrazione/foo.jpg"
        );
        assert_eq!(
            rules.destination("/allegati/foo.jpg", FileKind::Image, Lang::En),
            "/en/images/migration/foo.jpg"
        );
    }

    #[test]
    fn test_other_upload_folders_are_relocated() {
        let rules = BucketRules::default();
        assert_eq!(
            rules.destination("/s2magazine/2010_cover.png", FileKind::Image, Lang::It),
            "/it/immagini/migrazione/2010_cover.png"
        );
        assert_eq!(
            rules.destination("/images/logo.gif", FileKind::Image, Lang::En),
            "/en/images/migration/logo.gif"
        );
    }

    #[test]
    fn test_documents_go_to_attachments() {
        let rules = BucketRules::default();
        assert_eq!(
            rules.destination("/allegati/x_bando.pdf", FileKind::File, Lang::It),
            "/it/allegati/migrazione/x_bando.pdf"
        );
    }

    #[test]
    fn test_documents_outside_allegati_stay_in_place() {
        let rules = BucketRules::default();
        assert_eq!(rules.relocate("/images/bando.pdf", FileKind::File), "/images/bando.pdf");
        assert_eq!(
            rules.destination("/images/bando.pdf", FileKind::File, Lang::It),
            "/images/bando.pdf"
        );
        assert_eq!(
            rules.destination("/allegati/bando.pdf", FileKind::File, Lang::En),
            "/en/attachments/migration/bando.pdf"
        );
    }

    #[test]
    fn test_paths_outside_upload_folders_are_untouched() {
        let rules = BucketRules::default();
        assert_eq!(
            rules.destination("/sezione/foto.jpg", FileKind::Image, Lang::It),
            "/sezione/foto.jpg"
        );
    }

    #[test]
    fn test_only_first_folder_is_swapped() {
        let rules = BucketRules::default();
        assert_eq!(
            rules.relocate("/images/allegati/a.jpg", FileKind::Image),
            "/immagini/allegati/a.jpg"
        );
    }

    #[test]
    fn test_is_localized() {
        let rules = BucketRules::default();
        assert!(rules.is_localized("/it/immagini/migrazione/a.jpg"));
        assert!(rules.is_localized("/en/attachments/migration/a.pdf"));
        assert!(!rules.is_localized("/allegati/a.pdf"));
    }

    #[test]
    fn test_is_bucket_folder() {
        let rules = BucketRules::default();
        assert!(rules.is_bucket_folder("allegati"));
        assert!(rules.is_bucket_folder("s2magazine"));
        assert!(!rules.is_bucket_folder("sezione"));
        assert!(!rules.is_bucket_folder(""));
    }
}
