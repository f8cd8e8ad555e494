//! Records produced by the exporter.
//!
//! Each record becomes one JSON file. The `type` tag tells the importer how
//! to treat it; the sequence number (`count`) is not part of the record and
//! is attached by the writer when the record reaches disk.

use crate::paths::AssetPath;
use crate::{BucketRules, FileKind, Lang, PageType};
use serde::{Deserialize, Serialize};

/// Any exported record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExportRecord {
    /// Language root or first-level menu section.
    #[serde(rename = "first_level")]
    Folder(FolderRecord),
    /// Crawled content page.
    #[serde(rename = "content")]
    Content(PageRecord),
    /// Downloadable image or document.
    #[serde(rename = "file")]
    File(FileRecord),
}

impl ExportRecord {
    /// Italian path, which names the output file.
    #[must_use]
    pub fn it_path(&self) -> &str {
        match self {
            Self::Folder(folder) => &folder.it.path,
            Self::Content(page) => &page.it.path,
            Self::File(file) => &file.it.path,
        }
    }

    /// Value of the `type` tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Folder(_) => "first_level",
            Self::Content(_) => "content",
            Self::File(_) => "file",
        }
    }
}

/// Folder placeholder for a language root or a menu section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRecord {
    /// Always `Folder`.
    pub ct: String,
    /// Italian folder.
    pub it: FolderEntry,
    /// English folder, absent when the English menu is shorter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<FolderEntry>,
}

impl FolderRecord {
    /// Build a folder record.
    #[must_use]
    pub fn new(it: FolderEntry, en: Option<FolderEntry>) -> Self {
        Self {
            ct: "Folder".to_string(),
            it,
            en,
        }
    }
}

/// One language side of a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    /// Normalized id.
    pub id: String,
    /// Unique path.
    pub path: String,
    /// Display title.
    pub title: String,
}

/// A crawled content page with its optional English counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Content type.
    pub ct: PageType,
    /// Italian rendition.
    pub it: LocalizedPage,
    /// English rendition, when the page has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<LocalizedPage>,
}

/// One language rendition of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedPage {
    /// Last normalized breadcrumb segment.
    pub id: String,
    /// Unique path on the new site.
    pub path: String,
    /// Page title.
    pub title: String,
    /// Concatenated lead texts.
    pub description: String,
    /// Body HTML with internal links rewritten.
    pub content: String,
    /// Final URL the page was fetched from.
    pub url: String,
}

/// A downloadable asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Source URL.
    pub url: String,
    /// Normalized file name.
    pub filename: String,
    /// Image or document.
    pub ct: FileKind,
    /// Italian location.
    pub it: FilePath,
    /// English location.
    pub en: FilePath,
}

/// Localized location of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePath {
    /// Path on the new site.
    pub path: String,
}

impl FileRecord {
    /// Build a file record from an allocated asset path, placing it in the
    /// bucket of each language.
    #[must_use]
    pub fn from_asset(url: &str, kind: FileKind, asset: &AssetPath, rules: &BucketRules) -> Self {
        Self {
            url: url.to_string(),
            filename: asset.filename.clone(),
            ct: kind,
            it: FilePath {
                path: rules.destination(&asset.path, kind, Lang::It),
            },
            en: FilePath {
                path: rules.destination(&asset.path, kind, Lang::En),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::disallowed_macros)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(path: &str) -> LocalizedPage {
        LocalizedPage {
            id: "pagina".into(),
            path: path.into(),
            title: "Pagina".into(),
            description: String::new(),
            content: "<div class=\"testo\"></div>".into(),
            url: "http://x/home/pagina.html".into(),
        }
    }

    #[test]
    fn test_content_record_without_en_omits_field() {
        let record = ExportRecord::Content(PageRecord {
            ct: PageType::Ordinary,
            it: page("/it/pagina"),
            en: None,
        });
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "content");
        assert_eq!(value["ct"], "contenutoordinario");
        assert_eq!(value["it"]["path"], "/it/pagina");
        assert!(value.get("en").is_none());
        assert_eq!(record.it_path(), "/it/pagina");
    }

    #[test]
    fn test_folder_record_shape() {
        let record = ExportRecord::Folder(FolderRecord::new(
            FolderEntry {
                id: "it".into(),
                path: "/it".into(),
                title: "it".into(),
            },
            Some(FolderEntry {
                id: "en".into(),
                path: "/en".into(),
                title: "en".into(),
            }),
        ));
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "type": "first_level",
                "ct": "Folder",
                "it": {"id": "it", "path": "/it", "title": "it"},
                "en": {"id": "en", "path": "/en", "title": "en"},
            })
        );
    }

    #[test]
    fn test_folder_without_english_section_omits_en() {
        let record = ExportRecord::Folder(FolderRecord::new(
            FolderEntry {
                id: "archivio".into(),
                path: "/it/archivio".into(),
                title: "Archivio".into(),
            },
            None,
        ));
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("en").is_none());
        let back: ExportRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_file_record_from_asset() {
        let asset = AssetPath {
            path: "/immagini/mostra_foto.jpg".into(),
            filename: "foto.jpg".into(),
        };
        let record = FileRecord::from_asset(
            "http://x/allegati/mostra/foto.jpg",
            FileKind::Image,
            &asset,
            &BucketRules::default(),
        );
        assert_eq!(record.it.path, "/it/immagini/migrazione/mostra_foto.jpg");
        assert_eq!(record.en.path, "/en/images/migration/mostra_foto.jpg");
        let value = serde_json::to_value(ExportRecord::File(record)).unwrap();
        assert_eq!(value["type"], "file");
        assert_eq!(value["ct"], "Image");
    }

    #[test]
    fn test_records_deserialize_by_tag() {
        let record: ExportRecord = serde_json::from_value(json!({
            "type": "file",
            "url": "http://x/a.pdf",
            "filename": "a.pdf",
            "ct": "File",
            "it": {"path": "/it/allegati/migrazione/a.pdf"},
            "en": {"path": "/en/attachments/migration/a.pdf"},
        }))
        .unwrap();
        match record {
            ExportRecord::File(file) => assert_eq!(file.ct, FileKind::File),
            other => panic!("expected file record, got {}", other.kind()),
        }
    }
}
