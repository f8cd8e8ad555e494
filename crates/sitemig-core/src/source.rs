//! Staging of legacy news metadata for the import pipeline.
//!
//! The legacy CMS exported one JSON metadata file per news item. Staging
//! reads them in a stable order, parses their dates, downloads each item's
//! lead image and produces import items preceded by the news folder.

use crate::{Error, Fetcher, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// Folder every staged news item is placed in.
pub const NEWS_FOLDER: &str = "/news";

/// Date format of the legacy metadata.
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

mod legacy_date {
    use super::DATE_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, de};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, DATE_FORMAT).map_err(de::Error::custom)
    }
}

/// Categories of a news item: the legacy export writes either one name or
/// a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum Categories {
    One(String),
    Many(Vec<String>),
}

impl From<Categories> for Vec<String> {
    fn from(categories: Categories) -> Self {
        match categories {
            Categories::One(name) if name.is_empty() => Self::new(),
            Categories::One(name) => vec![name],
            Categories::Many(names) => names,
        }
    }
}

/// Image reference in the metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageRef {
    /// Absolute image URL.
    pub src: String,
}

/// One legacy news metadata file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewsMetadata {
    /// Legacy id, becomes the last path segment.
    pub id: String,
    #[serde(default = "no_categories")]
    category: Categories,
    /// Whether the item was featured on the home page.
    #[serde(default)]
    pub featured: bool,
    /// Title.
    pub title: String,
    /// Body HTML.
    #[serde(default)]
    pub text: String,
    /// Publication date.
    #[serde(with = "legacy_date")]
    pub pub_date: NaiveDateTime,
    /// Last modification date.
    #[serde(with = "legacy_date")]
    pub mod_date: NaiveDateTime,
    /// Candidate lead images, in order of preference.
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

const fn no_categories() -> Categories {
    Categories::Many(Vec::new())
}

impl NewsMetadata {
    /// Category names.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.category.clone().into()
    }
}

/// Downloaded lead image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageData {
    /// Last segment of the image URL.
    pub filename: String,
    /// Base64-encoded bytes.
    pub data: String,
}

/// A staged news item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsItem {
    /// Path on the new site.
    #[serde(rename = "_path")]
    pub path: String,
    /// Category names.
    pub subjects: Vec<String>,
    /// Featured flag.
    pub featured: bool,
    /// Title.
    pub title: String,
    /// Body HTML.
    pub text: String,
    /// Publication date.
    pub pub_date: NaiveDateTime,
    /// Last modification date.
    pub mod_date: NaiveDateTime,
    /// Lead image, when one could be downloaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageData>,
}

/// One item handed to the import pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "_type")]
pub enum ImportItem {
    /// Container of the staged items.
    Folder {
        /// Path on the new site.
        #[serde(rename = "_path")]
        path: String,
        /// Folder title.
        title: String,
    },
    /// A news item.
    #[serde(rename = "News Item")]
    NewsItem(NewsItem),
}

/// A directory of legacy news metadata files.
#[derive(Debug)]
pub struct NewsSource {
    dir: PathBuf,
}

impl NewsSource {
    /// Open a metadata directory. A missing directory is an error.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(Error::NotFound(format!(
                "Directory {} does not exist",
                dir.display()
            )));
        }
        Ok(Self { dir })
    }

    /// Metadata files, walked depth-first with entries sorted by name.
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        walk_sorted(&self.dir, &mut files)?;
        Ok(files)
    }

    /// Stage every readable metadata file.
    ///
    /// The news folder comes first. Files that do not parse are skipped,
    /// as are images that fail to download: the first image that does
    /// download becomes the lead image.
    #[instrument(skip_all, fields(dir = %self.dir.display()))]
    pub async fn stage(&self, fetcher: &Fetcher) -> Result<Vec<ImportItem>> {
        let mut items = vec![ImportItem::Folder {
            path: NEWS_FOLDER.to_string(),
            title: "News".to_string(),
        }];
        for file in self.files()? {
            let raw = fs::read_to_string(&file)?;
            let metadata: NewsMetadata = match serde_json::from_str(&raw) {
                Ok(metadata) => metadata,
                Err(err) => {
                    warn!("Skipping malformed metadata {}: {}", file.display(), err);
                    continue;
                },
            };
            let image = lead_image(fetcher, &metadata.images).await;
            items.push(ImportItem::NewsItem(NewsItem {
                path: format!("{NEWS_FOLDER}/{}", metadata.id),
                subjects: metadata.categories(),
                featured: metadata.featured,
                title: metadata.title,
                text: metadata.text,
                pub_date: metadata.pub_date,
                mod_date: metadata.mod_date,
                image,
            }));
        }
        debug!("Staged {} items", items.len());
        Ok(items)
    }
}

fn walk_sorted(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    let (dirs, plain): (Vec<_>, Vec<_>) = entries.into_iter().partition(|p| p.is_dir());
    files.extend(plain);
    for sub in dirs {
        walk_sorted(&sub, files)?;
    }
    Ok(())
}

async fn lead_image(fetcher: &Fetcher, images: &[ImageRef]) -> Option<ImageData> {
    for image in images {
        match fetcher.download(&image.src).await {
            Ok(bytes) => {
                return Some(ImageData {
                    filename: image.src.rsplit('/').next().unwrap_or_default().to_string(),
                    data: STANDARD.encode(bytes),
                });
            },
            Err(err) => warn!("Found a broken image in '{}': {}", image.src, err),
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::disallowed_macros)]
mod tests {
    use super::*;
    use crate::SiteConfig;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn metadata(id: &str, images: &[String]) -> String {
        serde_json::json!({
            "id": id,
            "category": "Concerti",
            "featured": true,
            "title": format!("Notizia {id}"),
            "text": "<p>Testo</p>",
            "pub_date": "2013-05-02 10:30:00",
            "mod_date": "2013-05-03 08:00:00",
            "images": images.iter().map(|src| serde_json::json!({"src": src})).collect::<Vec<_>>(),
        })
        .to_string()
    }

    #[test]
    fn test_open_missing_directory_is_fatal() {
        let err = NewsSource::open("/nonexistent/news-export").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_metadata_dates_and_categories() {
        let parsed: NewsMetadata = serde_json::from_str(&metadata("7", &[])).unwrap();
        assert_eq!(parsed.pub_date.to_string(), "2013-05-02 10:30:00");
        assert_eq!(parsed.categories(), ["Concerti"]);

        let many = r#"{"id": "8", "category": ["a", "b"], "title": "t",
            "pub_date": "2013-01-01 00:00:00", "mod_date": "2013-01-01 00:00:00"}"#;
        let parsed: NewsMetadata = serde_json::from_str(many).unwrap();
        assert_eq!(parsed.categories(), ["a", "b"]);
        assert!(!parsed.featured);
    }

    #[test]
    fn test_bad_date_fails_to_parse() {
        let bad = r#"{"id": "8", "title": "t", "pub_date": "02/05/2013", "mod_date": "2013-01-01 00:00:00"}"#;
        assert!(serde_json::from_str::<NewsMetadata>(bad).is_err());
    }

    #[test]
    fn test_files_are_walked_sorted() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::create_dir(dir.path().join("a"))?;
        fs::write(dir.path().join("b.json"), "{}")?;
        fs::write(dir.path().join("a").join("z.json"), "{}")?;
        fs::write(dir.path().join("0.json"), "{}")?;
        let source = NewsSource::open(dir.path())?;
        let names: Vec<_> = source
            .files()?
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["0.json", "b.json", "a/z.json"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_stage_skips_broken_images_and_malformed_files() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/ok.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"JPEG".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new()?;
        let uri = server.uri();
        fs::write(
            dir.path().join("01.json"),
            metadata("uno", &[format!("{uri}/img/broken.jpg"), format!("{uri}/img/ok.jpg")]),
        )?;
        fs::write(dir.path().join("02.json"), "not json")?;
        fs::write(dir.path().join("03.json"), metadata("tre", &[format!("{uri}/img/broken.jpg")]))?;

        let fetcher = Fetcher::new(&SiteConfig::default().with_base_url(&uri)?)?;
        let items = NewsSource::open(dir.path())?.stage(&fetcher).await?;

        assert_eq!(items.len(), 3);
        assert_eq!(
            items[0],
            ImportItem::Folder {
                path: "/news".into(),
                title: "News".into()
            }
        );
        let ImportItem::NewsItem(first) = &items[1] else {
            panic!("expected a news item");
        };
        assert_eq!(first.path, "/news/uno");
        assert_eq!(first.subjects, ["Concerti"]);
        let image = first.image.as_ref().unwrap();
        assert_eq!(image.filename, "ok.jpg");
        assert_eq!(STANDARD.decode(&image.data)?, b"JPEG");

        let ImportItem::NewsItem(third) = &items[2] else {
            panic!("expected a news item");
        };
        assert_eq!(third.title, "Notizia tre");
        assert!(third.image.is_none());

        let json = serde_json::to_value(&items[2])?;
        assert_eq!(json["_type"], "News Item");
        assert_eq!(json["pub_date"], "2013-05-02T10:30:00");
        assert!(json.get("image").is_none());
        Ok(())
    }
}
