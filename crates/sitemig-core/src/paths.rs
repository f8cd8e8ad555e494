//! Output path allocation.
//!
//! Every exported page and asset gets a path on the new site. Page paths come
//! from the breadcrumb trail, asset paths from the asset URL; in both cases
//! each segment goes through [`normalize_segment`] and the result is made
//! unique by a [`PathRegistry`].
//!
//! ```rust
//! use sitemig_core::{Lang, PathRegistry};
//! use sitemig_core::paths::breadcrumb_path;
//!
//! let levels = ["Home ", " Sezione ", " Pagina"].map(String::from);
//! let candidate = breadcrumb_path(&levels, Lang::It);
//! assert_eq!(candidate, "/it/sezione/pagina");
//!
//! let mut registry = PathRegistry::default();
//! assert_eq!(registry.allocate(&candidate), "/it/sezione/pagina");
//! assert_eq!(registry.allocate(&candidate), "/it/sezione/pagina_00");
//! ```

use crate::{BucketRules, FileKind, Lang, SiteConfig};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Longest normalized segment, extension excluded.
pub const MAX_SEGMENT_LENGTH: usize = 50;

/// Trailing `.ext` of up to four word characters.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)\.(\w{0,4})$").unwrap());

/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static QUOTES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"['"]"#).unwrap());

/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\W\-]+").unwrap());

/// Normalize free text into a URL-safe path segment.
///
/// Accents are folded, the text is lowercased, anything that is not a word
/// character becomes a single dash and the result is cropped to
/// [`MAX_SEGMENT_LENGTH`] at a dash boundary. A short trailing extension
/// (`.pdf`, `.jpg`, `.2`) is set aside and re-appended untouched.
///
/// ```rust
/// use sitemig_core::paths::normalize_segment;
///
/// assert_eq!(normalize_segment("Attività & Progetti"), "attivita-progetti");
/// assert_eq!(normalize_segment("L'Archivio"), "larchivio");
/// assert_eq!(normalize_segment("Foto Mostra.JPG"), "foto-mostra.jpg");
/// ```
#[must_use]
pub fn normalize_segment(text: &str) -> String {
    let lower = fold_to_ascii(text.trim()).to_lowercase();
    let (base, ext) = match FILENAME_RE.captures(&lower) {
        Some(caps) => (caps[1].to_string(), caps[2].to_string()),
        None => (lower.clone(), String::new()),
    };
    let base = QUOTES_RE.replace_all(&base, "");
    let base = NON_WORD_RE.replace_all(&base, "-");
    let mut out = crop(base.trim_matches('-'), MAX_SEGMENT_LENGTH).to_string();
    if !ext.is_empty() {
        out.push('.');
        out.push_str(&ext);
    }
    out
}

fn fold_to_ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_ascii() {
            out.push(ch);
            continue;
        }
        match ch {
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'Æ' => out.push_str("AE"),
            'œ' => out.push_str("oe"),
            'Œ' => out.push_str("OE"),
            'ø' => out.push('o'),
            'Ø' => out.push('O'),
            'đ' => out.push('d'),
            'Đ' => out.push('D'),
            'ł' => out.push('l'),
            'Ł' => out.push('L'),
            '\u{2018}' | '\u{2019}' | '\u{201c}' | '\u{201d}' | '\u{92}' | '«' | '»' => {},
            c if c.is_alphanumeric() => {},
            _ => out.push(' '),
        }
    }
    out
}

/// Crop at the last dash that keeps the text within `max`; hard cut when
/// there is no such dash.
fn crop(base: &str, max: usize) -> &str {
    if base.len() <= max {
        return base;
    }
    let mut index = base.len();
    while index > max {
        match base[..index].rfind('-') {
            Some(dash) => index = dash,
            None => return &base[..max],
        }
    }
    if index == 0 { base } else { &base[..index] }
}

/// Candidate path of a page from its breadcrumb levels.
///
/// The first level equal to the language's home sentinel (`home`,
/// `home-eng`) becomes the language root.
#[must_use]
pub fn breadcrumb_path(levels: &[String], lang: Lang) -> String {
    let mut segments: Vec<String> = levels.iter().map(|l| normalize_segment(l)).collect();
    if let Some(home) = segments.iter().position(|s| s == lang.home_sentinel()) {
        segments[home] = lang.code().to_string();
    }
    format!("/{}", segments.join("/"))
}

/// Last segment of a path.
#[must_use]
pub fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Registry of allocated output paths.
///
/// Paths are never released: once handed out, a path stays taken for the
/// rest of the run.
#[derive(Debug, Default, Clone)]
pub struct PathRegistry {
    taken: HashSet<String>,
    by_key: HashMap<String, String>,
}

impl PathRegistry {
    /// Reserve `candidate`, or the first free `candidate_NN` variant.
    pub fn allocate(&mut self, candidate: &str) -> String {
        self.reserve(candidate, "")
    }

    /// Like [`allocate`](Self::allocate), memoized by a source key.
    ///
    /// The same key always yields the path of its first allocation, so two
    /// components asking for the same source URL agree on one path.
    pub fn allocate_for(&mut self, key: &str, candidate: &str) -> String {
        self.reserve_for(key, candidate, "")
    }

    /// Like [`allocate_for`](Self::allocate_for) for a file path: `stem`
    /// and `.ext` are reserved together and a suffix goes before the
    /// extension (`foo.jpg`, `foo_00.jpg`).
    pub fn allocate_file_for(&mut self, key: &str, stem: &str, ext: &str) -> String {
        self.reserve_for(key, stem, &format!(".{ext}"))
    }

    fn reserve_for(&mut self, key: &str, stem: &str, ext: &str) -> String {
        if let Some(path) = self.by_key.get(key) {
            return path.clone();
        }
        let path = self.reserve(stem, ext);
        self.by_key.insert(key.to_string(), path.clone());
        path
    }

    fn reserve(&mut self, stem: &str, ext: &str) -> String {
        let mut path = format!("{stem}{ext}");
        let mut n = 0usize;
        while self.taken.contains(&path) {
            path = format!("{stem}_{n:02}{ext}");
            n += 1;
        }
        self.taken.insert(path.clone());
        path
    }

    /// Path previously allocated for `key`.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.by_key.get(key).map(String::as_str)
    }

    /// Whether `path` is already taken.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.taken.contains(path)
    }

    /// Number of allocated paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.taken.len()
    }

    /// Whether nothing has been allocated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}

/// Allocated location of a downloadable asset, before localization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPath {
    /// Unique path in the canonical folder of its kind, with the original
    /// extension, e.g. `/immagini/sub_foto.jpg`.
    pub path: String,
    /// Normalized file name, e.g. `foto.jpg`.
    pub filename: String,
}

/// Allocate the path of an asset from its domain-relative URL path.
///
/// `key` identifies the asset (its final URL without query); asking twice
/// for the same key returns the same allocation. Directory segments and
/// the file stem are normalized, site-name segments dropped, and the stem
/// is folded into its parent folder (`sub/foto` → `sub_foto`) unless the
/// parent is the root or one of the upload folders. The path is moved to
/// the canonical folder of `kind` before it is reserved, so two uploads
/// that land in the same bucket still get distinct paths.
///
/// Returns `None` when the last segment has no extension.
pub fn asset_path(
    domain_path: &str,
    key: &str,
    kind: FileKind,
    registry: &mut PathRegistry,
    site: &SiteConfig,
    rules: &BucketRules,
) -> Option<AssetPath> {
    let decoded = domain_path.replace("%20", " ");
    let (dirs, file) = decoded.rsplit_once('/').unwrap_or(("", decoded.as_str()));
    let (stem, ext) = file.rsplit_once('.')?;
    let stem = normalize_segment(stem);

    let mut segments: Vec<String> = dirs
        .split('/')
        .map(normalize_segment)
        .filter(|s| !site.dropped_segments.contains(s))
        .map(|s| {
            if s == Lang::It.home_sentinel() {
                Lang::It.code().to_string()
            } else if s == Lang::En.home_sentinel() {
                Lang::En.code().to_string()
            } else {
                s
            }
        })
        .collect();

    let fold = segments
        .last()
        .is_some_and(|parent| !parent.is_empty() && !rules.is_bucket_folder(parent));
    match segments.last_mut() {
        Some(parent) if fold => {
            parent.push('_');
            parent.push_str(&stem);
        },
        _ => segments.push(stem.clone()),
    }

    let relocated = rules.relocate(&segments.join("/"), kind);
    Some(AssetPath {
        path: registry.allocate_file_for(key, &relocated, ext),
        filename: format!("{stem}.{ext}"),
    })
}
