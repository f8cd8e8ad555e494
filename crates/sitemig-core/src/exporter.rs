//! Recursive bilingual export of the legacy site.
//!
//! The crawl starts from the two home pages, emits a folder per first-level
//! menu section and then walks every second-level page depth-first. The
//! walk uses an explicit LIFO worklist: visiting a page schedules its
//! record beneath the visits of its child links, so a page is written after
//! its whole subtree. Termination comes from the fetcher, which never hands
//! out the same URL twice.

use crate::extract::{ExtractedPage, MenuSection, PageSelectors, extract_page, parse_menu};
use crate::link::{absolutize_in, split_query};
use crate::paths::{asset_path, breadcrumb_path, last_segment, normalize_segment};
use crate::writer::RecordWriter;
use crate::{
    BucketRules, ContentRewriter, CrawlState, Error, ExportRecord, Fetcher, FileKind, FileRecord,
    FolderEntry, FolderRecord, Lang, LocalizedPage, PageRecord, Result, SiteConfig,
};
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// Where the crawl is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    /// Reading the two home menus.
    RootMenu,
    /// Emitting first-level section folders.
    FirstLevelSections,
    /// Walking the pages below a section.
    SubpageRecursion,
    /// Finished.
    Done,
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RootMenu => "root-menu",
            Self::FirstLevelSections => "first-level-sections",
            Self::SubpageRecursion => "subpage-recursion",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// One unit of pending work.
#[derive(Debug)]
pub enum WorkItem {
    /// Fetch and extract a URL.
    Visit(String),
    /// Write a finished record.
    Emit(Box<ExportRecord>),
}

/// Pagination of the crawl roots (second-level pages, or sitemap news).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Roots skipped before the first one processed.
    pub offset: usize,
    /// Maximum number of roots processed; `0` means no limit.
    pub limit: usize,
}

impl ExportOptions {
    /// Whether the root at `index` (in crawl order) is processed.
    #[must_use]
    pub const fn includes(&self, index: usize) -> bool {
        index >= self.offset && (self.limit == 0 || index - self.offset < self.limit)
    }

    /// Restrict an iterator to the configured window.
    pub fn window<I: Iterator>(&self, items: I) -> std::iter::Take<std::iter::Skip<I>> {
        let limit = if self.limit == 0 { usize::MAX } else { self.limit };
        items.skip(self.offset).take(limit)
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    /// Records written.
    pub written: usize,
    /// Records skipped because of an excluded prefix.
    pub skipped: usize,
    /// URLs fetched.
    pub visited: usize,
}

/// Drives a full site export.
pub struct Exporter<'a> {
    fetcher: &'a Fetcher,
    site: &'a SiteConfig,
    selectors: PageSelectors,
    rules: BucketRules,
    options: ExportOptions,
    phase: CrawlPhase,
}

impl<'a> Exporter<'a> {
    /// Create an exporter; fails if a configured selector does not parse.
    pub fn new(fetcher: &'a Fetcher, site: &'a SiteConfig, options: ExportOptions) -> Result<Self> {
        Ok(Self {
            fetcher,
            site,
            selectors: PageSelectors::compile(site)?,
            rules: BucketRules::default(),
            options,
            phase: CrawlPhase::RootMenu,
        })
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> CrawlPhase {
        self.phase
    }

    fn enter(&mut self, phase: CrawlPhase) {
        debug!("Entering phase {}", phase);
        self.phase = phase;
    }

    /// Run the export, writing every record as soon as it is complete.
    ///
    /// Only an unreachable Italian home page or a write failure stops the
    /// run; everything else is logged and skipped.
    #[instrument(skip_all, fields(base_url = %self.site.base_url))]
    pub async fn run(
        &mut self,
        state: &mut CrawlState,
        writer: &mut RecordWriter,
    ) -> Result<ExportSummary> {
        self.enter(CrawlPhase::RootMenu);
        let (menu_it, menu_en) = self.root_menus(state).await?;
        let root = FolderRecord::new(
            language_root(Lang::It, state),
            Some(language_root(Lang::En, state)),
        );
        writer.write(&ExportRecord::Folder(root), state)?;

        let mut index = 0usize;
        for (position, section) in menu_it.iter().enumerate() {
            self.enter(CrawlPhase::FirstLevelSections);
            let record = Self::section_folder(section, menu_en.get(position), state);
            writer.write(&ExportRecord::Folder(record), state)?;

            self.enter(CrawlPhase::SubpageRecursion);
            for child in &section.children {
                let included = self.options.includes(index);
                index += 1;
                if included {
                    self.crawl(&child.url, state, writer).await?;
                }
            }
        }

        self.enter(CrawlPhase::Done);
        let summary = ExportSummary {
            written: writer.written(),
            skipped: writer.skipped(),
            visited: state.visited.len(),
        };
        info!(
            "Export finished: {} records written, {} skipped, {} URLs visited",
            summary.written, summary.skipped, summary.visited
        );
        Ok(summary)
    }

    async fn root_menus(
        &self,
        state: &mut CrawlState,
    ) -> Result<(Vec<MenuSection>, Vec<MenuSection>)> {
        let home = self.fetcher.fetch(&self.site.base_url, state).await.ok_or_else(|| {
            Error::NotFound(format!("Home page '{}' could not be fetched", self.site.base_url))
        })?;
        let menu_it = parse_menu(&home.text(), &self.selectors, self.site);

        let en_home = self.site.en_home_url();
        let menu_en = match self.fetcher.fetch(&en_home, state).await {
            Some(page) => parse_menu(&page.text(), &self.selectors, self.site),
            None => {
                warn!("English home page '{}' unavailable, folders will be Italian only", en_home);
                Vec::new()
            },
        };
        info!("Menu has {} sections ({} in English)", menu_it.len(), menu_en.len());
        Ok((menu_it, menu_en))
    }

    fn section_folder(
        it: &MenuSection,
        en: Option<&MenuSection>,
        state: &mut CrawlState,
    ) -> FolderRecord {
        let entry = |section: &MenuSection, lang: Lang, state: &mut CrawlState| {
            let id = normalize_segment(&section.title);
            FolderEntry {
                path: state.paths.allocate(&format!("/{}/{id}", lang.code())),
                id,
                title: section.title.clone(),
            }
        };
        let it_entry = entry(it, Lang::It, state);
        let en_entry = en.map(|section| entry(section, Lang::En, state));
        FolderRecord::new(it_entry, en_entry)
    }

    /// Walk everything reachable from one second-level page.
    #[instrument(level = "debug", skip(self, state, writer))]
    async fn crawl(
        &self,
        url: &str,
        state: &mut CrawlState,
        writer: &mut RecordWriter,
    ) -> Result<()> {
        let mut worklist = vec![WorkItem::Visit(url.to_string())];
        while let Some(item) = worklist.pop() {
            match item {
                WorkItem::Emit(record) => {
                    writer.write(&record, state)?;
                },
                WorkItem::Visit(url) => {
                    if FileKind::detect(&url).is_some() {
                        if let Some(record) = self.file_record(&url, state).await {
                            worklist.push(WorkItem::Emit(Box::new(ExportRecord::File(record))));
                        }
                        continue;
                    }
                    let Some((record, children)) = self.content_record(&url, state).await else {
                        continue;
                    };
                    worklist.push(WorkItem::Emit(Box::new(ExportRecord::Content(record))));
                    worklist.extend(children.into_iter().rev().map(WorkItem::Visit));
                },
            }
        }
        Ok(())
    }

    /// Build the record of a downloadable asset.
    ///
    /// The path is allocated under the asset's final URL, so a body that
    /// already linked the asset and this record agree on it.
    async fn file_record(&self, url: &str, state: &mut CrawlState) -> Option<FileRecord> {
        let kind = FileKind::detect(url)?;
        let page = self.fetcher.fetch(url, state).await?;
        let key = split_query(&page.url).0;
        let Some(asset) = asset_path(
            self.site.strip_base(key),
            key,
            kind,
            &mut state.paths,
            self.site,
            &self.rules,
        ) else {
            warn!("Cannot derive a file name for '{}'", page.url);
            return None;
        };
        let record = FileRecord::from_asset(&page.url, kind, &asset, &self.rules);
        self.add_redirects(&[url, page.url.as_str()], &record.it.path, state);
        Some(record)
    }

    /// Build the record of a content page, with the internal links found in
    /// its subpage container.
    async fn content_record(
        &self,
        url: &str,
        state: &mut CrawlState,
    ) -> Option<(PageRecord, Vec<String>)> {
        let page = self.fetcher.fetch(url, state).await?;
        let extracted = extract_page(&page.text(), &page.url, &self.selectors, self.site);
        let it = self.localize(&extracted, Lang::It, &page.url, state).await?;
        self.add_redirects(&[url, page.url.as_str()], &it.path, state);

        let en = self.english(&extracted, &page.url, state).await;
        let children = extracted
            .child_links
            .into_iter()
            .filter(|link| self.site.is_internal(link))
            .collect();

        debug!("Extracted '{}' as {}", page.url, it.path);
        Some((
            PageRecord {
                ct: extracted.page_type,
                it,
                en,
            },
            children,
        ))
    }

    /// English rendition of a page, reached through its language switch.
    async fn english(
        &self,
        it_page: &ExtractedPage,
        it_url: &str,
        state: &mut CrawlState,
    ) -> Option<LocalizedPage> {
        let Some(raw) = it_page.language_switch.as_deref() else {
            warn!("Missing EN link for {}", it_url);
            return None;
        };
        let en_url = absolutize_in(raw, it_url, self.site);
        if en_url.is_empty() {
            warn!("Empty EN link for {}", it_url);
            return None;
        }
        let Some(page) = self.fetcher.fetch(&en_url, state).await else {
            warn!("EN page of {} unavailable", it_url);
            return None;
        };
        let extracted = extract_page(&page.text(), &page.url, &self.selectors, self.site);
        if extracted.missing_translation {
            warn!("Missing translation for {}", it_url);
            return None;
        }
        let en = self.localize(&extracted, Lang::En, &page.url, state).await?;
        self.add_redirects(&[en_url.as_str(), page.url.as_str()], &en.path, state);
        Some(en)
    }

    /// Rewrite the body of one language rendition and allocate its path.
    ///
    /// A rendition without breadcrumb or title, or whose body cannot be
    /// rewritten, is skipped.
    async fn localize(
        &self,
        extracted: &ExtractedPage,
        lang: Lang,
        page_url: &str,
        state: &mut CrawlState,
    ) -> Option<LocalizedPage> {
        let (Some(breadcrumb), Some(title)) = (&extracted.breadcrumb, &extracted.title) else {
            warn!("Skipping '{}': no breadcrumb or title", page_url);
            return None;
        };
        let rewriter = ContentRewriter::new(self.fetcher, self.site, &self.rules);
        let body = extracted.body.as_deref().unwrap_or_default();
        let content = match rewriter.rewrite(body, lang, page_url, state).await {
            Ok(content) => content,
            Err(err) => {
                warn!("Skipping '{}': {}", page_url, err);
                return None;
            },
        };
        let candidate = breadcrumb_path(breadcrumb, lang);
        Some(LocalizedPage {
            id: last_segment(&candidate).to_string(),
            path: state.paths.allocate(&candidate),
            title: title.clone(),
            description: extracted.description.clone(),
            content,
            url: page_url.to_string(),
        })
    }

    fn add_redirects(&self, urls: &[&str], dest: &str, state: &mut CrawlState) {
        for url in urls {
            if !self.site.is_internal(url) {
                continue;
            }
            let source = self.site.strip_base(url);
            if !source.is_empty() {
                state.redirects.insert(source, dest);
            }
        }
    }
}

fn language_root(lang: Lang, state: &mut CrawlState) -> FolderEntry {
    FolderEntry {
        id: lang.code().to_string(),
        path: state.paths.allocate(&format!("/{}", lang.code())),
        title: lang.code().to_string(),
    }
}
