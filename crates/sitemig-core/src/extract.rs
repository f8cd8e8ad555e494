//! Structural extraction from legacy pages.
//!
//! The legacy templates are stable enough that a handful of CSS selectors
//! (see [`Selectors`](crate::config::Selectors)) locate everything the
//! exporter needs. Extraction is synchronous and returns owned data, so a
//! parsed document never lives across an `await`.

use crate::link::{absolutize, absolutize_in};
use crate::news::NewsRecord;
use crate::{Error, PageType, Result, SiteConfig};
use scraper::{ElementRef, Html, Selector};

/// Compiled structural selectors.
#[derive(Debug, Clone)]
pub struct PageSelectors {
    menu_section: Selector,
    menu_children: Selector,
    anchor: Selector,
    breadcrumb: Selector,
    title: Selector,
    description: Vec<Selector>,
    body: Selector,
    listing: Selector,
    language_switch: Selector,
    subpage_container: Selector,
    subpage_links: Selector,
    news_article: Selector,
    news_title: Selector,
    news_image: Selector,
    paragraph: Selector,
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Config(format!("Invalid selector '{css}': {e}")))
}

impl PageSelectors {
    /// Compile the configured selectors.
    pub fn compile(site: &SiteConfig) -> Result<Self> {
        let s = &site.selectors;
        Ok(Self {
            menu_section: parse_selector(&s.menu_section)?,
            menu_children: parse_selector(&s.menu_children)?,
            anchor: parse_selector("a")?,
            breadcrumb: parse_selector(&s.breadcrumb)?,
            title: parse_selector(&s.title)?,
            description: s
                .description
                .iter()
                .map(|css| parse_selector(css))
                .collect::<Result<_>>()?,
            body: parse_selector(&s.body)?,
            listing: parse_selector(&s.listing)?,
            language_switch: parse_selector(&s.language_switch)?,
            subpage_container: parse_selector(&s.subpage_container)?,
            subpage_links: parse_selector("a, img")?,
            news_article: parse_selector(&s.news_article)?,
            news_title: parse_selector(&s.news_title)?,
            news_image: parse_selector(&s.news_image)?,
            paragraph: parse_selector("p")?,
        })
    }
}

/// A first-level menu section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSection {
    /// Section label.
    pub title: String,
    /// Second-level entries.
    pub children: Vec<MenuLink>,
}

/// A second-level menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLink {
    /// Absolute URL.
    pub url: String,
    /// Link label.
    pub title: String,
}

/// What a content page is made of, before path allocation and link
/// rewriting.
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    /// Page title.
    pub title: Option<String>,
    /// Concatenated lead texts.
    pub description: String,
    /// Outer HTML of the body container.
    pub body: Option<String>,
    /// Breadcrumb levels, as displayed.
    pub breadcrumb: Option<Vec<String>>,
    /// Whether the page is a plain page or an item listing.
    pub page_type: PageType,
    /// Raw target of the language switch, when the page has one.
    pub language_switch: Option<String>,
    /// Absolute URLs of links and images in the subpage container.
    pub child_links: Vec<String>,
    /// The page only says the translation is not available.
    pub missing_translation: bool,
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Read the first-level menu of a home page.
///
/// Sections without a children container are ignored, as are entries whose
/// link is empty or a placeholder.
#[must_use]
pub fn parse_menu(html: &str, selectors: &PageSelectors, site: &SiteConfig) -> Vec<MenuSection> {
    let document = Html::parse_document(html);
    document
        .select(&selectors.menu_section)
        .filter_map(|section| {
            let container = section.select(&selectors.menu_children).next()?;
            let title = section
                .select(&selectors.anchor)
                .next()
                .map(text_of)
                .unwrap_or_default();
            let children = container
                .select(&selectors.anchor)
                .filter_map(|link| {
                    let url = absolutize(link.value().attr("href").unwrap_or_default(), site);
                    (!url.is_empty()).then(|| MenuLink {
                        url,
                        title: text_of(link),
                    })
                })
                .collect();
            Some(MenuSection { title, children })
        })
        .collect()
}

/// Extract the structural parts of a content page.
#[must_use]
pub fn extract_page(
    html: &str,
    page_url: &str,
    selectors: &PageSelectors,
    site: &SiteConfig,
) -> ExtractedPage {
    let document = Html::parse_document(html);
    let first = |selector: &Selector| document.select(selector).next();

    let description = selectors
        .description
        .iter()
        .filter_map(|selector| first(selector).map(text_of))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let breadcrumb = first(&selectors.breadcrumb).map(|trail| {
        text_of(trail)
            .split(site.selectors.breadcrumb_separator.as_str())
            .map(|level| level.trim().to_string())
            .collect()
    });

    let page_type = if first(&selectors.listing).is_some() {
        PageType::Summary
    } else {
        PageType::Ordinary
    };

    let child_links = first(&selectors.subpage_container)
        .map(|container| {
            container
                .select(&selectors.subpage_links)
                .filter_map(|el| el.value().attr("href").or_else(|| el.value().attr("src")))
                .map(|raw| absolutize_in(raw, page_url, site))
                .filter(|url| !url.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let missing_translation = !site.missing_translation_marker.is_empty()
        && document
            .root_element()
            .text()
            .collect::<String>()
            .contains(&site.missing_translation_marker);

    ExtractedPage {
        title: first(&selectors.title).map(text_of),
        description,
        body: first(&selectors.body).map(|body| body.html()),
        breadcrumb,
        page_type,
        language_switch: first(&selectors.language_switch)
            .map(|link| link.value().attr("href").unwrap_or_default().to_string()),
        child_links,
        missing_translation,
    }
}

/// Extract a news article from the flat news site.
///
/// Returns `None` when the page has no article container.
#[must_use]
pub fn extract_news(
    html: &str,
    page_url: &str,
    selectors: &PageSelectors,
    site: &SiteConfig,
) -> Option<NewsRecord> {
    let document = Html::parse_document(html);
    let article = document.select(&selectors.news_article).next()?;
    let title = article
        .select(&selectors.news_title)
        .next()
        .map(text_of)
        .unwrap_or_default();
    let image = document.select(&selectors.news_image).next();
    let img_src = image
        .and_then(|img| img.value().attr("src"))
        .map(|src| absolutize_in(src, page_url, site))
        .unwrap_or_default();
    let img_alt = image
        .and_then(|img| img.value().attr("alt"))
        .unwrap_or_default()
        .to_string();
    let text = article
        .select(&selectors.paragraph)
        .map(text_of)
        .filter(|p| !p.is_empty())
        .collect();

    Some(NewsRecord {
        title,
        img_src,
        img_alt,
        text,
        url: page_url.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::disallowed_macros)]
mod tests {
    use super::*;

    const HOME: &str = r##"<html><body>
        <div class="divprinc"><a href="#">Chi siamo</a>
          <div class="divsec">
            <a href="/home/storia.html">Storia</a>
            <a href="#">Vuoto</a>
            <a href="www.fondazionezeri.unibo.it/home/statuto.html">Statuto</a>
          </div>
        </div>
        <div class="divprinc"><a href="#">Senza figli</a></div>
        <div class="divprinc"><a href="#">Attività</a>
          <div class="divsec"><a href="/home/mostre.html">Mostre</a></div>
        </div>
    </body></html>"##;

    const PAGE: &str = r##"<html><body>
        <div class="bread">Home &raquo; Chi siamo &raquo; Storia</div>
        <a id="ling2" href="/home_eng/history.html">English</a>
        <div class="titolo"> La storia </div>
        <div class="preocchiello">Dal 1999</div>
        <div class="sottotitolo">La fondazione</div>
        <div class="testo"><p>Testo <a href="/home/statuto.html">statuto</a></p></div>
        <table class="centro"><tr><td>
          <a href="/home/sub.html">Sub</a>
          <img src="/allegati/foto.jpg">
          <a href="dettaglio.html">Relativo</a>
          <a href="#">Nulla</a>
        </td></tr></table>
    </body></html>"##;

    fn selectors(site: &SiteConfig) -> PageSelectors {
        PageSelectors::compile(site).unwrap()
    }

    #[test]
    fn test_invalid_selector_is_config_error() {
        let mut site = SiteConfig::default();
        site.selectors.body = "div[".into();
        assert!(matches!(PageSelectors::compile(&site), Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_menu() {
        let site = SiteConfig::default();
        let menu = parse_menu(HOME, &selectors(&site), &site);
        assert_eq!(menu.len(), 2);
        assert_eq!(menu[0].title, "Chi siamo");
        let urls: Vec<_> = menu[0].children.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            [
                "http://www.fondazionezeri.unibo.it/home/storia.html",
                "http://www.fondazionezeri.unibo.it/home/statuto.html",
            ]
        );
        assert_eq!(menu[1].title, "Attività");
        assert_eq!(menu[1].children[0].title, "Mostre");
    }

    #[test]
    fn test_extract_page_parts() {
        let site = SiteConfig::default();
        let url = "http://www.fondazionezeri.unibo.it/home/storia.html";
        let page = extract_page(PAGE, url, &selectors(&site), &site);
        assert_eq!(page.title.as_deref(), Some("La storia"));
        assert_eq!(page.description, "Dal 1999 La fondazione");
        assert_eq!(
            page.breadcrumb.unwrap(),
            ["Home", "Chi siamo", "Storia"].map(String::from)
        );
        assert_eq!(page.page_type, PageType::Ordinary);
        assert_eq!(page.language_switch.as_deref(), Some("/home_eng/history.html"));
        assert!(page.body.unwrap().starts_with("<div class=\"testo\">"));
        assert!(!page.missing_translation);
        assert_eq!(
            page.child_links,
            [
                "http://www.fondazionezeri.unibo.it/home/sub.html",
                "http://www.fondazionezeri.unibo.it/allegati/foto.jpg",
                "http://www.fondazionezeri.unibo.it/home/dettaglio.html",
            ]
        );
    }

    #[test]
    fn test_listing_marks_summary() {
        let site = SiteConfig::default();
        let html = r#"<div class="titolo">Notizie</div><div class="elenco"></div>"#;
        let page = extract_page(html, "http://x/", &selectors(&site), &site);
        assert_eq!(page.page_type, PageType::Summary);
        assert!(page.breadcrumb.is_none());
        assert!(page.language_switch.is_none());
        assert!(page.child_links.is_empty());
    }

    #[test]
    fn test_missing_translation_marker() {
        let site = SiteConfig::default();
        let html = "<div class=\"testo\">Avviso: la pagina non &egrave; disponibile</div>";
        let page = extract_page(html, "http://x/", &selectors(&site), &site);
        assert!(page.missing_translation);
    }

    #[test]
    fn test_extract_news() {
        let site = SiteConfig::default();
        let html = r#"<html><body>
            <img class="art-postheader" src="/images/news/a.jpg" alt="Copertina">
            <div class="item-page">
              <h2 class="art-postheader"> Concerto </h2>
              <p>Primo paragrafo.</p><p>  </p><p>Secondo.</p>
            </div>
        </body></html>"#;
        let news = extract_news(html, "http://www.fondazionezeri.unibo.it/n?id=1", &selectors(&site), &site)
            .unwrap();
        assert_eq!(news.title, "Concerto");
        assert_eq!(news.img_src, "http://www.fondazionezeri.unibo.it/images/news/a.jpg");
        assert_eq!(news.img_alt, "Copertina");
        assert_eq!(news.text, ["Primo paragrafo.", "Secondo."]);
    }

    #[test]
    fn test_extract_news_without_article() {
        let site = SiteConfig::default();
        assert!(extract_news("<p>x</p>", "http://x/", &selectors(&site), &site).is_none());
    }
}
