//! Link rewriting inside exported page bodies.
//!
//! A body fragment is processed in three passes: the link and image
//! targets are collected, each internal target is resolved (following
//! redirects) and mapped to its location on the new site, then the fragment
//! is streamed through `lol_html` once more to apply the replacements and
//! drop presentational attributes.
//!
//! Where links end up:
//!
//! | Target                          | Replacement                               |
//! |---------------------------------|-------------------------------------------|
//! | page                            | domain-relative final path, query kept    |
//! | image (`img src` or `a href`)   | allocated asset path in the language bucket |
//! | document (`a href` to pdf/doc)  | allocated asset path, not localized       |
//! | redirects off the site          | absolute final URL                        |
//!
//! Targets that already point at a rewritten location are left alone, so
//! rewriting an already rewritten fragment changes nothing.

use crate::link::{absolutize_in, split_query};
use crate::paths::asset_path;
use crate::{BucketRules, CrawlState, FileKind, Fetcher, Lang, Result, SiteConfig};
use lol_html::{RewriteStrSettings, element, rewrite_str};
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::debug;

/// Attributes removed from every element.
const STRIPPED_ATTRIBUTES: [&str; 4] = ["onclick", "align", "id", "style"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LinkTag {
    Anchor,
    Image,
}

#[derive(Debug, Clone)]
struct Replacement {
    value: String,
    internal: bool,
}

/// Rewrites internal links of body fragments.
pub struct ContentRewriter<'a> {
    fetcher: &'a Fetcher,
    site: &'a SiteConfig,
    rules: &'a BucketRules,
}

impl<'a> ContentRewriter<'a> {
    /// Create a rewriter.
    #[must_use]
    pub const fn new(fetcher: &'a Fetcher, site: &'a SiteConfig, rules: &'a BucketRules) -> Self {
        Self {
            fetcher,
            site,
            rules,
        }
    }

    /// Rewrite a fragment for the given language.
    ///
    /// `page_url` is the page the fragment comes from, used for
    /// document-relative links. Asset paths are allocated in
    /// `state.paths`, keyed by final URL, so a later file record for the
    /// same asset gets the same path.
    pub async fn rewrite(
        &self,
        fragment: &str,
        lang: Lang,
        page_url: &str,
        state: &mut CrawlState,
    ) -> Result<String> {
        if fragment.is_empty() {
            return Ok(String::new());
        }
        let links = collect_links(fragment)?;
        let mut replacements = HashMap::with_capacity(links.len());
        for (tag, raw) in links {
            if let Some(replacement) = self.replacement(&raw, lang, page_url, state).await {
                debug!("Rewriting '{}' to '{}'", raw, replacement.value);
                replacements.insert((tag, raw), replacement);
            }
        }
        apply(fragment, &replacements)
    }

    async fn replacement(
        &self,
        raw: &str,
        lang: Lang,
        page_url: &str,
        state: &mut CrawlState,
    ) -> Option<Replacement> {
        let url = absolutize_in(&raw.replace("&amp;", "&"), page_url, self.site);
        if url.is_empty() || !self.site.is_internal(&url) {
            return None;
        }
        if self.already_rewritten(self.site.strip_base(&url), state) {
            return None;
        }

        let final_url = match self.fetcher.resolve(&url, state).await {
            Some(resolved) => resolved,
            None => url,
        };
        if !self.site.is_internal(&final_url) {
            return Some(Replacement {
                value: final_url,
                internal: false,
            });
        }

        let path = match self.site.strip_base(&final_url) {
            "" => "/",
            path => path,
        };
        let (bare, query) = split_query(path);
        let located = match FileKind::detect(bare) {
            None => bare.to_string(),
            Some(kind) => {
                let key = split_query(&final_url).0;
                let asset =
                    asset_path(bare, key, kind, &mut state.paths, self.site, self.rules)?;
                match kind {
                    FileKind::Image => self.rules.destination(&asset.path, kind, lang),
                    FileKind::File => asset.path,
                }
            },
        };
        state.mark_rewritten(&located);

        let value = match query {
            Some(query) => format!("{located}?{query}"),
            None => located,
        };
        Some(Replacement {
            value,
            internal: true,
        })
    }

    fn already_rewritten(&self, path: &str, state: &CrawlState) -> bool {
        let bare = split_query(path).0;
        let allocated_page = FileKind::detect(bare).is_none() && state.paths.contains(bare);
        self.rules.is_localized(bare) || allocated_page || state.is_rewritten(bare)
    }
}

/// Distinct link targets of a fragment, in document order.
fn collect_links(fragment: &str) -> Result<Vec<(LinkTag, String)>> {
    let found = RefCell::new(Vec::<(LinkTag, String)>::new());
    let push = |tag: LinkTag, value: Option<String>| {
        if let Some(value) = value {
            let mut found = found.borrow_mut();
            if !found.iter().any(|(t, v)| *t == tag && *v == value) {
                found.push((tag, value));
            }
        }
    };
    rewrite_str(
        fragment,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("a[href]", |el| {
                    push(LinkTag::Anchor, el.get_attribute("href"));
                    Ok(())
                }),
                element!("img[src]", |el| {
                    push(LinkTag::Image, el.get_attribute("src"));
                    Ok(())
                }),
            ],
            strict: false,
            ..RewriteStrSettings::default()
        },
    )?;
    Ok(found.into_inner())
}

fn apply(fragment: &str, replacements: &HashMap<(LinkTag, String), Replacement>) -> Result<String> {
    let output = rewrite_str(
        fragment,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("*", |el| {
                    for attribute in STRIPPED_ATTRIBUTES {
                        el.remove_attribute(attribute);
                    }
                    Ok(())
                }),
                element!("img", |el| {
                    el.remove_attribute("name");
                    let replacement = el
                        .get_attribute("src")
                        .and_then(|src| replacements.get(&(LinkTag::Image, src)));
                    if let Some(replacement) = replacement {
                        el.set_attribute("src", &replacement.value)?;
                    }
                    Ok(())
                }),
                element!("a[href]", |el| {
                    let replacement = el
                        .get_attribute("href")
                        .and_then(|href| replacements.get(&(LinkTag::Anchor, href)));
                    if let Some(replacement) = replacement {
                        el.set_attribute("href", &replacement.value)?;
                        if replacement.internal {
                            el.remove_attribute("target");
                        }
                    }
                    Ok(())
                }),
            ],
            strict: false,
            ..RewriteStrSettings::default()
        },
    )?;
    Ok(output)
}
