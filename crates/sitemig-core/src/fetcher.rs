use crate::config::is_under;
use crate::{CrawlState, Error, Result, SiteConfig};
use encoding_rs::Encoding;
use regex::bytes::Regex;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Client, Response, redirect};
use std::sync::LazyLock;
use tracing::{debug, info, instrument, warn};

/// Redirect hops followed before a link is considered broken.
const MAX_REDIRECTS: usize = 10;

/// Bytes of a body searched for a `<meta charset>` declaration.
const META_SNIFF_LENGTH: usize = 1024;

/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static META_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?\s*([a-z0-9_:.-]+)"#).unwrap()
});

/// HTTP client for the legacy site, aware of what the current run has
/// already fetched.
///
/// Redirects are followed hop by hop so that every URL on a redirect chain
/// lands in the run's resolution cache. A URL is requested at most once per
/// run, whether it is first met as a link to resolve or as a page to visit.
pub struct Fetcher {
    client: Client,
    base_url: String,
    encoding: &'static Encoding,
}

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL, after redirects.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Raw body.
    pub body: Vec<u8>,
    encoding: &'static Encoding,
}

impl Page {
    /// Body decoded with the charset the response declares, or the site's
    /// encoding when it declares none.
    ///
    /// The legacy pages use a stray `U+0092` (or its Windows-1252 reading,
    /// `U+2019`) as apostrophe; both become `'`.
    #[must_use]
    pub fn text(&self) -> String {
        let (text, _) = self.encoding.decode_without_bom_handling(&self.body);
        text.replace(['\u{92}', '\u{2019}'], "'")
    }

    /// Encoding used by [`text`](Self::text).
    #[must_use]
    pub const fn encoding(&self) -> &'static Encoding {
        self.encoding
    }
}

impl Fetcher {
    /// Creates a fetcher for the configured site.
    pub fn new(site: &SiteConfig) -> Result<Self> {
        let encoding = Encoding::for_label(site.encoding.as_bytes())
            .ok_or_else(|| Error::Config(format!("Unknown encoding '{}'", site.encoding)))?;
        let client = Client::builder()
            .timeout(site.http.timeout())
            .user_agent(site.http.user_agent.as_str())
            .redirect(redirect::Policy::none())
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self {
            client,
            base_url: site.base_url.clone(),
            encoding,
        })
    }

    /// Fetches a page at most once per run.
    ///
    /// Returns `None` for empty or already visited URLs, error statuses,
    /// transport failures, and redirects that land on a visited page or
    /// outside the site. Both the requested and the final URL are recorded
    /// as visited.
    #[instrument(level = "debug", skip(self, state))]
    pub async fn fetch(&self, url: &str, state: &mut CrawlState) -> Option<Page> {
        if url.is_empty() {
            warn!("Found an empty link");
            return None;
        }
        if !state.visited.insert(url) {
            info!("Link '{}' already visited", url);
            return None;
        }

        let final_url = self.retrieve(url, state).await?;
        if final_url != url && state.visited.contains(&final_url) {
            info!("Link '{}' redirected to already visited page '{}'", url, final_url);
            return None;
        }
        if !is_under(&final_url, &self.base_url) {
            warn!("Link '{}' points outside the site ({})", url, final_url);
            return None;
        }
        state.visited.insert(&final_url);
        let Some(page) = state.take_pending(&final_url) else {
            info!("Link '{}' already visited", final_url);
            return None;
        };
        if !(200..300).contains(&page.status) {
            warn!("Found a broken link to '{}' ({})", url, page.status);
            return None;
        }

        debug!("Fetched {} bytes from {}", page.body.len(), final_url);
        Some(page)
    }

    /// Follows redirects from `url` and returns where they end.
    ///
    /// Used to rewrite links, so it neither marks anything visited nor
    /// looks at the status code. The response is kept for a later
    /// [`fetch`](Self::fetch) of the same URL, which then costs no request.
    pub async fn resolve(&self, url: &str, state: &mut CrawlState) -> Option<String> {
        self.retrieve(url, state).await
    }

    /// Downloads raw bytes, failing on error statuses.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let mut current = url.to_string();
        for _ in 0..=MAX_REDIRECTS {
            let response = self.client.get(&current).send().await?;
            if let Some(next) = redirect_target(&response) {
                current = next;
                continue;
            }
            let bytes = response.error_for_status()?.bytes().await?;
            debug!("Downloaded {} bytes from {}", bytes.len(), current);
            return Ok(bytes.to_vec());
        }
        Err(Error::NotFound(format!("Too many redirects from '{url}'")))
    }

    /// Final URL of `url`, requesting only the hops the run has not seen.
    ///
    /// A site response that ends a chain is stored in `state` until
    /// [`fetch`](Self::fetch) takes it. Failures are cached as well.
    async fn retrieve(&self, url: &str, state: &mut CrawlState) -> Option<String> {
        let mut hops: Vec<String> = Vec::new();
        let mut current = url.to_string();
        let resolved = loop {
            if let Some(cached) = state.cached_resolution(&current) {
                break cached.map(str::to_string);
            }
            if hops.len() > MAX_REDIRECTS {
                warn!("Found a broken link to '{}': too many redirects", url);
                break None;
            }
            hops.push(current.clone());

            let response = match self.client.get(&current).send().await {
                Ok(response) => response,
                Err(err) => {
                    warn!("Found a broken link to '{}': {}", current, err);
                    break None;
                },
            };
            if let Some(next) = redirect_target(&response) {
                debug!("'{}' redirects to '{}'", current, next);
                current = next;
                continue;
            }

            let final_url = response.url().to_string();
            if is_under(&final_url, &self.base_url) {
                match self.read(response).await {
                    Some(page) => state.store_pending(page),
                    None => break None,
                }
            }
            hops.push(final_url.clone());
            break Some(final_url);
        };

        for hop in &hops {
            state.cache_resolution(hop, resolved.clone());
        }
        resolved
    }

    async fn read(&self, response: Response) -> Option<Page> {
        let url = response.url().to_string();
        let status = response.status().as_u16();
        let declared = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(charset_param)
            .and_then(|label| Encoding::for_label(label.as_bytes()));
        let body = match response.bytes().await {
            Ok(body) => body.to_vec(),
            Err(err) => {
                warn!("Failed to read '{}': {}", url, err);
                return None;
            },
        };
        let encoding = declared
            .or_else(|| meta_charset(&body))
            .unwrap_or(self.encoding);
        Some(Page {
            url,
            status,
            body,
            encoding,
        })
    }
}

fn redirect_target(response: &Response) -> Option<String> {
    if !response.status().is_redirection() {
        return None;
    }
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    response.url().join(location).ok().map(String::from)
}

/// `charset` parameter of a `Content-Type` value.
fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']).to_string())
    })
}

/// Encoding named by a `<meta charset>` or `<meta http-equiv>` tag near
/// the start of a body.
fn meta_charset(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(META_SNIFF_LENGTH)];
    let label = META_CHARSET_RE.captures(head)?.get(1)?;
    Encoding::for_label(label.as_bytes())
}
