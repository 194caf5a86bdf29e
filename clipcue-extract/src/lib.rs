//! Best-effort title extraction for short-video pages.
//!
//! Page markup is inconsistent across the site's own view types (detail page
//! vs. discovery feed vs. player overlay), so [`extract`] walks an ordered
//! chain of locators and accepts the first one that yields non-empty text.
//! The chain trades precision for robustness: any one non-empty signal wins,
//! we never compare candidates across locators.

use clipcue_common::VideoInfo;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use url::Url;

/// Title containers tried in order, detail page first, descriptions last.
pub const DEFAULT_TITLE_SELECTORS: &[&str] = &[
    // video detail page
    ".video-info-detail .title",
    ".video-title-container .title",
    ".video-info-container .title",
    // discovery feed
    ".xgplayer-video-title",
    "[data-e2e=\"video-title\"]",
    // other known containers
    ".video-meta-title",
    ".title-container",
    // video description
    ".video-info-detail .desc",
    ".video-desc",
    "[data-e2e=\"video-desc\"]",
];

const DEFAULT_HOST: &str = "douyin.com";
const DEFAULT_VIDEO_PATH_PATTERN: &str = r"/video/(\d+)";
const DEFAULT_SYNTHETIC_LABEL: &str = "抖音视频";
const DEFAULT_TITLE_SUFFIX: &str = " - 抖音";

/// Site-specific extraction knobs.
///
/// The defaults describe 抖音 (douyin.com); deployments targeting a mirror
/// or a rebranded frontend override individual fields from configuration.
///
/// ```rust
/// use clipcue_extract::SiteProfile;
///
/// let profile = SiteProfile::default();
/// assert_eq!(profile.host, "douyin.com");
/// assert_eq!(profile.synthetic_title_label, "抖音视频");
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    /// Host the page must live on for the extractor to be applicable.
    pub host: String,
    /// CSS selectors tried in order against the document.
    pub title_selectors: Vec<String>,
    /// Pattern matched against the location path; capture group 1 is the
    /// numeric video id.
    pub video_path_pattern: String,
    /// Label prefixed to the captured id when synthesising a title.
    pub synthetic_title_label: String,
    /// Trailing site-name suffix stripped from the `<title>` fallback.
    pub title_suffix: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            title_selectors: DEFAULT_TITLE_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            video_path_pattern: DEFAULT_VIDEO_PATH_PATTERN.to_string(),
            synthetic_title_label: DEFAULT_SYNTHETIC_LABEL.to_string(),
            title_suffix: DEFAULT_TITLE_SUFFIX.to_string(),
        }
    }
}

impl SiteProfile {
    /// Whether `url` lives on this profile's host (or a subdomain of it).
    pub fn matches_host(&self, url: &Url) -> bool {
        match url.host_str() {
            Some(host) => {
                host == self.host || host.ends_with(&format!(".{}", self.host))
            }
            None => false,
        }
    }
}

/// One strategy for recovering a title. Strategies are capability-equivalent:
/// each either produces non-empty text or nothing, and the chain short-circuits
/// on the first hit.
enum Locator<'a> {
    /// A CSS selector tried against the document.
    Css(&'a str),
    /// Numeric video id parsed out of the location path.
    VideoPathId,
    /// The document `<title>`, with the site-name suffix stripped.
    DocumentTitle,
}

impl Locator<'_> {
    fn try_locate(&self, doc: &Html, location: &Url, profile: &SiteProfile) -> Option<String> {
        match self {
            Locator::Css(raw) => {
                // An unparseable selector locates nothing; the chain moves on.
                let selector = Selector::parse(raw).ok()?;
                let element = doc.select(&selector).next()?;
                non_empty(element.text().collect::<String>().trim())
            }
            Locator::VideoPathId => {
                let pattern = Regex::new(&profile.video_path_pattern).ok()?;
                let captures = pattern.captures(location.path())?;
                let id = captures.get(1)?.as_str();
                Some(format!("{} {}", profile.synthetic_title_label, id))
            }
            Locator::DocumentTitle => {
                let selector = Selector::parse("title").ok()?;
                let element = doc.select(&selector).next()?;
                let text = element.text().collect::<String>();
                non_empty(text.replacen(&profile.title_suffix, "", 1).trim())
            }
        }
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Recover the video's title and address from a page snapshot.
///
/// Walks the profile's CSS selectors in order, then falls back to the
/// numeric id in the location path, then to the document `<title>`. The
/// first locator yielding non-empty trimmed text wins; a selector that
/// matches an element with empty text does not stop the chain. Returns
/// `None` when every locator comes up empty; the caller never sees a
/// partial record or an empty title.
pub fn extract(html: &str, location: &Url, profile: &SiteProfile) -> Option<VideoInfo> {
    let doc = Html::parse_document(html);

    let chain = profile
        .title_selectors
        .iter()
        .map(|s| Locator::Css(s))
        .chain([Locator::VideoPathId, Locator::DocumentTitle]);

    for locator in chain {
        if let Some(title) = locator.try_locate(&doc, location, profile) {
            tracing::debug!(title=%title, url=%location, "extract.title_located");
            return Some(VideoInfo {
                title,
                url: location.to_string(),
            });
        }
    }

    tracing::debug!(url=%location, "extract.no_title");
    None
}

/// Canonicalise a discovery-page address.
///
/// A feed URL carrying `modal_id=<digits>` refers to the video that would
/// open in the detail overlay; rewrite it to the canonical
/// `https://www.<host>/video/<id>` form. Anything else passes through
/// unchanged.
pub fn normalize_video_url(url: &Url, profile: &SiteProfile) -> Url {
    let modal_id = url
        .query_pairs()
        .find(|(k, _)| k == "modal_id")
        .map(|(_, v)| v.into_owned());

    if let Some(id) = modal_id {
        if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(canonical) =
                Url::parse(&format!("https://www.{}/video/{}", profile.host, id))
            {
                return canonical;
            }
        }
    }
    url.clone()
}
