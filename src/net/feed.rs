// RSS feed model and a lenient extractor
//
// Feeds in the wild are messy (unescaped entities, CDATA, missing fields),
// and a kiosk ticker only needs titles and dates, so extraction is
// regex-based and forgiving: items without a title are skipped, everything
// else degrades to an empty string. The parsed model is what gets cached,
// so it must round-trip through serde exactly.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Parsed feed, as stored in the RSS cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub title: String,
    pub items: Vec<FeedItem>,
}

/// One feed entry, reduced to what the ticker renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub published: String,
}

fn item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<item[\s>].*?</item>").unwrap())
}

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap())
}

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<link[^>]*>(.*?)</link>").unwrap())
}

fn pub_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<pubDate[^>]*>(.*?)</pubDate>").unwrap())
}

fn cdata_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^\s*<!\[CDATA\[(.*)\]\]>\s*$").unwrap())
}

/// Unwrap CDATA, decode the common entities, trim.
fn clean(raw: &str) -> String {
    let unwrapped = match cdata_re().captures(raw) {
        Some(caps) => caps[1].to_string(),
        None => raw.to_string(),
    };
    unwrapped
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .trim()
        .to_string()
}

fn first_capture(re: &Regex, haystack: &str) -> String {
    re.captures(haystack)
        .map(|caps| clean(&caps[1]))
        .unwrap_or_default()
}

/// Extract the channel title and items from an RSS document.
pub fn parse_rss(xml: &str) -> Feed {
    let channel_head = match item_re().find(xml) {
        Some(first_item) => &xml[..first_item.start()],
        None => xml,
    };
    let title = first_capture(title_re(), channel_head);

    let items = item_re()
        .find_iter(xml)
        .filter_map(|m| {
            let block = m.as_str();
            let item_title = first_capture(title_re(), block);
            if item_title.is_empty() {
                return None;
            }
            Some(FeedItem {
                title: item_title,
                link: first_capture(link_re(), block),
                published: first_capture(pub_date_re(), block),
            })
        })
        .collect();

    Feed { title, items }
}
