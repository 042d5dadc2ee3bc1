//! # Intent Detection Module
//!
//! Infers a coarse category for a URL from its shape. The category only drives
//! UI defaults (suggested mode, crawl limits and extraction prompts); it is
//! never sent to the server as anything more than a hint.
//!
//! Detection walks an ordered table of `(Intent, Regex)` pairs and returns the
//! first hit with a fixed confidence of `0.8`. Anything else, including an
//! empty input, is `general` with confidence `0.5`.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::request::{CrawlMode, split_url_list};

/// Confidence reported for a pattern match
pub const MATCH_CONFIDENCE: f32 = 0.8;

/// Confidence reported when nothing matched
pub const FALLBACK_CONFIDENCE: f32 = 0.5;

/// Coarse URL category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Article,
    Social,
    Ecommerce,
    Batch,
    General,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Article => "article",
            Intent::Social => "social",
            Intent::Ecommerce => "ecommerce",
            Intent::Batch => "batch",
            Intent::General => "general",
        }
    }

    /// Form defaults suggested for this intent
    pub fn defaults(&self) -> IntentDefaults {
        match self {
            Intent::Article => IntentDefaults {
                mode: CrawlMode::Smart,
                max_pages: 3,
                max_depth: 1,
                prompts: &[
                    "Summarize the main argument and key takeaways",
                    "Extract the author, publication date and headline",
                    "List the sources and references cited",
                ],
            },
            Intent::Social => IntentDefaults {
                mode: CrawlMode::Stealth,
                max_pages: 1,
                max_depth: 0,
                prompts: &[
                    "Extract post text, author handle and engagement counts",
                    "Summarize the sentiment of the discussion",
                ],
            },
            Intent::Ecommerce => IntentDefaults {
                mode: CrawlMode::Smart,
                max_pages: 5,
                max_depth: 2,
                prompts: &[
                    "Extract product names, prices and availability",
                    "Compare the listed products by rating",
                    "Collect shipping and return policies",
                ],
            },
            Intent::Batch => IntentDefaults {
                mode: CrawlMode::Batch,
                max_pages: 1,
                max_depth: 0,
                prompts: &["Summarize each page in one paragraph"],
            },
            Intent::General => IntentDefaults {
                mode: CrawlMode::Smart,
                max_pages: 5,
                max_depth: 2,
                prompts: &[
                    "Extract and analyze the key information on this site",
                    "List the main sections and what they cover",
                ],
            },
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "article" => Ok(Intent::Article),
            "social" => Ok(Intent::Social),
            "ecommerce" => Ok(Intent::Ecommerce),
            "batch" => Ok(Intent::Batch),
            "general" | "" => Ok(Intent::General),
            other => Err(format!("unknown intent: {}", other)),
        }
    }
}

/// UI defaults tied to an intent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntentDefaults {
    pub mode: CrawlMode,
    pub max_pages: u32,
    pub max_depth: u32,
    pub prompts: &'static [&'static str],
}

/// Outcome of intent detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntentMatch {
    pub intent: Intent,
    pub confidence: f32,
}

impl IntentMatch {
    fn fallback() -> Self {
        Self {
            intent: Intent::General,
            confidence: FALLBACK_CONFIDENCE,
        }
    }
}

// Insertion order is match order. Host rows only match a whole host label.
const PATTERN_TABLE: &[(Intent, &str)] = &[
    (Intent::Batch, r"/sitemap[^/]*(\.xml)?$"),
    (Intent::Article, r"/(article|blog|post|news|story)s?/"),
    (Intent::Article, r"(^|[/.])medium\.com([/:?#]|$)"),
    (Intent::Article, r"(^|[/.])substack\.com([/:?#]|$)"),
    (Intent::Article, r"(^|[/.])dev\.to([/:?#]|$)"),
    (Intent::Article, r"/\d{4}/\d{2}/"),
    (Intent::Article, r"(^|[/.])wordpress\.com([/:?#]|$)"),
    (Intent::Social, r"(^|[/.])twitter\.com([/:?#]|$)"),
    (Intent::Social, r"(^|[/.])x\.com([/:?#]|$)"),
    (Intent::Social, r"(^|[/.])instagram\.com([/:?#]|$)"),
    (Intent::Social, r"(^|[/.])linkedin\.com([/:?#]|$)"),
    (Intent::Social, r"(^|[/.])facebook\.com([/:?#]|$)"),
    (Intent::Social, r"(^|[/.])tiktok\.com([/:?#]|$)"),
    (Intent::Social, r"(^|[/.])reddit\.com([/:?#]|$)"),
    (Intent::Ecommerce, r"(^|[/.])amazon\.[a-z.]+([/:?#]|$)"),
    (Intent::Ecommerce, r"(^|[/.])ebay\.[a-z.]+([/:?#]|$)"),
    (Intent::Ecommerce, r"shopify"),
    (Intent::Ecommerce, r"/products?/"),
    (Intent::Ecommerce, r"/shop/"),
    (Intent::Ecommerce, r"/store/"),
    (Intent::Ecommerce, r"\.shop\b"),
];

// One entry of a pasted URL list: optional scheme, dotted host, optional port and path.
const URL_TOKEN: &str = r"(?i)^(https?://)?([a-z0-9-]+\.)+[a-z]{2,}(:\d+)?([/?#]\S*)?$";

/// True when `input` holds two or more URLs separated by commas or whitespace
///
/// Commas inside a single URL (map coordinates, query values) leave fragments
/// that are not URLs on their own, so they do not count as a list.
pub fn is_url_list(input: &str) -> bool {
    static TOKEN: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(token) = TOKEN.get_or_init(|| Regex::new(URL_TOKEN).ok()) else {
        return false;
    };
    let entries = split_url_list(input);
    entries.len() > 1 && entries.iter().all(|entry| token.is_match(entry))
}

/// Ordered regex table for intent detection
pub struct IntentDetector {
    patterns: Vec<(Intent, Regex)>,
}

impl IntentDetector {
    /// Build a detector from `(intent, pattern)` pairs, preserving order
    pub fn new(table: &[(Intent, &str)]) -> Result<Self, regex::Error> {
        let patterns = table
            .iter()
            .map(|(intent, pattern)| Ok((*intent, Regex::new(&format!("(?i){}", pattern))?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { patterns })
    }

    /// Detector with the built-in table
    pub fn builtin() -> &'static IntentDetector {
        static DETECTOR: OnceLock<IntentDetector> = OnceLock::new();
        DETECTOR.get_or_init(|| {
            IntentDetector::new(PATTERN_TABLE).expect("built-in intent patterns are valid")
        })
    }

    /// Return the first matching intent, or `general`
    ///
    /// A list of URLs is always `batch`, ahead of the table.
    pub fn detect(&self, url: &str) -> IntentMatch {
        let url = url.trim();
        if url.is_empty() {
            return IntentMatch::fallback();
        }
        if is_url_list(url) {
            return IntentMatch {
                intent: Intent::Batch,
                confidence: MATCH_CONFIDENCE,
            };
        }

        self.patterns
            .iter()
            .find(|(_, re)| re.is_match(url))
            .map(|(intent, _)| IntentMatch {
                intent: *intent,
                confidence: MATCH_CONFIDENCE,
            })
            .unwrap_or_else(IntentMatch::fallback)
    }
}

/// Detect the intent of a URL with the built-in table
pub fn detect_intent(url: &str) -> IntentMatch {
    IntentDetector::builtin().detect(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_url_is_general() {
        for url in ["https://example.com", "https://rust-lang.org/learn", "ftp://files.internal/readme"] {
            let m = detect_intent(url);
            assert_eq!(m.intent, Intent::General, "{}", url);
            assert_eq!(m.confidence, FALLBACK_CONFIDENCE);
        }
    }

    #[test]
    fn test_empty_url_is_general() {
        assert_eq!(detect_intent(""), IntentMatch::fallback());
        assert_eq!(detect_intent("   "), IntentMatch::fallback());
    }

    #[test]
    fn test_known_categories() {
        let cases = [
            ("https://medium.com/@someone/a-post", Intent::Article),
            ("https://example.com/blog/hello-world", Intent::Article),
            ("https://example.com/2024/05/launch", Intent::Article),
            ("https://www.reddit.com/r/rust", Intent::Social),
            ("https://x.com/rustlang", Intent::Social),
            ("https://www.amazon.com/dp/B000", Intent::Ecommerce),
            ("https://example.com/products/42", Intent::Ecommerce),
            ("https://site1.com https://site2.com", Intent::Batch),
            ("site1.com,site2.com/about", Intent::Batch),
            ("https://dev.to/rust/ownership", Intent::Article),
            ("https://blog.substack.com", Intent::Article),
            ("https://mobile.twitter.com/rustlang", Intent::Social),
            ("https://www.amazon.co.uk/dp/B000", Intent::Ecommerce),
            ("https://example.com/sitemap.xml", Intent::Batch),
        ];
        for (url, expected) in cases {
            let m = detect_intent(url);
            assert_eq!(m.intent, expected, "{}", url);
            assert_eq!(m.confidence, MATCH_CONFIDENCE);
        }
    }

    #[test]
    fn test_box_com_is_not_social() {
        assert_eq!(detect_intent("https://box.com").intent, Intent::General);
    }

    #[test]
    fn test_host_patterns_need_whole_labels() {
        for url in [
            "https://dev.tools.example.com",
            "https://foo-x.com/home",
            "https://notmedium.com/page",
            "https://x.company.io",
            "https://mydev.to.example.org",
        ] {
            assert_eq!(detect_intent(url).intent, Intent::General, "{}", url);
        }
    }

    #[test]
    fn test_commas_inside_one_url_are_not_a_list() {
        let maps = "https://maps.example.com/place/@40.7,-74.0,12z";
        assert!(!is_url_list(maps));
        assert_eq!(detect_intent(maps).intent, Intent::General);

        let query = "https://example.com/search?tags=rust,tokio";
        assert!(!is_url_list(query));
        assert_ne!(detect_intent(query).intent, Intent::Batch);

        assert!(is_url_list("https://a.com, https://b.com"));
        assert!(!is_url_list("https://a.com"));
    }

    #[test]
    fn test_custom_table_still_sees_lists() {
        let detector = IntentDetector::new(&[(Intent::Article, r"/blog/")]).unwrap();
        assert_eq!(
            detector.detect("https://a.com/blog/x https://b.com").intent,
            Intent::Batch
        );
    }

    #[test]
    fn test_first_match_wins() {
        // Matches both article and ecommerce; article comes first.
        let m = detect_intent("https://shopify.com/blog/pricing");
        assert_eq!(m.intent, Intent::Article);

        let detector = IntentDetector::new(&[
            (Intent::Ecommerce, r"shopify"),
            (Intent::Article, r"/blog/"),
        ])
        .unwrap();
        assert_eq!(
            detector.detect("https://shopify.com/blog/pricing").intent,
            Intent::Ecommerce
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(detect_intent("https://MEDIUM.COM/x").intent, Intent::Article);
    }

    #[test]
    fn test_intent_round_trip_str() {
        for intent in [
            Intent::Article,
            Intent::Social,
            Intent::Ecommerce,
            Intent::Batch,
            Intent::General,
        ] {
            assert_eq!(intent.as_str().parse::<Intent>().unwrap(), intent);
        }
        assert!("weird".parse::<Intent>().is_err());
    }

    #[test]
    fn test_defaults_have_prompts() {
        assert_eq!(Intent::Batch.defaults().mode, CrawlMode::Batch);
        assert!(!Intent::General.defaults().prompts.is_empty());
    }
}
