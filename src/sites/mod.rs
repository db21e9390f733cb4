use regex::Regex;
use std::sync::{Arc, LazyLock};

/// One supported story website. `pattern` is scheme-less; the registry
/// prepends an optional `http://`/`https://` when compiling.
#[derive(Debug, Clone)]
pub struct SiteDefinition {
    pub name: &'static str,
    pub code: &'static str,
    pub pattern: &'static str,
    pub icon_url: &'static str,
}

/// A single occurrence of a recognized story link in free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMatch {
    /// Short code of the site whose alternative fired, if recognized.
    pub site: Option<String>,
    /// The raw matched substring.
    pub text: String,
    /// Captured numeric story/series id, when the site pattern captures one.
    pub id: Option<String>,
    /// Captured sub-type tag ("works" or "series" for AO3).
    pub kind: Option<String>,
}

pub const AO3_CODE: &str = "AO3";
pub const FFN_CODE: &str = "FFN";

const SCHEME_PREFIX: &str = r"(?:http://|https://|)";

static BUILTIN_SITES: &[SiteDefinition] = &[
    SiteDefinition {
        name: "FanFiction.Net",
        code: "FFN",
        pattern: r"(?:www\.|m\.|)fanfiction\.net/s/(?P<ffn_id>\d+)",
        icon_url: "https://www.fanfiction.net/static/icons3/ff-icon-128.png",
    },
    SiteDefinition {
        name: "FictionPress",
        code: "FP",
        pattern: r"(?:www\.|m\.|)fictionpress\.com/s/\d+",
        icon_url: "https://www.fanfiction.net/static/icons3/ff-icon-128.png",
    },
    SiteDefinition {
        name: "Archive of Our Own",
        code: "AO3",
        pattern: r"(?:www\.|)archiveofourown\.org/(?P<ao3_kind>works|series)/(?P<ao3_id>\d+)",
        icon_url: "https://archiveofourown.org/images/ao3_logos/logo_42.png",
    },
    SiteDefinition {
        name: "SpaceBattles",
        code: "SB",
        pattern: r"forums\.spacebattles\.com/threads/\S*",
        icon_url: "https://forums.spacebattles.com/data/svg/2/1/1682578744/2022_favicon_192x192.png",
    },
    SiteDefinition {
        name: "Sufficient Velocity",
        code: "SV",
        pattern: r"forums\.sufficientvelocity\.com/threads/\S*",
        icon_url: "https://forums.sufficientvelocity.com/favicon-96x96.png?v=69wyvmQdJN",
    },
    SiteDefinition {
        name: "Questionable Questing",
        code: "QQ",
        pattern: r"forums\.questionablequesting\.com/threads/\S*",
        icon_url: "https://forums.questionablequesting.com/favicon.ico",
    },
    SiteDefinition {
        name: "Sink Into Your Eyes",
        code: "SIYE",
        pattern: r"(?:www\.|)siye\.co\.uk/(?:siye/|)viewstory\.php\?sid=\d+",
        icon_url: "https://www.siye.co.uk/siye/favicon.ico",
    },
];

static BUILTIN_REGISTRY: LazyLock<Arc<SiteRegistry>> =
    LazyLock::new(|| Arc::new(SiteRegistry::new(BUILTIN_SITES.to_vec())));

/// Ordered registry of site definitions. Registration order decides which
/// alternative wins when patterns overlap: the combined alternation is
/// built in registration order and the regex engine prefers earlier
/// branches at the same position.
pub struct SiteRegistry {
    sites: Vec<(SiteDefinition, Regex)>,
    combined: Regex,
}

impl SiteRegistry {
    pub fn new(sites: Vec<SiteDefinition>) -> Self {
        let alternation = sites
            .iter()
            .map(|site| format!("(?P<{}>{})", site.code, site.pattern))
            .collect::<Vec<_>>()
            .join("|");
        let combined = Regex::new(&format!("{SCHEME_PREFIX}(?:{alternation})"))
            .expect("builtin site patterns must compile");

        let sites = sites
            .into_iter()
            .map(|site| {
                let single = Regex::new(&format!("{SCHEME_PREFIX}{}", site.pattern))
                    .expect("builtin site patterns must compile");
                (site, single)
            })
            .collect();

        Self { sites, combined }
    }

    /// The process-wide registry of supported sites.
    pub fn builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN_REGISTRY)
    }

    pub fn get(&self, code: &str) -> Option<&SiteDefinition> {
        self.sites
            .iter()
            .find(|(site, _)| site.code == code)
            .map(|(site, _)| site)
    }

    /// Fast pre-check used by the autoresponse path before doing any work.
    pub fn contains_link(&self, text: &str) -> bool {
        self.combined.is_match(text)
    }

    /// Scan free text for recognized story links, left to right. Pure and
    /// restartable: the same input always yields the same match sequence.
    pub fn scan<'r, 't>(&'r self, text: &'t str) -> impl Iterator<Item = LinkMatch> + use<'r, 't> {
        self.combined.captures_iter(text).map(|caps| {
            let site = self
                .sites
                .iter()
                .find(|(site, _)| caps.name(site.code).is_some())
                .map(|(site, _)| site.code.to_string());
            let id = caps
                .name("ffn_id")
                .or_else(|| caps.name("ao3_id"))
                .map(|m| m.as_str().to_string());
            let kind = caps.name("ao3_kind").map(|m| m.as_str().to_string());
            let text = caps
                .get(0)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            LinkMatch {
                site,
                text,
                id,
                kind,
            }
        })
    }

    /// Match `text` against one specific site's pattern.
    pub fn find(&self, code: &str, text: &str) -> Option<LinkMatch> {
        let (site, single) = self.sites.iter().find(|(site, _)| site.code == code)?;
        let caps = single.captures(text)?;
        let id = caps
            .name("ffn_id")
            .or_else(|| caps.name("ao3_id"))
            .map(|m| m.as_str().to_string());
        let kind = caps.name("ao3_kind").map(|m| m.as_str().to_string());
        Some(LinkMatch {
            site: Some(site.code.to_string()),
            text: caps.get(0)?.as_str().to_string(),
            id,
            kind,
        })
    }

    /// Icon of the first registered site whose pattern matches `url`.
    pub fn icon_for_url(&self, url: &str) -> Option<&'static str> {
        self.sites
            .iter()
            .find(|(_, single)| single.is_match(url))
            .map(|(site, _)| site.icon_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ao3_work_link_captures_kind_and_id() {
        let registry = SiteRegistry::builtin();
        let matches: Vec<_> = registry
            .scan("read archiveofourown.org/works/12345 tonight")
            .collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].site.as_deref(), Some("AO3"));
        assert_eq!(matches[0].kind.as_deref(), Some("works"));
        assert_eq!(matches[0].id.as_deref(), Some("12345"));
    }

    #[test]
    fn ffn_link_with_scheme_and_mobile_prefix() {
        let registry = SiteRegistry::builtin();
        let matches: Vec<_> = registry
            .scan("https://m.fanfiction.net/s/98765 is a classic")
            .collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].site.as_deref(), Some("FFN"));
        assert_eq!(matches[0].id.as_deref(), Some("98765"));
        assert_eq!(matches[0].kind, None);
    }

    #[test]
    fn matches_reported_left_to_right() {
        let registry = SiteRegistry::builtin();
        let text = "fanfiction.net/s/1 then archiveofourown.org/series/2 then \
                    forums.spacebattles.com/threads/something.3/";
        let sites: Vec<_> = registry
            .scan(text)
            .map(|m| m.site.unwrap_or_default())
            .collect();
        assert_eq!(sites, ["FFN", "AO3", "SB"]);
    }

    #[test]
    fn scan_is_restartable_and_idempotent() {
        let registry = SiteRegistry::builtin();
        let text = "see siye.co.uk/viewstory.php?sid=4 and fictionpress.com/s/77";
        let first: Vec<_> = registry.scan(text).collect();
        let second: Vec<_> = registry.scan(text).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn plain_text_has_no_matches() {
        let registry = SiteRegistry::builtin();
        assert!(!registry.contains_link("nothing to see here"));
        assert_eq!(registry.scan("nothing to see here").count(), 0);
    }

    #[test]
    fn find_matches_one_site_only() {
        let registry = SiteRegistry::builtin();
        let m = registry
            .find(AO3_CODE, "https://archiveofourown.org/series/555")
            .unwrap();
        assert_eq!(m.kind.as_deref(), Some("series"));
        assert_eq!(m.id.as_deref(), Some("555"));
        assert!(registry.find(FFN_CODE, "archiveofourown.org/works/1").is_none());
    }

    #[test]
    fn icon_resolution_uses_registration_order() {
        let registry = SiteRegistry::builtin();
        let icon = registry
            .icon_for_url("https://www.fanfiction.net/s/123/1/Some-Story")
            .unwrap();
        assert!(icon.contains("ff-icon"));
        assert!(registry.icon_for_url("https://example.com/story").is_none());
    }
}
