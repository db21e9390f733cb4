pub mod cache;

use crate::model::{NormalizedResult, Series, Work};
use crate::sites::SiteRegistry;
use cache::RenderCache;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError};

/// Total display budget for one card, across every text part.
pub const CARD_BUDGET: usize = 6000;
/// Display budget for a single tag list (fandoms, categories, characters).
pub const TAG_BUDGET: usize = 100;

const ELLIPSIS: &str = "...";
const DETAIL_DELIMITER: &str = " • ";
const FOOTER: &str = "Sourced through an external metadata service. Some results may be out of date or unavailable.";

/// Transport-agnostic display card. The chat layer renders this as
/// whatever rich-embed widget it supports.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoryCard {
    pub title: String,
    pub url: Option<String>,
    pub description: String,
    pub author: Option<CardAuthor>,
    pub fields: Vec<CardField>,
    pub footer: Option<String>,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardAuthor {
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl StoryCard {
    /// Total displayed length in characters, the unit the card budget is
    /// measured in.
    pub fn len(&self) -> usize {
        let fields: usize = self
            .fields
            .iter()
            .map(|f| f.name.chars().count() + f.value.chars().count())
            .sum();
        self.title.chars().count()
            + self.description.chars().count()
            + self.author.as_ref().map_or(0, |a| a.name.chars().count())
            + self.footer.as_ref().map_or(0, |f| f.chars().count())
            + fields
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(CardField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }
}

/// Maps normalized results to display cards. Construction is memoized per
/// distinct input value: two results that compare equal always yield the
/// identical card, and the bounded cache keeps rebuild cost flat.
pub struct Renderer {
    registry: Arc<SiteRegistry>,
    cache: Mutex<RenderCache>,
}

impl Renderer {
    pub const DEFAULT_CACHE_CAPACITY: usize = 128;

    pub fn new(registry: Arc<SiteRegistry>) -> Self {
        Self::with_cache_capacity(registry, Self::DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(registry: Arc<SiteRegistry>, capacity: usize) -> Self {
        Self {
            registry,
            cache: Mutex::new(RenderCache::new(capacity)),
        }
    }

    pub fn render(&self, result: &NormalizedResult) -> StoryCard {
        match result {
            NormalizedResult::Work(work) => self.render_work(work),
            NormalizedResult::Series(series) => self.render_series(series),
            NormalizedResult::NotFound => not_found_card(),
        }
    }

    /// Render one page of a series browse: page 0 is the series overview,
    /// page i > 0 is the i-th sub-entry.
    pub fn render_page(&self, series: &Series, index: usize) -> StoryCard {
        if index == 0 {
            self.render_series(series)
        } else {
            series
                .works
                .get(index - 1)
                .map_or_else(not_found_card, |work| self.render_work(work))
        }
    }

    fn render_work(&self, work: &Work) -> StoryCard {
        let key = structural_key(b'w', work);
        if let Some(card) = self.cache_get(key) {
            return card;
        }
        let card = self.build_work_card(work);
        self.cache_put(key, card.clone());
        card
    }

    fn render_series(&self, series: &Series) -> StoryCard {
        let key = structural_key(b's', series);
        if let Some(card) = self.cache_get(key) {
            return card;
        }
        let card = self.build_series_card(series);
        self.cache_put(key, card.clone());
        card
    }

    fn build_work_card(&self, work: &Work) -> StoryCard {
        let details = detail_row(&[&work.fandoms, &work.categories, &work.characters]);
        let rating = work.rating.as_deref().unwrap_or("Not Rated");
        let mut card = StoryCard {
            title: work.title.clone(),
            url: Some(work.url.clone()),
            author: card_author(&work.authors),
            footer: Some(FOOTER.to_string()),
            icon_url: self.registry.icon_for_url(&work.url).map(String::from),
            ..StoryCard::default()
        }
        .field(
            "\u{1F4DC} Last Updated",
            format_updated(work.updated, work.complete),
            true,
        )
        .field(
            "\u{1F4D6} Length",
            format!(
                "{} words in {} chapter(s)",
                group_digits(work.words),
                work.chapters
            ),
            true,
        )
        .field(format!("\u{1F516} Rating: {rating}"), details, false)
        .field("\u{1F4CA} Stats", stats_row(&work.stats), false);

        // The summary takes whatever budget the rest of the card left over,
        // so the total never exceeds CARD_BUDGET.
        let remaining = CARD_BUDGET.saturating_sub(card.len());
        card.description = shorten(&work.summary, remaining, ELLIPSIS);
        card
    }

    fn build_series_card(&self, series: &Series) -> StoryCard {
        let work_links = std::iter::once("\u{1F4DA} **Works:**".to_string())
            .chain(
                series
                    .works
                    .iter()
                    .map(|work| format!("[{}]({})", work.title, work.url)),
            )
            .collect::<Vec<_>>()
            .join("\n");

        let mut card = StoryCard {
            title: series.name.clone(),
            url: Some(series.url.clone()),
            description: work_links.clone(),
            author: card_author(&series.authors),
            footer: Some(FOOTER.to_string()),
            icon_url: self.registry.icon_for_url(&series.url).map(String::from),
            ..StoryCard::default()
        }
        .field(
            "\u{1F4DC} Last Updated",
            format_updated(series.updated, series.complete),
            true,
        )
        .field(
            "\u{1F4D6} Length",
            format!(
                "{} words in {} work(s)",
                group_digits(series.words),
                series.works.len()
            ),
            true,
        );

        let remaining = CARD_BUDGET.saturating_sub(card.len());
        let summary = shorten(&series.summary, remaining.saturating_sub(2), ELLIPSIS);
        card.description = if summary.is_empty() {
            work_links
        } else {
            format!("{summary}\n\n{work_links}")
        };
        card
    }

    fn cache_get(&self, key: u64) -> Option<StoryCard> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
    }

    fn cache_put(&self, key: u64, card: StoryCard) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, card);
    }
}

/// The fixed card for a resolution attempt that found nothing.
pub fn not_found_card() -> StoryCard {
    StoryCard {
        title: "No Results".to_string(),
        description: "No results found. You may need to edit your search.".to_string(),
        ..StoryCard::default()
    }
}

fn card_author(authors: &[crate::model::Author]) -> Option<CardAuthor> {
    let first = authors.first()?;
    let name = authors
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    Some(CardAuthor {
        name,
        url: first.url.clone(),
    })
}

fn detail_row(tag_lists: &[&Vec<String>]) -> String {
    let parts: Vec<String> = tag_lists
        .iter()
        .filter(|tags| !tags.is_empty())
        .map(|tags| shorten(&tags.join(", "), TAG_BUDGET, ELLIPSIS))
        .collect();
    if parts.is_empty() {
        "No details available.".to_string()
    } else {
        parts.join(DETAIL_DELIMITER)
    }
}

fn stats_row(stats: &[(String, u64)]) -> String {
    if stats.is_empty() {
        return "No stats available at this time.".to_string();
    }
    stats
        .iter()
        .map(|(name, count)| format!("**{name}:** {}", group_digits(*count)))
        .collect::<Vec<_>>()
        .join(DETAIL_DELIMITER)
}

fn format_updated(updated: Option<chrono::NaiveDate>, complete: bool) -> String {
    match updated {
        Some(date) => {
            let rendered = date.format("%B %d, %Y").to_string();
            if complete {
                format!("{rendered} (Complete)")
            } else {
                rendered
            }
        }
        None => "Unknown".to_string(),
    }
}

/// Collapse whitespace and truncate at a word boundary so the result never
/// exceeds `width` characters, marking truncation with `placeholder`.
pub fn shorten(text: &str, width: usize, placeholder: &str) -> String {
    let placeholder_len = placeholder.chars().count();
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= width {
        return collapsed;
    }
    if width < placeholder_len {
        return placeholder.chars().take(width).collect();
    }

    let budget = width - placeholder_len;
    let mut out = String::new();
    let mut out_chars = 0;
    for word in collapsed.split(' ') {
        let word_chars = word.chars().count();
        let extra = if out.is_empty() {
            word_chars
        } else {
            word_chars + 1
        };
        if out_chars + extra > budget {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
        out_chars += extra;
    }
    out.push_str(placeholder);
    out
}

/// Format a count with thousands separators.
fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn structural_key<T: Hash>(tag: u8, value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    tag.hash(&mut hasher);
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Author;
    use chrono::NaiveDate;

    fn sample_work(summary_len: usize) -> Work {
        Work {
            title: "The Long Watch".into(),
            url: "https://archiveofourown.org/works/777".into(),
            authors: vec![Author::with_url(
                "nightowl",
                "https://archiveofourown.org/users/nightowl",
            )],
            rating: Some("Teen And Up Audiences".into()),
            complete: true,
            updated: NaiveDate::from_ymd_opt(2022, 3, 8),
            words: 80_000,
            chapters: 12,
            summary: "word ".repeat(summary_len / 5),
            fandoms: vec!["Naruto".into()],
            categories: vec!["Gen".into()],
            characters: vec!["Kakashi".into()],
            stats: vec![("Kudos".into(), 4000), ("Hits".into(), 60_000)],
        }
    }

    fn sample_series(work_count: usize) -> Series {
        Series {
            name: "The Saga".into(),
            url: "https://archiveofourown.org/series/9".into(),
            summary: "Connected stories.".into(),
            updated: NaiveDate::from_ymd_opt(2024, 2, 1),
            complete: false,
            words: 36_000,
            works: (0..work_count)
                .map(|i| Work {
                    title: format!("Part {}", i + 1),
                    url: format!("https://archiveofourown.org/works/{}", i + 1),
                    ..sample_work(50)
                })
                .collect(),
            authors: vec![Author::new("quillwright")],
        }
    }

    fn renderer() -> Renderer {
        Renderer::new(SiteRegistry::builtin())
    }

    #[test]
    fn equal_inputs_render_identical_cards() {
        let renderer = renderer();
        let result = NormalizedResult::Work(sample_work(300));
        let first = renderer.render(&result);
        let second = renderer.render(&result.clone());
        assert_eq!(first, second);
    }

    #[test]
    fn card_never_exceeds_budget() {
        let renderer = renderer();
        for summary_len in [0, 1, 99, 5_900, 6_000, 50_000, 100_000] {
            let card = renderer.render(&NormalizedResult::Work(sample_work(summary_len)));
            assert!(
                card.len() <= CARD_BUDGET,
                "card length {} over budget for summary length {summary_len}",
                card.len()
            );
        }
    }

    #[test]
    fn updated_field_renders_date_and_completion() {
        let renderer = renderer();
        let card = renderer.render(&NormalizedResult::Work(sample_work(50)));
        let updated = &card.fields[0];
        assert_eq!(updated.value, "March 08, 2022 (Complete)");

        let mut unfinished = sample_work(50);
        unfinished.updated = None;
        unfinished.complete = false;
        let card = renderer.render(&NormalizedResult::Work(unfinished));
        assert_eq!(card.fields[0].value, "Unknown");
    }

    #[test]
    fn stats_row_omits_nothing_when_present_and_fallbacks_when_empty() {
        let renderer = renderer();
        let card = renderer.render(&NormalizedResult::Work(sample_work(50)));
        let stats = &card.fields[3];
        assert_eq!(stats.value, "**Kudos:** 4,000 • **Hits:** 60,000");

        let mut bare = sample_work(50);
        bare.stats.clear();
        let card = renderer.render(&NormalizedResult::Work(bare));
        assert_eq!(card.fields[3].value, "No stats available at this time.");
    }

    #[test]
    fn work_card_resolves_site_icon_from_url() {
        let renderer = renderer();
        let card = renderer.render(&NormalizedResult::Work(sample_work(50)));
        assert!(card.icon_url.unwrap().contains("archiveofourown.org"));

        let mut offsite = sample_work(50);
        offsite.url = "https://example.com/story/1".into();
        let card = renderer.render(&NormalizedResult::Work(offsite));
        assert!(card.icon_url.is_none());
    }

    #[test]
    fn series_card_lists_works_in_order() {
        let renderer = renderer();
        let card = renderer.render(&NormalizedResult::Series(sample_series(3)));
        let part1 = card.description.find("[Part 1]").unwrap();
        let part3 = card.description.find("[Part 3]").unwrap();
        assert!(part1 < part3);
        assert!(card.description.starts_with("Connected stories."));
    }

    #[test]
    fn render_page_zero_is_overview_and_pages_are_sub_entries() {
        let renderer = renderer();
        let series = sample_series(2);
        assert_eq!(renderer.render_page(&series, 0).title, "The Saga");
        assert_eq!(renderer.render_page(&series, 1).title, "Part 1");
        assert_eq!(renderer.render_page(&series, 2).title, "Part 2");
    }

    #[test]
    fn not_found_renders_fixed_card() {
        let renderer = renderer();
        let card = renderer.render(&NormalizedResult::NotFound);
        assert_eq!(card.title, "No Results");
        assert!(card.url.is_none());
    }

    #[test]
    fn shorten_handles_degenerate_widths() {
        assert_eq!(shorten("hello world", 100, "..."), "hello world");
        assert_eq!(shorten("hello world again", 9, "..."), "hello...");
        assert_eq!(shorten("hello", 2, "..."), "..".to_string());
        assert_eq!(shorten("hello world", 0, "..."), "");
        assert_eq!(shorten("  spaced   out  ", 100, "..."), "spaced out");
    }

    #[test]
    fn group_digits_inserts_separators() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1_000), "1,000");
        assert_eq!(group_digits(1_234_567), "1,234,567");
    }
}
