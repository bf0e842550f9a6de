use std::path::Path;

use regex::Regex;

use crate::errors::{FeedImageError, FeedImageResult};

/// Sport and recap noise that makes stock photo searches worse.
pub const DEFAULT_BOILERPLATE: &[&str] = &[
    "Men's Basketball",
    "Women's Basketball",
    "Men's Soccer",
    "Women's Soccer",
    "Men's Tennis",
    "Women's Tennis",
    "Men's Golf",
    "Women's Golf",
    "Men's Track and Field",
    "Women's Track and Field",
    "Men's Cross Country",
    "Women's Cross Country",
    "MBB",
    "WBB",
    "mbball",
    "wbball",
    "msoc",
    "wsoc",
    "vball",
    "Box Score",
    "Postgame Notes",
    "Game Notes",
    "Recap",
];

/// Characters trimmed from the ends once phrases are gone.
const SEPARATORS: &[char] = &['-', '\u{2013}', '\u{2014}', '|', ':', ',', ';', '/'];

/// One boilerplate rule, either a literal phrase or a raw pattern.
#[derive(Debug, Clone)]
pub struct BoilerplateRule {
    pattern: Regex,
}

impl BoilerplateRule {
    /// Case-insensitive literal phrase. Runs of whitespace match any
    /// whitespace and apostrophes match straight or curly quotes.
    pub fn phrase(phrase: &str) -> FeedImageResult<Self> {
        let words: Vec<String> = phrase
            .split_whitespace()
            .map(|word| regex::escape(word).replace('\'', "['\u{2019}]"))
            .collect();
        if words.is_empty() {
            return Err(FeedImageError::Config("empty boilerplate phrase".to_string()));
        }

        let mut pattern = String::from("(?i)");
        if phrase.trim_start().starts_with(|c: char| c.is_alphanumeric()) {
            pattern.push_str(r"\b");
        }
        pattern.push_str(&words.join(r"\s+"));
        if phrase.trim_end().ends_with(|c: char| c.is_alphanumeric()) {
            pattern.push_str(r"\b");
        }

        Self::compile(phrase, &pattern)
    }

    pub fn pattern(pattern: &str) -> FeedImageResult<Self> {
        Self::compile(pattern, &format!("(?i){}", pattern))
    }

    fn compile(source: &str, pattern: &str) -> FeedImageResult<Self> {
        let pattern = Regex::new(pattern).map_err(|e| {
            FeedImageError::Config(format!("invalid boilerplate rule '{}': {}", source, e))
        })?;
        Ok(Self { pattern })
    }
}

/// Turns an article title into a stock photo search query.
#[derive(Debug, Clone)]
pub struct TitleCleaner {
    rules: Vec<BoilerplateRule>,
}

impl TitleCleaner {
    pub fn new(rules: Vec<BoilerplateRule>) -> Self {
        Self { rules }
    }

    pub fn from_phrases<S: AsRef<str>>(phrases: &[S]) -> FeedImageResult<Self> {
        // longer phrases first so "Men's Track and Field" wins over shorter overlaps
        let mut sorted: Vec<&str> = phrases.iter().map(|p| p.as_ref()).collect();
        sorted.sort_by_key(|p| std::cmp::Reverse(p.len()));

        let rules = sorted
            .into_iter()
            .map(BoilerplateRule::phrase)
            .collect::<FeedImageResult<Vec<_>>>()?;
        Ok(Self::new(rules))
    }

    pub fn standard() -> FeedImageResult<Self> {
        Self::from_phrases(DEFAULT_BOILERPLATE)
    }

    /// Rule list, one per line. `#` starts a comment and `re:` marks a raw
    /// regular expression.
    pub fn parse_rules(content: &str) -> FeedImageResult<Self> {
        let mut phrases = Vec::new();
        let mut patterns = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.strip_prefix("re:") {
                Some(pattern) => patterns.push(BoilerplateRule::pattern(pattern.trim())?),
                None => phrases.push(line.to_string()),
            }
        }

        let mut cleaner = Self::from_phrases(&phrases)?;
        cleaner.rules.extend(patterns);
        Ok(cleaner)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> FeedImageResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_rules(&content)
    }

    pub fn rules(&self) -> &[BoilerplateRule] {
        &self.rules
    }

    /// Remove every rule match and normalize whitespace. Repeats until
    /// nothing changes, so `clean(clean(x)) == clean(x)`.
    pub fn clean(&self, title: &str) -> String {
        let mut current = normalize(title);

        loop {
            let mut next = current.clone();
            for rule in &self.rules {
                next = rule.pattern.replace_all(&next, " ").into_owned();
            }
            let next = normalize(&next);

            if next == current {
                return next;
            }
            current = next;
        }
    }
}

fn normalize(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|c: char| c.is_whitespace() || SEPARATORS.contains(&c))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleaner() -> TitleCleaner {
        TitleCleaner::standard().unwrap()
    }

    #[test]
    fn test_removes_sport_boilerplate() {
        assert_eq!(
            cleaner().clean("Jones Tigers Win Men's Basketball Game"),
            "Jones Tigers Win Game"
        );
    }

    #[test]
    fn test_removal_is_case_insensitive() {
        assert_eq!(
            cleaner().clean("jones tigers win MEN'S BASKETBALL game"),
            "jones tigers win game"
        );
        assert_eq!(
            cleaner().clean("Tigers Win Men\u{2019}s  Basketball Opener"),
            "Tigers Win Opener"
        );
    }

    #[test]
    fn test_trims_dangling_separators() {
        assert_eq!(
            cleaner().clean("Women's Soccer: Bobcats Edge Rangers - Recap"),
            "Bobcats Edge Rangers"
        );
    }

    #[test]
    fn test_respects_word_boundaries() {
        // "MBB" must not be cut out of a longer word
        assert_eq!(cleaner().clean("MBBQ Festival Returns"), "MBBQ Festival Returns");
    }

    #[test]
    fn test_idempotent() {
        let cleaner = cleaner();
        let titles = [
            "Jones Tigers Win Men's Basketball Game",
            "Men's Men's Basketball Basketball",
            "  Recap | Women's Golf  ",
            "Plain title with   extra spaces",
            "Recap",
            "",
        ];
        for title in titles {
            let once = cleaner.clean(title);
            assert_eq!(cleaner.clean(&once), once, "not idempotent for {:?}", title);
        }
    }

    #[test]
    fn test_nested_phrases_removed_completely() {
        assert_eq!(cleaner().clean("Men's Men's Basketball Basketball"), "");
    }

    #[test]
    fn test_all_configured_phrases_removed() {
        let cleaner = cleaner();
        for phrase in DEFAULT_BOILERPLATE {
            let cleaned = cleaner.clean(&format!("Tigers {} Today", phrase.to_uppercase()));
            assert_eq!(cleaned, "Tigers Today", "phrase {:?} survived", phrase);
        }
    }

    #[test]
    fn test_parse_rules_with_comments_and_patterns() {
        let cleaner = TitleCleaner::parse_rules(
            "# sports noise\nMen's Basketball\n\nre:\\(\\d+-\\d+\\)\n",
        )
        .unwrap();

        assert_eq!(cleaner.rules().len(), 2);
        assert_eq!(
            cleaner.clean("Tigers (10-4) Win Men's Basketball Game"),
            "Tigers Win Game"
        );
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let err = TitleCleaner::parse_rules("re:(unclosed").unwrap_err();
        assert!(matches!(err, FeedImageError::Config(_)));
    }
}
