//! Text analysis pipelines.
//!
//! Every index gets one pipeline for writing documents and one for query
//! text. The two usually match, but substring and prefix analyzers expand
//! values into n-grams only at index time: the query is matched against
//! those grams as a whole.
//!
//! The standard pipeline is:
//! 1. `SimpleTokenizer` - splits on whitespace and punctuation
//! 2. `RemoveLongFilter` - drops tokens longer than 40 bytes
//! 3. `LowerCaser` - when `case_fold` is set
//! 4. `AsciiFoldingFilter` - when `fold_diacritics` is set
//! 5. `StopWordFilter` - when a stop-word list is configured
//! 6. `Stemmer` - when `stemming` is set and a language is given

use std::fmt;

use sift_config::{AnalyzerKind, AnalyzerSettings, IndexDescriptor};
use stop_words::LANGUAGE;
use tantivy::{
    Index,
    tokenizer::{
        AsciiFoldingFilter, Language, LowerCaser, NgramTokenizer, RawTokenizer,
        RemoveLongFilter, SimpleTokenizer, Stemmer, StopWordFilter, TextAnalyzer,
        TextAnalyzerBuilder, TokenStream, WhitespaceTokenizer,
    },
};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::error::AnalyzerError;

/// Name under which the index-time pipeline is registered with tantivy.
pub const SIFT_TOKENIZER: &str = "sift_text";

/// Maximum token length in bytes before filtering.
const MAX_TOKEN_LENGTH: usize = 40;

/// Gram sizes for substring matching.
const SUBSET_GRAMS: (usize, usize) = (2, 20);

/// Gram sizes for prefix matching.
const STARTS_WITH_GRAMS: (usize, usize) = (1, 20);

/// Stop-word list used by the stop analyzer when none is configured.
const DEFAULT_STOP_LANGUAGE: &str = "english";

/// Whether a pipeline analyzes stored documents or query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Tokenizes content being written.
    Index,
    /// Tokenizes query text.
    Search,
}

/// A configured text analysis pipeline.
#[derive(Clone)]
pub struct Analyzer {
    /// The tantivy pipeline.
    text: TextAnalyzer,
    /// Settings the pipeline was built from.
    settings: AnalyzerSettings,
    /// Which side of the index the pipeline serves.
    mode: AnalysisMode,
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("settings", &self.settings)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Analyzer {
    /// Builds the analyzer for one index.
    ///
    /// Search mode uses the descriptor's `search_analyzer` when present and
    /// its `analyzer` otherwise.
    pub fn for_index(
        descriptor: &IndexDescriptor,
        mode: AnalysisMode,
    ) -> Result<Self, AnalyzerError> {
        let settings = match mode {
            AnalysisMode::Index => &descriptor.analyzer,
            AnalysisMode::Search => search_settings(descriptor),
        };
        Self::from_settings(settings, mode)
    }

    /// Builds a query analyzer that is valid for every given index.
    ///
    /// Identical search settings are used as-is. Otherwise the result is a
    /// standard pipeline with case and diacritic folding that only removes
    /// stop words or stems when all indexes agree on the language.
    pub fn for_indexes(descriptors: &[&IndexDescriptor]) -> Result<Self, AnalyzerError> {
        let (first, rest) = descriptors.split_first().ok_or(AnalyzerError::NoIndexes)?;
        let base = search_settings(first);
        if rest.iter().all(|d| search_settings(d) == base) {
            return Self::from_settings(base, AnalysisMode::Search);
        }

        let all: Vec<&AnalyzerSettings> = descriptors.iter().map(|d| search_settings(d)).collect();
        let stemming_language = common(all.iter().map(|s| stemming_language(s)));
        let stop_words = common(all.iter().map(|s| s.stop_words.as_deref()));
        let merged = AnalyzerSettings {
            kind: AnalyzerKind::Standard,
            stemming: stemming_language.is_some(),
            language: stemming_language.map(str::to_string),
            stop_words: stop_words.map(str::to_string),
            custom_stop_words: Vec::new(),
            case_fold: true,
            fold_diacritics: true,
        };
        Self::from_settings(&merged, AnalysisMode::Search)
    }

    /// Builds a pipeline from explicit settings.
    pub fn from_settings(
        settings: &AnalyzerSettings,
        mode: AnalysisMode,
    ) -> Result<Self, AnalyzerError> {
        Ok(Self {
            text: build_pipeline(settings, mode)?,
            settings: settings.clone(),
            mode,
        })
    }

    /// Returns the settings the pipeline was built from.
    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    /// Returns the analysis mode.
    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    /// Runs the pipeline over text and returns the token texts.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut analyzer = self.text.clone();
        let mut stream = analyzer.token_stream(text);
        let mut tokens = Vec::new();
        stream.process(&mut |token| tokens.push(token.text.clone()));
        tokens
    }

    /// Normalizes a wildcard, prefix or fuzzy term the way tokens are
    /// normalized, without splitting it.
    pub fn normalize_literal(&self, text: &str) -> String {
        let folded = if self.settings.fold_diacritics {
            strip_diacritics(text)
        } else {
            text.to_string()
        };
        if lowercases(&self.settings) {
            folded.to_lowercase()
        } else {
            folded
        }
    }

    /// Registers the pipeline with an index under [`SIFT_TOKENIZER`].
    pub fn register(&self, index: &Index) {
        index
            .tokenizers()
            .register(SIFT_TOKENIZER, self.text.clone());
    }
}

/// Query-time settings of a descriptor.
fn search_settings(descriptor: &IndexDescriptor) -> &AnalyzerSettings {
    descriptor
        .search_analyzer
        .as_ref()
        .unwrap_or(&descriptor.analyzer)
}

/// Language a pipeline stems with, if any.
fn stemming_language(settings: &AnalyzerSettings) -> Option<&str> {
    settings
        .language
        .as_deref()
        .filter(|_| settings.stemming)
}

/// Returns the value shared by every item, or `None` if they differ.
fn common<'a>(mut values: impl Iterator<Item = Option<&'a str>>) -> Option<&'a str> {
    let first = values.next()??;
    values
        .all(|v| v.is_some_and(|v| v.eq_ignore_ascii_case(first)))
        .then_some(first)
}

/// Whether the pipeline lowercases tokens.
fn lowercases(settings: &AnalyzerSettings) -> bool {
    settings.case_fold
        || matches!(
            settings.kind,
            AnalyzerKind::Simple
                | AnalyzerKind::Stop
                | AnalyzerKind::Subset
                | AnalyzerKind::StartsWith
        )
}

/// Assembles the tantivy pipeline for the settings.
fn build_pipeline(
    settings: &AnalyzerSettings,
    mode: AnalysisMode,
) -> Result<TextAnalyzer, AnalyzerError> {
    let mut builder = tokenizer(settings.kind, mode)?;
    if settings.kind == AnalyzerKind::Standard {
        builder = builder.filter_dynamic(RemoveLongFilter::limit(MAX_TOKEN_LENGTH));
    }
    if lowercases(settings) {
        builder = builder.filter_dynamic(LowerCaser);
    }
    if settings.fold_diacritics {
        builder = builder.filter_dynamic(AsciiFoldingFilter);
    }

    if matches!(settings.kind, AnalyzerKind::Standard | AnalyzerKind::Stop) {
        let words = stop_word_list(settings)?;
        if !words.is_empty() {
            builder = builder.filter_dynamic(StopWordFilter::remove(words));
        }
    }

    if settings.kind == AnalyzerKind::Standard
        && settings.stemming
        && let Some(language) = settings.language.as_deref()
    {
        builder = builder.filter_dynamic(Stemmer::new(parse_language(language)?));
    }

    Ok(builder.build())
}

/// Picks the tokenizer for an analyzer kind.
fn tokenizer(
    kind: AnalyzerKind,
    mode: AnalysisMode,
) -> Result<TextAnalyzerBuilder, AnalyzerError> {
    let builder = match (kind, mode) {
        (AnalyzerKind::Standard | AnalyzerKind::Simple | AnalyzerKind::Stop, _) => {
            TextAnalyzer::builder(SimpleTokenizer::default()).dynamic()
        }
        (AnalyzerKind::Whitespace, _) | (AnalyzerKind::Subset, AnalysisMode::Search) => {
            TextAnalyzer::builder(WhitespaceTokenizer::default()).dynamic()
        }
        (AnalyzerKind::Keyword, _) | (AnalyzerKind::StartsWith, AnalysisMode::Search) => {
            TextAnalyzer::builder(RawTokenizer::default()).dynamic()
        }
        (AnalyzerKind::Subset, AnalysisMode::Index) => {
            TextAnalyzer::builder(ngrams(SUBSET_GRAMS, false)?).dynamic()
        }
        (AnalyzerKind::StartsWith, AnalysisMode::Index) => {
            TextAnalyzer::builder(ngrams(STARTS_WITH_GRAMS, true)?).dynamic()
        }
    };
    Ok(builder)
}

/// Builds an n-gram tokenizer.
fn ngrams(
    (min_gram, max_gram): (usize, usize),
    prefix_only: bool,
) -> Result<NgramTokenizer, AnalyzerError> {
    NgramTokenizer::new(min_gram, max_gram, prefix_only)
        .map_err(|e| AnalyzerError::Tokenizer(e.to_string()))
}

/// Collects the configured stop words, normalized like the tokens they
/// are compared against.
fn stop_word_list(settings: &AnalyzerSettings) -> Result<Vec<String>, AnalyzerError> {
    let named = match (settings.kind, settings.stop_words.as_deref()) {
        (_, Some(language)) => Some(language),
        (AnalyzerKind::Stop, None) => Some(DEFAULT_STOP_LANGUAGE),
        _ => None,
    };

    let mut words: Vec<String> = match named {
        Some(language) => stop_words::get(stop_word_language(language)?)
            .iter()
            .map(|w| (*w).to_string())
            .collect(),
        None => Vec::new(),
    };
    words.extend(settings.custom_stop_words.iter().cloned());

    Ok(words
        .into_iter()
        .map(|word| {
            let word = if lowercases(settings) {
                word.to_lowercase()
            } else {
                word
            };
            if settings.fold_diacritics {
                strip_diacritics(&word)
            } else {
                word
            }
        })
        .collect())
}

/// Parses a language name into a tantivy stemmer `Language`.
///
/// Matching is case-insensitive.
pub fn parse_language(name: &str) -> Result<Language, AnalyzerError> {
    match name.to_lowercase().as_str() {
        "arabic" => Ok(Language::Arabic),
        "danish" => Ok(Language::Danish),
        "dutch" => Ok(Language::Dutch),
        "english" => Ok(Language::English),
        "finnish" => Ok(Language::Finnish),
        "french" => Ok(Language::French),
        "german" => Ok(Language::German),
        "greek" => Ok(Language::Greek),
        "hungarian" => Ok(Language::Hungarian),
        "italian" => Ok(Language::Italian),
        "norwegian" => Ok(Language::Norwegian),
        "portuguese" => Ok(Language::Portuguese),
        "romanian" => Ok(Language::Romanian),
        "russian" => Ok(Language::Russian),
        "spanish" => Ok(Language::Spanish),
        "swedish" => Ok(Language::Swedish),
        "tamil" => Ok(Language::Tamil),
        "turkish" => Ok(Language::Turkish),
        other => Err(AnalyzerError::InvalidLanguage(other.to_string())),
    }
}

/// Maps a language name to its stop-word list.
fn stop_word_language(name: &str) -> Result<LANGUAGE, AnalyzerError> {
    match parse_language(name)? {
        Language::Arabic => Ok(LANGUAGE::Arabic),
        Language::Danish => Ok(LANGUAGE::Danish),
        Language::Dutch => Ok(LANGUAGE::Dutch),
        Language::English => Ok(LANGUAGE::English),
        Language::Finnish => Ok(LANGUAGE::Finnish),
        Language::French => Ok(LANGUAGE::French),
        Language::German => Ok(LANGUAGE::German),
        Language::Greek => Ok(LANGUAGE::Greek),
        Language::Hungarian => Ok(LANGUAGE::Hungarian),
        Language::Italian => Ok(LANGUAGE::Italian),
        Language::Norwegian => Ok(LANGUAGE::Norwegian),
        Language::Portuguese => Ok(LANGUAGE::Portuguese),
        Language::Romanian => Ok(LANGUAGE::Romanian),
        Language::Russian => Ok(LANGUAGE::Russian),
        Language::Spanish => Ok(LANGUAGE::Spanish),
        Language::Swedish => Ok(LANGUAGE::Swedish),
        Language::Turkish => Ok(LANGUAGE::Turkish),
        Language::Tamil => Err(AnalyzerError::NoStopWords(name.to_lowercase())),
    }
}

/// Removes combining marks after canonical decomposition, so `café`
/// becomes `cafe`.
pub fn strip_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer(settings: AnalyzerSettings, mode: AnalysisMode) -> Analyzer {
        Analyzer::from_settings(&settings, mode).unwrap()
    }

    #[test]
    fn standard_lowercases_and_splits() {
        let a = analyzer(AnalyzerSettings::default(), AnalysisMode::Index);
        assert_eq!(a.tokenize("Hello, World! foo-bar"), ["hello", "world", "foo", "bar"]);
    }

    #[test]
    fn standard_removes_long_tokens() {
        let a = analyzer(AnalyzerSettings::default(), AnalysisMode::Index);
        let text = format!("short {} word", "a".repeat(50));
        assert_eq!(a.tokenize(&text), ["short", "word"]);
    }

    #[test]
    fn english_stems_and_drops_stop_words() {
        let a = analyzer(AnalyzerSettings::english(), AnalysisMode::Index);
        assert_eq!(a.tokenize("the foxes"), ["fox"]);
    }

    #[test]
    fn folds_diacritics() {
        let a = analyzer(AnalyzerSettings::default(), AnalysisMode::Index);
        assert_eq!(a.tokenize("Café crème"), ["cafe", "creme"]);
    }

    #[test]
    fn case_fold_can_be_disabled() {
        let settings = AnalyzerSettings {
            case_fold: false,
            ..AnalyzerSettings::default()
        };
        let a = analyzer(settings, AnalysisMode::Index);
        assert_eq!(a.tokenize("Hello"), ["Hello"]);
    }

    #[test]
    fn custom_stop_words_are_removed() {
        let settings = AnalyzerSettings {
            custom_stop_words: vec!["Lorem".into()],
            ..AnalyzerSettings::default()
        };
        let a = analyzer(settings, AnalysisMode::Index);
        assert_eq!(a.tokenize("lorem ipsum"), ["ipsum"]);
    }

    #[test]
    fn stop_kind_defaults_to_english() {
        let a = analyzer(AnalyzerSettings::of_kind(AnalyzerKind::Stop), AnalysisMode::Index);
        assert_eq!(a.tokenize("The Fox and the Dog"), ["fox", "dog"]);
    }

    #[test]
    fn keyword_keeps_whole_value() {
        let a = analyzer(AnalyzerSettings::of_kind(AnalyzerKind::Keyword), AnalysisMode::Index);
        assert_eq!(a.tokenize("New York"), ["new york"]);
    }

    #[test]
    fn whitespace_keeps_punctuation() {
        let a = analyzer(AnalyzerSettings::of_kind(AnalyzerKind::Whitespace), AnalysisMode::Index);
        assert_eq!(a.tokenize("foo-bar baz."), ["foo-bar", "baz."]);
    }

    #[test]
    fn subset_expands_only_at_index_time() {
        let settings = AnalyzerSettings::of_kind(AnalyzerKind::Subset);
        let index = analyzer(settings.clone(), AnalysisMode::Index);
        let grams = index.tokenize("Fox");
        assert!(grams.contains(&"fo".to_string()));
        assert!(grams.contains(&"ox".to_string()));
        assert!(grams.contains(&"fox".to_string()));

        let search = analyzer(settings, AnalysisMode::Search);
        assert_eq!(search.tokenize("OX"), ["ox"]);
    }

    #[test]
    fn starts_with_indexes_prefixes() {
        let settings = AnalyzerSettings::of_kind(AnalyzerKind::StartsWith);
        let index = analyzer(settings.clone(), AnalysisMode::Index);
        assert_eq!(index.tokenize("abc"), ["a", "ab", "abc"]);

        let search = analyzer(settings, AnalysisMode::Search);
        assert_eq!(search.tokenize("AB"), ["ab"]);
    }

    #[test]
    fn for_index_prefers_search_analyzer() {
        let desc = IndexDescriptor::new("news", "/idx")
            .with_analyzer(AnalyzerSettings::english())
            .with_search_analyzer(AnalyzerSettings::of_kind(AnalyzerKind::Simple));
        let index = Analyzer::for_index(&desc, AnalysisMode::Index).unwrap();
        let search = Analyzer::for_index(&desc, AnalysisMode::Search).unwrap();
        assert_eq!(index.tokenize("foxes"), ["fox"]);
        assert_eq!(search.tokenize("foxes"), ["foxes"]);
        assert_eq!(search.mode(), AnalysisMode::Search);
    }

    #[test]
    fn for_indexes_requires_an_index() {
        assert_eq!(
            Analyzer::for_indexes(&[]).unwrap_err(),
            AnalyzerError::NoIndexes
        );
    }

    #[test]
    fn for_indexes_reuses_identical_settings() {
        let a = IndexDescriptor::new("a", "/a").with_analyzer(AnalyzerSettings::english());
        let b = IndexDescriptor::new("b", "/b").with_analyzer(AnalyzerSettings::english());
        let merged = Analyzer::for_indexes(&[&a, &b]).unwrap();
        assert_eq!(merged.settings(), &AnalyzerSettings::english());
    }

    #[test]
    fn for_indexes_merges_differing_settings() {
        let english = IndexDescriptor::new("a", "/a").with_analyzer(AnalyzerSettings::english());
        let french = IndexDescriptor::new("b", "/b").with_analyzer(AnalyzerSettings {
            language: Some("french".into()),
            stemming: true,
            stop_words: Some("english".into()),
            ..AnalyzerSettings::default()
        });
        let merged = Analyzer::for_indexes(&[&english, &french]).unwrap();
        assert!(!merged.settings().stemming);
        assert_eq!(merged.settings().stop_words.as_deref(), Some("english"));
        assert_eq!(merged.tokenize("the foxes"), ["foxes"]);
    }

    #[test]
    fn invalid_language_is_error() {
        let settings = AnalyzerSettings {
            language: Some("klingon".into()),
            stemming: true,
            ..AnalyzerSettings::default()
        };
        let err = Analyzer::from_settings(&settings, AnalysisMode::Index).unwrap_err();
        assert_eq!(err, AnalyzerError::InvalidLanguage("klingon".into()));
    }

    #[test]
    fn tamil_has_no_stop_words() {
        let settings = AnalyzerSettings {
            stop_words: Some("Tamil".into()),
            ..AnalyzerSettings::default()
        };
        let err = Analyzer::from_settings(&settings, AnalysisMode::Index).unwrap_err();
        assert_eq!(err, AnalyzerError::NoStopWords("tamil".into()));
    }

    #[test]
    fn parse_language_is_case_insensitive() {
        assert_eq!(parse_language("English").unwrap(), Language::English);
        assert_eq!(parse_language("GeRmAn").unwrap(), Language::German);
    }

    #[test]
    fn normalize_literal_folds_without_splitting() {
        let a = analyzer(AnalyzerSettings::default(), AnalysisMode::Search);
        assert_eq!(a.normalize_literal("Crème-Brûlée*"), "creme-brulee*");
    }

    #[test]
    fn strips_combining_marks() {
        assert_eq!(strip_diacritics("naïve façade"), "naive facade");
        assert_eq!(strip_diacritics("plain"), "plain");
    }
}
