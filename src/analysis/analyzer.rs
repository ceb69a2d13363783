use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use crate::analysis::filter::TokenFilter;
use crate::analysis::filters::lowercase::LowercaseFilter;
use crate::analysis::filters::stemmer::StemmerFilter;
use crate::analysis::filters::stopword::StopWordFilter;
use crate::analysis::token::Token;
use crate::analysis::tokenizer::{StandardTokenizer, Tokenizer};
use crate::core::error::{Error, ErrorKind, Result};

/// Text analysis pipeline
pub struct Analyzer {
    pub tokenizer: Box<dyn Tokenizer>,
    pub filters: Vec<Box<dyn TokenFilter>>,
    pub name: String,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("name", &self.name)
            .field("filters", &self.filters.len())
            .finish_non_exhaustive()
    }
}

impl Clone for Analyzer {
    fn clone(&self) -> Self {
        Analyzer {
            tokenizer: self.tokenizer.clone_box(),
            filters: self.filters.iter().map(|f| f.clone_box()).collect(),
            name: self.name.clone(),
        }
    }
}

impl Analyzer {
    pub fn new(name: String, tokenizer: Box<dyn Tokenizer>) -> Self {
        Analyzer {
            tokenizer,
            filters: Vec::new(),
            name,
        }
    }

    pub fn add_filter(mut self, filter: Box<dyn TokenFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn analyze(&self, text: &str) -> Vec<Token> {
        let mut tokens = self.tokenizer.tokenize(text);

        for filter in &self.filters {
            tokens = filter.filter(tokens);
        }

        tokens
    }

    /// Tokenizer output only, no normalization (UNIQUE fields)
    pub fn raw_terms(&self, text: &str) -> Vec<String> {
        dedup(self.tokenizer.tokenize(text).into_iter().map(|t| t.text))
    }

    /// Normalized terms, first occurrence order, duplicates removed
    pub fn terms(&self, text: &str) -> Vec<String> {
        dedup(self.analyze(text).into_iter().map(|t| t.text))
    }

    /// Run the filter chain over a single query term; `None` when a filter drops it
    pub fn normalize(&self, term: &str) -> Option<String> {
        let mut tokens = vec![Token::new(term.to_string(), 0, 0)];

        for filter in &self.filters {
            tokens = filter.filter(tokens);
        }

        tokens.into_iter().next().map(|t| t.text).filter(|t| !t.is_empty())
    }

    /// Lowercase letters and digits, English stop words, Snowball English stems
    pub fn standard_english() -> Self {
        Analyzer::new("standard_english".to_string(),
                      Box::new(StandardTokenizer::default()))
            .add_filter(Box::new(LowercaseFilter::stripping_symbols()))
            .add_filter(Box::new(StopWordFilter::english()))
            .add_filter(Box::new(StemmerFilter::english()))
    }

    /// Lowercase only
    pub fn simple() -> Self {
        Analyzer::new("simple".to_string(),
                      Box::new(StandardTokenizer::default()))
            .add_filter(Box::new(LowercaseFilter::default()))
    }
}

fn dedup(terms: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    terms.filter(|t| seen.insert(t.clone())).collect()
}

/// Registry for managing analyzers
pub struct AnalyzerRegistry {
    analyzers: HashMap<String, Arc<Analyzer>>,
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        let mut registry = AnalyzerRegistry {
            analyzers: HashMap::new(),
        };

        registry.register_defaults();
        registry
    }

    fn register_defaults(&mut self) {
        self.register("standard", Analyzer::standard_english());
        self.register("simple", Analyzer::simple());
    }

    pub fn register(&mut self, name: &str, analyzer: Analyzer) {
        self.analyzers.insert(name.to_string(), Arc::new(analyzer));
    }

    pub fn get(&self, name: &str) -> Result<Arc<Analyzer>> {
        self.analyzers.get(name).cloned().ok_or_else(|| Error {
            kind: ErrorKind::NotFound,
            context: format!("Analyzer '{}' not found", name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_terms_are_stemmed_and_deduplicated() {
        let analyzer = Analyzer::standard_english();
        let terms = analyzer.terms("The Cats are chasing cats");
        assert_eq!(terms, vec!["cat".to_string(), "chase".to_string()]);
    }

    #[test]
    fn raw_terms_keep_case() {
        let analyzer = Analyzer::standard_english();
        assert_eq!(analyzer.raw_terms("Meow Meow"), vec!["Meow".to_string()]);
    }

    #[test]
    fn normalize_drops_stop_words() {
        let analyzer = Analyzer::standard_english();
        assert_eq!(analyzer.normalize("the"), None);
        assert_eq!(analyzer.normalize("Engines"), Some("engin".to_string()));
    }

    #[test]
    fn registry_reports_unknown_analyzer() {
        let registry = AnalyzerRegistry::new();
        assert!(registry.get("standard").is_ok());
        assert_eq!(registry.get("klingon").unwrap_err().kind, ErrorKind::NotFound);
    }
}
