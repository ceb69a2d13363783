use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;

/// Case folding, optionally keeping only letters and digits
///
/// Tokens left empty are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowercaseFilter {
    pub strip_symbols: bool,
}

impl LowercaseFilter {
    pub fn stripping_symbols() -> Self {
        LowercaseFilter { strip_symbols: true }
    }

    fn fold(&self, text: &str) -> String {
        if self.strip_symbols {
            text.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect()
        } else {
            text.to_lowercase()
        }
    }
}

impl TokenFilter for LowercaseFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens.into_iter()
            .filter_map(|mut token| {
                token.text = self.fold(&token.text);
                (!token.text.is_empty()).then_some(token)
            })
            .collect()
    }

    fn name(&self) -> &str {
        if self.strip_symbols { "lowercase_alphanumeric" } else { "lowercase" }
    }

    fn clone_box(&self) -> Box<dyn TokenFilter> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(filter: LowercaseFilter, words: &[&str]) -> Vec<String> {
        let tokens = words
            .iter()
            .enumerate()
            .map(|(i, w)| Token::new(w.to_string(), i as u32, 0))
            .collect();
        filter.filter(tokens).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn folds_case() {
        assert_eq!(run(LowercaseFilter::default(), &["Woofle", "Don't"]), vec!["woofle", "don't"]);
    }

    #[test]
    fn strips_symbols_and_drops_empty_tokens() {
        let filter = LowercaseFilter::stripping_symbols();
        assert_eq!(run(filter, &["Don't", "3.14", "Ünïcode", "--"]), vec!["dont", "314", "ünïcode"]);
    }
}
