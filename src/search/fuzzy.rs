use std::collections::HashMap;
use levenshtein_automata::{LevenshteinAutomatonBuilder, Distance};
use crate::core::config::TypoToleranceConfig;
use crate::index::state_set::StateSet;

/// Edit budget for a query term, derived from its length
#[derive(Debug, Clone)]
pub struct TypoTolerance {
    enabled: bool,
    /// (minimum length, distance), longest first
    thresholds: Vec<(usize, u8)>,
}

impl TypoTolerance {
    pub fn new(config: &TypoToleranceConfig) -> Self {
        let mut thresholds = config.thresholds.clone();
        thresholds.sort_by(|a, b| b.0.cmp(&a.0));
        TypoTolerance {
            enabled: config.enabled,
            thresholds,
        }
    }

    /// 0 means typo-tolerant lookup is skipped
    pub fn max_distance(&self, term: &str) -> u8 {
        if !self.enabled {
            return 0;
        }

        let len = term.chars().count();
        self.thresholds
            .iter()
            .find(|(min_len, _)| len >= *min_len)
            .map(|(_, distance)| *distance)
            .unwrap_or(0)
    }
}

/// Candidate generation for typo-tolerant lookup
///
/// Implementations only prune: they may return states whose terms are
/// further away than `max_distance`, never miss one that is within it.
pub trait TypoAutomaton: Send + Sync {
    /// State registered for an indexed term
    fn state_of(&self, term: &str) -> u64;

    fn index(&self, terms: &[&str]) -> Vec<u64> {
        terms.iter().map(|term| self.state_of(term)).collect()
    }

    /// Members of `states` possibly within `max_distance` of `term`
    fn find_matching_states(&self, term: &str, max_distance: u8, states: &StateSet) -> Vec<u64>;
}

/// Maps terms onto a small alphabet and walks the state trie with a
/// Levenshtein row, pruning subtrees without members
#[derive(Debug, Clone)]
pub struct StateSetIndex {
    alphabet_size: u32,
    depth: usize,
}

impl StateSetIndex {
    pub fn new(config: &TypoToleranceConfig) -> Self {
        let alphabet_size = config.alphabet_size.max(1);
        StateSetIndex {
            alphabet_size,
            depth: config.index_length.min(max_depth(alphabet_size)),
        }
    }

    fn base(&self) -> u64 {
        self.alphabet_size as u64 + 1
    }

    fn map_char(&self, c: char) -> u64 {
        (c as u32 % self.alphabet_size) as u64 + 1
    }

    fn walk(
        &self,
        node: u64,
        depth: usize,
        row: &[usize],
        query: &[u64],
        max_distance: usize,
        states: &StateSet,
        found: &mut Vec<u64>,
    ) {
        if states.has(node) {
            // A truncated node stands for every longer term sharing its path
            let distance = if depth == self.depth {
                row.iter().copied().min().unwrap_or(usize::MAX)
            } else {
                row[query.len()]
            };
            if distance <= max_distance {
                found.push(node);
            }
        }

        if depth == self.depth {
            return;
        }

        for c in 1..=self.alphabet_size as u64 {
            let child = node * self.base() + c;
            if states.reachable(child) == 0 {
                continue;
            }

            let mut next = Vec::with_capacity(row.len());
            next.push(row[0] + 1);
            for (j, &q) in query.iter().enumerate() {
                let cost = usize::from(q != c);
                let value = (row[j + 1] + 1)
                    .min(next[j] + 1)
                    .min(row[j] + cost);
                next.push(value);
            }

            if next.iter().copied().min().unwrap_or(usize::MAX) <= max_distance {
                self.walk(child, depth + 1, &next, query, max_distance, states, found);
            }
        }
    }
}

impl TypoAutomaton for StateSetIndex {
    fn state_of(&self, term: &str) -> u64 {
        term.chars()
            .take(self.depth)
            .fold(0, |state, c| state * self.base() + self.map_char(c))
    }

    fn find_matching_states(&self, term: &str, max_distance: u8, states: &StateSet) -> Vec<u64> {
        let query: Vec<u64> = term.chars().map(|c| self.map_char(c)).collect();
        let row: Vec<usize> = (0..=query.len()).collect();
        let mut found = Vec::new();

        if states.reachable(0) > 0 {
            self.walk(0, 0, &row, &query, max_distance as usize, states, &mut found);
        }
        found
    }
}

/// Deepest trie level whose state ids still fit in a u64
fn max_depth(alphabet_size: u32) -> usize {
    let base = alphabet_size as u64 + 1;
    let mut depth = 0;
    let mut max_state: u64 = 0;
    while let Some(next) = max_state.checked_mul(base).and_then(|s| s.checked_add(base - 1)) {
        max_state = next;
        depth += 1;
    }
    depth
}

/// Authoritative edit-distance check, one DFA builder per distance
pub struct ExactMatcher {
    builders: HashMap<u8, LevenshteinAutomatonBuilder>,
}

impl Default for ExactMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ExactMatcher {
    pub fn new() -> Self {
        ExactMatcher {
            builders: HashMap::new(),
        }
    }

    /// Plain Levenshtein (no transpositions) between `term` and `candidate`
    pub fn within(&mut self, term: &str, candidate: &str, max_distance: u8) -> bool {
        let builder = self
            .builders
            .entry(max_distance)
            .or_insert_with(|| LevenshteinAutomatonBuilder::new(max_distance, false));

        let dfa = builder.build_dfa(term);
        match dfa.eval(candidate) {
            Distance::Exact(d) => d <= max_distance,
            Distance::AtLeast(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Plain DP distance over chars, the oracle for the pruning check
    fn levenshtein_distance(a: &str, b: &str) -> usize {
        let b: Vec<char> = b.chars().collect();
        let mut prev: Vec<usize> = (0..=b.len()).collect();

        for (i, ca) in a.chars().enumerate() {
            let mut curr = vec![i + 1; b.len() + 1];
            for (j, cb) in b.iter().enumerate() {
                curr[j + 1] = (prev[j + 1] + 1)
                    .min(curr[j] + 1)
                    .min(prev[j] + usize::from(ca != *cb));
            }
            prev = curr;
        }
        prev[b.len()]
    }

    fn index() -> StateSetIndex {
        StateSetIndex::new(&TypoToleranceConfig::default())
    }

    #[test]
    fn budget_follows_term_length() {
        let typo = TypoTolerance::new(&TypoToleranceConfig::default());
        assert_eq!(typo.max_distance("cat"), 0);
        assert_eq!(typo.max_distance("devel"), 1);
        assert_eq!(typo.max_distance("develep"), 1);
        assert_eq!(typo.max_distance("developmnt"), 2);

        let disabled = TypoToleranceConfig { enabled: false, ..Default::default() };
        assert_eq!(TypoTolerance::new(&disabled).max_distance("developmnt"), 0);
    }

    #[test]
    fn finds_states_within_distance() {
        let index = index();
        let mut states = StateSet::new(4);
        let terms = ["develop", "meow", "search", "engin", "dog"];
        for state in index.index(&terms) {
            states.add(state);
        }

        let found = index.find_matching_states("develep", 1, &states);
        assert!(found.contains(&index.state_of("develop")));
    }

    #[test]
    fn never_prunes_true_matches() {
        let index = index();
        let mut states = StateSet::new(4);
        let terms = [
            "world", "would", "word", "worlds", "search", "searching",
            "internationalization", "internationalisation", "a", "zz",
        ];
        for term in terms {
            states.add(index.state_of(term));
        }

        for query in ["wrld", "serch", "internationalizatoin", "worlds", "b"] {
            for distance in 1..=2u8 {
                let found = index.find_matching_states(query, distance, &states);
                for term in terms {
                    if levenshtein_distance(query, term) <= distance as usize {
                        assert!(
                            found.contains(&index.state_of(term)),
                            "{} should reach {} at {}", query, term, distance
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn exact_check_rejects_pruning_false_positives() {
        let mut exact = ExactMatcher::new();
        assert!(exact.within("develep", "develop", 1));
        assert!(!exact.within("develep", "developer", 1));
        // Transpositions count as two edits
        assert!(!exact.within("teh", "the", 1));
        assert!(exact.within("teh", "the", 2));
    }

    #[test]
    fn deep_alphabets_stay_in_range() {
        let config = TypoToleranceConfig { alphabet_size: 255, ..Default::default() };
        let index = StateSetIndex::new(&config);
        assert!(index.depth < 14);
        let _ = index.state_of("abcdefghijklmnopqrstuvwxyz");
    }
}
