use crate::query::ast::{TextClause, ANY_FIELD};
use crate::search::results::SearchHit;

/// Scorer trait
pub trait Scorer: Send + Sync {
    /// Weight of `hit` for a group whose direct text children are `clauses`
    fn score(&self, hit: &SearchHit, clauses: &[TextClause<'_>]) -> f32;

    fn name(&self) -> &str;
}

/// Boost sums per matched field, a flat fulltext bonus and a per-term bonus
pub struct AdditiveScorer {
    pub fulltext_bonus: f32,  // Added when the raw phrase is in a fulltext field
    pub term_weight: f32,     // Per distinct matched term
}

impl Default for AdditiveScorer {
    fn default() -> Self {
        AdditiveScorer {
            fulltext_bonus: 10.0,
            term_weight: 2.0,
        }
    }
}

impl AdditiveScorer {
    /// Boosts of `field`'s clauses, or of the wildcard ones when the field
    /// has none, whose value the hit matched
    fn field_boost(&self, hit: &SearchHit, field: &str, clauses: &[TextClause<'_>]) -> f32 {
        let own = clauses.iter().any(|c| c.field == field);
        let target = if own { field } else { ANY_FIELD };

        clauses
            .iter()
            .filter(|c| c.field == target && hit.matched_terms.contains(c.value))
            .map(|c| c.boost)
            .sum()
    }
}

impl Scorer for AdditiveScorer {
    fn score(&self, hit: &SearchHit, clauses: &[TextClause<'_>]) -> f32 {
        let mut weight: f32 = hit
            .matched_fields
            .iter()
            .map(|field| self.field_boost(hit, field, clauses))
            .sum();

        if hit.fulltext {
            weight += self.fulltext_bonus;
        }
        weight + self.term_weight * hit.matched_terms.len() as f32
    }

    fn name(&self) -> &str {
        "additive"
    }
}
