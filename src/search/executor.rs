use std::collections::HashSet;
use tracing::debug;
use crate::core::error::{Error, Result};
use crate::core::types::DocId;
use crate::index::posting::PostingList;
use crate::index::storage::{total_matches, FieldMatches, Storage};
use crate::query::ast::{FullTextQuery, GroupQuery, PrefixQuery, Query, TermQuery, TextClause, ANY_FIELD};
use crate::scoring::scorer::Scorer;
use crate::search::results::ResultSet;

/// Evaluates a query tree against a storage backend
///
/// Every node works on one running [`ResultSet`]: text nodes add hits,
/// `Not` removes them, groups filter, flag, score and sort what their
/// children left behind.
pub struct QueryExecutor<'a, S: Storage + ?Sized> {
    pub storage: &'a mut S,
    pub scorer: &'a dyn Scorer,
}

impl<'a, S: Storage + ?Sized> QueryExecutor<'a, S> {
    pub fn new(storage: &'a mut S, scorer: &'a dyn Scorer) -> Self {
        QueryExecutor { storage, scorer }
    }

    /// `phrase` is the raw query string used for fulltext flags
    pub fn execute(&mut self, query: &Query, phrase: &str) -> Result<ResultSet> {
        let mut results = ResultSet::new();
        self.evaluate(query, &mut results, phrase)?;
        debug!(query = %query, hits = results.len(), "Executed query");
        Ok(results)
    }

    fn evaluate(&mut self, query: &Query, results: &mut ResultSet, phrase: &str) -> Result<()> {
        match query {
            Query::And(group) => self.search_and(group, results, phrase),
            Query::Or(group) => self.search_or(group, results, phrase),
            Query::Not(not) => {
                let mut excluded = ResultSet::new();
                self.evaluate(&not.child, &mut excluded, phrase)?;
                results.remove_all(excluded.ids());
                Ok(())
            }
            Query::Term(term) => self.search_term(term, results),
            Query::Prefix(prefix) => self.search_prefix(prefix, results),
            Query::FullText(full_text) => self.search_full_text(full_text, results),
            Query::Null(_) => Ok(()),
        }
    }

    fn evaluate_children(&mut self, group: &GroupQuery, results: &mut ResultSet, phrase: &str) -> Result<()> {
        let mut children: Vec<&Query> = group.children.iter().collect();
        children.sort_by_key(|child| child.priority());

        for child in children {
            self.evaluate(child, results, phrase)?;
        }
        Ok(())
    }

    fn search_and(&mut self, group: &GroupQuery, results: &mut ResultSet, phrase: &str) -> Result<()> {
        self.evaluate_children(group, results, phrase)?;

        // Only direct term/prefix/phrase children count towards the threshold
        let clauses = text_clauses(group);
        results.retain(|hit| hit.matched_terms.len() == clauses.len());

        self.finish_group(&clauses, results, phrase)
    }

    fn search_or(&mut self, group: &GroupQuery, results: &mut ResultSet, phrase: &str) -> Result<()> {
        self.evaluate_children(group, results, phrase)?;
        self.finish_group(&text_clauses(group), results, phrase)
    }

    fn finish_group(&self, clauses: &[TextClause<'_>], results: &mut ResultSet, phrase: &str) -> Result<()> {
        self.assign_fulltext(results, phrase)?;

        for hit in results.iter_mut() {
            hit.weight = self.scorer.score(hit, clauses);
        }
        results.sort_by_weight();
        Ok(())
    }

    /// Flag hits whose stored fulltext value contains the raw phrase
    fn assign_fulltext(&self, results: &mut ResultSet, phrase: &str) -> Result<()> {
        if results.is_empty() {
            return Ok(());
        }

        let schema = self.storage.schema();
        let mut fields = Vec::new();
        for field in schema.fulltext_fields() {
            if !field.is_stored() {
                return Err(Error::logic(format!(
                    "Field `{}` is declared as fulltext but not stored.",
                    field.name
                )));
            }
            fields.push(field.name.as_str());
        }

        if phrase.trim().is_empty() {
            return Ok(());
        }

        for hit in results.iter_mut() {
            let contains = fields.iter().any(|name| {
                hit.document
                    .get(*name)
                    .is_some_and(|value| value.as_text().contains(phrase))
            });
            hit.fulltext |= contains;
        }
        Ok(())
    }

    fn search_term(&mut self, query: &TermQuery, results: &mut ResultSet) -> Result<()> {
        let field = field_filter(&query.field);

        let mut matches = self.storage.find_by_term(&query.value, field)?;
        if total_matches(&matches) == 0 {
            matches = self.storage.find_by_term_typo_tolerant(&query.value, field)?;
            debug!(term = %query.value, hits = total_matches(&matches), "Fell back to typo-tolerant lookup");
        }

        self.attach(&matches, &query.value, results)
    }

    fn search_prefix(&mut self, query: &PrefixQuery, results: &mut ResultSet) -> Result<()> {
        let matches = self.storage.find_by_prefix(&query.prefix, field_filter(&query.field))?;
        self.attach(&matches, &query.prefix, results)
    }

    /// Documents holding every searchable word of the phrase, kept when the
    /// literal phrase appears in the field's stored value
    fn search_full_text(&mut self, query: &FullTextQuery, results: &mut ResultSet) -> Result<()> {
        let field = field_filter(&query.field);
        let analyzer = self.storage.analyzer();
        let words: Vec<String> = analyzer
            .raw_terms(&query.phrase)
            .into_iter()
            .filter(|word| analyzer.normalize(word).is_some())
            .collect();

        if words.is_empty() {
            return Ok(());
        }

        let mut candidates: Option<PostingList> = None;
        for word in &words {
            let mut found = PostingList::new();
            for postings in self.storage.find_by_term(word, field)?.values() {
                found.union(postings);
            }
            candidates = Some(match candidates {
                Some(previous) => previous.intersect(&found),
                None => found,
            });
        }

        let candidates = candidates.unwrap_or_default();
        if candidates.is_empty() {
            return Ok(());
        }

        let targets: Vec<String> = match field {
            Some(name) => vec![name.to_string()],
            None => self
                .storage
                .schema()
                .fulltext_fields()
                .map(|f| f.name.clone())
                .collect(),
        };

        for document in self.storage.get_documents(&candidates.doc_ids)? {
            let matched: Vec<&String> = targets
                .iter()
                .filter(|name| {
                    document
                        .get_field(name)
                        .is_some_and(|value| value.as_text().contains(query.phrase.as_str()))
                })
                .collect();

            if matched.is_empty() {
                continue;
            }

            let hit = results.entry(&document.id);
            for name in matched {
                hit.record_match(name, &query.phrase);
            }
            hit.fulltext = true;
            if hit.document.is_empty() {
                hit.document = document.fields.clone();
            }
        }
        Ok(())
    }

    /// Record `term` on every matched id, fetching stored fields for new ids
    fn attach(&mut self, matches: &FieldMatches, term: &str, results: &mut ResultSet) -> Result<()> {
        let mut seen = HashSet::new();
        let fresh: Vec<DocId> = matches
            .values()
            .flat_map(|postings| postings.iter())
            .filter(|id| !results.contains(id) && seen.insert((*id).clone()))
            .cloned()
            .collect();

        let documents = if fresh.is_empty() {
            Vec::new()
        } else {
            self.storage.get_documents(&fresh)?
        };

        for (field, postings) in matches {
            for id in postings.iter() {
                results.entry(id).record_match(field, term);
            }
        }
        for document in documents {
            results.entry(&document.id).document = document.fields;
        }
        Ok(())
    }
}

fn field_filter(field: &str) -> Option<&str> {
    (field != ANY_FIELD).then_some(field)
}

fn text_clauses(group: &GroupQuery) -> Vec<TextClause<'_>> {
    group.children.iter().filter_map(Query::text_clause).collect()
}
