use std::collections::{BTreeSet, HashMap};
use crate::core::types::{DocId, FieldMap};

/// One matching document while a query is evaluated and after scoring
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: DocId,
    pub matched_fields: BTreeSet<String>,
    pub matched_terms: BTreeSet<String>,
    pub fulltext: bool,
    pub weight: f32,
    pub document: FieldMap,
}

impl SearchHit {
    pub fn new(id: DocId) -> Self {
        SearchHit {
            id,
            matched_fields: BTreeSet::new(),
            matched_terms: BTreeSet::new(),
            fulltext: false,
            weight: 0.0,
            document: FieldMap::new(),
        }
    }

    pub fn record_match(&mut self, field: &str, term: &str) {
        self.matched_fields.insert(field.to_string());
        self.matched_terms.insert(term.to_string());
    }
}

/// Hits keyed by id, kept in first-matched order
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    hits: Vec<SearchHit>,
    positions: HashMap<DocId, usize>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn contains(&self, id: &DocId) -> bool {
        self.positions.contains_key(id)
    }

    pub fn get(&self, id: &DocId) -> Option<&SearchHit> {
        self.positions.get(id).map(|&i| &self.hits[i])
    }

    /// Existing hit for `id`, or a fresh one appended at the end
    pub fn entry(&mut self, id: &DocId) -> &mut SearchHit {
        let index = match self.positions.get(id) {
            Some(&index) => index,
            None => {
                self.hits.push(SearchHit::new(id.clone()));
                self.positions.insert(id.clone(), self.hits.len() - 1);
                self.hits.len() - 1
            }
        };
        &mut self.hits[index]
    }

    pub fn retain(&mut self, keep: impl FnMut(&SearchHit) -> bool) {
        self.hits.retain(keep);
        self.reindex();
    }

    pub fn remove_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a DocId>) {
        let mut removed = false;
        for id in ids {
            removed |= self.positions.remove(id).is_some();
        }
        if removed {
            let positions = &self.positions;
            self.hits.retain(|hit| positions.contains_key(&hit.id));
            self.reindex();
        }
    }

    /// Descending weight; equal weights keep their order
    pub fn sort_by_weight(&mut self) {
        self.hits.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        self.reindex();
    }

    pub fn iter(&self) -> impl Iterator<Item = &SearchHit> {
        self.hits.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SearchHit> {
        self.hits.iter_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = &DocId> {
        self.hits.iter().map(|hit| &hit.id)
    }

    pub fn into_hits(self) -> Vec<SearchHit> {
        self.hits
    }

    fn reindex(&mut self) {
        self.positions = self
            .hits
            .iter()
            .enumerate()
            .map(|(i, hit)| (hit.id.clone(), i))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(set: &ResultSet) -> Vec<&str> {
        set.ids().map(|id| id.as_str()).collect()
    }

    #[test]
    fn entry_appends_once() {
        let mut set = ResultSet::new();
        set.entry(&DocId::from("b")).record_match("title", "x");
        set.entry(&DocId::from("a"));
        set.entry(&DocId::from("b")).record_match("text", "y");

        assert_eq!(ids(&set), vec!["b", "a"]);
        let hit = set.get(&DocId::from("b")).unwrap();
        assert_eq!(hit.matched_terms.len(), 2);
        assert_eq!(hit.matched_fields.len(), 2);
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let mut set = ResultSet::new();
        for (id, weight) in [("1", 2.0), ("2", 5.0), ("3", 2.0), ("4", 5.0)] {
            set.entry(&DocId::from(id)).weight = weight;
        }
        set.sort_by_weight();
        assert_eq!(ids(&set), vec!["2", "4", "1", "3"]);
        assert!(set.get(&DocId::from("3")).is_some());
    }

    #[test]
    fn remove_all_reindexes() {
        let mut set = ResultSet::new();
        for id in ["1", "2", "3"] {
            set.entry(&DocId::from(id));
        }
        set.remove_all([&DocId::from("2")]);
        assert_eq!(ids(&set), vec!["1", "3"]);
        assert_eq!(set.get(&DocId::from("3")).unwrap().id.as_str(), "3");
    }
}
