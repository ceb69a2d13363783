use crate::core::types::DocId;

const SEPARATOR: char = ',';

/// Document ids indexed under one (field, term) pair
/// Note: kept in insertion order, never contains duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostingList {
    pub doc_ids: Vec<DocId>,
}

impl PostingList {
    pub fn new() -> Self {
        PostingList {
            doc_ids: Vec::new(),
        }
    }

    /// Parse the comma-joined form stored in a posting record
    pub fn decode(encoded: &str) -> Self {
        let mut list = PostingList::new();
        for id in encoded.split(SEPARATOR).filter(|id| !id.is_empty()) {
            list.add(DocId(id.to_string()));
        }
        list
    }

    pub fn encode(&self) -> String {
        let ids: Vec<&str> = self.doc_ids.iter().map(|id| id.as_str()).collect();
        ids.join(",")
    }

    /// Append `doc_id` unless already present
    pub fn add(&mut self, doc_id: DocId) -> bool {
        if self.contains(&doc_id) {
            return false;
        }
        self.doc_ids.push(doc_id);
        true
    }

    pub fn remove(&mut self, doc_id: &DocId) -> bool {
        let before = self.doc_ids.len();
        self.doc_ids.retain(|id| id != doc_id);
        before != self.doc_ids.len()
    }

    pub fn contains(&self, doc_id: &DocId) -> bool {
        self.doc_ids.iter().any(|id| id == doc_id)
    }

    /// Append every id of `other` not yet present
    pub fn union(&mut self, other: &PostingList) {
        for id in &other.doc_ids {
            self.add(id.clone());
        }
    }

    /// Ids of `self` also present in `other`, in `self` order
    pub fn intersect(&self, other: &PostingList) -> PostingList {
        PostingList {
            doc_ids: self.doc_ids.iter()
                .filter(|id| other.contains(id))
                .cloned()
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.doc_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocId> {
        self.doc_ids.iter()
    }
}

impl FromIterator<DocId> for PostingList {
    fn from_iter<I: IntoIterator<Item = DocId>>(iter: I) -> Self {
        let mut list = PostingList::new();
        for id in iter {
            list.add(id);
        }
        list
    }
}
