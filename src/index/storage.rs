use std::collections::{BTreeMap, HashSet};
use crate::analysis::analyzer::Analyzer;
use crate::core::error::Result;
use crate::core::types::{DocId, Document, FieldMap};
use crate::index::posting::PostingList;
use crate::schema::schema::Schema;

pub use crate::storage::record_store::OpenMode;

/// Matches per field name
pub type FieldMatches = BTreeMap<String, PostingList>;

/// Total number of (field, id) matches
pub fn total_matches(matches: &FieldMatches) -> usize {
    matches.values().map(|postings| postings.len()).sum()
}

/// Backend contract of the engine
///
/// Calls made outside an `open`/`commit` bracket open the backend for
/// their own duration.
pub trait Storage {
    fn schema(&self) -> &Schema;

    /// Analyzer the backend normalizes terms with
    fn analyzer(&self) -> &Analyzer;

    /// Create missing tables
    fn initialize(&mut self) -> Result<()>;

    /// Drop every document, posting and state
    fn truncate(&mut self) -> Result<()>;

    fn open(&mut self, mode: OpenMode) -> Result<()>;

    /// Persist pending state deltas and close the session
    fn commit(&mut self) -> Result<()>;

    /// Store the STORED projection; fails on a missing REQUIRED field
    fn save_document(&mut self, id: &DocId, fields: &FieldMap) -> Result<()>;

    fn save_indices(&mut self, id: &DocId, fields: &FieldMap) -> Result<()>;

    /// Drop `document.id` from the postings of the values in `document`
    ///
    /// Only the given values are removed. A document rebuilt from
    /// `load_document` carries its STORED fields alone, so postings of
    /// INDEXED fields that are not STORED stay behind.
    fn remove_doc_from_indices(&mut self, document: &Document) -> Result<()>;

    fn load_document(&mut self, id: &DocId) -> Result<Option<FieldMap>>;

    /// Stored documents for `ids`, in order, skipping unknown ids
    fn get_documents(&mut self, ids: &[DocId]) -> Result<Vec<Document>>;

    fn find_by_term(&mut self, term: &str, field: Option<&str>) -> Result<FieldMatches>;

    fn find_by_term_typo_tolerant(&mut self, term: &str, field: Option<&str>) -> Result<FieldMatches>;

    fn find_by_prefix(&mut self, prefix: &str, field: Option<&str>) -> Result<FieldMatches>;

    /// Posting list stored under the untransformed `term`
    fn load_index(&mut self, field: &str, term: &str) -> Result<PostingList>;

    fn save_states(&mut self, added: &HashSet<u64>, removed: &HashSet<u64>) -> Result<()>;

    fn get_states(&mut self) -> Result<Vec<u64>>;

    fn count(&mut self) -> Result<usize>;

    fn exists(&self) -> bool;

    fn is_empty(&mut self) -> Result<bool> {
        Ok(self.count()? == 0)
    }
}
