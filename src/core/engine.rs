use std::collections::HashMap;
use tracing::{debug, info};
use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::types::{DocId, Document, FieldMap};
use crate::core::utils;
use crate::index::file_storage::FileStorage;
use crate::index::posting::PostingList;
use crate::index::storage::{FieldMatches, OpenMode, Storage};
use crate::query::ast::Query;
use crate::query::parser::QueryParser;
use crate::schema::schema::Schema;
use crate::scoring::scorer::{AdditiveScorer, Scorer};
use crate::search::executor::QueryExecutor;
use crate::search::results::SearchHit;

/// A document waiting for the next flush
#[derive(Debug, Clone)]
struct PendingDocument {
    id: DocId,
    fields: FieldMap,
    /// Assigned from the document count rather than by the caller
    synthesized: bool,
}

/// Entry point: buffers documents, writes them on flush, answers queries
pub struct SearchEngine<S: Storage = FileStorage> {
    storage: S,
    parser: QueryParser,
    scorer: Box<dyn Scorer>,
    pending: Vec<PendingDocument>,
}

impl SearchEngine<FileStorage> {
    /// File backend under `config.storage_path`; files are created if absent
    pub fn open(schema: Schema, config: Config) -> Result<Self> {
        let mut storage = FileStorage::new(schema, &config)?;
        storage.initialize()?;
        info!(path = %config.storage_path.display(), "Opened search engine");
        Ok(Self::with_storage(storage))
    }
}

impl<S: Storage> SearchEngine<S> {
    pub fn with_storage(storage: S) -> Self {
        SearchEngine {
            storage,
            parser: QueryParser::default(),
            scorer: Box::new(AdditiveScorer::default()),
            pending: Vec::new(),
        }
    }

    pub fn with_scorer(mut self, scorer: Box<dyn Scorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn schema(&self) -> &Schema {
        self.storage.schema()
    }

    /// Buffer a document under the next sequential id
    ///
    /// The returned id is provisional: on flush a UNIQUE field match reuses
    /// the stored document's id, and a taken id moves to the next free one.
    /// [`SearchEngine::flush`] reports the ids actually written.
    pub fn add_document(&mut self, fields: FieldMap) -> Result<DocId> {
        let sequence = self.storage.count()? + self.pending.len() + 1;
        let id = DocId::from_sequence(sequence as u64);

        self.pending.push(PendingDocument {
            id: id.clone(),
            fields,
            synthesized: true,
        });
        Ok(id)
    }

    /// Buffer a document under a caller-assigned id; an existing document
    /// with that id is replaced on flush
    pub fn add_document_with_id(&mut self, id: &str, fields: FieldMap) -> Result<DocId> {
        let id = DocId::new(id)?;
        self.pending.push(PendingDocument {
            id: id.clone(),
            fields,
            synthesized: false,
        });
        Ok(id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Write every pending document in one session and return the ids
    /// they were stored under, in the order they were added
    ///
    /// The whole batch is validated first; if any document is rejected the
    /// batch is dropped and nothing is written.
    pub fn flush(&mut self) -> Result<Vec<DocId>> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }

        let batch = std::mem::take(&mut self.pending);
        for document in &batch {
            self.storage.schema().validate(&document.fields)?;
        }

        self.storage.open(OpenMode::ReadWrite)?;
        let written = self.write_batch(&batch);
        let committed = self.storage.commit();
        let written = written?;
        committed?;

        debug!(documents = batch.len(), "Flushed pending documents");
        Ok(written)
    }

    fn write_batch(&mut self, batch: &[PendingDocument]) -> Result<Vec<DocId>> {
        let mut resolved = Vec::with_capacity(batch.len());
        // Full field maps written in this batch, so replacing one of them
        // also clears its INDEXED-only fields
        let mut written: HashMap<DocId, &FieldMap> = HashMap::new();

        for pending in batch {
            let id = match self.find_unique_match(&pending.fields)? {
                Some(existing) => existing,
                None if pending.synthesized => self.next_free_id(pending.id.clone())?,
                None => pending.id.clone(),
            };

            let previous = match written.get(&id) {
                Some(fields) => Some((*fields).clone()),
                None => self.storage.load_document(&id)?,
            };
            if let Some(previous) = previous {
                let previous = Document::with_fields(id.clone(), previous);
                self.storage.remove_doc_from_indices(&previous)?;
            }

            self.storage.save_document(&id, &pending.fields)?;
            self.storage.save_indices(&id, &pending.fields)?;
            written.insert(id.clone(), &pending.fields);
            resolved.push(id);
        }
        Ok(resolved)
    }

    /// Id of a stored document sharing a UNIQUE field value with `fields`
    fn find_unique_match(&mut self, fields: &FieldMap) -> Result<Option<DocId>> {
        let unique: Vec<String> = self
            .storage
            .schema()
            .fields
            .iter()
            .filter(|f| f.is_unique() && f.is_indexed() && fields.contains_key(&f.name))
            .map(|f| f.name.clone())
            .collect();

        for field in unique {
            let Some(value) = fields.get(&field) else {
                continue;
            };
            let tokens = self.storage.analyzer().raw_terms(&value.as_text());

            let mut shared: Option<PostingList> = None;
            for token in &tokens {
                let postings = self.storage.load_index(&field, token)?;
                shared = Some(match shared {
                    Some(previous) => previous.intersect(&postings),
                    None => postings,
                });
            }

            if let Some(id) = shared.and_then(|ids| ids.doc_ids.into_iter().next()) {
                debug!(field = %field, id = %id, "Reusing id of unique match");
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// `id`, or the next sequential id not taken by a stored document
    fn next_free_id(&mut self, id: DocId) -> Result<DocId> {
        let mut id = id;
        while self.storage.load_document(&id)?.is_some() {
            let next = utils::decode_id(id.as_str()).map_or(0, |n| n + 1);
            id = DocId::from_sequence(next);
        }
        Ok(id)
    }

    /// Parse `phrase`, evaluate it and return ranked hits
    pub fn search(&mut self, phrase: &str) -> Result<Vec<SearchHit>> {
        let query = self.parser.parse(phrase)?.normalize();
        self.search_query(&query, phrase)
    }

    /// Evaluate an already built query; `phrase` drives fulltext flags
    pub fn search_query(&mut self, query: &Query, phrase: &str) -> Result<Vec<SearchHit>> {
        self.storage.open(OpenMode::Read)?;
        let results = QueryExecutor::new(&mut self.storage, self.scorer.as_ref()).execute(query, phrase);
        let closed = self.storage.commit();
        let results = results?;
        closed?;
        Ok(results.into_hits())
    }

    pub fn find_docs_by_term(&mut self, term: &str, field: Option<&str>) -> Result<FieldMatches> {
        self.storage.find_by_term(term, field)
    }

    pub fn find_docs_by_prefix(&mut self, prefix: &str, field: Option<&str>) -> Result<FieldMatches> {
        self.storage.find_by_prefix(prefix, field)
    }

    pub fn find_docs_by_term_typo_tolerant(&mut self, term: &str, field: Option<&str>) -> Result<FieldMatches> {
        self.storage.find_by_term_typo_tolerant(term, field)
    }

    pub fn load_document(&mut self, id: &DocId) -> Result<Option<FieldMap>> {
        self.storage.load_document(id)
    }

    /// Persisted documents; pending ones are not counted
    pub fn count(&mut self) -> Result<usize> {
        self.storage.count()
    }

    /// Drop every stored and pending document
    pub fn truncate(&mut self) -> Result<()> {
        self.pending.clear();
        self.storage.truncate()
    }
}
