use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use crate::analysis::analyzer::{Analyzer, AnalyzerRegistry};
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DocId, Document, FieldMap, FieldValue};
use crate::index::posting::PostingList;
use crate::index::state_set::StateSet;
use crate::index::storage::{FieldMatches, OpenMode, Storage};
use crate::schema::schema::{FieldDefinition, Schema};
use crate::search::fuzzy::{ExactMatcher, StateSetIndex, TypoAutomaton, TypoTolerance};
use crate::storage::layout::StorageLayout;
use crate::storage::record::{MergeStrategy, PostingRecord, SortKey, StateRecord, StoredDocument};
use crate::storage::record_store::RecordStore;

/// File backend: one sorted record file for documents, one per indexed
/// field, one for typo states
pub struct FileStorage {
    schema: Schema,
    analyzer: Arc<Analyzer>,
    layout: StorageLayout,
    docs: RecordStore<StoredDocument>,
    indices: BTreeMap<String, RecordStore<PostingRecord>>,
    states: RecordStore<StateRecord>,
    state_set: StateSet,
    automaton: Box<dyn TypoAutomaton>,
    typo: TypoTolerance,
    exact: ExactMatcher,
    mode: Option<OpenMode>,
}

impl FileStorage {
    pub fn new(schema: Schema, config: &Config) -> Result<Self> {
        let registry = AnalyzerRegistry::new();
        let analyzer = registry.get(&schema.analyzer)?;
        Self::with_analyzer(schema, config, analyzer)
    }

    pub fn with_analyzer(schema: Schema, config: &Config, analyzer: Arc<Analyzer>) -> Result<Self> {
        let layout = StorageLayout::new(config.storage_path.clone(), &schema.name)?;

        let indices = schema
            .indexed_fields()
            .map(|field| {
                let store = RecordStore::new(layout.index_path(&field.name), config.index_record_width);
                (field.name.clone(), store)
            })
            .collect();

        Ok(FileStorage {
            docs: RecordStore::new(layout.docs_path(), config.docs_record_width),
            states: RecordStore::new(layout.states_path(), config.state_record_width),
            indices,
            state_set: StateSet::new(config.typo_tolerance.alphabet_size),
            automaton: Box::new(StateSetIndex::new(&config.typo_tolerance)),
            typo: TypoTolerance::new(&config.typo_tolerance),
            exact: ExactMatcher::new(),
            mode: None,
            schema,
            analyzer,
            layout,
        })
    }

    /// Swap the candidate generator used for typo-tolerant lookups
    pub fn with_automaton(mut self, automaton: Box<dyn TypoAutomaton>) -> Self {
        self.automaton = automaton;
        self
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn state_set(&self) -> &StateSet {
        &self.state_set
    }

    pub fn is_open(&self) -> bool {
        self.mode.is_some()
    }

    /// Open for the duration of one call unless a session is running;
    /// returns whether the caller must close again
    fn ensure_open(&mut self, mode: OpenMode) -> Result<bool> {
        match self.mode {
            None => {
                self.open(mode)?;
                Ok(true)
            }
            Some(OpenMode::Read) if mode == OpenMode::ReadWrite => Err(Error {
                kind: ErrorKind::InvalidState,
                context: "Storage is open read-only".to_string(),
            }),
            Some(_) => Ok(false),
        }
    }

    fn release(&mut self, opened: bool) -> Result<()> {
        if opened {
            self.commit()?;
        }
        Ok(())
    }

    fn close(&mut self) {
        self.docs.close();
        self.states.close();
        for store in self.indices.values_mut() {
            store.close();
        }
        self.mode = None;
    }

    fn field_definition(&self, name: &str) -> Option<&FieldDefinition> {
        self.schema.field(name)
    }

    /// Terms a field value is indexed under
    fn field_terms(&self, field: &FieldDefinition, value: &FieldValue) -> Vec<String> {
        let text = value.as_text();
        if field.is_unique() {
            self.analyzer.raw_terms(&text)
        } else {
            self.analyzer.terms(&text)
        }
    }

    /// Fields a lookup runs against, paired with the key to look up
    fn lookup_targets(&self, term: &str, field: Option<&str>) -> Vec<(String, Option<String>)> {
        let normalized = self.analyzer.normalize(term);

        match field {
            None | Some("*") => self
                .schema
                .indexed_fields()
                .filter(|f| !f.is_unique())
                .map(|f| (f.name.clone(), normalized.clone()))
                .collect(),
            Some(name) => {
                let key = match self.field_definition(name) {
                    Some(def) if def.is_indexed() && def.is_unique() => Some(term.to_string()),
                    Some(def) if def.is_indexed() => normalized,
                    _ => None,
                };
                vec![(name.to_string(), key)]
            }
        }
    }

    /// Drop `state` unless another posting record still carries it
    fn release_state(&mut self, state: u64) -> Result<()> {
        let wanted: HashSet<u64> = [state].into_iter().collect();

        for (name, store) in &self.indices {
            let unique = self.schema.field(name).is_some_and(|f| f.is_unique());
            if !unique && !store.scan_by_states(&wanted)?.is_empty() {
                return Ok(());
            }
        }

        self.state_set.remove(state);
        Ok(())
    }

    fn index_store(&mut self, field: &str) -> Result<&mut RecordStore<PostingRecord>> {
        self.indices.get_mut(field).ok_or_else(|| Error {
            kind: ErrorKind::NotFound,
            context: format!("No index for field `{}`", field),
        })
    }

    fn find_by_term_in_session(&mut self, term: &str, field: Option<&str>) -> Result<FieldMatches> {
        let mut matches = FieldMatches::new();

        for (name, key) in self.lookup_targets(term, field) {
            let postings = match (key, self.indices.get(&name)) {
                (Some(key), Some(store)) => store
                    .get(SortKey::Text(&key))?
                    .map(|record| record.postings())
                    .unwrap_or_default(),
                _ => PostingList::new(),
            };
            matches.insert(name, postings);
        }

        Ok(matches)
    }

    fn find_by_prefix_in_session(&mut self, prefix: &str, field: Option<&str>) -> Result<FieldMatches> {
        let mut matches = FieldMatches::new();

        for (name, key) in self.lookup_targets(prefix, field) {
            let mut postings = PostingList::new();
            if let (Some(key), Some(store)) = (key, self.indices.get(&name)) {
                for record in store.prefix_scan(&key)? {
                    postings.union(&record.postings());
                }
            }
            matches.insert(name, postings);
        }

        Ok(matches)
    }

    fn find_typo_tolerant_in_session(&mut self, term: &str, field: Option<&str>) -> Result<FieldMatches> {
        let mut matches = FieldMatches::new();
        let Some(normalized) = self.analyzer.normalize(term) else {
            return Ok(matches);
        };

        let max_distance = self.typo.max_distance(&normalized);
        if max_distance == 0 {
            return Ok(matches);
        }

        let candidates: HashSet<u64> = self
            .automaton
            .find_matching_states(&normalized, max_distance, &self.state_set)
            .into_iter()
            .collect();
        debug!(term = %normalized, max_distance, candidates = candidates.len(), "Typo-tolerant lookup");

        for (name, _) in self.lookup_targets(term, field) {
            let unique = self.schema.field(&name).is_none_or(|f| f.is_unique() || !f.is_indexed());
            let mut postings = PostingList::new();

            if !unique && let Some(store) = self.indices.get(&name) {
                for record in store.scan_by_states(&candidates)? {
                    if self.exact.within(&normalized, &record.key, max_distance) {
                        postings.union(&record.postings());
                    }
                }
            }
            matches.insert(name, postings);
        }

        Ok(matches)
    }

    fn save_indices_in_session(&mut self, id: &DocId, fields: &FieldMap) -> Result<()> {
        let indexed: Vec<FieldDefinition> = self.schema.indexed_fields().cloned().collect();

        for field in indexed {
            let Some(value) = fields.get(&field.name) else {
                continue;
            };

            for term in self.field_terms(&field, value) {
                let state = (!field.is_unique()).then(|| self.automaton.state_of(&term));
                let postings: PostingList = [id.clone()].into_iter().collect();
                let record = PostingRecord::new(&term, &postings, state);

                self.index_store(&field.name)?.upsert(record, MergeStrategy::UnionIds)?;
                if let Some(state) = state {
                    self.state_set.add(state);
                }
            }
        }

        Ok(())
    }

    fn remove_doc_in_session(&mut self, document: &Document) -> Result<()> {
        let indexed: Vec<FieldDefinition> = self.schema.indexed_fields().cloned().collect();

        for field in indexed {
            let Some(value) = document.fields.get(&field.name) else {
                continue;
            };

            for term in self.field_terms(&field, value) {
                let store = self.index_store(&field.name)?;
                let Some(mut record) = store.get(SortKey::Text(&term))? else {
                    continue;
                };

                let mut postings = record.postings();
                if !postings.remove(&document.id) {
                    continue;
                }

                if postings.is_empty() {
                    store.delete(SortKey::Text(&term))?;
                    if let Some(state) = record.state {
                        self.release_state(state)?;
                    }
                } else {
                    record.ids = postings.encode();
                    store.upsert(record, MergeStrategy::Replace)?;
                }
            }
        }

        Ok(())
    }
}

impl Storage for FileStorage {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    fn initialize(&mut self) -> Result<()> {
        self.docs.create()?;
        self.states.create()?;
        for store in self.indices.values() {
            store.create()?;
        }
        Ok(())
    }

    fn truncate(&mut self) -> Result<()> {
        let opened = self.ensure_open(OpenMode::ReadWrite)?;

        self.docs.truncate()?;
        self.states.truncate()?;
        for store in self.indices.values_mut() {
            store.truncate()?;
        }
        self.state_set.load(std::iter::empty());

        self.release(opened)
    }

    fn open(&mut self, mode: OpenMode) -> Result<()> {
        if self.mode.is_some() {
            return Err(Error {
                kind: ErrorKind::InvalidState,
                context: "Storage session already open".to_string(),
            });
        }
        if mode == OpenMode::Read {
            self.initialize()?;
        }

        let result = (|| -> Result<()> {
            self.docs.open(mode)?;
            self.states.open(mode)?;
            for store in self.indices.values_mut() {
                store.open(mode)?;
            }

            let states = self.states.scan_all()?;
            self.state_set.load(states.into_iter().map(|record| record.state));
            Ok(())
        })();

        match result {
            Ok(()) => {
                self.mode = Some(mode);
                debug!(schema = %self.schema.name, ?mode, states = self.state_set.len(), "Opened storage");
                Ok(())
            }
            Err(err) => {
                self.close();
                Err(err)
            }
        }
    }

    fn commit(&mut self) -> Result<()> {
        if self.mode == Some(OpenMode::ReadWrite) && self.state_set.is_dirty() {
            let (added, removed) = self.state_set.take_deltas();
            self.save_states(&added, &removed)?;
        }

        debug!(schema = %self.schema.name, "Committed storage");
        self.close();
        Ok(())
    }

    fn save_document(&mut self, id: &DocId, fields: &FieldMap) -> Result<()> {
        self.schema.validate(fields)?;

        let opened = self.ensure_open(OpenMode::ReadWrite)?;
        let document = StoredDocument {
            id: id.as_str().to_string(),
            fields: self.schema.stored(fields),
        };
        let result = self.docs.upsert(document, MergeStrategy::Replace);

        self.release(opened)?;
        result
    }

    fn save_indices(&mut self, id: &DocId, fields: &FieldMap) -> Result<()> {
        let opened = self.ensure_open(OpenMode::ReadWrite)?;
        let result = self.save_indices_in_session(id, fields);
        self.release(opened)?;
        result
    }

    fn remove_doc_from_indices(&mut self, document: &Document) -> Result<()> {
        let opened = self.ensure_open(OpenMode::ReadWrite)?;
        let result = self.remove_doc_in_session(document);
        self.release(opened)?;
        result
    }

    fn load_document(&mut self, id: &DocId) -> Result<Option<FieldMap>> {
        let opened = self.ensure_open(OpenMode::Read)?;
        let result = self.docs.get(SortKey::Text(id.as_str()));
        self.release(opened)?;
        Ok(result?.map(|doc| doc.fields))
    }

    fn get_documents(&mut self, ids: &[DocId]) -> Result<Vec<Document>> {
        let opened = self.ensure_open(OpenMode::Read)?;

        let mut documents = Vec::with_capacity(ids.len());
        let mut result = Ok(());
        for id in ids {
            match self.docs.get(SortKey::Text(id.as_str())) {
                Ok(Some(stored)) => documents.push(Document::with_fields(id.clone(), stored.fields)),
                Ok(None) => {}
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }

        self.release(opened)?;
        result.map(|_| documents)
    }

    fn find_by_term(&mut self, term: &str, field: Option<&str>) -> Result<FieldMatches> {
        let opened = self.ensure_open(OpenMode::Read)?;
        let result = self.find_by_term_in_session(term, field);
        self.release(opened)?;
        result
    }

    fn find_by_term_typo_tolerant(&mut self, term: &str, field: Option<&str>) -> Result<FieldMatches> {
        let opened = self.ensure_open(OpenMode::Read)?;
        let result = self.find_typo_tolerant_in_session(term, field);
        self.release(opened)?;
        result
    }

    fn find_by_prefix(&mut self, prefix: &str, field: Option<&str>) -> Result<FieldMatches> {
        let opened = self.ensure_open(OpenMode::Read)?;
        let result = self.find_by_prefix_in_session(prefix, field);
        self.release(opened)?;
        result
    }

    fn load_index(&mut self, field: &str, term: &str) -> Result<PostingList> {
        let opened = self.ensure_open(OpenMode::Read)?;
        let result = match self.indices.get(field) {
            Some(store) => store
                .get(SortKey::Text(term))
                .map(|record| record.map(|r| r.postings()).unwrap_or_default()),
            None => Ok(PostingList::new()),
        };
        self.release(opened)?;
        result
    }

    fn save_states(&mut self, added: &HashSet<u64>, removed: &HashSet<u64>) -> Result<()> {
        let opened = self.ensure_open(OpenMode::ReadWrite)?;

        let result = (|| -> Result<()> {
            for &state in added {
                self.states.upsert(StateRecord { state }, MergeStrategy::Replace)?;
            }
            for &state in removed {
                self.states.delete(SortKey::Number(state))?;
            }
            Ok(())
        })();

        debug!(added = added.len(), removed = removed.len(), "Saved typo states");
        self.release(opened)?;
        result
    }

    fn get_states(&mut self) -> Result<Vec<u64>> {
        let opened = self.ensure_open(OpenMode::Read)?;
        let result = self.states.scan_all();
        self.release(opened)?;
        Ok(result?.into_iter().map(|record| record.state).collect())
    }

    fn count(&mut self) -> Result<usize> {
        let opened = self.ensure_open(OpenMode::Read)?;
        let result = self.docs.total();
        self.release(opened)?;
        result
    }

    fn exists(&self) -> bool {
        self.docs.exists()
    }
}
