pub mod core;
pub mod storage;
pub mod analysis;
pub mod schema;
pub mod index;
pub mod scoring;
pub mod search;
pub mod query;
pub mod mmap;

pub use crate::core::config::{Config, TypoToleranceConfig};
pub use crate::core::engine::SearchEngine;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::types::{fields, DocId, Document, FieldMap, FieldValue};
pub use crate::query::ast::Query;
pub use crate::schema::schema::{FieldFlags, Schema};
pub use crate::search::results::SearchHit;

/*
┌──────────────────────────────────────────────────────────────────────────────┐
│                           LINEDEX ARCHITECTURE                               │
└──────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── CORE LAYER ──────────────────────────────────┐
│  struct SearchEngine<S: Storage>                                             │
│  • storage: S                      // FileStorage by default                 │
│  • parser: QueryParser             // text -> Query                          │
│  • scorer: Box<dyn Scorer>         // AdditiveScorer                         │
│  • pending: Vec<PendingDocument>   // written on flush()                     │
│                                                                              │
│  Config { storage_path, *_record_width, typo_tolerance }                     │
│  DocId(String) base-62 · FieldValue { Text | Number | Boolean }              │
└──────────────────────────────────────────────────────────────────────────────┘
                 │ flush()                          │ search()
                 ▼                                  ▼
┌──────────────── INDEX LAYER ─────────────┐  ┌────────── QUERY LAYER ─────────┐
│  trait Storage                            │  │  QueryParser (nom lexer)       │
│  FileStorage                              │  │    -> Query { Term | Prefix |  │
│  • docs:    RecordStore<StoredDocument>   │  │       FullText | And | Or |    │
│  • indices: field -> RecordStore<Posting> │  │       Not | Null }             │
│  • states:  RecordStore<StateRecord>      │  │  QueryExecutor                 │
│  • state_set: StateSet (+ deltas)         │◄─┤    running ResultSet           │
│  • automaton: dyn TypoAutomaton           │  │    Scorer -> SearchHit.weight  │
│  • analyzer: Arc<Analyzer>                │  └────────────────────────────────┘
└───────────────────────────────────────────┘
                 │
                 ▼
┌──────────────────────────── STORAGE LAYER ───────────────────────────────────┐
│  RecordStore<R: Record>        one sorted file of fixed-width JSON lines      │
│  • binary_search(pattern)      offset = index * width                         │
│  • get / prefix_scan / upsert(MergeStrategy) / delete / scan_by_states        │
│  • grow()                      width = min * (ceil(needed / min) + 1)         │
│  FileLock (flock LOCK_EX)      StorageLayout (file names)   MmapFile (scans)   │
└──────────────────────────────────────────────────────────────────────────────┘
*/
