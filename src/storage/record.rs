use serde::{Serialize, Deserialize};
use serde::de::DeserializeOwned;
use crate::core::error::Result;
use crate::core::types::FieldMap;
use crate::index::posting::PostingList;

/// Value a record file is sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey<'a> {
    Text(&'a str),
    /// Only valid for records whose key is their sole field
    Number(u64),
}

/// A JSON line in a sorted record file; the key field is serialized first
pub trait Record: Serialize + DeserializeOwned {
    const KEY_FIELD: &'static str;

    fn sort_key(&self) -> SortKey<'_>;

    /// Fold `existing` into `self` for [`MergeStrategy::UnionIds`]
    fn union_ids(&mut self, _existing: Self) {}
}

/// How an upsert treats a record already stored under the same key
pub enum MergeStrategy<R> {
    Replace,
    UnionIds,
    /// Called as `merge(&mut incoming, existing)`
    Custom(fn(&mut R, R)),
}

impl<R: Record> MergeStrategy<R> {
    pub fn merge(&self, incoming: &mut R, existing: R) {
        match self {
            MergeStrategy::Replace => {}
            MergeStrategy::UnionIds => incoming.union_ids(existing),
            MergeStrategy::Custom(merge) => merge(incoming, existing),
        }
    }
}

/// Leading bytes of every line stored under `key`
pub fn key_pattern<R: Record>(key: SortKey<'_>) -> Result<Vec<u8>> {
    let pattern = match key {
        SortKey::Text(text) => {
            format!("{{\"{}\":{}", R::KEY_FIELD, serde_json::to_string(text)?)
        }
        SortKey::Number(num) => format!("{{\"{}\":{}}}", R::KEY_FIELD, num),
    };
    Ok(pattern.into_bytes())
}

/// Leading bytes shared by every line whose text key starts with `prefix`
pub fn prefix_pattern<R: Record>(prefix: &str) -> Result<Vec<u8>> {
    let mut pattern = key_pattern::<R>(SortKey::Text(prefix))?;
    // Drop the closing quote so longer keys still match
    pattern.pop();
    Ok(pattern)
}

/// Stored projection of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    #[serde(flatten)]
    pub fields: FieldMap,
}

impl Record for StoredDocument {
    const KEY_FIELD: &'static str = "id";

    fn sort_key(&self) -> SortKey<'_> {
        SortKey::Text(&self.id)
    }
}

/// One posting list line: term, comma-joined ids, optional typo state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostingRecord {
    #[serde(rename = "k")]
    pub key: String,
    pub ids: String,
    #[serde(rename = "s", default, skip_serializing_if = "Option::is_none")]
    pub state: Option<u64>,
}

impl PostingRecord {
    pub fn new(key: &str, postings: &PostingList, state: Option<u64>) -> Self {
        PostingRecord {
            key: key.to_string(),
            ids: postings.encode(),
            state,
        }
    }

    pub fn postings(&self) -> PostingList {
        PostingList::decode(&self.ids)
    }
}

impl Record for PostingRecord {
    const KEY_FIELD: &'static str = "k";

    fn sort_key(&self) -> SortKey<'_> {
        SortKey::Text(&self.key)
    }

    fn union_ids(&mut self, existing: Self) {
        let mut merged = existing.postings();
        merged.union(&self.postings());
        self.ids = merged.encode();
        if self.state.is_none() {
            self.state = existing.state;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    #[serde(rename = "s")]
    pub state: u64,
}

impl Record for StateRecord {
    const KEY_FIELD: &'static str = "s";

    fn sort_key(&self) -> SortKey<'_> {
        SortKey::Number(self.state)
    }
}
