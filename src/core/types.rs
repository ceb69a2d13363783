use serde::{Serialize, Deserialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use crate::core::error::{Error, Result};
use crate::core::utils;

/// Base-62 encoded document identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub String);

impl DocId {
    /// Caller-assigned id; must be non-empty and free of the posting separator
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::validation("Document id must not be empty"));
        }
        if id.contains(',') {
            return Err(Error::validation(format!("Document id `{}` must not contain `,`", id)));
        }
        Ok(DocId(id))
    }

    pub fn from_sequence(sequence: u64) -> Self {
        DocId(utils::encode_id(sequence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocId {
    fn from(id: &str) -> Self {
        DocId(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Boolean(bool),
}

impl FieldValue {
    /// Text form fed to the tokenizer and to fulltext substring checks
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(text) => Cow::Borrowed(text),
            // Below 1e15 an integral f64 is exact as i64
            FieldValue::Number(num) if num.fract() == 0.0 && num.abs() < 1e15 => {
                Cow::Owned(format!("{}", *num as i64))
            }
            FieldValue::Number(num) => Cow::Owned(num.to_string()),
            FieldValue::Boolean(flag) => Cow::Owned(flag.to_string()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        FieldValue::Text(text.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        FieldValue::Text(text)
    }
}

impl From<f64> for FieldValue {
    fn from(num: f64) -> Self {
        FieldValue::Number(num)
    }
}

impl From<i64> for FieldValue {
    fn from(num: i64) -> Self {
        FieldValue::Number(num as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(flag: bool) -> Self {
        FieldValue::Boolean(flag)
    }
}

pub type FieldMap = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub fields: FieldMap,
}

impl Document {
    pub fn with_fields(id: DocId, fields: FieldMap) -> Self {
        Document { id, fields }
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// Build a [`FieldMap`] from `(name, value)` pairs
pub fn fields<I, K, V>(pairs: I) -> FieldMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<FieldValue>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}
