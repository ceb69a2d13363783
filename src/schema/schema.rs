use serde::{Serialize, Deserialize};
use std::ops::BitOr;
use crate::core::error::{Error, Result};
use crate::core::types::{FieldMap, FieldValue};

/// Reserved for the document identifier
pub const ID_FIELD: &str = "id";

/// Per-field option bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FieldFlags(u8);

impl FieldFlags {
    pub const NONE: FieldFlags = FieldFlags(0);
    pub const REQUIRED: FieldFlags = FieldFlags(1);
    pub const STORED: FieldFlags = FieldFlags(2);
    pub const INDEXED: FieldFlags = FieldFlags(4);
    pub const FULLTEXT: FieldFlags = FieldFlags(8);
    pub const UNIQUE: FieldFlags = FieldFlags(16);

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: FieldFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for FieldFlags {
    type Output = FieldFlags;

    fn bitor(self, rhs: FieldFlags) -> FieldFlags {
        FieldFlags(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub flags: FieldFlags,
}

impl FieldDefinition {
    pub fn is_required(&self) -> bool {
        self.flags.contains(FieldFlags::REQUIRED)
    }

    pub fn is_stored(&self) -> bool {
        self.flags.contains(FieldFlags::STORED)
    }

    pub fn is_indexed(&self) -> bool {
        self.flags.contains(FieldFlags::INDEXED)
    }

    pub fn is_fulltext(&self) -> bool {
        self.flags.contains(FieldFlags::FULLTEXT)
    }

    pub fn is_unique(&self) -> bool {
        self.flags.contains(FieldFlags::UNIQUE)
    }
}

/// Static field declaration plus the analyzer used for its text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
    pub analyzer: String,
}

impl Schema {
    pub fn new(name: &str) -> Self {
        Schema {
            name: name.to_string(),
            fields: Vec::new(),
            analyzer: "standard".to_string(),
        }
    }

    pub fn add_field(mut self, name: &str, flags: FieldFlags) -> Result<Self> {
        if name == ID_FIELD {
            return Err(Error::validation(format!(
                "The schema provided contains a field with the reserved name `{}`",
                ID_FIELD
            )));
        }
        if name.is_empty() || self.field(name).is_some() {
            return Err(Error::validation(format!("Invalid or duplicate field name `{}`", name)));
        }

        self.fields.push(FieldDefinition {
            name: name.to_string(),
            flags,
        });
        Ok(self)
    }

    pub fn with_analyzer(mut self, analyzer: &str) -> Self {
        self.analyzer = analyzer.to_string();
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn indexed_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| f.is_indexed())
    }

    pub fn fulltext_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| f.is_fulltext())
    }

    /// Fails on the first REQUIRED field missing from `fields`, or on a
    /// NaN/infinite number (JSON lines cannot carry them)
    pub fn validate(&self, fields: &FieldMap) -> Result<()> {
        for (name, value) in fields {
            if let FieldValue::Number(num) = value
                && !num.is_finite()
            {
                return Err(Error::validation(format!(
                    "Field `{}` holds the non-finite number {}",
                    name, num
                )));
            }
        }

        for field in self.fields.iter().filter(|f| f.is_required()) {
            if !fields.contains_key(&field.name) {
                let doc = serde_json::to_string(fields).unwrap_or_default();
                return Err(Error::validation(format!(
                    "No `{}` key provided for doc {}",
                    field.name, doc
                )));
            }
        }
        Ok(())
    }

    /// Subset of `fields` flagged STORED
    pub fn stored(&self, fields: &FieldMap) -> FieldMap {
        self.fields
            .iter()
            .filter(|f| f.is_stored())
            .filter_map(|f| fields.get(&f.name).map(|v| (f.name.clone(), v.clone())))
            .collect()
    }
}
