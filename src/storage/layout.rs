use std::path::PathBuf;
use std::fs;
use crate::core::error::Result;

/// File names of one schema's tables under the storage directory
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub base_dir: PathBuf,      // Root directory
    pub schema: String,         // Prefix shared by every file
}

impl StorageLayout {
    pub fn new(base_dir: PathBuf, schema: &str) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;

        Ok(StorageLayout {
            base_dir,
            schema: schema.to_string(),
        })
    }

    pub fn docs_path(&self) -> PathBuf {
        self.base_dir.join(format!("{}_docs.json", self.schema))
    }

    pub fn index_path(&self, field: &str) -> PathBuf {
        self.base_dir.join(format!("{}_{}_index.json", self.schema, field))
    }

    pub fn states_path(&self) -> PathBuf {
        self.base_dir.join(format!("{}_states.json", self.schema))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_files_after_schema() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path().join("nested"), "articles").unwrap();
        assert!(layout.base_dir.is_dir());
        assert!(layout.docs_path().ends_with("articles_docs.json"));
        assert!(layout.index_path("title").ends_with("articles_title_index.json"));
        assert!(layout.states_path().ends_with("articles_states.json"));
    }
}
