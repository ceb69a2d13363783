use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_path: PathBuf,

    // Minimum record widths; files grow past these on demand
    pub docs_record_width: usize,
    pub index_record_width: usize,
    pub state_record_width: usize,

    pub typo_tolerance: TypoToleranceConfig,
}

/// Settings for typo-tolerant term lookup
#[derive(Debug, Clone)]
pub struct TypoToleranceConfig {
    pub enabled: bool,
    /// (minimum term length in chars, allowed edit distance), longest first
    pub thresholds: Vec<(usize, u8)>,
    /// Number of leading characters encoded into a state id
    pub index_length: usize,
    pub alphabet_size: u32,
}

impl Default for TypoToleranceConfig {
    fn default() -> Self {
        TypoToleranceConfig {
            enabled: true,
            thresholds: vec![(9, 2), (5, 1)],
            index_length: 14,
            alphabet_size: 4,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_path: PathBuf::from("./data"),
            docs_record_width: 256,
            index_record_width: 12,
            state_record_width: 12,
            typo_tolerance: TypoToleranceConfig::default(),
        }
    }
}

impl Config {
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    pub fn without_typo_tolerance(mut self) -> Self {
        self.typo_tolerance.enabled = false;
        self
    }
}
