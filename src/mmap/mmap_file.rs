use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::path::Path;
use crate::core::error::Result;

/// Read-only memory map of a record file
pub struct MmapFile {
    pub mmap: Option<Mmap>,
    pub len: usize,
}

impl MmapFile {
    /// Zero-length files are not mapped
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        let metadata = file.metadata()?;
        let len = metadata.len() as usize;

        if len == 0 {
            return Ok(MmapFile { mmap: None, len });
        }

        let mmap = unsafe { MmapOptions::new().len(len).map(&file)? };

        Ok(MmapFile { mmap: Some(mmap), len })
    }

    pub fn data(&self) -> &[u8] {
        match &self.mmap {
            Some(mmap) => &mmap[..],
            None => &[],
        }
    }

    /// Newline separated lines with their padding removed, blank lines skipped
    pub fn lines(&self) -> impl Iterator<Item = &[u8]> {
        self.data()
            .split(|&b| b == b'\n')
            .map(|line| line.trim_ascii_end())
            .filter(|line| !line.is_empty())
    }
}
