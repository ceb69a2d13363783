use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use regex::bytes::Regex;
use tracing::{info, trace};
use crate::core::error::{Error, ErrorKind, Result};
use crate::mmap::mmap_file::MmapFile;
use crate::storage::file_lock::FileLock;
use crate::storage::record::{key_pattern, prefix_pattern, MergeStrategy, Record, SortKey};

/// Trailing `"s":<n>}` of a line carrying a typo state
const STATE_PATTERN: &str = r#""s":(\d+)\}\s*$"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    ReadWrite,
}

/// Sorted file of fixed-width JSON lines
///
/// Every line is `width` bytes: the encoded record, space padding, `\n`.
/// Lines are ordered by their leading key bytes so point and prefix
/// lookups are binary searches over `offset = index * width`.
pub struct RecordStore<R: Record> {
    pub path: PathBuf,
    file: Option<File>,
    width: usize,
    min_width: usize,
    _record: PhantomData<R>,
}

impl<R: Record> RecordStore<R> {
    pub fn new(path: impl Into<PathBuf>, min_width: usize) -> Self {
        // Room for at least `{}` and the newline
        let min_width = min_width.max(3);
        RecordStore {
            path: path.into(),
            file: None,
            width: min_width,
            min_width,
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Create the file if absent
    pub fn create(&self) -> Result<()> {
        OpenOptions::new().create(true).append(true).open(&self.path)?;
        Ok(())
    }

    pub fn open(&mut self, mode: OpenMode) -> Result<()> {
        let file = match mode {
            OpenMode::Read => File::open(&self.path)?,
            OpenMode::ReadWrite => OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&self.path)?,
        };

        self.width = self.discover_width(&file)?.unwrap_or(self.min_width);
        self.file = Some(file);
        Ok(())
    }

    pub fn close(&mut self) {
        self.file = None;
    }

    /// Empty the file; the width falls back to the minimum
    pub fn truncate(&mut self) -> Result<()> {
        match &self.file {
            Some(file) => {
                let _lock = FileLock::exclusive(file)?;
                file.set_len(0)?;
            }
            None => {
                File::create(&self.path)?;
            }
        }
        self.width = self.min_width;
        info!(path = %self.path.display(), "Truncated record file");
        Ok(())
    }

    /// Width of the first line, `None` for an empty file
    fn discover_width(&self, file: &File) -> Result<Option<usize>> {
        let mut reader = BufReader::new(file);
        let mut first = Vec::new();
        reader.read_until(b'\n', &mut first)?;

        if first.is_empty() {
            return Ok(None);
        }
        if first.last() != Some(&b'\n') {
            return Err(Error::storage(format!(
                "Unterminated record line in {}",
                self.path.display()
            )));
        }
        Ok(Some(first.len()))
    }

    fn file(&self) -> Result<&File> {
        self.file.as_ref().ok_or_else(|| Error {
            kind: ErrorKind::InvalidState,
            context: format!("Record file {} is not open", self.path.display()),
        })
    }

    /// Number of records
    pub fn total(&self) -> Result<usize> {
        let len = self.file()?.metadata()?.len() as usize;
        Ok(len / self.width)
    }

    fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<()> {
        let mut file = self.file()?;
        file.seek(SeekFrom::Start(offset as u64))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn read_line(&self, index: usize) -> Result<Vec<u8>> {
        let mut line = vec![0u8; self.width];
        self.read_at(index * self.width, &mut line)?;
        Ok(line)
    }

    fn read_record(&self, index: usize) -> Result<R> {
        let line = self.read_line(index)?;
        Ok(serde_json::from_slice(line.trim_ascii_end())?)
    }

    fn read_from(&self, offset: usize) -> Result<Vec<u8>> {
        let mut file = self.file()?;
        file.seek(SeekFrom::Start(offset as u64))?;
        let mut rest = Vec::new();
        file.read_to_end(&mut rest)?;
        Ok(rest)
    }

    fn write_at(&self, offset: usize, bytes: &[u8]) -> Result<()> {
        let mut file = self.file()?;
        file.seek(SeekFrom::Start(offset as u64))?;
        file.write_all(bytes)?;
        Ok(())
    }

    /// Binary search over the line-sorted file
    ///
    /// Compares the first `min(pattern.len(), width)` bytes of a line with
    /// `pattern`. Returns `(true, index)` on a match, otherwise `(false, i)`
    /// where `i` is the position that keeps the file sorted on insert.
    pub fn binary_search(&self, pattern: &[u8]) -> Result<(bool, usize)> {
        let mut low = 0;
        let mut high = self.total()?;
        let len = pattern.len().min(self.width);
        let mut probe = vec![0u8; len];

        while low < high {
            let mid = low + (high - low) / 2;
            self.read_at(mid * self.width, &mut probe)?;

            match probe.as_slice().cmp(pattern) {
                std::cmp::Ordering::Equal => return Ok((true, mid)),
                std::cmp::Ordering::Less => low = mid + 1,
                std::cmp::Ordering::Greater => high = mid,
            }
        }

        Ok((false, low))
    }

    pub fn get(&self, key: SortKey<'_>) -> Result<Option<R>> {
        let pattern = key_pattern::<R>(key)?;
        match self.binary_search(&pattern)? {
            (true, index) => Ok(Some(self.read_record(index)?)),
            (false, _) => Ok(None),
        }
    }

    /// Every record whose text key starts with `prefix`, in key order
    pub fn prefix_scan(&self, prefix: &str) -> Result<Vec<R>> {
        let pattern = prefix_pattern::<R>(prefix)?;
        let (hit, index) = self.binary_search(&pattern)?;
        if !hit {
            return Ok(Vec::new());
        }

        let matches = |i: usize| -> Result<bool> {
            Ok(self.read_line(i)?.starts_with(&pattern))
        };

        let mut start = index;
        while start > 0 && matches(start - 1)? {
            start -= 1;
        }

        let total = self.total()?;
        let mut records = Vec::new();
        let mut i = start;
        while i < total {
            let line = self.read_line(i)?;
            if !line.starts_with(&pattern) {
                break;
            }
            records.push(serde_json::from_slice(line.trim_ascii_end())?);
            i += 1;
        }

        Ok(records)
    }

    /// Insert `record` in sorted position, or merge it into the stored one
    pub fn upsert(&mut self, mut record: R, strategy: MergeStrategy<R>) -> Result<()> {
        let lock = FileLock::exclusive(self.file()?)?;

        let pattern = key_pattern::<R>(record.sort_key())?;
        let (hit, index) = self.binary_search(&pattern)?;

        if hit {
            let existing = self.read_record(index)?;
            strategy.merge(&mut record, existing);
        }

        let payload = serde_json::to_vec(&record)?;
        if payload.len() + 1 > self.width {
            self.grow(payload.len() + 1)?;
        }
        let line = self.pad(payload);

        if hit {
            self.write_at(index * self.width, &line)?;
        } else {
            let offset = index * self.width;
            let rest = self.read_from(offset)?;
            self.write_at(offset, &line)?;
            self.write_at(offset + line.len(), &rest)?;
            trace!(path = %self.path.display(), index, shifted = rest.len(), "Spliced record in");
        }

        drop(lock);
        Ok(())
    }

    /// Remove the record stored under `key`; false when absent
    pub fn delete(&mut self, key: SortKey<'_>) -> Result<bool> {
        let _lock = FileLock::exclusive(self.file()?)?;

        let pattern = key_pattern::<R>(key)?;
        let (hit, index) = self.binary_search(&pattern)?;
        if !hit {
            return Ok(false);
        }

        let offset = index * self.width;
        let rest = self.read_from(offset + self.width)?;
        self.write_at(offset, &rest)?;

        let file = self.file()?;
        let len = file.metadata()?.len();
        file.set_len(len - self.width as u64)?;
        trace!(path = %self.path.display(), index, "Spliced record out");

        Ok(true)
    }

    /// Rewrite every line padded to a width that fits `needed` bytes
    fn grow(&mut self, needed: usize) -> Result<()> {
        let new_width = self.min_width * (needed.div_ceil(self.min_width) + 1);

        let old = self.read_from(0)?;
        let mut rewritten = Vec::with_capacity(old.len() / self.width.max(1) * new_width);
        for line in old.chunks(self.width) {
            let payload = line.trim_ascii_end().to_vec();
            rewritten.extend(pad_to(payload, new_width));
        }

        let file = self.file()?;
        file.set_len(0)?;
        self.write_at(0, &rewritten)?;

        info!(
            path = %self.path.display(),
            from = self.width,
            to = new_width,
            "Grew record width"
        );
        self.width = new_width;
        Ok(())
    }

    fn pad(&self, payload: Vec<u8>) -> Vec<u8> {
        pad_to(payload, self.width)
    }

    /// All records in key order
    pub fn scan_all(&self) -> Result<Vec<R>> {
        let mmap = MmapFile::open_read_only(&self.path)?;
        mmap.lines()
            .map(|line| Ok(serde_json::from_slice(line)?))
            .collect()
    }

    /// Records whose trailing `s` field is one of `states`
    pub fn scan_by_states(&self, states: &HashSet<u64>) -> Result<Vec<R>> {
        if states.is_empty() {
            return Ok(Vec::new());
        }

        let pattern = Regex::new(STATE_PATTERN)?;
        let mmap = MmapFile::open_read_only(&self.path)?;
        let mut records = Vec::new();

        for line in mmap.lines() {
            let state = pattern
                .captures(line)
                .and_then(|caps| caps.get(1))
                .and_then(|m| std::str::from_utf8(m.as_bytes()).ok())
                .and_then(|digits| digits.parse::<u64>().ok());

            if state.is_some_and(|s| states.contains(&s)) {
                records.push(serde_json::from_slice(line)?);
            }
        }

        Ok(records)
    }
}

fn pad_to(mut payload: Vec<u8>, width: usize) -> Vec<u8> {
    payload.resize(width - 1, b' ');
    payload.push(b'\n');
    payload
}
