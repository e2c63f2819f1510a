//! A small LRU pool of open `blk*.dat` file handles.
//!
//! Sequential height iteration mostly revisits the same one or two
//! files, but jumps across file boundaries happen at every `blk*.dat`
//! rollover; a bounded pool amortises `open()` cost without ever
//! exhausting descriptors. Capacity and buffer size are fixed per the
//! spec (8 handles, ~10 MiB buffered reads each) rather than configurable,
//! since they are an implementation resource budget, not a tunable.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

const MAX_OPEN_FILES: usize = 8;
const READ_BUFFER_SIZE: usize = 10 * 1024 * 1024;

struct OpenFile {
    file_no: u32,
    reader: BufReader<File>,
}

pub struct FilePool {
    dir: PathBuf,
    // Front = most recently used.
    open: VecDeque<OpenFile>,
}

impl FilePool {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FilePool {
            dir: dir.into(),
            open: VecDeque::with_capacity(MAX_OPEN_FILES),
        }
    }

    fn blk_path(&self, file_no: u32) -> PathBuf {
        self.dir.join(format!("blk{file_no:05}.dat"))
    }

    fn position(&mut self, file_no: u32) -> Option<usize> {
        self.open.iter().position(|f| f.file_no == file_no)
    }

    fn touch(&mut self, idx: usize) {
        if idx != 0 {
            let entry = self.open.remove(idx).expect("index from position()");
            self.open.push_front(entry);
        }
    }

    fn open_file(&mut self, file_no: u32) -> io::Result<()> {
        if self.open.len() >= MAX_OPEN_FILES {
            self.open.pop_back();
        }
        let file = File::open(self.blk_path(file_no))?;
        let reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
        self.open.push_front(OpenFile { file_no, reader });
        Ok(())
    }

    /// Read exactly `len` bytes starting at `offset` within `file_no`.
    pub fn read_at(&mut self, file_no: u32, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        match self.position(file_no) {
            Some(idx) => self.touch(idx),
            None => self.open_file(file_no)?,
        }
        let entry = &mut self.open[0];
        entry.reader.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        entry.reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
