use crate::SweepError;
use crate::segment::{INTERSECTION_BYTES, Intersection, SEGMENT_BYTES, Segment};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// A fixed-size record persisted through a paged store.
pub trait Record: bincode::Encode + bincode::Decode<()> + Copy {
    const ENCODED_BYTES: u64;
}

impl Record for Segment {
    const ENCODED_BYTES: u64 = SEGMENT_BYTES;
}

impl Record for Intersection {
    const ENCODED_BYTES: u64 = INTERSECTION_BYTES;
}

/// Append-only record store with page-granular iteration.
///
/// Records have a fixed encoded size, so byte offsets and record counts are
/// interchangeable. Writers are buffered; call `flush` before handing the
/// store's path or a page cursor to a reader.
#[derive(Debug)]
pub struct PagedStore<R: Record> {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    records: u64,
    _marker: PhantomData<R>,
}

impl<R: Record> PagedStore<R> {
    /// Create a fresh store at `path`, truncating any previous file.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, SweepError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)?;
        Ok(PagedStore {
            path,
            writer: Some(BufWriter::new(file)),
            records: 0,
            _marker: PhantomData,
        })
    }

    /// Open an existing store read-only.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SweepError> {
        let path = path.into();
        let len = fs::metadata(&path)?.len();
        Ok(PagedStore {
            path,
            writer: None,
            records: len / R::ENCODED_BYTES,
            _marker: PhantomData,
        })
    }

    pub fn append(&mut self, record: &R) -> Result<(), SweepError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| SweepError::Other("store is not writable".to_string()))?;
        bincode::encode_into_std_write(*record, writer, bincode::config::standard())?;
        self.records += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), SweepError> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Flush and release the write handle; the store stays readable.
    pub fn close(&mut self) -> Result<(), SweepError> {
        self.flush()?;
        self.writer = None;
        Ok(())
    }

    pub fn record_count(&self) -> u64 {
        self.records
    }

    pub fn byte_len(&self) -> u64 {
        self.records * R::ENCODED_BYTES
    }

    pub fn pathname(&self) -> &Path {
        &self.path
    }

    /// Lazy page iteration from `offset` to the end of the store.
    pub fn pages(&self, offset: u64, records_per_page: usize) -> Result<PageCursor<R>, SweepError> {
        self.pages_range(offset, self.byte_len(), records_per_page)
    }

    /// Lazy page iteration over the byte range `[begin, end)`.
    pub fn pages_range(
        &self,
        begin: u64,
        end: u64,
        records_per_page: usize,
    ) -> Result<PageCursor<R>, SweepError> {
        let end = end.min(self.byte_len());
        let remaining = end.saturating_sub(begin) / R::ENCODED_BYTES;
        let file = File::open(&self.path)?;
        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(begin))?;
        Ok(PageCursor {
            reader,
            remaining,
            records_per_page: records_per_page.max(1),
            _marker: PhantomData,
        })
    }

    /// Remove the backing file, consuming the store.
    pub fn delete(mut self) -> Result<(), SweepError> {
        self.writer = None;
        fs::remove_file(&self.path)?;
        Ok(())
    }
}

/// Cursor over a store's byte range, yielding one decoded page at a time.
pub struct PageCursor<R: Record> {
    reader: BufReader<File>,
    remaining: u64,
    records_per_page: usize,
    _marker: PhantomData<R>,
}

impl<R: Record> PageCursor<R> {
    /// The next page as `(records, bytes consumed)`, or `None` once the
    /// range yields zero records.
    pub fn next_page(&mut self) -> Result<Option<(Vec<R>, u64)>, SweepError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let take = self.records_per_page.min(self.remaining as usize);
        let mut batch = Vec::with_capacity(take);
        for _ in 0..take {
            let record: R =
                bincode::decode_from_std_read(&mut self.reader, bincode::config::standard())?;
            batch.push(record);
        }
        self.remaining -= take as u64;
        Ok(Some((batch, take as u64 * R::ENCODED_BYTES)))
    }
}
