use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::common::{DalConfig, DalError, PageId, Result};
use crate::storage::page::{allocate_empty_page, Page};

use super::PageManager;

/// Dal (data access layer) maps page identifiers onto a single backing file.
///
/// Page `n` lives at byte offset `n * page_size`. Every read and write moves
/// exactly one page. The Dal owns the file handle and the allocator; it has no
/// internal locking, see `SharedDal` for a handle that can cross threads.
pub struct Dal {
    /// The backing file, `None` once closed
    file: Option<File>,
    /// Path to the backing file
    path: PathBuf,
    /// Page size and capacity
    config: DalConfig,
    /// Page identifier allocator
    allocator: PageManager,
    /// Number of pages read
    num_reads: u64,
    /// Number of pages written
    num_writes: u64,
}

impl Dal {
    /// Creates the backing file, discarding anything already at `path`.
    pub fn create<P: AsRef<Path>>(path: P, config: DalConfig) -> Result<Self> {
        Self::open_with(path.as_ref(), config, true)
    }

    /// Opens the backing file read-write, creating it if missing and keeping
    /// its contents.
    ///
    /// The allocator is not stored in the file, so it starts fresh: pages
    /// written in an earlier session are readable but must be claimed before
    /// they can be written again.
    pub fn open<P: AsRef<Path>>(path: P, config: DalConfig) -> Result<Self> {
        Self::open_with(path.as_ref(), config, false)
    }

    fn open_with(path: &Path, config: DalConfig, truncate: bool) -> Result<Self> {
        config.validate()?;
        let allocator = PageManager::new(config.max_pages)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(truncate)
            .open(path)?;

        let file_len = file.metadata()?.len();
        let existing = file_len / config.page_size as u64;
        debug!(
            path = %path.display(),
            page_size = config.page_size,
            max_pages = config.max_pages,
            truncate,
            existing_pages = existing,
            "opened data file"
        );
        if existing > 0 {
            warn!(
                path = %path.display(),
                existing_pages = existing,
                "allocator state is not persisted; previously allocated pages are treated as free"
            );
        }
        if let Some(limit) = config.file_size_limit().filter(|&limit| file_len > limit) {
            warn!(
                path = %path.display(),
                file_len,
                limit,
                "file is larger than max_pages * page_size; trailing pages are unreachable"
            );
        }

        Ok(Self {
            file: Some(file),
            path: path.to_path_buf(),
            config,
            allocator,
            num_reads: 0,
            num_writes: 0,
        })
    }

    /// Hands out a free page identifier.
    pub fn allocate_page_id(&mut self) -> Result<PageId> {
        self.ensure_open()?;
        self.allocator.allocate()
    }

    /// Returns a page identifier to the free pool.
    pub fn release_page_id(&mut self, page_id: PageId) -> Result<()> {
        self.ensure_open()?;
        self.allocator.release(page_id)
    }

    /// Marks a specific identifier as in use, e.g. a page known to be live
    /// after reopening a file.
    pub fn claim_page_id(&mut self, page_id: PageId) -> Result<()> {
        self.ensure_open()?;
        self.allocator.claim(page_id)
    }

    /// Creates an unassigned, zeroed page sized for this file.
    pub fn allocate_empty_page(&self) -> Result<Page> {
        allocate_empty_page(self.config.page_size)
    }

    /// Reads page `page_id` from disk.
    ///
    /// Ids released in this session are rejected until reallocated. Ids the
    /// allocator has never handed out stay readable, so pages written before
    /// a reopen can be read back. Fails with `ShortRead` if the file does not
    /// hold the whole page.
    pub fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        self.ensure_open()?;
        let offset = self.check_page_id(page_id)?;
        if self.allocator.is_released(page_id) {
            return Err(DalError::PageNotAllocated(page_id));
        }

        let page_size = self.config.page_size;
        let mut page = allocate_empty_page(page_size)?;
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(offset))?;

        let actual = read_full(file, page.payload_mut())?;
        if actual < page_size {
            return Err(DalError::ShortRead {
                page_id,
                expected: page_size,
                actual,
            });
        }
        page.set_id(page_id);

        self.num_reads += 1;
        trace!(%page_id, "read page");
        Ok(page)
    }

    /// Writes `page` at the slot named by its id.
    ///
    /// The page must be assigned, sized for this file, and either reserved or
    /// currently allocated. Those checks run before any I/O, so a rejected
    /// write leaves the file untouched.
    pub fn write_page(&mut self, page: &Page) -> Result<()> {
        self.ensure_open()?;
        let page_id = page.id();
        let offset = self.check_page_id(page_id)?;

        let page_size = self.config.page_size;
        if page.page_size() != page_size {
            return Err(DalError::PageSizeMismatch {
                expected: page_size,
                actual: page.page_size(),
            });
        }
        if !self.allocator.is_reserved(page_id) && !self.allocator.is_allocated(page_id) {
            return Err(DalError::PageNotAllocated(page_id));
        }

        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(offset))?;
        let actual = write_full(file, page.payload())?;
        if actual < page_size {
            return Err(DalError::ShortWrite {
                page_id,
                expected: page_size,
                actual,
            });
        }
        file.flush()?;

        self.num_writes += 1;
        trace!(%page_id, "wrote page");
        Ok(())
    }

    /// Flushes buffered writes and syncs the file to disk.
    pub fn sync(&mut self) -> Result<()> {
        let file = self.file_mut()?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }

    /// Flushes and releases the file handle. Every later call, including a
    /// second close, fails with `ClosedHandle`.
    pub fn close(&mut self) -> Result<()> {
        let mut file = self.file.take().ok_or(DalError::ClosedHandle)?;
        file.flush()?;
        file.sync_all()?;

        debug!(
            path = %self.path.display(),
            reads = self.num_reads,
            writes = self.num_writes,
            "closed data file"
        );
        Ok(())
    }

    /// Returns true once `close` has released the file handle.
    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    /// Returns the number of whole pages currently in the file.
    pub fn num_pages(&self) -> Result<u64> {
        let file = self.file.as_ref().ok_or(DalError::ClosedHandle)?;
        Ok(file.metadata()?.len() / self.config.page_size as u64)
    }

    /// Returns the number of pages read.
    pub fn num_reads(&self) -> u64 {
        self.num_reads
    }

    /// Returns the number of pages written.
    pub fn num_writes(&self) -> u64 {
        self.num_writes
    }

    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    pub fn config(&self) -> &DalConfig {
        &self.config
    }

    pub fn allocator(&self) -> &PageManager {
        &self.allocator
    }

    /// Returns the path to the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_open(&self) -> Result<()> {
        if self.file.is_none() {
            return Err(DalError::ClosedHandle);
        }
        Ok(())
    }

    fn file_mut(&mut self) -> Result<&mut File> {
        self.file.as_mut().ok_or(DalError::ClosedHandle)
    }

    /// Only ids inside the configured capacity map to a slot. Returns the
    /// byte offset of that slot.
    fn check_page_id(&self, page_id: PageId) -> Result<u64> {
        match page_id.index() {
            Some(i) if i < self.config.max_pages => page_id
                .offset(self.config.page_size)
                .ok_or(DalError::InvalidPageId(page_id)),
            _ => Err(DalError::InvalidPageId(page_id)),
        }
    }
}

impl Drop for Dal {
    fn drop(&mut self) {
        // Best effort for a Dal that was never closed
        if let Some(file) = self.file.as_mut() {
            let _ = file.flush();
            let _ = file.sync_all();
        }
    }
}

/// Reads until `buf` is full or the source hits end of file.
/// Returns the number of bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Writes until `buf` is drained or the sink stops accepting bytes.
/// Returns the number of bytes written.
fn write_full<W: Write>(writer: &mut W, buf: &[u8]) -> io::Result<usize> {
    let mut written = 0;
    while written < buf.len() {
        match writer.write(&buf[written..]) {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(written)
}
