use std::fmt;

use thiserror::Error;

use super::types::PageId;

/// Why the allocator refused to release or claim a page identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageIdRejection {
    /// Outside `[0, capacity)`
    OutOfRange,
    /// Header page or the page reserved after it
    Reserved,
    /// Already in the free pool
    NotAllocated,
    /// Already handed out
    AlreadyAllocated,
}

impl fmt::Display for PageIdRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            PageIdRejection::OutOfRange => "out of range",
            PageIdRejection::Reserved => "reserved",
            PageIdRejection::NotAllocated => "not allocated",
            PageIdRejection::AlreadyAllocated => "already allocated",
        };
        f.write_str(reason)
    }
}

/// Data access layer error types
#[derive(Error, Debug)]
pub enum DalError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Out of memory: could not acquire a {requested} byte page buffer")]
    OutOfMemory { requested: usize },

    #[error("Invalid capacity {0}: must leave room for at least one page beyond the reserved pair")]
    InvalidCapacity(usize),

    #[error("Invalid page size: {0}")]
    InvalidPageSize(usize),

    #[error("No free page identifiers left (capacity {capacity})")]
    Exhausted { capacity: usize },

    #[error("Cannot release {page_id}: {reason}")]
    InvalidRelease {
        page_id: PageId,
        reason: PageIdRejection,
    },

    #[error("Cannot claim {page_id}: {reason}")]
    InvalidClaim {
        page_id: PageId,
        reason: PageIdRejection,
    },

    #[error("Short read on {page_id}: expected {expected} bytes, got {actual}")]
    ShortRead {
        page_id: PageId,
        expected: usize,
        actual: usize,
    },

    #[error("Short write on {page_id}: expected {expected} bytes, wrote {actual}")]
    ShortWrite {
        page_id: PageId,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid page ID: {0}")]
    InvalidPageId(PageId),

    #[error("{0} is not allocated")]
    PageNotAllocated(PageId),

    #[error("Page size mismatch: expected {expected} bytes, page has {actual}")]
    PageSizeMismatch { expected: usize, actual: usize },

    #[error("Page overflow: {len} bytes at offset {offset} exceed page size {page_size}")]
    PageOverflow {
        offset: usize,
        len: usize,
        page_size: usize,
    },

    #[error("Data access layer is closed")]
    ClosedHandle,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DalError>;
