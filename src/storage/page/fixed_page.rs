use crate::common::{DalError, PageId, Result, INVALID_PAGE_ID};

/// A fixed-size unit of storage together with the identifier of the slot it
/// belongs to.
///
/// The payload length is set at creation and never changes. A page starts out
/// unassigned (`INVALID_PAGE_ID`) and must be given an id before it can be
/// written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    id: PageId,
    payload: Box<[u8]>,
}

/// Creates an unassigned, zero-filled page of `page_size` bytes.
///
/// The buffer is reserved fallibly so an allocation failure surfaces as
/// `OutOfMemory` instead of aborting the process.
pub fn allocate_empty_page(page_size: usize) -> Result<Page> {
    if page_size == 0 {
        return Err(DalError::InvalidPageSize(page_size));
    }

    let mut buf = Vec::new();
    buf.try_reserve_exact(page_size)
        .map_err(|_| DalError::OutOfMemory {
            requested: page_size,
        })?;
    buf.resize(page_size, 0);

    Ok(Page {
        id: INVALID_PAGE_ID,
        payload: buf.into_boxed_slice(),
    })
}

impl Page {
    /// Returns the page ID.
    pub fn id(&self) -> PageId {
        self.id
    }

    /// Assigns the slot this page will be written to.
    pub fn set_id(&mut self, id: PageId) {
        self.id = id;
    }

    /// Returns true once the page has a real slot.
    pub fn is_assigned(&self) -> bool {
        self.id.is_valid()
    }

    pub fn page_size(&self) -> usize {
        self.payload.len()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.payload
    }

    /// Copies `bytes` into the payload starting at `offset`.
    /// Leaves the payload untouched if the range does not fit.
    pub fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let end = offset
            .checked_add(bytes.len())
            .filter(|&end| end <= self.payload.len())
            .ok_or(DalError::PageOverflow {
                offset,
                len: bytes.len(),
                page_size: self.payload.len(),
            })?;

        self.payload[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Zero-fills the payload, keeping the id.
    pub fn clear(&mut self) {
        self.payload.fill(0);
    }
}
