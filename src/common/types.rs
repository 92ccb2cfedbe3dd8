use std::fmt;

/// Page identifier type - addresses a fixed-size slot in the backing file.
/// Negative values never reach the disk; `INVALID_PAGE_ID` marks a page that
/// has not been placed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub i32);

impl PageId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    pub fn as_i32(&self) -> i32 {
        self.0
    }

    /// Returns true if this identifier can be mapped to a file offset.
    pub fn is_valid(&self) -> bool {
        self.0 >= 0
    }

    /// Returns the index of this page, or None for an unassigned id.
    pub fn index(&self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }

    /// Byte offset of this page in a file of `page_size`-byte pages.
    /// None for an unassigned id or an offset past `u64::MAX`.
    pub fn offset(&self, page_size: usize) -> Option<u64> {
        let index = u64::try_from(self.0).ok()?;
        index.checked_mul(page_size as u64)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageId({})", self.0)
    }
}

/// Identifier carried by a page that has not been assigned a slot
pub const INVALID_PAGE_ID: PageId = PageId(-1);

/// Page 0 holds the file header
pub const HEADER_PAGE_ID: PageId = PageId(0);

/// Page 1 is reserved for future use
pub const RESERVED_PAGE_ID: PageId = PageId(1);

/// Number of pages at the start of the file that are never allocated
pub const NUM_RESERVED_PAGES: usize = 2;

/// First identifier the allocator hands out
pub const FIRST_ALLOCATABLE_PAGE_ID: PageId = PageId(NUM_RESERVED_PAGES as i32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_validity() {
        assert!(!INVALID_PAGE_ID.is_valid());
        assert_eq!(INVALID_PAGE_ID.index(), None);
        assert!(HEADER_PAGE_ID.is_valid());
        assert_eq!(PageId::new(7).index(), Some(7));
    }

    #[test]
    fn test_page_id_offset() {
        assert_eq!(PageId::new(0).offset(4096), Some(0));
        assert_eq!(PageId::new(2).offset(4096), Some(8192));
        assert_eq!(
            PageId::new(i32::MAX).offset(4096),
            Some((i32::MAX as u64) * 4096)
        );
        assert_eq!(INVALID_PAGE_ID.offset(4096), None);
        assert_eq!(PageId::new(4).offset(usize::MAX), None);
    }

    #[test]
    fn test_page_id_display() {
        assert_eq!(PageId::new(2).to_string(), "PageId(2)");
        assert_eq!(INVALID_PAGE_ID.to_string(), "PageId(-1)");
    }
}
