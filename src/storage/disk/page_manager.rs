use tracing::trace;

use crate::common::{
    validate_capacity, DalError, PageId, PageIdRejection, Result, NUM_RESERVED_PAGES,
};

/// Allocation state of one page identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    /// Never handed out by this manager
    Unknown,
    /// Handed out and not yet released
    Allocated,
    /// Released and waiting for reuse
    Released,
}

/// PageManager hands out page identifiers and takes them back.
///
/// Identifiers 0 and 1 never enter the free stack, so no sequence of calls can
/// allocate them. Released ids are reused most-recent-first; before any
/// release, ids come out in ascending order starting at 2.
///
/// State lives in memory only. A manager built for a reopened file knows
/// nothing about pages handed out before; use `claim` to re-register them.
#[derive(Debug)]
pub struct PageManager {
    /// Maximum number of pages, reserved pages included
    capacity: usize,
    /// Free identifiers; the top of the stack is the next allocation
    free_list: Vec<PageId>,
    /// State per identifier
    slots: Vec<SlotState>,
}

impl PageManager {
    /// Creates a manager for a file of `capacity` pages.
    pub fn new(capacity: usize) -> Result<Self> {
        validate_capacity(capacity)?;

        let free_len = capacity - NUM_RESERVED_PAGES;
        let mut free_list = Vec::new();
        free_list
            .try_reserve_exact(free_len)
            .map_err(|_| DalError::OutOfMemory {
                requested: free_len * std::mem::size_of::<PageId>(),
            })?;
        // Pushed in descending order so the first pops ascend.
        free_list.extend((NUM_RESERVED_PAGES..capacity).rev().map(|i| PageId::new(i as i32)));

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| DalError::OutOfMemory {
                requested: capacity * std::mem::size_of::<SlotState>(),
            })?;
        slots.resize(capacity, SlotState::Unknown);

        Ok(Self {
            capacity,
            free_list,
            slots,
        })
    }

    /// Takes the most recently released identifier, or the lowest untouched
    /// one if nothing has been released.
    pub fn allocate(&mut self) -> Result<PageId> {
        let page_id = self.free_list.pop().ok_or(DalError::Exhausted {
            capacity: self.capacity,
        })?;
        self.slots[page_id.0 as usize] = SlotState::Allocated;

        trace!(%page_id, free = self.free_list.len(), "allocated page id");
        Ok(page_id)
    }

    /// Returns an allocated identifier to the free stack.
    ///
    /// Out-of-range, reserved and already-free ids are rejected; a rejected
    /// release leaves the manager unchanged.
    pub fn release(&mut self, page_id: PageId) -> Result<()> {
        let index = self
            .check_allocatable(page_id)
            .map_err(|reason| DalError::InvalidRelease { page_id, reason })?;
        if self.slots[index] != SlotState::Allocated {
            return Err(DalError::InvalidRelease {
                page_id,
                reason: PageIdRejection::NotAllocated,
            });
        }

        self.slots[index] = SlotState::Released;
        self.free_list.push(page_id);

        trace!(%page_id, free = self.free_list.len(), "released page id");
        Ok(())
    }

    /// Marks a specific free identifier as allocated.
    ///
    /// Used to rebuild allocator state for a file whose live pages the caller
    /// already knows. Linear in the number of free ids.
    pub fn claim(&mut self, page_id: PageId) -> Result<()> {
        let index = self
            .check_allocatable(page_id)
            .map_err(|reason| DalError::InvalidClaim { page_id, reason })?;
        if self.slots[index] == SlotState::Allocated {
            return Err(DalError::InvalidClaim {
                page_id,
                reason: PageIdRejection::AlreadyAllocated,
            });
        }

        if let Some(pos) = self.free_list.iter().rposition(|&id| id == page_id) {
            self.free_list.remove(pos);
        }
        self.slots[index] = SlotState::Allocated;

        trace!(%page_id, free = self.free_list.len(), "claimed page id");
        Ok(())
    }

    /// Returns the maximum number of pages, reserved pages included.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of identifiers available for allocation.
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Returns the number of identifiers currently handed out.
    pub fn allocated_count(&self) -> usize {
        self.capacity - NUM_RESERVED_PAGES - self.free_list.len()
    }

    /// Returns true if the id is currently handed out.
    pub fn is_allocated(&self, page_id: PageId) -> bool {
        self.slot(page_id) == Some(SlotState::Allocated)
    }

    /// Returns true if the id was released and has not been handed out since.
    /// Ids never handed out by this manager are not released.
    pub fn is_released(&self, page_id: PageId) -> bool {
        self.slot(page_id) == Some(SlotState::Released)
    }

    /// Returns true for the header page and the page reserved after it.
    pub fn is_reserved(&self, page_id: PageId) -> bool {
        page_id.index().is_some_and(|i| i < NUM_RESERVED_PAGES)
    }

    fn slot(&self, page_id: PageId) -> Option<SlotState> {
        page_id.index().and_then(|i| self.slots.get(i).copied())
    }

    /// Maps an id to its slot if it is one the allocator manages.
    fn check_allocatable(&self, page_id: PageId) -> std::result::Result<usize, PageIdRejection> {
        match page_id.index() {
            Some(i) if i >= self.capacity => Err(PageIdRejection::OutOfRange),
            Some(i) if i < NUM_RESERVED_PAGES => Err(PageIdRejection::Reserved),
            Some(i) => Ok(i),
            None => Err(PageIdRejection::OutOfRange),
        }
    }
}
