use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::{PageId, Result};
use crate::storage::page::Page;

use super::Dal;

/// SharedDal serializes access to a `Dal` from several threads.
///
/// Clones share the same Dal. Each operation holds the lock for exactly one
/// call, so a page read or write is never interleaved with another.
#[derive(Clone)]
pub struct SharedDal {
    inner: Arc<Mutex<Dal>>,
}

impl SharedDal {
    pub fn new(dal: Dal) -> Self {
        Self {
            inner: Arc::new(Mutex::new(dal)),
        }
    }

    pub fn allocate_page_id(&self) -> Result<PageId> {
        self.inner.lock().allocate_page_id()
    }

    pub fn release_page_id(&self, page_id: PageId) -> Result<()> {
        self.inner.lock().release_page_id(page_id)
    }

    pub fn claim_page_id(&self, page_id: PageId) -> Result<()> {
        self.inner.lock().claim_page_id(page_id)
    }

    pub fn allocate_empty_page(&self) -> Result<Page> {
        self.inner.lock().allocate_empty_page()
    }

    pub fn read_page(&self, page_id: PageId) -> Result<Page> {
        self.inner.lock().read_page(page_id)
    }

    pub fn write_page(&self, page: &Page) -> Result<()> {
        self.inner.lock().write_page(page)
    }

    pub fn sync(&self) -> Result<()> {
        self.inner.lock().sync()
    }

    /// Closes the underlying Dal for every clone.
    pub fn close(&self) -> Result<()> {
        self.inner.lock().close()
    }

    /// Runs `f` with exclusive access to the Dal, for multi-step sequences
    /// that must not interleave with other clones.
    pub fn with_dal<T>(&self, f: impl FnOnce(&mut Dal) -> T) -> T {
        f(&mut *self.inner.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{DalConfig, DalError};
    use std::thread;
    use tempfile::NamedTempFile;

    #[test]
    fn test_shared_dal_concurrent_writers() {
        let temp_file = NamedTempFile::new().unwrap();
        let dal = Dal::create(temp_file.path(), DalConfig::new(128, 34)).unwrap();
        let shared = SharedDal::new(dal);

        let handles: Vec<_> = (0..4u8)
            .map(|t| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let mut ids = Vec::new();
                    for _ in 0..8 {
                        let mut page = shared.allocate_empty_page().unwrap();
                        page.set_id(shared.allocate_page_id().unwrap());
                        page.payload_mut().fill(t);
                        shared.write_page(&page).unwrap();
                        ids.push(page.id());
                    }
                    (t, ids)
                })
            })
            .collect();

        let mut seen = std::collections::HashSet::new();
        for handle in handles {
            let (t, ids) = handle.join().unwrap();
            for id in ids {
                assert!(seen.insert(id), "{id} handed out twice");
                let page = shared.read_page(id).unwrap();
                assert!(page.payload().iter().all(|&b| b == t));
            }
        }

        assert_eq!(seen.len(), 32);
        assert!(matches!(
            shared.allocate_page_id(),
            Err(DalError::Exhausted { .. })
        ));
    }

    #[test]
    fn test_shared_dal_close_is_shared() {
        let temp_file = NamedTempFile::new().unwrap();
        let dal = Dal::create(temp_file.path(), DalConfig::default()).unwrap();
        let a = SharedDal::new(dal);
        let b = a.clone();

        a.close().unwrap();
        assert!(b.with_dal(|dal| dal.is_closed()));
        assert!(matches!(b.allocate_page_id(), Err(DalError::ClosedHandle)));
    }
}
