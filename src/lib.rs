//! Pagedal - a page-oriented data access layer in Rust
//!
//! This crate maps a flat file onto fixed-size pages, hands out page
//! identifiers, and reads and writes whole pages by identifier. It is the
//! bottom layer a B-tree or record store would be built on.
//!
//! # Architecture
//!
//! - **Common** (`common`): shared types, configuration and errors
//!   - `PageId`: signed page identifier, `-1` for an unassigned page
//!   - `DalConfig`: page size and capacity, loadable from TOML
//!   - `DalError`: every failure the layer reports
//!
//! - **Storage** (`storage`): pages and page I/O
//!   - `Page`: a fixed-size payload tagged with its identifier
//!   - `PageManager`: LIFO allocator over page identifiers, keeping pages 0
//!     and 1 reserved
//!   - `Dal`: owns the backing file and the allocator, reads and writes pages
//!   - `SharedDal`: a cloneable handle that serializes access across threads
//!
//! The allocator is kept in memory only. Reopening a file starts it fresh.
//!
//! # Example
//!
//! ```rust,no_run
//! use pagedal::common::DalConfig;
//! use pagedal::storage::disk::Dal;
//!
//! let mut dal = Dal::create("test.db", DalConfig::default()).unwrap();
//!
//! // Allocate an identifier and fill a page
//! let mut page = dal.allocate_empty_page().unwrap();
//! page.set_id(dal.allocate_page_id().unwrap());
//! page.write_at(0, b"data").unwrap();
//! dal.write_page(&page).unwrap();
//! dal.close().unwrap();
//!
//! // Reopen without truncating and read it back
//! let mut dal = Dal::open("test.db", DalConfig::default()).unwrap();
//! let page = dal.read_page(page.id()).unwrap();
//! assert_eq!(&page.payload()[..4], b"data");
//! ```

pub mod common;
pub mod storage;

// Re-export commonly used types at the crate root
pub use common::{DalConfig, DalError, PageId, Result};
pub use storage::disk::{Dal, PageManager, SharedDal};
pub use storage::page::{allocate_empty_page, Page};
