mod dal;
mod page_manager;
mod shared_dal;

pub use dal::*;
pub use page_manager::*;
pub use shared_dal::*;
