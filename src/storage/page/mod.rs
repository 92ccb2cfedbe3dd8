mod fixed_page;

pub use fixed_page::*;
