//! Business logic services for the POS Retail Suite

pub mod catalog;
pub mod count;

pub use catalog::CatalogService;
pub use count::CountService;
