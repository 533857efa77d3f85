#![forbid(unsafe_code)]

pub mod catalog;
pub mod model;
pub mod time;

pub use catalog::{Catalog, CatalogError, DisplayMetadata};
pub use time::Clock;
