pub mod cache;
pub mod dataset;
pub mod entities;
pub mod list;
