//! Products domain module.
//!
//! Catalog entries, their category set and the queryable product schema.
//! Pure domain logic: no IO, no storage.

pub mod product;

pub use product::{Category, Product, ProductDraft, PRODUCT_SCHEMA};
