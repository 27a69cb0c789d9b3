//! Cached product and category queries with invalidate-on-write.
//!
//! Reads go through the shared [`QueryCache`](crate::cache::QueryCache).
//! Successful writes invalidate the listing cache of their resource and, for
//! updates and deletes, the detail entry of the record they touched. Failed
//! writes leave the cache alone.

mod categories;
mod products;

pub use categories::CategoriesApi;
pub use products::ProductsApi;
