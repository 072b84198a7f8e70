//! Pagination and multipart form handling shared by the route handlers

pub mod multipart;
pub mod pagination;

#[allow(unused_imports)]
pub use multipart::{CollectedForm, FormFile};
#[allow(unused_imports)]
pub use pagination::{Paginated, PaginationMeta, PaginationParams};
