//! Common types used across the application.

pub mod company;
pub mod id;
pub mod money;
pub mod pagination;

pub use company::CompanyProfile;
pub use id::*;
pub use money::{Currency, Money};
pub use pagination::{PageMeta, PageRequest, PageResponse};
