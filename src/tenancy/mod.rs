//! Tenant and identity primitives shared by the access layer and the
//! write pipeline.

pub mod actor;
pub mod assignment;
pub mod reference;
pub mod role;

pub use actor::{ActingUser, Caller};
pub use assignment::resolve_website;
pub use reference::{extract_website_ids, WebsiteId};
pub use role::Role;
