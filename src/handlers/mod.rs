pub mod collection;
pub mod health;

pub use collection::{create, delete, find, get, list, update};
pub use health::health;
