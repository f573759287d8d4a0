pub mod media;
pub mod page;
pub mod user;
pub mod website;

pub use media::Media;
pub use page::{Block, Page, PageStatus};
pub use user::User;
pub use website::{Website, WebsiteSettings, WebsiteStatus};
