//! Confluence API types.

mod attachment;
mod page;
mod user;

pub use attachment::{Attachment, AttachmentExtensions, AttachmentLinks, AttachmentsResponse};
pub use page::{Body, Page, Storage, Version};
pub use user::User;
