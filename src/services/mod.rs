//! Service layer modules for external integrations.
//!
//! Contains clients for object storage and transactional email delivery.

pub mod mailer;
pub mod storage;

pub use mailer::Mailer;
pub use storage::StorageClient;
