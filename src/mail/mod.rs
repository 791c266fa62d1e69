pub mod backend;
pub mod decoders;
pub mod error;
pub mod fetch;
pub mod imap_client;
pub mod normalize;

pub use backend::MailBackend;
pub use error::MailError;
pub use fetch::fetch_inbox_summaries;
