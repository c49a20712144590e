pub mod config;
pub mod logger;
pub mod error;
pub mod markup;
pub mod media;
pub mod channel;
pub mod content;
pub mod post;
pub mod validator;
pub mod attachments;
pub mod publisher;
pub mod deferred_store;
pub mod ticker;
pub mod scheduler;

#[cfg(test)]
mod test_data;

pub use error::{Error, Result};
