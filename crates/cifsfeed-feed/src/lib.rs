//! Feed layer: CIFS XML rendering, external schema validation, and publishing.

mod error;
pub use error::FeedError;

pub mod publish;
pub mod validate;
pub mod xml;

pub use publish::publish;
pub use validate::Validator;
pub use xml::{SCHEMA_LOCATION, render, write_feed};
