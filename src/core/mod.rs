pub mod entry_builder;
pub mod naming;
pub mod pipeline;
pub mod top_entry_builder;
pub mod type_mapper;
pub mod writer;

pub use crate::domain::ports::{SecretStore, SourceConnector, Uploader};
pub use crate::utils::error::Result;
