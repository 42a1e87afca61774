//! Source readers, type inference, and staging file writer

pub mod conversion;
pub mod infer;
pub mod reader;
pub mod staging;

pub use infer::SchemaInferrer;
pub use reader::{DelimitedConfig, Format, read_source};
