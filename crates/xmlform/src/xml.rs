//! XML tree, parser and writer

pub mod model;
pub mod parser;
pub mod writer;

pub use model::{Body, XmlNode};
pub use parser::{Config, MixedContent, Parser};
pub use writer::{to_string, Writer};
