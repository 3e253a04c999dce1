//! The public compressing [`Writer`] and decompressing [`Reader`] (§4.5,
//! §4.6), and their builder-style configuration (§3 "Lifecycles").

mod options;
mod reader;
mod writer;

pub use options::{ReaderBuilder, ReaderOptions, WriterBuilder, WriterOptions};
pub use reader::Reader;
pub use writer::Writer;
