//! Bind raster images into PDF documents.
//!
//! The encoder writes images as pages of a new PDF, or appends them to an
//! existing one as an incremental update that leaves every existing byte in
//! place. Around it, a small [`Pipeline`] groups downloaded chapters into
//! books and converts them on a pool of worker threads.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use claybook::{document, DocumentInfo, PdfOptions, SourceImage};
//!
//! # fn main() -> claybook::Result<()> {
//! let sources = vec![SourceImage::from(Path::new("001.png")), SourceImage::from(Path::new("002.jpg"))];
//! let pages = document::create_file(
//!     Path::new("chapter.pdf"),
//!     sources,
//!     DocumentInfo::default(),
//!     &PdfOptions::default(),
//!     |done, total| println!("{}/{}", done, total),
//! )?;
//! assert_eq!(pages.len(), 2);
//! # Ok(())
//! # }
//! ```

pub use config::{ColorPolicy, Config, PdfOptions};
pub use document::{Document, DocumentInfo, PageRecord};
pub use error::{CbError, Result};
pub use filter::Filter;
pub use pipeline::{
    plan_jobs, BookGrouping, ChapterBatch, ChapterInfo, ConversionJob, JobOutcome, Pipeline, Report, SkipReason,
};
pub use progress::{LogProgress, NoProgress, Progress};
pub use raster::{ColorMode, Raster};
pub use reader::{page_count, read_object, read_xref_chain, ExistingPdf, XrefChain};
pub use source::SourceImage;

mod codec;
mod config;
pub mod document;
mod error;
mod filter;
pub mod parse;
pub mod pdf;
mod pipeline;
mod progress;
mod raster;
mod reader;
pub mod simple_encode;
mod source;
pub mod writer;
