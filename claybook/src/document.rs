//! Writing whole documents: a new file from scratch or an incremental update
//! appended to an existing one.
//!
//! A [`Document`] moves through [`State`]s in a fixed order:
//!
//! ```text
//! Opened -> HeaderWritten -> CatalogWritten -> PerPageLoop -> XRefWritten -> Closed
//!                                                   \
//!                                                    -> Aborted
//! ```
//!
//! Object numbers for every page are reserved before the page tree is
//! written, so the number of frames of every source is determined first.
//! Any error after `Opened` leaves the document `Aborted` without a
//! cross-reference table; discarding the partial output is up to the caller.

use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
};

use chrono::Utc;

pub use self::{
    info::DocumentInfo,
    page::{PageIds, PageRecord, IMAGE_RESOURCE},
};
use crate::{
    config::PdfOptions,
    error::{CbError, Result},
    pdf::{
        dictionary,
        document::{dict_types, PageTree, K_COUNT, K_KIDS, K_PAGES, K_TYPE},
        Array, Dictionary, IndirectObject, Name, Object, ObjectTable, Reference, Trailer,
    },
    reader::ExistingPdf,
    simple_encode::SimpleEncoder,
    source::SourceImage,
    writer::{Encoder, IoSink, Writer},
};

mod info;
mod page;

/// `%PDF-1.4` followed by a comment with high-bit bytes marking the file as
/// binary.
const HEADER: &[u8] = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    New,
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Opened(Mode),
    HeaderWritten,
    CatalogWritten,
    PerPageLoop,
    XRefWritten,
    Closed,
    Aborted,
}

/// What an incremental update needs to know about the file it extends.
#[derive(Debug)]
struct Base {
    start_xref: usize,
    trailer: Trailer,
    page_tree_root: Reference,
    page_tree: PageTree,
    info: Option<Dictionary>,
    /// The existing file does not end with an end-of-line marker.
    needs_eol: bool,
}

pub struct Document<W: Write> {
    sink: IoSink<W>,
    table: ObjectTable,
    state: State,
    info: DocumentInfo,
    options: PdfOptions,
    base: Option<Base>,
    pages: Vec<PageRecord>,
}

impl<W: Write> Document<W> {
    /// Start a new document written to `sink` from its first byte.
    pub fn create(sink: W, info: DocumentInfo, options: PdfOptions) -> Self {
        Self {
            sink: IoSink::new(sink, 0),
            table: ObjectTable::new(),
            state: State::Opened(Mode::New),
            info,
            options,
            base: None,
            pages: Vec::new(),
        }
    }

    /// Start an incremental update of `existing`. `sink` must append to the
    /// very file `existing` was read from.
    ///
    /// Only the entries set in `info` are written; they are merged over the
    /// existing Info dictionary.
    pub fn append(existing: &ExistingPdf, sink: W, info: DocumentInfo, options: PdfOptions) -> Result<Self> {
        let trailer = existing.trailer().clone();
        let (page_tree_root, page_tree) = existing.page_tree()?;
        let base_info = if info.is_empty() { None } else { existing.info()? };
        let size = u32::try_from(trailer.size)
            .map_err(|_| CbError::InvalidExistingPdf(format!("trailer /Size {} is too large", trailer.size)))?;
        log::debug!(
            "appending to a document with {} pages and {} objects",
            page_tree.count,
            size
        );

        Ok(Self {
            sink: IoSink::new(sink, existing.len()),
            table: ObjectTable::continuing(size),
            state: State::Opened(Mode::Append),
            info,
            options,
            base: Some(Base {
                start_xref: existing.chain().start_xref,
                trailer,
                page_tree_root,
                page_tree,
                info: base_info,
                needs_eol: !existing.ends_with_eol(),
            }),
            pages: Vec::new(),
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn mode(&self) -> Mode {
        if self.base.is_some() {
            Mode::Append
        } else {
            Mode::New
        }
    }

    /// Pages written so far.
    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }

    /// Write all `sources` as pages, in order, and finish the document.
    ///
    /// `progress` is called after every page with the number of pages
    /// written so far and the total.
    pub fn write_images<F>(&mut self, sources: Vec<SourceImage>, mut progress: F) -> Result<&[PageRecord]>
    where
        F: FnMut(usize, usize),
    {
        if !matches!(self.state, State::Opened(_)) {
            return Err(CbError::InternalConsistency(format!(
                "images can only be written once, document is {:?}",
                self.state
            )));
        }

        match self.write_all(sources, &mut progress) {
            Ok(()) => {
                self.state = State::Closed;
                Ok(&self.pages)
            }
            Err(err) => {
                log::debug!("document aborted in state {:?}: {}", self.state, err);
                self.state = State::Aborted;
                Err(err)
            }
        }
    }

    fn write_all(&mut self, sources: Vec<SourceImage>, progress: &mut dyn FnMut(usize, usize)) -> Result<()> {
        let probes = sources.iter().map(SourceImage::probe).collect::<Result<Vec<_>>>()?;
        let total: usize = probes.iter().map(|p| p.frames).sum();

        let catalog = match &self.base {
            None => Some(self.table.allocate_object()),
            Some(_) => None,
        };
        let page_tree_root = match &self.base {
            None => self.table.allocate_object(),
            Some(base) => {
                self.table.reissue(base.page_tree_root)?;
                base.page_tree_root
            }
        };
        let ids: Vec<PageIds> = (0..total).map(|_| PageIds::allocate(&mut self.table)).collect();

        self.write_header()?;
        self.write_catalog(catalog, page_tree_root, &ids)?;

        self.state = State::PerPageLoop;
        let mut ids = ids.into_iter();
        for (source, probe) in sources.into_iter().zip(probes) {
            let description = source.describe();
            let opened = source.open(probe, self.options.color_policy)?;
            let recovered = opened.recovered();
            let mut frames = 0;
            for raster in opened {
                let raster = raster?;
                let page_ids = ids.next().ok_or_else(|| frame_mismatch(&description, probe.frames))?;
                let mut record = page::write_page(
                    &mut self.sink,
                    &mut self.table,
                    page_ids,
                    page_tree_root,
                    &raster,
                    &self.options,
                )?;
                // the pixels are not needed once the page is out
                drop(raster);
                self.sink.take_error()?;

                record.recovered = recovered;
                self.pages.push(record);
                frames += 1;
                progress(self.pages.len(), total);
            }
            if frames != probe.frames {
                return Err(frame_mismatch(&description, probe.frames));
            }
        }

        let info = self.write_info()?;
        self.write_xref(catalog, info)
    }

    fn write_header(&mut self) -> Result<()> {
        match &self.base {
            None => self.sink.write(HEADER),
            Some(base) if base.needs_eol => self.sink.write(b"\n"),
            Some(_) => {}
        }
        self.sink.take_error()?;
        self.state = State::HeaderWritten;
        Ok(())
    }

    /// New documents get a catalog and a fresh page tree. Updates rewrite
    /// the existing page tree root with the new pages appended.
    fn write_catalog(&mut self, catalog: Option<Reference>, page_tree_root: Reference, ids: &[PageIds]) -> Result<()> {
        let new_pages: Vec<Reference> = ids.iter().map(|ids| ids.page).collect();
        let page_tree = match &self.base {
            None => dictionary([
                (K_TYPE, Object::from(Name::from(dict_types::PAGES))),
                (
                    K_KIDS,
                    Object::from(new_pages.iter().copied().map(Object::from).collect::<Array>()),
                ),
                (K_COUNT, Object::from(new_pages.len())),
            ]),
            Some(base) => base.page_tree.extended_with(&new_pages),
        };

        if let Some(catalog) = catalog {
            let dict = dictionary([
                (K_TYPE, Object::from(Name::from(dict_types::CATALOG))),
                (K_PAGES, Object::from(page_tree_root)),
            ]);
            self.write_object(catalog, Object::from(dict))?;
        }
        self.write_object(page_tree_root, Object::from(page_tree))?;
        self.sink.take_error()?;
        self.state = State::CatalogWritten;
        Ok(())
    }

    /// Returns the Info reference for the trailer.
    fn write_info(&mut self) -> Result<Option<Reference>> {
        let now = Utc::now();
        let dict = match &self.base {
            None => self.info.clone().with_defaults(None, now).to_dictionary(),
            Some(base) if self.info.is_empty() => return Ok(base.trailer.info),
            Some(base) => {
                let mut dict = base.info.clone().unwrap_or_default();
                let mut info = self.info.clone();
                info.mod_date = Some(info.mod_date.unwrap_or(now));
                info.apply_to(&mut dict);
                dict
            }
        };
        let reference = self.table.allocate_object();
        self.write_object(reference, Object::from(dict))?;
        Ok(Some(reference))
    }

    fn write_xref(&mut self, catalog: Option<Reference>, info: Option<Reference>) -> Result<()> {
        let mut trailer = match (&self.base, catalog) {
            (Some(base), _) => {
                let mut trailer = Trailer::new(base.trailer.root);
                trailer.previous = Some(base.start_xref);
                trailer.id = base.trailer.id.clone();
                trailer
            }
            (None, Some(catalog)) => Trailer::new(catalog),
            (None, None) => {
                return Err(CbError::InternalConsistency("new document without catalog".to_owned()));
            }
        };
        trailer.info = info;

        let start_xref = self.table.write_xref_and_trailer(&mut self.sink, trailer)?;
        self.sink.flush()?;
        self.state = State::XRefWritten;
        log::debug!(
            "wrote {} objects, cross-reference table at {}",
            self.table.len(),
            start_xref
        );
        Ok(())
    }

    fn write_object(&mut self, reference: Reference, object: Object) -> Result<()> {
        self.table.record_offset(reference, self.sink.position())?;
        SimpleEncoder::write_to(&IndirectObject::new(reference, object), &mut self.sink);
        Ok(())
    }
}

fn frame_mismatch(source: &str, expected: usize) -> CbError {
    CbError::Decode {
        path: source.into(),
        message: format!("frame count changed while decoding, expected {}", expected),
    }
}

/// Write `sources` into a new PDF at `target`.
///
/// Without a title in `info`, the file stem of `target` is used.
pub fn create_file(
    target: &Path,
    sources: Vec<SourceImage>,
    info: DocumentInfo,
    options: &PdfOptions,
    progress: impl FnMut(usize, usize),
) -> Result<Vec<PageRecord>> {
    let title = target.file_stem().map(|s| s.to_string_lossy().into_owned());
    let info = match (info.title.is_none(), title) {
        (true, Some(title)) => DocumentInfo {
            title: Some(title),
            ..info
        },
        (_, _) => info,
    };

    let file = BufWriter::new(File::create(target)?);
    let mut document = Document::create(file, info, options.clone());
    let pages = document.write_images(sources, progress)?.to_vec();
    Ok(pages)
}

/// Append `sources` as new pages to the PDF at `target`.
pub fn append_file(
    target: &Path,
    sources: Vec<SourceImage>,
    info: DocumentInfo,
    options: &PdfOptions,
    progress: impl FnMut(usize, usize),
) -> Result<Vec<PageRecord>> {
    let existing = ExistingPdf::open(target)?;
    let file = BufWriter::new(OpenOptions::new().append(true).open(target)?);
    let mut document = Document::append(&existing, file, info, options.clone())?;
    drop(existing);
    let pages = document.write_images(sources, progress)?.to_vec();
    Ok(pages)
}
