//! Just enough PDF reading to append pages to a file this crate (or any
//! producer of classic cross-reference tables) wrote.

use std::{fs, path::Path};

use fnv::{FnvHashMap, FnvHashSet};
use nom::Slice;

use crate::{
    error::{CbError, Result},
    parse::{indirect_object, span, startxref_tail, xref_section},
    pdf::{
        document::{Catalog, PageTree},
        xref::XrefEntry,
        Dictionary, Object, Reference, Trailer,
    },
};

/// Merged view over every cross-reference section of a file.
#[derive(Debug, Clone)]
pub struct XrefChain {
    /// Offset of the newest cross-reference section.
    pub start_xref: usize,
    /// Trailer of the newest section.
    pub trailer: Trailer,
    /// Object number to `(offset, generation)`. Free objects are absent.
    pub offsets: FnvHashMap<u32, (usize, u16)>,
}

impl XrefChain {
    pub fn offset_of(&self, reference: Reference) -> Option<usize> {
        self.offsets
            .get(&reference.index)
            .filter(|(_, generation)| *generation == reference.generation)
            .map(|(offset, _)| *offset)
    }
}

/// Read the newest cross-reference section and every section reachable
/// through `/Prev`. Newer sections shadow older ones.
pub fn read_xref_chain(buf: &[u8]) -> Result<XrefChain> {
    let input = span(buf);
    let (_, start_xref) = startxref_tail(input)?;

    let mut trailer: Option<Trailer> = None;
    let mut merged: FnvHashMap<u32, Option<(usize, u16)>> = FnvHashMap::default();
    let mut visited = FnvHashSet::default();
    let mut next = Some(start_xref);

    while let Some(offset) = next {
        if !visited.insert(offset) {
            log::warn!("cross-reference chain loops back to {}", offset);
            break;
        }
        if offset >= buf.len() {
            return Err(CbError::InvalidExistingPdf(format!(
                "cross-reference offset {} is beyond the end of the file",
                offset
            )));
        }
        log::debug!("read cross-reference section at {}", offset);

        let (_, (xref, section_trailer)) = xref_section(input.slice(offset..))?;
        for entry in xref.entries() {
            let number = u32::try_from(entry.number())
                .map_err(|_| CbError::InvalidExistingPdf(format!("object number {} too large", entry.number())))?;
            let location = match entry {
                XrefEntry::Used(used) => Some((used.byte_offset, used.generation)),
                XrefEntry::Free(_) => None,
            };
            merged.entry(number).or_insert(location);
        }

        next = section_trailer.previous;
        if trailer.is_none() {
            trailer = Some(section_trailer);
        }
    }

    let mut trailer = trailer.ok_or_else(|| CbError::InvalidExistingPdf("no trailer found".to_owned()))?;
    if trailer.encrypt.is_some() {
        return Err(CbError::InvalidExistingPdf("encrypted documents are not supported".to_owned()));
    }

    let offsets: FnvHashMap<u32, (usize, u16)> = merged
        .into_iter()
        .filter_map(|(number, location)| location.map(|l| (number, l)))
        .collect();

    let highest = offsets.keys().copied().max().unwrap_or(0) as usize;
    if trailer.size <= highest {
        log::warn!(
            "trailer /Size {} does not cover object {}, continuing after it",
            trailer.size,
            highest
        );
        trailer.size = highest + 1;
    }

    Ok(XrefChain {
        start_xref,
        trailer,
        offsets,
    })
}

/// Parse the indirect object `reference` points at.
pub fn read_object(buf: &[u8], chain: &XrefChain, reference: Reference) -> Result<Object> {
    let offset = chain.offset_of(reference).ok_or_else(|| {
        CbError::InvalidExistingPdf(format!("object {} is not in the cross-reference table", reference))
    })?;
    if offset >= buf.len() {
        return Err(CbError::InvalidExistingPdf(format!(
            "object {} at {} is beyond the end of the file",
            reference, offset
        )));
    }

    let (_, indirect) = indirect_object(span(buf).slice(offset..))?;
    if indirect.reference() != reference {
        return Err(CbError::InvalidExistingPdf(format!(
            "expected object {} at {}, found {}",
            reference,
            offset,
            indirect.reference()
        )));
    }
    Ok(*indirect.object)
}

/// Number of pages of the PDF at `path`.
pub fn page_count(path: &Path) -> Result<usize> {
    Ok(ExistingPdf::open(path)?.page_tree()?.1.count)
}

/// An existing PDF held in memory while new pages are appended to it.
#[derive(Debug)]
pub struct ExistingPdf {
    buf: Vec<u8>,
    chain: XrefChain,
}

impl ExistingPdf {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_bytes(fs::read(path)?)
    }

    pub fn from_bytes(buf: Vec<u8>) -> Result<Self> {
        let chain = read_xref_chain(&buf)?;
        Ok(Self { buf, chain })
    }

    /// File length, where appended bytes start.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Whether the file ends with an end-of-line marker, so that appended
    /// objects start on a fresh line.
    pub fn ends_with_eol(&self) -> bool {
        matches!(self.buf.last(), Some(b'\n' | b'\r'))
    }

    pub fn chain(&self) -> &XrefChain {
        &self.chain
    }

    pub fn trailer(&self) -> &Trailer {
        &self.chain.trailer
    }

    pub fn object(&self, reference: Reference) -> Result<Object> {
        read_object(&self.buf, &self.chain, reference)
    }

    fn dictionary(&self, reference: Reference) -> Result<Dictionary> {
        match self.object(reference)? {
            Object::Dictionary(d) => Ok(d),
            other => Err(CbError::InvalidExistingPdf(format!(
                "object {} is {} instead of a dictionary",
                reference, other
            ))),
        }
    }

    pub fn catalog(&self) -> Result<Catalog> {
        let dict = self.dictionary(self.chain.trailer.root)?;
        Catalog::new_with(&dict).map_err(|err| CbError::InvalidExistingPdf(err.to_string()))
    }

    /// Root of the page tree together with its object number.
    pub fn page_tree(&self) -> Result<(Reference, PageTree)> {
        let root = self.catalog()?.pages;
        let dict = self.dictionary(root)?;
        let tree = PageTree::new_with(dict, |kids| self.object(*kids).ok())
            .map_err(|err| CbError::InvalidExistingPdf(err.to_string()))?;
        Ok((root, tree))
    }

    /// The Info dictionary, if the trailer names one.
    pub fn info(&self) -> Result<Option<Dictionary>> {
        self.chain.trailer.info.map(|info| self.dictionary(info)).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two revisions: the second one replaces the page tree and adds a page.
    fn two_revisions() -> Vec<u8> {
        let mut buf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for obj in [
            &b"1 0 obj\n<</Type /Catalog /Pages 2 0 R>>\nendobj\n"[..],
            &b"2 0 obj\n<</Type /Pages /Kids [3 0 R] /Count 1>>\nendobj\n"[..],
            &b"3 0 obj\n<</Type /Page /Parent 2 0 R>>\nendobj\n"[..],
        ] {
            offsets.push(buf.len());
            buf.extend_from_slice(obj);
        }
        let first_xref = buf.len();
        buf.extend_from_slice(b"xref\n0 4\n0000000000 65535 f\r\n");
        for o in &offsets {
            buf.extend_from_slice(format!("{:010} 00000 n\r\n", o).as_bytes());
        }
        buf.extend_from_slice(format!("trailer\n<</Size 4 /Root 1 0 R>>\nstartxref\n{}\n%%EOF\n", first_xref).as_bytes());

        let tree = buf.len();
        buf.extend_from_slice(b"2 0 obj\n<</Type /Pages /Kids [3 0 R 4 0 R] /Count 2>>\nendobj\n");
        let page = buf.len();
        buf.extend_from_slice(b"4 0 obj\n<</Type /Page /Parent 2 0 R>>\nendobj\n");
        let second_xref = buf.len();
        buf.extend_from_slice(
            format!(
                "xref\n2 1\n{:010} 00000 n\r\n4 1\n{:010} 00000 n\r\ntrailer\n<</Size 5 /Root 1 0 R /Prev {}>>\nstartxref\n{}\n%%EOF\n",
                tree, page, first_xref, second_xref
            )
            .as_bytes(),
        );
        buf
    }

    #[test]
    fn newest_section_wins() {
        let pdf = ExistingPdf::from_bytes(two_revisions()).unwrap();
        assert_eq!(pdf.trailer().size, 5);
        assert_eq!(pdf.chain().offsets.len(), 4);

        let (root, tree) = pdf.page_tree().unwrap();
        assert_eq!(root, Reference::new(2));
        assert_eq!(tree.count, 2);
        assert_eq!(tree.kids, vec![Reference::new(3), Reference::new(4)]);
        assert_eq!(pdf.info().unwrap(), None);
    }

    #[test]
    fn prev_loop_terminates() {
        let mut buf = b"%PDF-1.4\n1 0 obj\n<</Type /Catalog /Pages 2 0 R>>\nendobj\n".to_vec();
        let xref = buf.len();
        buf.extend_from_slice(
            format!(
                "xref\n0 2\n0000000000 65535 f\r\n0000000009 00000 n\r\ntrailer\n<</Size 2 /Root 1 0 R /Prev {}>>\nstartxref\n{}\n%%EOF\n",
                xref, xref
            )
            .as_bytes(),
        );
        let chain = read_xref_chain(&buf).unwrap();
        assert_eq!(chain.offset_of(Reference::new(1)), Some(9));
        assert_eq!(chain.offset_of(Reference { index: 1, generation: 3 }), None);
    }

    #[test]
    fn encrypted_is_rejected() {
        let buf = b"%PDF-1.4\nxref\n0 1\n0000000000 65535 f\r\ntrailer\n<</Size 1 /Root 1 0 R /Encrypt 5 0 R>>\nstartxref\n9\n%%EOF\n";
        assert!(matches!(
            read_xref_chain(&buf[..]),
            Err(CbError::InvalidExistingPdf(_))
        ));
    }

    #[test]
    fn not_a_pdf() {
        assert!(matches!(
            ExistingPdf::from_bytes(b"hello world".to_vec()),
            Err(CbError::InvalidExistingPdf(_))
        ));
    }

    #[test]
    fn wrong_object_at_offset() {
        let mut buf = b"%PDF-1.4\n".to_vec();
        buf.extend_from_slice(b"7 0 obj\nnull\nendobj\n");
        buf.extend_from_slice(b"xref\n0 2\n0000000000 65535 f\r\n0000000009 00000 n\r\ntrailer\n<</Size 2 /Root 1 0 R>>\nstartxref\n29\n%%EOF\n");
        let chain = read_xref_chain(&buf).unwrap();
        assert!(matches!(
            read_object(&buf, &chain, Reference::new(1)),
            Err(CbError::InvalidExistingPdf(_))
        ));
    }
}
