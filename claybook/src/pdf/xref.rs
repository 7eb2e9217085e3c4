use std::collections::BTreeMap;

use crate::{
    error::CbError,
    pdf::{Reference, Trailer},
    simple_encode::SimpleEncoder,
    writer::{Encoder, Writer},
};

/// References to objects inside one cross-reference section.
///
/// Entries are kept sorted by object number. Objects are either in use, with
/// the byte offset of their `N G obj` line, or free.
#[derive(Debug, Clone, PartialEq)]
pub struct Xref(Vec<XrefEntry>);

impl Xref {
    pub fn entries(&self) -> &[XrefEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn highest_index(&self) -> usize {
        self.0.iter().map(XrefEntry::number).max().unwrap_or(0)
    }

    pub fn used_objects(&self) -> impl Iterator<Item = &UsedObject> {
        self.0
            .iter()
            .filter_map(|entry| if let XrefEntry::Used(u) = entry { Some(u) } else { None })
    }

    pub fn free_objects(&self) -> impl Iterator<Item = &FreeObject> {
        self.0
            .iter()
            .filter_map(|entry| if let XrefEntry::Free(u) = entry { Some(u) } else { None })
    }

    /// Runs of consecutive object numbers, as written in the `xref` table.
    pub fn subsections(&self) -> Vec<&[XrefEntry]> {
        let mut sections = Vec::new();
        let mut start = 0;
        for i in 1..=self.0.len() {
            let contiguous = i < self.0.len() && self.0[i].number() == self.0[i - 1].number() + 1;
            if !contiguous {
                sections.push(&self.0[start..i]);
                start = i;
            }
        }
        sections
    }
}

impl From<Vec<XrefEntry>> for Xref {
    fn from(mut v: Vec<XrefEntry>) -> Self {
        v.sort_by_key(XrefEntry::number);
        Xref(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FreeObject {
    /// Number of this object
    pub number: usize,
    /// Next generation number that should be used
    pub generation: u16,
    /// Next free object number
    pub next_free: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsedObject {
    /// Number of this object
    pub number: usize,
    /// The position of this object in the pdf file in bytes, starting from the
    /// beginning of the PDF.
    pub byte_offset: usize,
    pub generation: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub enum XrefEntry {
    Free(FreeObject),
    Used(UsedObject),
}

impl XrefEntry {
    pub fn number(&self) -> usize {
        match self {
            XrefEntry::Free(FreeObject { number, .. }) => *number,
            XrefEntry::Used(UsedObject { number, .. }) => *number,
        }
    }
}

impl From<UsedObject> for XrefEntry {
    fn from(v: UsedObject) -> Self {
        Self::Used(v)
    }
}

impl From<FreeObject> for XrefEntry {
    fn from(v: FreeObject) -> Self {
        Self::Free(v)
    }
}

/// Hands out object numbers for one writing session and remembers where each
/// object starts.
///
/// Numbers are strictly increasing and never reused. A fresh document starts
/// at 1; a session that extends an existing file starts at the old trailer
/// `/Size` and may additionally re-issue old numbers for objects it rewrites.
#[derive(Debug, Clone)]
pub struct ObjectTable {
    next: u32,
    first: u32,
    offsets: BTreeMap<u32, Slot>,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u16,
    offset: Option<usize>,
}

impl Default for ObjectTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::continuing(1)
    }

    /// Continue numbering after an existing document whose trailer reported
    /// `size`.
    pub fn continuing(size: u32) -> Self {
        let first = size.max(1);
        Self {
            next: first,
            first,
            offsets: BTreeMap::new(),
        }
    }

    pub fn allocate_object(&mut self) -> Reference {
        let reference = Reference::new(self.next);
        self.offsets.insert(
            self.next,
            Slot {
                generation: 0,
                offset: None,
            },
        );
        self.next += 1;
        reference
    }

    /// Register an object of the existing document that is written again
    /// with new content. It keeps the generation of `reference`.
    pub fn reissue(&mut self, reference: Reference) -> Result<(), CbError> {
        if reference.index == 0 || reference.index >= self.first {
            return Err(CbError::InternalConsistency(format!(
                "object {} is not part of the existing document",
                reference.index
            )));
        }
        let slot = Slot {
            generation: reference.generation,
            offset: None,
        };
        if self.offsets.insert(reference.index, slot).is_some() {
            return Err(CbError::InternalConsistency(format!(
                "object {} re-issued twice",
                reference.index
            )));
        }
        Ok(())
    }

    pub fn is_allocated(&self, reference: Reference) -> bool {
        self.offsets.contains_key(&reference.index)
    }

    /// Must be called exactly once per object, with the position its
    /// `N G obj` line starts at.
    pub fn record_offset(&mut self, reference: Reference, offset: usize) -> Result<(), CbError> {
        match self.offsets.get_mut(&reference.index) {
            Some(Slot { generation, .. }) if *generation != reference.generation => {
                Err(CbError::InternalConsistency(format!(
                    "object {} has generation {}, not {}",
                    reference.index, generation, reference.generation
                )))
            }
            Some(Slot { offset: slot @ None, .. }) => {
                *slot = Some(offset);
                Ok(())
            }
            Some(Slot { offset: Some(previous), .. }) => Err(CbError::InternalConsistency(format!(
                "object {} written twice (at {} and {})",
                reference.index, previous, offset
            ))),
            None => Err(CbError::InternalConsistency(format!(
                "object {} was never allocated",
                reference.index
            ))),
        }
    }

    /// Value for the trailer `/Size` entry.
    pub fn size(&self) -> u32 {
        self.next
    }

    /// Number of objects allocated or re-issued in this session.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Cross-reference section for everything written in this session.
    pub fn xref(&self) -> Result<Xref, CbError> {
        let mut entries = Vec::with_capacity(self.offsets.len() + 1);
        if self.first == 1 {
            entries.push(XrefEntry::from(FreeObject {
                number: 0,
                generation: u16::MAX,
                next_free: 0,
            }));
        }
        for (&number, slot) in &self.offsets {
            let byte_offset = slot.offset.ok_or_else(|| {
                CbError::InternalConsistency(format!("object {} was allocated but never written", number))
            })?;
            entries.push(
                UsedObject {
                    number: number as usize,
                    byte_offset,
                    generation: slot.generation,
                }
                .into(),
            );
        }
        Ok(Xref::from(entries))
    }

    /// Write the xref table, `trailer`, `startxref` and the EOF marker.
    /// `/Size` is filled in from this table. Returns the xref offset.
    pub fn write_xref_and_trailer(&self, writer: &mut dyn Writer, mut trailer: Trailer) -> Result<usize, CbError> {
        let xref = self.xref()?;
        trailer.size = self.size() as usize;

        let start_xref = writer.position();
        SimpleEncoder::write_to(&xref, writer);
        SimpleEncoder::write_to(&trailer, writer);

        writer.write(b"startxref\n");
        writer.write(start_xref.to_string().as_bytes());
        writer.write(b"\n%%EOF\n");
        Ok(start_xref)
    }
}
