use std::fmt::Display;

use super::Object;

/// An object together with the number it is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectObject {
    pub index: u32,
    pub generation: u16,
    pub object: Box<Object>,
}

impl IndirectObject {
    pub fn new(reference: Reference, object: Object) -> Self {
        Self {
            index: reference.index,
            generation: reference.generation,
            object: Box::new(object),
        }
    }

    pub fn reference(&self) -> Reference {
        Reference {
            index: self.index,
            generation: self.generation,
        }
    }
}

impl Display for IndirectObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Indirect {} {} {{ {} }}", self.index, self.generation, self.object)
    }
}

/// Identity of an indirect object. Objects written by this crate always use
/// generation 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference {
    pub index: u32,
    pub generation: u16,
}

impl Reference {
    pub const fn new(index: u32) -> Self {
        Self { index, generation: 0 }
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.index, self.generation)
    }
}
