use std::{fmt::Display, ops::Deref};

use fnv::FnvBuildHasher;
use indexmap::IndexMap;

pub use self::{
    array::Array,
    indirect::{IndirectObject, Reference},
    name::Name,
    stream::Stream,
    string::CbString,
    trailer::Trailer,
    xref::{ObjectTable, Xref, XrefEntry},
};

mod array;
pub mod document;
mod indirect;
mod name;
mod stream;
mod string;
pub mod trailer;
pub mod xref;

/// Dictionaries keep insertion order so that serialized output is
/// deterministic.
pub type Dictionary = IndexMap<Name, Object, FnvBuildHasher>;

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    String(CbString),
    HexString(Bytes),
    Float(f64),
    Integer(i64),
    Bool(bool),
    Name(Name),
    Array(Array),
    Dictionary(Dictionary),
    Stream(Stream),
    Null,
    Reference(Reference),
}

impl Object {
    pub fn name(&self) -> Option<&Name> {
        if let Self::Name(n) = self {
            Some(n)
        } else {
            None
        }
    }

    pub fn integer(&self) -> Option<i64> {
        if let Self::Integer(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    /// Integers and floats both count as numbers.
    pub fn number(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn array(&self) -> Option<&Array> {
        if let Self::Array(a) = self {
            Some(a)
        } else {
            None
        }
    }

    pub fn dictionary(&self) -> Option<&Dictionary> {
        if let Self::Dictionary(d) = self {
            Some(d)
        } else {
            None
        }
    }

    pub fn reference(&self) -> Option<&Reference> {
        if let Self::Reference(r) = self {
            Some(r)
        } else {
            None
        }
    }

    pub fn hex_string(&self) -> Option<&Bytes> {
        if let Self::HexString(h) = self {
            Some(h)
        } else {
            None
        }
    }

    /// Raw bytes of either string flavour.
    pub fn string_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::String(s) => Some(&s[..]),
            Self::HexString(h) => Some(&h[..]),
            _ => None,
        }
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Object::String(obj) => obj.fmt(f),
            Object::HexString(obj) => obj.fmt(f),
            Object::Float(obj) => obj.fmt(f),
            Object::Integer(obj) => obj.fmt(f),
            Object::Bool(obj) => obj.fmt(f),
            Object::Name(obj) => write!(f, "/{}", obj),
            Object::Array(obj) => obj.fmt(f),
            Object::Dictionary(d) => write!(f, "Dictionary({} entries)", d.len()),
            Object::Stream(s) => write!(f, "Stream({} bytes)", s.data.len()),
            Object::Null => write!(f, "null"),
            Object::Reference(obj) => obj.fmt(f),
        }
    }
}

impl From<bool> for Object {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Object {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<u32> for Object {
    fn from(v: u32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<usize> for Object {
    fn from(v: usize) -> Self {
        // object counts and byte offsets never get close to i64::MAX
        Self::Integer(v as i64)
    }
}

impl From<f64> for Object {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<CbString> for Object {
    fn from(v: CbString) -> Self {
        Self::String(v)
    }
}

impl From<Name> for Object {
    fn from(n: Name) -> Self {
        Self::Name(n)
    }
}

impl From<Vec<Object>> for Object {
    fn from(a: Vec<Object>) -> Self {
        Self::Array(a.into())
    }
}

impl From<Array> for Object {
    fn from(a: Array) -> Self {
        Self::Array(a)
    }
}

impl From<Dictionary> for Object {
    fn from(d: Dictionary) -> Self {
        Self::Dictionary(d)
    }
}

impl From<Stream> for Object {
    fn from(s: Stream) -> Self {
        Self::Stream(s)
    }
}

impl From<Reference> for Object {
    fn from(r: Reference) -> Self {
        Self::Reference(r)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bytes(Vec<u8>);

impl Bytes {
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(v: Vec<u8>) -> Self {
        Bytes(v)
    }
}

impl From<&[u8]> for Bytes {
    fn from(v: &[u8]) -> Self {
        Bytes(v.to_vec())
    }
}

impl Deref for Bytes {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for Bytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let limited_length = self.len().min(15);
        write!(f, "{}", &String::from_utf8_lossy(&self.0[..limited_length]))
    }
}

/// Build a [`Dictionary`] from `(key, value)` pairs, keeping their order.
pub fn dictionary<const N: usize>(entries: [(&[u8], Object); N]) -> Dictionary {
    entries.into_iter().map(|(k, v)| (Name::from(k), v)).collect()
}
