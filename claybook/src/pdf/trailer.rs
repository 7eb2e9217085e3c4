use super::{Bytes, Dictionary, Object, Reference};

pub const TRAILER: &[u8] = b"trailer";
pub const K_SIZE: &[u8] = b"Size";
pub const K_PREVIOUS: &[u8] = b"Prev";
pub const K_ENCRYPT: &[u8] = b"Encrypt";
pub const K_ROOT: &[u8] = b"Root";
pub const K_INFO: &[u8] = b"Info";
pub const K_ID: &[u8] = b"ID";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrailerError {
    #[error("trailer /Size is invalid")]
    InvalidSize,
    #[error("trailer has no /Size")]
    MissingSize,
    #[error("trailer /Root is not a reference")]
    InvalidRoot,
    #[error("trailer has no /Root")]
    MissingRoot,
    #[error("trailer /Prev is invalid")]
    InvalidPrevious,
    #[error("trailer /Info is not a reference")]
    InvalidInfo,
    #[error("trailer /ID is invalid")]
    InvalidId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trailer {
    /// One more than the highest object number used in the document.
    pub size: usize,

    /// Byte offset to the previous cross-reference section.
    pub previous: Option<usize>,

    /// Reference to the document catalog.
    pub root: Reference,

    /// Encryption dictionary (or a reference to it). Only read to refuse
    /// encrypted input, never written.
    pub encrypt: Option<Object>,

    /// Document information dictionary.
    pub info: Option<Reference>,

    /// File identifier.
    pub id: Option<[Bytes; 2]>,
}

impl Trailer {
    pub fn new(root: Reference) -> Self {
        Self {
            size: 0,
            previous: None,
            root,
            encrypt: None,
            info: None,
            id: None,
        }
    }
}

impl From<Trailer> for Dictionary {
    fn from(trailer: Trailer) -> Self {
        let mut dict = Dictionary::default();
        dict.insert(K_SIZE.into(), Object::from(trailer.size));
        if let Some(prev) = trailer.previous {
            dict.insert(K_PREVIOUS.into(), Object::from(prev));
        }

        dict.insert(K_ROOT.into(), Object::Reference(trailer.root));

        if let Some(info) = trailer.info {
            dict.insert(K_INFO.into(), Object::Reference(info));
        }

        if let Some([id0, id1]) = trailer.id {
            dict.insert(
                K_ID.into(),
                Object::from(vec![Object::HexString(id0), Object::HexString(id1)]),
            );
        }

        dict
    }
}

impl TryFrom<Dictionary> for Trailer {
    type Error = TrailerError;

    fn try_from(dict: Dictionary) -> Result<Self, Self::Error> {
        Ok(Trailer {
            size: dict
                .get(K_SIZE)
                .ok_or(TrailerError::MissingSize)?
                .integer()
                .ok_or(TrailerError::InvalidSize)?
                .try_into()
                .map_err(|_| TrailerError::InvalidSize)?,

            previous: dict
                .get(K_PREVIOUS)
                .map(|o| o.integer().ok_or(TrailerError::InvalidPrevious))
                .transpose()?
                .map(TryInto::try_into)
                .transpose()
                .map_err(|_| TrailerError::InvalidPrevious)?,

            root: *dict
                .get(K_ROOT)
                .ok_or(TrailerError::MissingRoot)?
                .reference()
                .ok_or(TrailerError::InvalidRoot)?,

            encrypt: dict.get(K_ENCRYPT).cloned(),

            info: dict
                .get(K_INFO)
                .map(|o| o.reference().copied().ok_or(TrailerError::InvalidInfo))
                .transpose()?,

            id: dict
                .get(K_ID)
                .map(|o| o.array().ok_or(TrailerError::InvalidId))
                .transpose()?
                .map(|a| match (a.first(), a.get(1), a.len()) {
                    (Some(id0), Some(id1), 2) => Ok([
                        id0.string_bytes().ok_or(TrailerError::InvalidId)?.into(),
                        id1.string_bytes().ok_or(TrailerError::InvalidId)?.into(),
                    ]),
                    _ => Err(TrailerError::InvalidId),
                })
                .transpose()?,
        })
    }
}
