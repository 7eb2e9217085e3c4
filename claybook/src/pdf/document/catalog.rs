use crate::pdf::{
    document::{dict_types, require_type, K_PAGES},
    Dictionary, Reference,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog has no /Pages entry")]
    MissingPages,
    #[error("catalog /Pages is not an indirect reference")]
    InvalidPages,
}

/// The parts of a document catalog needed to extend an existing document.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    /// Root of the page tree.
    pub pages: Reference,
}

impl Catalog {
    pub(crate) fn new_with(dict: &Dictionary) -> Result<Self, CatalogError> {
        // some producers omit /Type, the page tree is what matters
        let _ = require_type(dict, dict_types::CATALOG);

        Ok(Self {
            pages: *dict
                .get(K_PAGES)
                .ok_or(CatalogError::MissingPages)?
                .reference()
                .ok_or(CatalogError::InvalidPages)?,
        })
    }
}
