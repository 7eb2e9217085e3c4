use crate::pdf::{
    document::{dict_types, require_type, K_COUNT, K_KIDS},
    Array, Dictionary, Object, Reference,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PagesError {
    #[error("page tree has no /Kids")]
    MissingKids,
    #[error("page tree /Kids is not an array of references")]
    InvalidKids,
    #[error("page tree has no /Count")]
    MissingCount,
    #[error("page tree /Count is invalid")]
    InvalidCount,
}

/// Root node of an existing page tree.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTree {
    /// Page or intermediate page tree nodes, in page order.
    pub kids: Vec<Reference>,
    /// Number of leaf pages below this node.
    pub count: usize,
    /// The complete node dictionary, so inheritable attributes survive a
    /// rewrite.
    pub dictionary: Dictionary,
}

impl PageTree {
    /// `resolve` is used when `/Kids` is stored as an indirect array.
    pub(crate) fn new_with<F>(dict: Dictionary, resolve: F) -> Result<Self, PagesError>
    where
        F: FnOnce(&Reference) -> Option<Object>,
    {
        let _ = require_type(&dict, dict_types::PAGES);

        let kids = match dict.get(K_KIDS).ok_or(PagesError::MissingKids)? {
            Object::Array(a) => kids_from_array(a)?,
            Object::Reference(r) => match resolve(r) {
                Some(Object::Array(a)) => kids_from_array(&a)?,
                _ => return Err(PagesError::InvalidKids),
            },
            _ => return Err(PagesError::InvalidKids),
        };

        let count: usize = dict
            .get(K_COUNT)
            .ok_or(PagesError::MissingCount)?
            .integer()
            .ok_or(PagesError::InvalidCount)?
            .try_into()
            .map_err(|_| PagesError::InvalidCount)?;

        if count < kids.len() {
            log::error!(
                "Invalid child count. Got {} children but count is {}",
                kids.len(),
                count
            );
            return Err(PagesError::InvalidCount);
        }

        Ok(Self {
            kids,
            count,
            dictionary: dict,
        })
    }

    /// Node dictionary with `pages` appended after the existing kids.
    pub fn extended_with(&self, pages: &[Reference]) -> Dictionary {
        let mut dict = self.dictionary.clone();
        let kids: Array = self
            .kids
            .iter()
            .chain(pages.iter())
            .copied()
            .map(Object::Reference)
            .collect();
        dict.insert(K_KIDS.into(), kids.into());
        dict.insert(K_COUNT.into(), Object::from(self.count + pages.len()));
        dict
    }
}

fn kids_from_array(array: &Array) -> Result<Vec<Reference>, PagesError> {
    array
        .iter()
        .map(|kid| kid.reference().copied().ok_or(PagesError::InvalidKids))
        .collect()
}
