pub use catalog::{Catalog, CatalogError};
pub use pages::{PageTree, PagesError};

use crate::pdf::{Dictionary, Object};

pub mod catalog;
pub mod pages;

/// Dictionary type names
pub(crate) mod dict_types {
    pub const CATALOG: &[u8] = b"Catalog";
    pub const PAGES: &[u8] = b"Pages";
    pub const PAGE: &[u8] = b"Page";
    pub const XOBJECT: &[u8] = b"XObject";
    pub const IMAGE: &[u8] = b"Image";
}

pub(crate) const K_TYPE: &[u8] = b"Type";
pub(crate) const K_SUBTYPE: &[u8] = b"Subtype";
pub(crate) const K_PARENT: &[u8] = b"Parent";
pub(crate) const K_KIDS: &[u8] = b"Kids";
pub(crate) const K_COUNT: &[u8] = b"Count";
pub(crate) const K_PAGES: &[u8] = b"Pages";
pub(crate) const K_LENGTH: &[u8] = b"Length";

pub(crate) const K_MEDIA_BOX: &[u8] = b"MediaBox";
pub(crate) const K_RESOURCES: &[u8] = b"Resources";
pub(crate) const K_CONTENTS: &[u8] = b"Contents";
pub(crate) const K_PROC_SET: &[u8] = b"ProcSet";
pub(crate) const K_XOBJECT: &[u8] = b"XObject";

pub(crate) const K_WIDTH: &[u8] = b"Width";
pub(crate) const K_HEIGHT: &[u8] = b"Height";
pub(crate) const K_FILTER: &[u8] = b"Filter";
pub(crate) const K_BITS_PER_COMPONENT: &[u8] = b"BitsPerComponent";
pub(crate) const K_COLOR_SPACE: &[u8] = b"ColorSpace";
pub(crate) const K_DECODE: &[u8] = b"Decode";

fn require_type(dict: &Dictionary, t: &[u8]) -> Result<(), ()> {
    if let Some(k) = dict.get(K_TYPE).and_then(Object::name) {
        if &k[..] != t {
            log::warn!("Wrong dictionary type `{}`", k);
            Err(())
        } else {
            Ok(())
        }
    } else {
        log::warn!("Missing dictionary type");
        Err(())
    }
}
