use chrono::{DateTime, Utc};

use crate::pdf::{CbString, Dictionary, Name, Object};

/// Document information dictionary entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub mod_date: Option<DateTime<Utc>>,
}

pub(crate) const PRODUCER: &str = concat!("claybook ", env!("CARGO_PKG_VERSION"));

impl DocumentInfo {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Fill in what a new document should always carry.
    pub(crate) fn with_defaults(mut self, fallback_title: Option<&str>, now: DateTime<Utc>) -> Self {
        if self.title.is_none() {
            self.title = fallback_title.map(str::to_owned);
        }
        self.producer.get_or_insert_with(|| PRODUCER.to_owned());
        self.creation_date.get_or_insert(now);
        self.mod_date.get_or_insert(now);
        self
    }

    /// Write every present entry into `dict`, replacing existing values.
    pub(crate) fn apply_to(&self, dict: &mut Dictionary) {
        let texts = [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Subject", &self.subject),
            ("Keywords", &self.keywords),
            ("Creator", &self.creator),
            ("Producer", &self.producer),
        ];
        for (key, value) in texts {
            if let Some(value) = value {
                dict.insert(Name::from(key), Object::from(CbString::text(value)));
            }
        }
        let dates = [("CreationDate", &self.creation_date), ("ModDate", &self.mod_date)];
        for (key, value) in dates {
            if let Some(value) = value {
                dict.insert(Name::from(key), Object::from(CbString::date(value)));
            }
        }
    }

    pub(crate) fn to_dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::default();
        self.apply_to(&mut dict);
        dict
    }
}
