//! Blankness checks shared by validation, mode selection and payload shaping.
//!
//! A value is blank when it is absent, empty, or (for strings) whitespace only.

use serde_json::{Map, Value};

pub(crate) trait Blank {
    fn is_blank(&self) -> bool;

    fn is_present(&self) -> bool {
        !self.is_blank()
    }
}

impl Blank for str {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.as_str().is_blank()
    }
}

impl Blank for Map<String, Value> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Blank + ?Sized> Blank for &T {
    fn is_blank(&self) -> bool {
        (**self).is_blank()
    }
}

impl<T: Blank> Blank for Option<T> {
    fn is_blank(&self) -> bool {
        self.as_ref().map_or(true, |value| value.is_blank())
    }
}
