use std::collections::BTreeMap;

use crate::model::class_key;

/// Segmentation label id → material class. Id 0 is background and never mapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    classes: BTreeMap<u8, String>,
}

impl Default for LabelMap {
    fn default() -> Self {
        Self::new([(1, "concreto"), (2, "metal"), (3, "deck_metalico")])
    }
}

impl LabelMap {
    #[must_use]
    pub fn new<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u8, K)>,
        K: AsRef<str>,
    {
        Self {
            classes: entries
                .into_iter()
                .filter(|(id, _)| *id != 0)
                .map(|(id, class)| (id, class_key(class.as_ref())))
                .collect(),
        }
    }

    #[must_use]
    pub fn class_of(&self, id: u8) -> Option<&str> {
        self.classes.get(&id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &str)> {
        self.classes.iter().map(|(id, class)| (*id, class.as_str()))
    }
}
