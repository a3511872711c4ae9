use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ExtractError;
use crate::model::class_key;

/// Subtypes a query for the supertype also matches, as IFC schemas define them.
const SUBTYPES: &[(&str, &[&str])] = &[
    ("IFCWALL", &["IFCWALLSTANDARDCASE", "IFCWALLELEMENTEDCASE"]),
    ("IFCSLAB", &["IFCSLABSTANDARDCASE", "IFCSLABELEMENTEDCASE"]),
    ("IFCBEAM", &["IFCBEAMSTANDARDCASE"]),
    ("IFCCOLUMN", &["IFCCOLUMNSTANDARDCASE"]),
    ("IFCMEMBER", &["IFCMEMBERSTANDARDCASE"]),
    ("IFCPLATE", &["IFCPLATESTANDARDCASE"]),
    ("IFCDOOR", &["IFCDOORSTANDARDCASE"]),
    ("IFCWINDOW", &["IFCWINDOWSTANDARDCASE"]),
];

fn subtypes_of(entity_type: &str) -> &'static [&'static str] {
    SUBTYPES
        .iter()
        .find(|(supertype, _)| *supertype == entity_type)
        .map_or(&[][..], |&(_, subtypes)| subtypes)
}

/// Material class → IFC entity types whose instances count toward it.
///
/// Each mapped type also matches its known subtypes (`IfcSlab` covers
/// `IfcSlabStandardCase`).
///
/// Passed to the [`super::Extractor`] at construction so alternate mappings
/// can be tested and configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMapping {
    classes: BTreeMap<String, Vec<String>>,
}

impl Default for ClassMapping {
    fn default() -> Self {
        let classes = [
            (
                "concreto",
                &["IfcWall", "IfcSlab", "IfcStair"][..],
            ),
            ("metal", &["IfcRailing", "IfcCurtainWall"][..]),
            ("deck_metalico", &["IfcCovering"][..]),
        ];
        Self::new(
            classes
                .into_iter()
                .map(|(class, types)| {
                    (
                        class.to_string(),
                        types.iter().map(ToString::to_string).collect(),
                    )
                })
                .collect(),
        )
    }
}

impl ClassMapping {
    #[must_use]
    pub fn new(classes: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            classes: classes
                .into_iter()
                .map(|(class, types)| (class_key(&class), expand(&types)))
                .collect(),
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Upper-case entity type names mapped to `class`.
    #[must_use]
    pub fn entity_types(&self, class: &str) -> &[String] {
        self.classes.get(class).map_or(&[][..], Vec::as_slice)
    }

    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.classes
    }
}

/// Upper-cases each type and appends its subtypes, without duplicates.
fn expand(types: &[String]) -> Vec<String> {
    let mut expanded: Vec<String> = Vec::new();
    for entity_type in types {
        let entity_type = entity_type.trim().to_ascii_uppercase();
        let subtypes = subtypes_of(&entity_type).iter().map(ToString::to_string);
        for t in std::iter::once(entity_type.clone()).chain(subtypes) {
            if !expanded.contains(&t) {
                expanded.push(t);
            }
        }
    }
    expanded
}

/// Photo folder name → technical area name in the IFC model.
pub fn load_area_mapping<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, String>, ExtractError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ExtractError::MappingRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ExtractError::MappingParse {
        path: path.to_path_buf(),
        source,
    })
}
