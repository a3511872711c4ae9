use std::collections::HashMap;

use crate::error::ExtractError;
use crate::parser::StepFile;

/// Where an element sits in the spatial structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    Contained(u64),
    /// No containment relation names the element. Expected for aggregated
    /// parts and type objects; such elements are simply not counted.
    Uncontained,
}

/// Element → containing structure, from `IFCRELCONTAINEDINSPATIALSTRUCTURE`.
#[derive(Debug, Default)]
pub struct ContainmentIndex {
    structure_of: HashMap<u64, u64>,
}

impl ContainmentIndex {
    /// Indexes every containment relation. When an element appears in more
    /// than one, the first relation in file order wins.
    ///
    /// # Errors
    ///
    /// [`ExtractError::MalformedRelation`] when a relation's
    /// `RelatingStructure` is not an instance reference.
    pub fn build(step: &StepFile) -> Result<Self, ExtractError> {
        let mut structure_of = HashMap::new();

        for rel in step.entities_of_type("IFCRELCONTAINEDINSPATIALSTRUCTURE") {
            // 4 = RelatedElements, 5 = RelatingStructure
            let structure = rel
                .reference_at(5)
                .ok_or(ExtractError::MalformedRelation { relation: rel.id })?;
            for element in rel.references_at(4) {
                structure_of.entry(element).or_insert(structure);
            }
        }

        Ok(Self { structure_of })
    }

    #[must_use]
    pub fn of(&self, element: u64) -> Containment {
        self.structure_of
            .get(&element)
            .map_or(Containment::Uncontained, |&s| Containment::Contained(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(data: &str) -> StepFile {
        StepFile::parse(&format!("DATA;\n{data}\nENDSEC;\n")).unwrap()
    }

    #[test]
    fn first_relation_wins() {
        let file = step(
            "#1=IFCRELCONTAINEDINSPATIALSTRUCTURE('a',$,$,$,(#5,#6),#100);
             #2=IFCRELCONTAINEDINSPATIALSTRUCTURE('b',$,$,$,(#6),#200);",
        );

        let index = ContainmentIndex::build(&file).unwrap();

        assert_eq!(index.of(5), Containment::Contained(100));
        assert_eq!(index.of(6), Containment::Contained(100));
        assert_eq!(index.of(7), Containment::Uncontained);
    }

    #[test]
    fn malformed_structure_propagates() {
        let file = step("#9=IFCRELCONTAINEDINSPATIALSTRUCTURE('a',$,$,$,(#5),$);");

        let err = ContainmentIndex::build(&file).unwrap_err();

        assert!(matches!(err, ExtractError::MalformedRelation { relation: 9 }));
    }
}
