//! Base plan extraction: counts the BIM elements of each material class
//! contained in a named area of the IFC model.

pub mod containment;
pub mod mapping;

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::error::ExtractError;
use crate::model::{normalize_area_id, BasePlan, CountingUnit};
use crate::parser::{IfcModel, SpatialArea};
use crate::store::RecordStore;

pub use containment::{Containment, ContainmentIndex};
pub use mapping::{load_area_mapping, ClassMapping};

/// Result of [`Extractor::generate_all`].
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    /// Area ids whose plan was written.
    pub generated: Vec<String>,
    /// Technical area names not present in the model.
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Extractor {
    mapping: ClassMapping,
}

impl Extractor {
    #[must_use]
    pub fn new(mapping: ClassMapping) -> Self {
        Self { mapping }
    }

    #[must_use]
    pub fn mapping(&self) -> &ClassMapping {
        &self.mapping
    }

    /// Plan for the area named `area_name` in the model, stored under `area_id`.
    pub fn base_plan(
        &self,
        model: &IfcModel,
        area_id: &str,
        area_name: &str,
    ) -> Result<BasePlan, ExtractError> {
        let area = model
            .find_area(area_name)
            .ok_or_else(|| ExtractError::AreaNotFound {
                name: area_name.to_string(),
            })?;
        let index = ContainmentIndex::build(&model.step)?;
        Ok(self.plan_for(model, &index, &area, area_id))
    }

    fn plan_for(
        &self,
        model: &IfcModel,
        index: &ContainmentIndex,
        area: &SpatialArea,
        area_id: &str,
    ) -> BasePlan {
        let counts: BTreeMap<&str, u64> = self
            .mapping
            .classes()
            .map(|class| {
                let n = self
                    .mapping
                    .entity_types(class)
                    .iter()
                    .flat_map(|t| model.step.entities_of_type(t))
                    .filter(|e| index.of(e.id) == Containment::Contained(area.id))
                    .count();
                (class, n as u64)
            })
            .collect();

        BasePlan::new(normalize_area_id(area_id), Some(CountingUnit::Instances), counts)
    }

    /// Writes one plan per `folder → area name` entry. Folder names become
    /// area ids (trimmed, lower-cased). Areas absent from the model are
    /// reported in the summary and skipped.
    pub fn generate_all<S>(
        &self,
        model: &IfcModel,
        folders: &BTreeMap<String, String>,
        store: &S,
    ) -> Result<GenerationSummary, ExtractError>
    where
        S: RecordStore<BasePlan>,
    {
        let index = ContainmentIndex::build(&model.step)?;
        let mut summary = GenerationSummary::default();

        for (folder, area_name) in folders {
            let area_id = normalize_area_id(folder);
            let Some(area) = model.find_area(area_name) else {
                warn!(folder = %area_id, area = %area_name, "area not found in IFC model, skipped");
                summary.missing.push(area_name.clone());
                continue;
            };

            let plan = self.plan_for(model, &index, &area, &area_id);
            store.put(&area_id, &plan)?;
            info!(
                area = %area_id,
                ifc_area = %area_name,
                ifc_id = area.id,
                total = plan.expected_total,
                "base plan written"
            );
            summary.generated.push(area_id);
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    const MODEL: &str = "ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#10=IFCBUILDINGSTOREY('b1',$,'N1 - Plataforma',$,$,$,$,$,.ELEMENT.,0.);
#11=IFCBUILDINGSTOREY('b2',$,'N2 - Mezanino',$,$,$,$,$,.ELEMENT.,5000.);
#20=IFCWALL('w1',$,'Parede',$,$,$,$,$,$);
#21=IFCWALLSTANDARDCASE('w2',$,'Parede',$,$,$,$,$,$);
#22=IFCSLAB('s1',$,'Laje',$,$,$,$,$,$);
#23=IFCRAILING('r1',$,'Guarda-corpo',$,$,$,$,$,$);
#24=IFCCOVERING('c1',$,'Deck',$,$,$,$,$,$);
#25=IFCSLAB('s2',$,'Laje',$,$,$,$,$,$);
#26=IFCCOLUMN('p1',$,'Pilar',$,$,$,$,$,$);
#27=IFCWALL('w3',$,'Solta',$,$,$,$,$,$);
#30=IFCRELCONTAINEDINSPATIALSTRUCTURE('r',$,$,$,(#20,#21,#22,#23,#26),#10);
#31=IFCRELCONTAINEDINSPATIALSTRUCTURE('r',$,$,$,(#24,#25),#11);
ENDSEC;
END-ISO-10303-21;
";

    fn model() -> IfcModel {
        IfcModel::parse(MODEL, "metro.ifc".into()).unwrap()
    }

    #[test]
    fn counts_only_elements_in_area() {
        let plan = Extractor::default()
            .base_plan(&model(), "Plataforma", "N1 - Plataforma")
            .unwrap();

        assert_eq!(plan.area_id, "plataforma");
        assert_eq!(plan.ceiling("concreto"), 3);
        assert_eq!(plan.ceiling("metal"), 1);
        assert_eq!(plan.ceiling("deck_metalico"), 0);
        assert_eq!(plan.expected_total, 4);
        assert_eq!(plan.unit, Some(CountingUnit::Instances));
    }

    #[test]
    fn ifc4_subtypes_count_toward_their_class() {
        let model = IfcModel::parse(
            "ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#10=IFCBUILDINGSTOREY('b1',$,'N1 - Plataforma',$,$,$,$,$,.ELEMENT.,0.);
#20=IFCSLABSTANDARDCASE('s1',$,'Laje',$,$,$,$,$,.FLOOR.);
#21=IFCWALLELEMENTEDCASE('w1',$,'Parede',$,$,$,$,$,$);
#22=IFCSLABELEMENTEDCASE('s2',$,'Laje',$,$,$,$,$,.FLOOR.);
#23=IFCWALLSTANDARDCASE('w2',$,'Solta',$,$,$,$,$,$);
#30=IFCRELCONTAINEDINSPATIALSTRUCTURE('r',$,$,$,(#20,#21,#22),#10);
ENDSEC;
END-ISO-10303-21;
",
            "ifc4.ifc".into(),
        )
        .unwrap();

        let plan = Extractor::default()
            .base_plan(&model, "plataforma", "N1 - Plataforma")
            .unwrap();

        assert_eq!(plan.ceiling("concreto"), 3);
        assert_eq!(plan.expected_total, 3);
    }

    #[test]
    fn custom_mapping_changes_classes() {
        let mapping = ClassMapping::new(BTreeMap::from([(
            "estrutura".to_string(),
            vec!["IfcColumn".to_string()],
        )]));

        let plan = Extractor::new(mapping)
            .base_plan(&model(), "plataforma", "N1 - Plataforma")
            .unwrap();

        assert_eq!(plan.expected, BTreeMap::from([("estrutura".to_string(), 1)]));
    }

    #[test]
    fn unknown_area_is_an_error() {
        let err = Extractor::default()
            .base_plan(&model(), "acesso", "N0 - Acesso")
            .unwrap_err();
        assert!(matches!(err, ExtractError::AreaNotFound { .. }));
    }

    #[test]
    fn generate_all_skips_missing_areas() {
        let store = MemoryStore::new();
        let folders = BTreeMap::from([
            (" Mezanino".to_string(), "N2 - Mezanino".to_string()),
            ("Plataforma".to_string(), "N1 - Plataforma".to_string()),
            ("Acesso".to_string(), "N0 - Acesso".to_string()),
        ]);

        let summary = Extractor::default()
            .generate_all(&model(), &folders, &store)
            .unwrap();

        assert_eq!(summary.generated, ["mezanino", "plataforma"]);
        assert_eq!(summary.missing, ["N0 - Acesso"]);
        let mezanino = store.get("mezanino").unwrap().unwrap();
        assert_eq!(mezanino.ceiling("concreto"), 1);
        assert_eq!(mezanino.ceiling("deck_metalico"), 1);
    }
}
