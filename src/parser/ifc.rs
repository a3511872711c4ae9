use crate::error::ParseError;
use crate::parser::step::StepFile;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Spatial containers a photo's area can be matched against, in lookup order.
pub const AREA_ENTITY_TYPES: &[(&str, AreaKind)] = &[
    ("IFCBUILDINGSTOREY", AreaKind::Storey),
    ("IFCSPACE", AreaKind::Space),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaKind {
    Storey,
    Space,
}

/// A named spatial structure element of the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpatialArea {
    pub id: u64,
    pub name: String,
    pub kind: AreaKind,
}

/// Parsed IFC model with the spatial queries the plan extractor needs.
#[derive(Debug)]
pub struct IfcModel {
    pub name: String,
    pub schema: String,
    pub file_path: String,
    pub step: StepFile,
}

impl IfcModel {
    /// Reads and parses an IFC file (IFC2x3 and IFC4).
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::FileRead`] if the file cannot be read.
    /// Returns [`ParseError::InvalidStep`] if the STEP format is malformed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use metro_progress::parser::IfcModel;
    ///
    /// let model = IfcModel::open("estacao.ifc")?;
    /// for area in model.spatial_areas() {
    ///     println!("{:?} {}", area.kind, area.name);
    /// }
    /// # Ok::<(), metro_progress::error::ParseError>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        let content = std::fs::read_to_string(&path).map_err(|source| ParseError::FileRead {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        let model = Self::parse(&content, path.as_ref().to_string_lossy().to_string())?;
        info!(
            file = %model.file_path,
            schema = %model.schema,
            entities = model.step.len(),
            "IFC model loaded"
        );
        Ok(model)
    }

    pub fn parse(content: &str, file_path: String) -> Result<Self, ParseError> {
        let step = StepFile::parse(content)?;
        let name = step
            .entities_of_type("IFCPROJECT")
            .next()
            .and_then(|e| e.string_at(2))
            .map_or_else(|| "Unknown Project".to_string(), str::to_string);

        Ok(Self {
            name,
            schema: step.schema.clone(),
            file_path,
            step,
        })
    }

    /// Storeys then spaces, each in file order. Unnamed elements are skipped.
    #[must_use]
    pub fn spatial_areas(&self) -> Vec<SpatialArea> {
        AREA_ENTITY_TYPES
            .iter()
            .flat_map(|&(entity_type, kind)| {
                self.step.entities_of_type(entity_type).filter_map(move |e| {
                    e.string_at(2).map(|name| SpatialArea {
                        id: e.id,
                        name: name.to_string(),
                        kind,
                    })
                })
            })
            .collect()
    }

    /// Area names offered for mapping: unique, sorted, without purely
    /// numeric names (room numbers and level indices).
    #[must_use]
    pub fn area_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .spatial_areas()
            .into_iter()
            .map(|a| a.name)
            .filter(|n| !n.is_empty() && !n.chars().all(|c| c.is_ascii_digit()))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// First storey, then first space, whose name matches exactly.
    #[must_use]
    pub fn find_area(&self, name: &str) -> Option<SpatialArea> {
        self.spatial_areas().into_iter().find(|a| a.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MODEL: &str = "ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCPROJECT('p',$,'Linha 6',$,$,$,$,$,$);
#10=IFCSPACE('s1',$,'Plataforma',$,$,$,$,$,.ELEMENT.,.INTERNAL.,$);
#11=IFCBUILDINGSTOREY('b1',$,'Plataforma',$,$,$,$,$,.ELEMENT.,0.);
#12=IFCBUILDINGSTOREY('b2',$,'02',$,$,$,$,$,.ELEMENT.,3000.);
#13=IFCSPACE('s2',$,'Mezanino',$,$,$,$,$,.ELEMENT.,.INTERNAL.,$);
#14=IFCSPACE('s3',$,$,$,$,$,$,$,.ELEMENT.,.INTERNAL.,$);
ENDSEC;
END-ISO-10303-21;
";

    fn model() -> IfcModel {
        IfcModel::parse(MODEL, "test.ifc".into()).unwrap()
    }

    #[test]
    fn reads_project_metadata() {
        let model = model();
        assert_eq!(model.name, "Linha 6");
        assert_eq!(model.schema, "IFC2X3");
    }

    #[test]
    fn area_names_skip_numeric_and_duplicates() {
        assert_eq!(model().area_names(), ["Mezanino", "Plataforma"]);
    }

    #[test]
    fn storeys_win_over_spaces() {
        let area = model().find_area("Plataforma").unwrap();
        assert_eq!(area.id, 11);
        assert_eq!(area.kind, AreaKind::Storey);
        assert!(model().find_area("Acesso").is_none());
    }
}
