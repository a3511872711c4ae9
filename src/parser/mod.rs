pub mod ifc;
pub mod step;

pub use crate::error::ParseError;
pub use ifc::{AreaKind, IfcModel, SpatialArea};
pub use step::{StepEntity, StepFile, StepValue};
