pub mod entities;
pub mod repositories;
pub mod value_objects;

pub use entities::*;
pub use repositories::*;
pub use teamform_errors::{TeamFormationError, TeamFormationResult};
pub use value_objects::*;
