//! Table-view service: response assembly, record shaping and CRUD orchestration.

mod assembler;
mod crud;
mod params;
mod shape;
mod validation;

pub use assembler::{Assembled, TableView};
pub use crud::{parse_id, CrudService};
pub use params::{ListParams, OptionsParams, ShowParams};
pub use shape::{shape_record, shape_records};
pub use validation::RequestValidator;
