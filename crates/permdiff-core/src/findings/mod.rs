pub mod compare;
pub mod extract;
pub mod model;

pub use compare::compare_lockfile;
pub use extract::extract_findings;
pub use model::{Dependency, DependencyChange, DependencyStatus, Finding};
