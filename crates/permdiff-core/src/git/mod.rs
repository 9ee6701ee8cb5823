pub mod diff;
pub mod range;

#[cfg(test)]
pub(crate) mod fixture;

pub use diff::{ChangeKind, PathChange, changed_paths, read_blob};
pub use range::{RangeInfo, ResolvedRange, open, repo_root, resolve_range};
