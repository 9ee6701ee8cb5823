pub mod model;
pub mod publish;
pub mod render;

pub use model::{ContextInfo, LockfileReport, Report, ScanStatus, ToolInfo};
pub use publish::write_github_env;
pub use render::{NO_CHANGES_MESSAGE, render_markdown, render_text};
