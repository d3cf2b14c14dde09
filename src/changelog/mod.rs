pub mod builder;
pub mod commit_mode;
pub mod fingerprint;
pub mod matcher;
pub mod output;
pub mod renderer;
pub mod source;
pub mod window;

pub use builder::{ReleaseNotesBuilder, ReleaseNotesOptions};
pub use renderer::{ChangelogRenderer, TemplateRenderer};
