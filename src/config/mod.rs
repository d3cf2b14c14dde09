pub mod loader;
pub mod types;

pub use types::{Category, Configuration, FingerprintTimestamp, Sort, Transformer};
