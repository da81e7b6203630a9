mod normalize;

pub use normalize::{normalize_path, sanitize_extension, PathError};
