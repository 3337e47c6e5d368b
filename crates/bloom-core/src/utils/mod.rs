pub mod fs;

pub use fs::{files_with_extensions, join_path, normalize_path, DS};
