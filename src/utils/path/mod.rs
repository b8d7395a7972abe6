//! Path and URL utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! - [`fs`]: Filesystem and logical path handling (`resolve_path`, `logical_path`)
//! - [`route`]: Reference utilities (`is_external_link`, `split_path_suffix`)

pub mod fs;
pub mod route;

pub use fs::{
    is_file_following_links, logical_file_name, logical_parent, logical_path, normalize_logical,
    resolve_path,
};
