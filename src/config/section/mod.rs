//! Configuration section definitions.
//!
//! Each module corresponds to a section in `revpub.toml`:
//!
//! | Module      | TOML Section   | Purpose                                |
//! |-------------|----------------|----------------------------------------|
//! | `paths`     | `[paths]`      | Source root, publish root, manifest    |
//! | `publish`   | `[publish]`    | Host, selection globs, naming          |
//! | `reference` | `[reference]`  | Generated script and its map file      |
//! | `compress`  | `[compress]`   | Compressed siblings                    |

mod compress;
mod paths;
mod publish;
mod reference;

pub use compress::{COMPRESSED_EXTENSION, CompressConfig};
pub use paths::PathsConfig;
pub use publish::{PublishPatterns, PublishSection};
pub use reference::ReferenceConfig;
