//! Language layer.
//!
//! Only TypeScript is supported. JavaScript sources are deliberately left
//! out because the `?` parameter marker is not legal JavaScript.

pub mod typescript;

pub use typescript::{count_error_nodes, is_typescript_file, Dialect};
