//! Invocation of the external index tools and build orchestration.
//!
//! Everything that physically builds or queries index structures is an
//! external executable (`parse_collection`, `invert`, `create_wand_data`,
//! `compress_inverted_index`, `evaluate_queries`, ...). This crate wraps
//! those tools behind [`Toolbox`], which also implements the two
//! decisions the system actually owns:
//!
//! - **build orchestration** ([`Toolbox::compress`]): register the
//!   requested logical index under its alias, then build only the
//!   physical artifacts that no structurally equivalent record already
//!   satisfies;
//! - **query resolution** ([`Toolbox::queries`]): resolve an alias to its
//!   two physical dependents and fail loudly when either is missing.
//!
//! All invocations block until the subprocess exits; a non-zero exit
//! status is the sole failure signal and aborts the current command.

mod error;
mod runner;
mod source;
mod toolbox;

pub use error::{Result, ToolsError};
pub use runner::{Invoker, Subprocess, ToolError};
pub use source::{ParseFormat, Source};
pub use toolbox::{prepare_output_dir, QueryOpts, Toolbox};
