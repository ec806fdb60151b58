//! Loads design documents, compiles them to CSS and keeps the output in step
//! with the files on disk.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use toqin::{CompilerOptions, CssCompiler, CssOptions, Store, SystemSource};
//!
//! # async fn build() -> toqin::Result<()> {
//! let options = CompilerOptions {
//!     out_dir: Some("dist".into()),
//!     watch: false,
//! };
//! let mut store = Store::new(SystemSource::new(), options);
//! store.use_compiler(CssCompiler::new(CssOptions::default()));
//!
//! let outputs = store.run("./tokens.json", Path::new(".")).await?;
//! for output in outputs.iter() {
//!     println!("{}", output.file_name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod compiler;
pub mod error;
pub mod loader;
mod log_init;
pub mod source;
pub mod store;
pub mod watch;

pub use compiler::{
    Compiler, CompilerOptions, CssCompiler, CssOptions, DesignOutput, Outputs, SourceMapMode,
    Stylesheet,
};
pub use dspec::{SpecError, SpecGraph, SpecId, Specification};
pub use error::{Result, ToqinError};
pub use loader::Loader;
pub use log_init::init_logger;
pub use source::{DocumentSource, MemorySource, SystemSource};
pub use store::{Store, StoreEvent, Unsubscribe};
pub use watch::{FileWatcher, NotifyWatcher};

// Re-export the log crate so users can use toqin::log::info!, etc.
pub use log;
