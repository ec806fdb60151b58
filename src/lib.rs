//! Toqin compiles design specification documents into stylesheets.
//!
//! This package bundles the two workspace crates:
//!
//! - [`dspec`]: the document model, value expressions and map builder.
//! - [`toqin`]: the loader, the CSS compiler and the incremental store.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use toqin_rs::toqin::{CompilerOptions, CssCompiler, CssOptions, Store, SystemSource};
//!
//! # async fn build() -> toqin_rs::toqin::Result<()> {
//! let mut store = Store::new(SystemSource::new(), CompilerOptions::default());
//! store.use_compiler(CssCompiler::new(CssOptions::default()));
//!
//! for output in store.run("./index.json", Path::new("design")).await? {
//!     println!("{}: {} bytes", output.file_name, output.content.len());
//! }
//! # Ok(())
//! # }
//! ```

pub use dspec;
pub use toqin;

pub use toqin::{
    Compiler, CompilerOptions, CssCompiler, CssOptions, Result, Store, StoreEvent, SystemSource,
    ToqinError,
};
