//! Output compilers.
//!
//! A [`Compiler`] turns the resolved graph into output files. The store runs
//! every registered compiler after each load or reindex; [`CssCompiler`] is
//! the built-in one.

pub mod css;
pub mod source_map;

use std::path::{Path, PathBuf};

use dspec::{SpecGraph, SpecId};
use log::debug;

use crate::error::Result;

pub use css::{CssCompiler, CssOptions, Stylesheet};
pub use source_map::{Mapping, SourceMap, SourceMapMode};

/// Settings shared by every compiler of a store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Where [`Outputs::write`] puts files. Nothing is written without one.
    pub out_dir: Option<PathBuf>,
    pub watch: bool,
}

/// One generated file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DesignOutput {
    /// Name of the compiler that produced it.
    pub compiler: String,
    pub file_name: String,
    pub content: String,
}

pub trait Compiler: Send + Sync {
    fn name(&self) -> &str;

    /// Compiles the graph rooted at `root`. Every map of every reachable
    /// document is up to date when this is called.
    fn compile(
        &self,
        graph: &SpecGraph,
        root: SpecId,
        options: &CompilerOptions,
    ) -> Result<Vec<DesignOutput>>;
}

/// The files produced by one compile pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outputs(pub Vec<DesignOutput>);

impl Outputs {
    pub fn iter(&self) -> impl Iterator<Item = &DesignOutput> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn find(&self, file_name: &str) -> Option<&DesignOutput> {
        self.0.iter().find(|output| output.file_name == file_name)
    }

    /// Writes every file into `out_dir`, creating it when missing.
    pub async fn write(&self, out_dir: &Path) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(out_dir).await?;

        let mut written = Vec::with_capacity(self.0.len());
        for output in &self.0 {
            let path = out_dir.join(&output.file_name);
            tokio::fs::write(&path, &output.content).await?;
            debug!("wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

impl IntoIterator for Outputs {
    type Item = DesignOutput;
    type IntoIter = std::vec::IntoIter<DesignOutput>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Extend<DesignOutput> for Outputs {
    fn extend<T: IntoIterator<Item = DesignOutput>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}
