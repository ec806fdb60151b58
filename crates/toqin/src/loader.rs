//! Reads documents and resolves their `extends`/`includes` graph.
//!
//! References are located relative to the referring document:
//!
//! | Reference | Resolves to |
//! |-----------|-------------|
//! | `https://…` | itself, fetched once per loader |
//! | `./x.json`, `../x.json` | the referrer's directory joined with the path |
//! | `/abs/x.json` | itself |
//! | `pkg/x.json` | a module directory (`node_modules`) above the referrer, else the referrer's directory |
//!
//! A reference made from a remote document is joined against that
//! document's URL.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use dspec::parser::{LoadOptions, ParsedDocument, parse_document};
use dspec::{SpecEdge, SpecGraph, SpecId};
use futures::future::{BoxFuture, FutureExt};
use log::{debug, warn};

use crate::error::{Result, ToqinError};
use crate::source::DocumentSource;

pub fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

fn is_relative(reference: &str) -> bool {
    reference.starts_with("./") || reference.starts_with("../")
}

/// Removes `.` and `..` components without touching the file system.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `path` joined onto the working directory and normalized.
pub fn absolute_path(path: &Path) -> PathBuf {
    match std::path::absolute(path) {
        Ok(absolute) => normalize_path(&absolute),
        Err(_) => normalize_path(path),
    }
}

/// The key a local file is stored under in a [`SpecGraph`].
///
/// Keys are absolute so that watcher paths find the same document.
pub fn path_key(path: &Path) -> String {
    absolute_path(path).to_string_lossy().into_owned()
}

/// Directory that references made by `url` are relative to.
pub(crate) fn base_dir_of(url: &str, fallback: &Path) -> PathBuf {
    if is_remote(url) {
        return fallback.to_path_buf();
    }
    Path::new(url)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| fallback.to_path_buf())
}

pub struct Loader<S> {
    source: S,
    options: LoadOptions,
    remote_cache: HashMap<String, ParsedDocument>,
    /// Documents whose references are being loaded, outermost first.
    loading: Vec<SpecId>,
}

impl<S: DocumentSource> Loader<S> {
    pub fn new(source: S) -> Self {
        Self::with_options(source, LoadOptions::default())
    }

    pub fn with_options(source: S, options: LoadOptions) -> Self {
        Self {
            source,
            options,
            remote_cache: HashMap::new(),
            loading: Vec::new(),
        }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolves `reference` to the path or URL it is stored under.
    pub async fn locate(
        &self,
        reference: &str,
        base_dir: &Path,
        parent: Option<&str>,
    ) -> Result<String> {
        if is_remote(reference) {
            return Ok(reference.to_string());
        }

        if let Some(parent) = parent.filter(|p| is_remote(p)) {
            let joined = reqwest::Url::parse(parent)
                .and_then(|base| base.join(reference))
                .map_err(|e| {
                    ToqinError::Io(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        e.to_string(),
                    ))
                })?;
            return Ok(joined.to_string());
        }

        let path = Path::new(reference);
        if is_relative(reference) || path.is_absolute() {
            return Ok(path_key(&base_dir.join(path)));
        }

        match self
            .source
            .resolve_module(reference, base_dir, &self.options.module_dirs)
            .await
        {
            Ok(found) => Ok(path_key(&found)),
            Err(e) => {
                debug!("{reference} is not a module ({e}), reading it from {}", base_dir.display());
                Ok(path_key(&base_dir.join(path)))
            }
        }
    }

    /// Reads one document without following its references.
    pub async fn read(
        &mut self,
        reference: &str,
        base_dir: &Path,
        parent: Option<&str>,
    ) -> Result<(String, ParsedDocument)> {
        let url = self
            .locate(reference, base_dir, parent)
            .await
            .map_err(|e| ToqinError::resolution(reference, parent, e))?;
        let parsed = self
            .fetch(&url)
            .await
            .map_err(|e| ToqinError::resolution(reference, parent, e))?;
        Ok((url, parsed))
    }

    /// Reads an already located document again. Remote documents come from
    /// the cache.
    pub async fn reload(&mut self, url: &str) -> Result<ParsedDocument> {
        self.fetch(url)
            .await
            .map_err(|e| ToqinError::resolution(url, None, e))
    }

    async fn fetch(&mut self, url: &str) -> Result<ParsedDocument> {
        if is_remote(url) {
            if let Some(cached) = self.remote_cache.get(url) {
                debug!("{url} served from the remote cache");
                return Ok(cached.clone());
            }
            let text = self.source.http_get(url).await?;
            let parsed = parse_document(&text, self.options.compact)?.with_url(url);
            self.remote_cache.insert(url.to_string(), parsed.clone());
            return Ok(parsed);
        }

        let text = self.source.read_file(Path::new(url)).await?;
        Ok(parse_document(&text, self.options.compact)?.with_url(url))
    }

    /// Loads `reference` and everything it extends or includes into `graph`.
    ///
    /// A document already in the graph is returned as is. References are
    /// followed one at a time, extends before includes, in declaration
    /// order. A reference back to a document still being loaded is dropped
    /// with a warning.
    pub fn load<'a>(
        &'a mut self,
        graph: &'a mut SpecGraph,
        reference: &'a str,
        base_dir: &'a Path,
        parent: Option<&'a str>,
    ) -> BoxFuture<'a, Result<SpecId>> {
        async move {
            let url = self
                .locate(reference, base_dir, parent)
                .await
                .map_err(|e| ToqinError::resolution(reference, parent, e))?;

            if let Some(id) = graph.find(&url) {
                return Ok(id);
            }

            let parsed = self
                .fetch(&url)
                .await
                .map_err(|e| ToqinError::resolution(reference, parent, e))?;
            debug!("loaded {url}");

            let id = graph.insert(url, parsed);
            self.loading.push(id);
            let result = self.load_references(graph, id, base_dir).await;
            self.loading.pop();

            if let Err(e) = result {
                graph.remove(id);
                return Err(e);
            }
            Ok(id)
        }
        .boxed()
    }

    /// Loads the references declared by an already inserted document and
    /// replaces its edges.
    pub async fn load_references(
        &mut self,
        graph: &mut SpecGraph,
        id: SpecId,
        fallback_dir: &Path,
    ) -> Result<()> {
        let Some(spec) = graph.get(id) else {
            return Err(ToqinError::UnknownDocument(id.to_string()));
        };
        let url = spec.url.clone();
        let extends = spec.document.extends.clone();
        let includes = spec.document.includes.clone();
        let base_dir = base_dir_of(&url, fallback_dir);

        let mut extended = Vec::new();
        for reference in extends {
            let target = reference.url().to_string();
            if let Some(child) = self.load_edge(graph, &target, &base_dir, &url).await? {
                extended.insert(0, SpecEdge::new(child, reference));
            }
        }

        let mut included = Vec::new();
        for reference in includes {
            let target = reference.url().to_string();
            if let Some(child) = self.load_edge(graph, &target, &base_dir, &url).await? {
                included.push(SpecEdge::new(child, reference));
            }
        }

        if let Some(spec) = graph.get_mut(id) {
            spec.extended = extended;
            spec.included = included;
        }
        Ok(())
    }

    async fn load_edge(
        &mut self,
        graph: &mut SpecGraph,
        reference: &str,
        base_dir: &Path,
        url: &str,
    ) -> Result<Option<SpecId>> {
        let child = self.load(graph, reference, base_dir, Some(url)).await?;
        if self.loading.contains(&child) {
            warn!("{url} references {reference}, which references it back; the reference is ignored");
            return Ok(None);
        }
        Ok(Some(child))
    }

    /// Loads a root document into a fresh graph and builds every map.
    pub async fn load_root(&mut self, reference: &str, base_dir: &Path) -> Result<(SpecGraph, SpecId)> {
        let mut graph = SpecGraph::new();
        let root = self.load(&mut graph, reference, base_dir, None).await?;
        graph.refresh(root);
        Ok((graph, root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/work/app/../tokens/./base.json")),
            PathBuf::from("/work/tokens/base.json")
        );
        assert_eq!(normalize_path(Path::new("../a.json")), PathBuf::from("../a.json"));
    }

    #[test]
    fn test_relative_keys_are_absolute() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolute_path(Path::new("./ds/../a.json")), cwd.join("a.json"));
        assert_eq!(path_key(Path::new("/ds/./a.json")), "/ds/a.json");
    }

    #[tokio::test]
    async fn test_locate() {
        let source = MemorySource::new().with_file("/work/node_modules/kit/base.json", "{}");
        let loader = Loader::new(source);
        let base = Path::new("/work/app");

        let located = loader.locate("../shared/a.json", base, None).await.unwrap();
        assert_eq!(located, "/work/shared/a.json");

        let located = loader.locate("/abs/a.json", base, None).await.unwrap();
        assert_eq!(located, "/abs/a.json");

        let located = loader.locate("kit/base.json", base, None).await.unwrap();
        assert_eq!(located, "/work/node_modules/kit/base.json");

        let located = loader.locate("local.json", base, None).await.unwrap();
        assert_eq!(located, "/work/app/local.json");

        let located = loader
            .locate("./colors.json", base, Some("https://cdn.test/kit/index.json"))
            .await
            .unwrap();
        assert_eq!(located, "https://cdn.test/kit/colors.json");
    }
}
