//! The incremental store.
//!
//! A [`Store`] owns the document graph of one root document, the registered
//! compilers and the set of watched files. A file change reloads only the
//! changed document, reconciles its `extends`/`includes` edges, rebuilds the
//! maps and compiles again:
//!
//! ```text
//! change ─▶ reindex ─▶ refresh maps ─▶ collect garbage ─▶ compile ─▶ write
//! ```
//!
//! Changes are consumed by a single loop, so one reindex and compile pass
//! finishes before the next starts. A failed reindex is logged and leaves
//! the previous graph in place.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};

use dspec::parser::LoadOptions;
use dspec::{SpecEdge, SpecGraph, SpecId, Specification};
use log::{debug, error, info, warn};
use tokio::sync::mpsc;

use crate::compiler::{Compiler, CompilerOptions, Outputs};
use crate::error::{Result, ToqinError};
use crate::loader::{Loader, absolute_path, base_dir_of, is_remote, path_key};
use crate::source::DocumentSource;
use crate::watch::{FileWatcher, NotifyWatcher};

/// Something that happened in a [`Store`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    /// The root document and its graph are loaded.
    IndexReady { url: String },
    /// A changed document was reloaded.
    Reindexed { url: String },
    Watch { path: PathBuf },
    Unwatch { path: PathBuf },
    CompileStart,
    CompileComplete { files: usize },
    FsWrite { path: PathBuf },
}

type Listener = Arc<dyn Fn(&StoreEvent) + Send + Sync>;
type Listeners = Mutex<Vec<(usize, Listener)>>;

/// Removes a listener registered with [`Store::subscribe`].
pub struct Unsubscribe {
    listeners: Weak<Listeners>,
    id: usize,
}

impl Unsubscribe {
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            if let Ok(mut listeners) = listeners.lock() {
                listeners.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

pub struct Store<S> {
    loader: Loader<S>,
    graph: SpecGraph,
    root: Option<SpecId>,
    base_dir: PathBuf,
    compilers: Vec<Box<dyn Compiler>>,
    options: CompilerOptions,
    listeners: Arc<Listeners>,
    next_listener: usize,
    watched: BTreeSet<PathBuf>,
    watcher: Option<Box<dyn FileWatcher>>,
}

impl<S: DocumentSource> Store<S> {
    pub fn new(source: S, options: CompilerOptions) -> Self {
        Self::with_load_options(source, LoadOptions::default(), options)
    }

    pub fn with_load_options(source: S, load_options: LoadOptions, options: CompilerOptions) -> Self {
        Self {
            loader: Loader::with_options(source, load_options),
            graph: SpecGraph::new(),
            root: None,
            base_dir: PathBuf::from("."),
            compilers: Vec::new(),
            options,
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener: 0,
            watched: BTreeSet::new(),
            watcher: None,
        }
    }

    /// Registers an output compiler.
    pub fn use_compiler(&mut self, compiler: impl Compiler + 'static) -> &mut Self {
        self.compilers.push(Box::new(compiler));
        self
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn graph(&self) -> &SpecGraph {
        &self.graph
    }

    pub fn root(&self) -> Option<SpecId> {
        self.root
    }

    /// The root document.
    pub fn specification(&self) -> Option<&Specification> {
        self.root.and_then(|root| self.graph.get(root))
    }

    /// Local files currently watched.
    pub fn watched(&self) -> impl Iterator<Item = &Path> {
        self.watched.iter().map(PathBuf::as_path)
    }

    /// Calls `listener` for every event until the returned handle is used.
    pub fn subscribe(&mut self, listener: impl Fn(&StoreEvent) + Send + Sync + 'static) -> Unsubscribe {
        let id = self.next_listener;
        self.next_listener += 1;

        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((id, Arc::new(listener)));
        }

        Unsubscribe {
            listeners: Arc::downgrade(&self.listeners),
            id,
        }
    }

    /// Listeners run without the lock held, so they may unsubscribe.
    fn emit(&self, event: StoreEvent) {
        let listeners: Vec<Listener> = match self.listeners.lock() {
            Ok(listeners) => listeners.iter().map(|(_, l)| l.clone()).collect(),
            Err(_) => return,
        };
        for listener in listeners {
            listener(&event);
        }
    }

    /// Loads the root document and everything it references, replacing any
    /// previously loaded graph.
    pub async fn load(&mut self, reference: &str, base_dir: &Path) -> Result<SpecId> {
        let mut graph = SpecGraph::new();
        let root = self.loader.load(&mut graph, reference, base_dir, None).await?;
        graph.refresh(root);

        self.graph = graph;
        self.root = Some(root);
        self.base_dir = absolute_path(base_dir);
        self.sync_watches();

        let url = self
            .graph
            .get(root)
            .map(|spec| spec.url.clone())
            .unwrap_or_default();
        info!("{} documents indexed from {}", self.graph.len(), url);
        self.emit(StoreEvent::IndexReady { url });
        Ok(root)
    }

    /// Runs every compiler and writes the results when an output directory
    /// is configured.
    pub async fn compile(&self) -> Result<Outputs> {
        let root = self
            .root
            .ok_or_else(|| ToqinError::UnknownDocument("root".to_string()))?;

        self.emit(StoreEvent::CompileStart);
        let mut outputs = Outputs::default();
        for compiler in &self.compilers {
            debug!("running the {} compiler", compiler.name());
            outputs.extend(compiler.compile(&self.graph, root, &self.options)?);
        }
        self.emit(StoreEvent::CompileComplete {
            files: outputs.len(),
        });

        if let Some(out_dir) = &self.options.out_dir {
            for path in outputs.write(out_dir).await? {
                self.emit(StoreEvent::FsWrite { path });
            }
        }

        Ok(outputs)
    }

    /// Loads and compiles. With [`CompilerOptions::watch`] set, keeps
    /// reindexing and compiling on every change of a loaded file.
    pub async fn run(&mut self, reference: &str, base_dir: &Path) -> Result<Outputs> {
        self.load(reference, base_dir).await?;
        let outputs = self.compile().await?;

        if self.options.watch {
            let (sender, changes) = mpsc::unbounded_channel();
            let watcher = NotifyWatcher::new(sender)?;
            self.watch_with(Box::new(watcher), changes).await;
        }

        Ok(outputs)
    }

    /// Installs `watcher` and handles the paths received on `changes` until
    /// the channel closes.
    pub async fn watch_with(
        &mut self,
        watcher: Box<dyn FileWatcher>,
        mut changes: mpsc::UnboundedReceiver<PathBuf>,
    ) {
        self.watcher = Some(watcher);
        self.watched.clear();
        self.sync_watches();

        while let Some(path) = changes.recv().await {
            match self.reindex(&path).await {
                Ok(true) => {
                    if let Err(e) = self.compile().await {
                        error!("Compiling after a change of {} failed: {}", path.display(), e);
                    }
                }
                Ok(false) => {}
                Err(e) => error!("Reindexing {} failed: {}", path.display(), e),
            }
        }
    }

    /// Reloads one changed document and reconciles its references.
    ///
    /// Returns `false` when the file is not part of the graph. On error the
    /// graph is left as it was.
    pub async fn reindex(&mut self, path: &Path) -> Result<bool> {
        let root = self
            .root
            .ok_or_else(|| ToqinError::UnknownDocument(path.display().to_string()))?;
        let url = path_key(path);
        let Some(id) = self.graph.find(&url) else {
            debug!("{url} is not part of the graph");
            return Ok(false);
        };

        let parsed = self.loader.reload(&url).await?;
        let mut graph = self.graph.clone();
        let Some(spec) = graph.get_mut(id) else {
            return Err(ToqinError::UnknownDocument(url));
        };
        spec.update(parsed);

        let extends = spec.document.extends.clone();
        let includes = spec.document.includes.clone();
        let previous: Vec<SpecEdge> = spec.edges().cloned().collect();
        let base_dir = base_dir_of(&url, &self.base_dir);

        let mut extended = Vec::new();
        for reference in extends {
            if let Some(child) = self.reference(&mut graph, id, reference.url(), &base_dir, &url).await? {
                extended.insert(0, SpecEdge::new(child, reference));
            }
        }

        let mut included = Vec::new();
        for reference in includes {
            if let Some(child) = self.reference(&mut graph, id, reference.url(), &base_dir, &url).await? {
                included.push(SpecEdge::new(child, reference));
            }
        }

        for edge in extended.iter().chain(included.iter()) {
            match previous.iter().find(|old| old.id == edge.id) {
                None => debug!("{url} now references {}", edge.reference.url()),
                Some(old) if old.filter != edge.filter => {
                    debug!("{url} changed its filters on {}", edge.reference.url())
                }
                Some(_) => {}
            }
        }
        for old in &previous {
            if !extended.iter().chain(included.iter()).any(|edge| edge.id == old.id) {
                debug!("{url} no longer references {}", old.reference.url());
            }
        }

        if let Some(spec) = graph.get_mut(id) {
            spec.extended = extended;
            spec.included = included;
        }

        graph.refresh(root);
        for removed in graph.collect_garbage(root) {
            debug!("{} dropped from the graph", removed.url);
        }

        self.graph = graph;
        self.sync_watches();
        self.emit(StoreEvent::Reindexed { url });
        Ok(true)
    }

    /// Loads one reference of a reindexed document, dropping it when it
    /// leads back to that document.
    async fn reference(
        &mut self,
        graph: &mut SpecGraph,
        id: SpecId,
        reference: &str,
        base_dir: &Path,
        url: &str,
    ) -> Result<Option<SpecId>> {
        let child = self.loader.load(graph, reference, base_dir, Some(url)).await?;
        if graph.reachable(child).contains(&id) {
            warn!("{url} references {reference}, which references it back; the reference is ignored");
            return Ok(None);
        }
        Ok(Some(child))
    }

    /// Watches every local document of the graph and nothing else.
    fn sync_watches(&mut self) {
        let Some(watcher) = self.watcher.as_mut() else {
            return;
        };

        let wanted: BTreeSet<PathBuf> = self
            .graph
            .iter()
            .filter(|spec| !is_remote(&spec.url))
            .map(|spec| PathBuf::from(&spec.url))
            .collect();

        let mut events = Vec::new();

        for path in self.watched.difference(&wanted) {
            match watcher.unwatch(path) {
                Ok(()) => events.push(StoreEvent::Unwatch { path: path.clone() }),
                Err(e) => warn!("Can not unwatch {}: {}", path.display(), e),
            }
        }

        let mut watched = BTreeSet::new();
        for path in wanted {
            if self.watched.contains(&path) {
                watched.insert(path);
                continue;
            }
            match watcher.watch(&path) {
                Ok(()) => {
                    events.push(StoreEvent::Watch { path: path.clone() });
                    watched.insert(path);
                }
                Err(e) => warn!("Can not watch {}: {}", path.display(), e),
            }
        }

        self.watched = watched;
        for event in events {
            self.emit(event);
        }
    }
}
