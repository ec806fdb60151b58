//! The resolved document graph.
//!
//! Documents are nodes of an arena addressed by [`SpecId`] and looked up by
//! their resolved path or URL. `extends`/`includes` are edges holding the
//! child's id and the [`EdgeFilter`] declared on the reference, so a document
//! shared by several referrers is stored once and never mutated by one of
//! them.
//!
//! Extended edges are kept in compile order: the entry declared last comes
//! first, so the entry declared first is merged last and wins collisions.

use std::collections::{HashMap, HashSet};
use std::fmt;

use log::debug;
use serde_json::Value;

use crate::maps::{
    DocumentMaps, build_animation_map, build_design_map, build_token_map, merge_animation_maps,
    merge_design_maps, merge_token_maps,
};
use crate::parser::ParsedDocument;
use crate::types::{
    AnimationMap, DesignMap, DesignSpec, EdgeFilter, ExternalRef, LocationMap, Section, TokenMap,
};

/// Index of a document in a [`SpecGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecId(usize);

impl fmt::Display for SpecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An `extends` or `includes` edge.
#[derive(Clone, Debug, PartialEq)]
pub struct SpecEdge {
    pub id: SpecId,
    /// The entry as declared in the referring document.
    pub reference: ExternalRef,
    pub filter: EdgeFilter,
}

impl SpecEdge {
    pub fn new(id: SpecId, reference: ExternalRef) -> Self {
        let filter = reference.filter();
        Self {
            id,
            reference,
            filter,
        }
    }
}

/// One loaded document and its flattened maps.
#[derive(Clone, Debug)]
pub struct Specification {
    pub id: SpecId,
    /// Resolved path or URL.
    pub url: String,
    pub document: DesignSpec,
    /// Override-eligible fields after inheritance from extends and includes.
    pub overrides: DesignSpec,
    pub raw: Value,
    pub locations: LocationMap,
    pub extended: Vec<SpecEdge>,
    pub included: Vec<SpecEdge>,
    pub token_map: TokenMap,
    pub design_map: DesignMap,
    pub animation_map: AnimationMap,
}

impl Specification {
    pub fn name(&self) -> &str {
        &self.document.name
    }

    /// Extended edges, then included ones.
    pub fn edges(&self) -> impl Iterator<Item = &SpecEdge> {
        self.extended.iter().chain(self.included.iter())
    }

    /// Replaces the document content, keeping identity and edges.
    pub fn update(&mut self, parsed: ParsedDocument) {
        self.document = parsed.spec;
        self.raw = parsed.raw;
        self.locations = parsed.locations;
    }
}

/// A document reached by [`SpecGraph::walk`] and the filters on its path.
#[derive(Clone, Debug, PartialEq)]
pub struct Visit {
    pub id: SpecId,
    pub filters: Vec<EdgeFilter>,
}

impl Visit {
    pub fn allows(&self, section: Section, key: &str) -> bool {
        crate::maps::allowed(&self.filters, section, key)
    }
}

/// Arena of loaded documents.
#[derive(Clone, Debug, Default)]
pub struct SpecGraph {
    nodes: Vec<Option<Specification>>,
    by_url: HashMap<String, SpecId>,
}

impl SpecGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document without edges. Maps are built by [`SpecGraph::refresh`].
    pub fn insert(&mut self, url: impl Into<String>, parsed: ParsedDocument) -> SpecId {
        let url = url.into();
        let id = SpecId(self.nodes.len());
        let overrides = parsed.spec.overrides();

        self.nodes.push(Some(Specification {
            id,
            url: url.clone(),
            document: parsed.spec,
            overrides,
            raw: parsed.raw,
            locations: parsed.locations,
            extended: Vec::new(),
            included: Vec::new(),
            token_map: TokenMap::new(),
            design_map: DesignMap::new(),
            animation_map: AnimationMap::new(),
        }));
        self.by_url.insert(url, id);
        id
    }

    pub fn find(&self, url: &str) -> Option<SpecId> {
        self.by_url.get(url).copied()
    }

    pub fn get(&self, id: SpecId) -> Option<&Specification> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: SpecId) -> Option<&mut Specification> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: SpecId) -> bool {
        self.get(id).is_some()
    }

    pub fn remove(&mut self, id: SpecId) -> Option<Specification> {
        let spec = self.nodes.get_mut(id.0)?.take()?;
        self.by_url.remove(&spec.url);
        Some(spec)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Specification> {
        self.nodes.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }

    /// Every document reachable from `root`, `root` included.
    pub fn reachable(&self, root: SpecId) -> HashSet<SpecId> {
        let mut seen = HashSet::new();
        let mut pending = vec![root];

        while let Some(id) = pending.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(spec) = self.get(id) {
                pending.extend(spec.edges().map(|edge| edge.id));
            }
        }

        seen.retain(|id| self.contains(*id));
        seen
    }

    /// Reachable documents, every one after all documents it references.
    pub fn post_order(&self, root: SpecId) -> Vec<SpecId> {
        fn visit(graph: &SpecGraph, id: SpecId, seen: &mut HashSet<SpecId>, out: &mut Vec<SpecId>) {
            if !seen.insert(id) {
                return;
            }
            let Some(spec) = graph.get(id) else {
                return;
            };
            for edge in spec.edges() {
                visit(graph, edge.id, seen, out);
            }
            out.push(id);
        }

        let mut out = Vec::new();
        visit(self, root, &mut HashSet::new(), &mut out);
        out
    }

    /// Drops every document no longer reachable from `root`.
    pub fn collect_garbage(&mut self, root: SpecId) -> Vec<Specification> {
        let live = self.reachable(root);
        let dead: Vec<SpecId> = self
            .iter()
            .map(|spec| spec.id)
            .filter(|id| !live.contains(id))
            .collect();

        dead.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Documents in compile order: extended documents, the document itself,
    /// then included documents, recursively. Each document appears once, at
    /// its first position.
    pub fn walk(&self, root: SpecId) -> Vec<Visit> {
        fn visit(
            graph: &SpecGraph,
            id: SpecId,
            filters: Vec<EdgeFilter>,
            seen: &mut HashSet<SpecId>,
            out: &mut Vec<Visit>,
        ) {
            if !seen.insert(id) {
                return;
            }
            let Some(spec) = graph.get(id) else {
                return;
            };

            let along = |edge: &SpecEdge| {
                let mut filters = filters.clone();
                if !edge.filter.is_empty() {
                    filters.push(edge.filter.clone());
                }
                filters
            };

            for edge in &spec.extended {
                visit(graph, edge.id, along(edge), seen, out);
            }
            out.push(Visit {
                id,
                filters: filters.clone(),
            });
            for edge in &spec.included {
                visit(graph, edge.id, along(edge), seen, out);
            }
        }

        let mut out = Vec::new();
        visit(self, root, Vec::new(), &mut HashSet::new(), &mut out);
        out
    }

    /// Tokens visible from `root`: extended, own, then included; later wins.
    pub fn merged_token_map(&self, root: SpecId) -> TokenMap {
        let mut tokens = TokenMap::new();
        for visit in self.walk(root) {
            if let Some(spec) = self.get(visit.id) {
                merge_token_maps(&mut tokens, &spec.token_map, &visit.filters);
            }
        }
        tokens
    }

    /// All three maps merged in compile order.
    pub fn merged_maps(&self, root: SpecId) -> DocumentMaps {
        let mut maps = DocumentMaps::default();
        for visit in self.walk(root) {
            if let Some(spec) = self.get(visit.id) {
                merge_token_maps(&mut maps.tokens, &spec.token_map, &visit.filters);
                merge_design_maps(&mut maps.designs, &spec.design_map, &visit.filters);
                merge_animation_maps(&mut maps.animations, &spec.animation_map, &visit.filters);
            }
        }
        maps
    }

    /// Recomputes inherited overrides and flattened maps of every document
    /// reachable from `root`, leaves first.
    pub fn refresh(&mut self, root: SpecId) {
        for id in self.post_order(root) {
            let Some(spec) = self.get(id) else {
                continue;
            };

            // Declaration order: extended edges are stored reversed.
            let sources: Vec<(String, DesignSpec)> = spec
                .extended
                .iter()
                .rev()
                .chain(spec.included.iter())
                .filter_map(|edge| self.get(edge.id))
                .map(|child| (child.url.clone(), child.overrides.clone()))
                .collect();

            let mut overrides = spec.document.overrides();
            for (url, source) in &sources {
                let taken = overrides.inherit_overrides(source);
                if !taken.is_empty() {
                    debug!("{} inherits {:?} from {}", spec.url, taken, url);
                }
            }

            let token_map = build_token_map(&spec.document.tokens, &spec.locations);
            let animation_map =
                build_animation_map(&spec.document.animations, &spec.locations, Some(&spec.url));

            if let Some(spec) = self.get_mut(id) {
                spec.overrides = overrides;
                spec.token_map = token_map;
                spec.animation_map = animation_map;
            }

            let lookup = self.merged_token_map(id);
            if let Some(spec) = self.get(id) {
                let design_map = build_design_map(
                    &spec.document,
                    &spec.locations,
                    spec.overrides.root_scope.as_deref(),
                    &lookup,
                );
                if let Some(spec) = self.get_mut(id) {
                    spec.design_map = design_map;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    fn add(graph: &mut SpecGraph, url: &str, json: &str) -> SpecId {
        graph.insert(url, parse_document(json, true).unwrap().with_url(url))
    }

    fn extend(graph: &mut SpecGraph, from: SpecId, to: SpecId) {
        let url = graph.get(to).unwrap().url.clone();
        let edge = SpecEdge::new(to, ExternalRef::Url(url));
        graph.get_mut(from).unwrap().extended.insert(0, edge);
    }

    fn include(graph: &mut SpecGraph, from: SpecId, to: SpecId, reference: ExternalRef) {
        graph
            .get_mut(from)
            .unwrap()
            .included
            .push(SpecEdge::new(to, reference));
    }

    // ==================== OVERRIDE TESTS ====================

    #[test]
    fn test_override_from_extends_before_includes() {
        let mut graph = SpecGraph::new();
        let root = add(&mut graph, "/root.json", r#"{"name": "root"}"#);
        let a = add(&mut graph, "/a.json", r#"{"name": "a", "rootScope": ".a", "variablePrefix": "a"}"#);
        let b = add(&mut graph, "/b.json", r#"{"name": "b", "rootScope": ".b", "customQueryMode": "id"}"#);
        include(&mut graph, root, b, ExternalRef::Url("/b.json".into()));
        extend(&mut graph, root, a);

        graph.refresh(root);
        let spec = graph.get(root).unwrap();

        assert_eq!(spec.overrides.root_scope.as_deref(), Some(".a"));
        assert_eq!(spec.overrides.variable_prefix.as_deref(), Some("a"));
        assert_eq!(spec.overrides.custom_query_mode, Some(crate::types::QueryMode::Id));
        // The document itself is untouched.
        assert_eq!(spec.document.root_scope, None);
    }

    #[test]
    fn test_first_declared_extend_wins() {
        let mut graph = SpecGraph::new();
        let root = add(&mut graph, "/root.json", r#"{"name": "root"}"#);
        let a = add(&mut graph, "/a.json", r#"{"name": "a", "rootScope": ".a", "tokens": [{"name": "x", "value": "a"}]}"#);
        let b = add(&mut graph, "/b.json", r#"{"name": "b", "rootScope": ".b", "tokens": [{"name": "x", "value": "b"}]}"#);
        // extends: [a, b]
        extend(&mut graph, root, a);
        extend(&mut graph, root, b);

        graph.refresh(root);

        assert_eq!(graph.get(root).unwrap().overrides.root_scope.as_deref(), Some(".a"));
        assert_eq!(graph.merged_token_map(root)["x"].value, "a");
    }

    // ==================== MERGE TESTS ====================

    #[test]
    fn test_merge_order() {
        let mut graph = SpecGraph::new();
        let root = add(
            &mut graph,
            "/root.json",
            r#"{"name": "root", "tokens": [{"name": "x", "value": "own"}, {"name": "y", "value": "own"}]}"#,
        );
        let parent = add(&mut graph, "/p.json", r#"{"name": "p", "tokens": [{"name": "x", "value": "parent"}, {"name": "z", "value": "parent"}]}"#);
        let child = add(&mut graph, "/c.json", r#"{"name": "c", "tokens": [{"name": "y", "value": "child"}]}"#);
        extend(&mut graph, root, parent);
        include(&mut graph, root, child, ExternalRef::Url("/c.json".into()));

        graph.refresh(root);
        let tokens = graph.merged_token_map(root);

        assert_eq!(tokens["x"].value, "own");
        assert_eq!(tokens["y"].value, "child");
        assert_eq!(tokens["z"].value, "parent");
        assert_eq!(tokens["z"].url.as_deref(), Some("/p.json"));

        let order: Vec<SpecId> = graph.walk(root).into_iter().map(|v| v.id).collect();
        assert_eq!(order, vec![parent, root, child]);
    }

    #[test]
    fn test_edge_filter_applies_to_branch() {
        let mut graph = SpecGraph::new();
        let root = add(&mut graph, "/root.json", r#"{"name": "root"}"#);
        let lib = add(
            &mut graph,
            "/lib.json",
            r#"{"name": "lib",
                "tokens": [{"name": "color", "value": "red"}, {"name": "size", "value": "1px"}],
                "designs": [{"name": "btn", "rules": {"color": "@color"}}]}"#,
        );
        let reference: ExternalRef = serde_json::from_str(
            r#"{"url": "/lib.json", "excludes": ["/tokens/color", "designs/btn"]}"#,
        )
        .unwrap();
        include(&mut graph, root, lib, reference);

        graph.refresh(root);
        let maps = graph.merged_maps(root);

        assert!(!maps.tokens.contains_key("color"));
        assert!(maps.tokens.contains_key("size"));
        assert!(maps.designs.is_empty());
        // The shared document keeps its own maps.
        assert!(graph.get(lib).unwrap().token_map.contains_key("color"));
    }

    #[test]
    fn test_designs_scoped_by_inherited_root_scope() {
        let mut graph = SpecGraph::new();
        let root = add(&mut graph, "/root.json", r#"{"name": "root", "designs": [{"name": "btn", "rules": {"color": "red"}}]}"#);
        let base = add(&mut graph, "/base.json", r#"{"name": "base", "rootScope": ".theme"}"#);
        extend(&mut graph, root, base);

        graph.refresh(root);

        assert!(graph.get(root).unwrap().design_map.contains_key(".theme .btn"));
    }

    // ==================== LIFECYCLE TESTS ====================

    #[test]
    fn test_collect_garbage() {
        let mut graph = SpecGraph::new();
        let root = add(&mut graph, "/root.json", r#"{"name": "root"}"#);
        let kept = add(&mut graph, "/kept.json", r#"{"name": "kept"}"#);
        let orphan = add(&mut graph, "/orphan.json", r#"{"name": "orphan"}"#);
        extend(&mut graph, root, kept);

        let removed = graph.collect_garbage(root);

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, orphan);
        assert_eq!(graph.find("/orphan.json"), None);
        assert_eq!(graph.find("/kept.json"), Some(kept));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_post_order_puts_references_first() {
        let mut graph = SpecGraph::new();
        let root = add(&mut graph, "/root.json", r#"{"name": "root"}"#);
        let mid = add(&mut graph, "/mid.json", r#"{"name": "mid"}"#);
        let leaf = add(&mut graph, "/leaf.json", r#"{"name": "leaf"}"#);
        extend(&mut graph, root, mid);
        extend(&mut graph, mid, leaf);
        include(&mut graph, root, leaf, ExternalRef::Url("/leaf.json".into()));

        assert_eq!(graph.post_order(root), vec![leaf, mid, root]);
    }
}
