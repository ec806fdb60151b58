//! CSS stylesheet compiler.
//!
//! One pass over the graph, in this order:
//!
//! 1. `@import` statements of every document
//! 2. the `@layer` declaration line, when any layer is used
//! 3. `color-scheme` rules for custom light/dark queries
//! 4. `@font-face` blocks
//! 5. per document, extended documents first and included ones last: the
//!    custom property block and its query overrides, `@keyframes`, then rule
//!    blocks grouped by cascade layer
//!
//! ```text
//! :root {
//!   --color: #336699;
//! }
//!
//! @media (prefers-color-scheme: dark) {
//!   :root {
//!     --color: #112233;
//!   }
//! }
//! ```

use std::borrow::Cow;

use dspec::maps::build_design_map;
use dspec::parser::media::{MediaQueryTable, QueryTarget};
use dspec::parser::selectors::pseudo_variants;
use dspec::types::{
    DesignMap, DesignRef, FontFace, MediaQuery, QueryMode, RuleValue, Section, SourceLocation,
    TagType, TokenType,
};
use dspec::{Resolver, SpecGraph, SpecId, Specification, Visit};
use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::compiler::source_map::{Mapping, SourceMap, SourceMapMode};
use crate::compiler::{Compiler, CompilerOptions, DesignOutput};
use crate::error::{Result, ToqinError};

const ROOT_SCOPE: &str = ":root";
const OVERRIDES_LAYER: &str = "overrides";

static QUERY_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+)\.(@[\w\-@]+)$").expect("valid query suffix pattern"));
static PSEUDO_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+)\.(:[\w\-:]+)$").expect("valid pseudo suffix pattern"));

/// CSS output settings. Unset fields fall back to the root document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CssOptions {
    /// Custom property prefix (`variablePrefix`).
    pub prefix: Option<String>,
    /// Selector every rule is nested under (`rootScope`).
    pub scope: Option<String>,
    /// Aliases added on top of the built-in and document aliases.
    pub media_queries: IndexMap<String, MediaQuery>,
    pub custom_query_mode: Option<QueryMode>,
    /// `light`, `dark` or `system`.
    pub default_color_scheme: Option<String>,
    /// Selector kinds dropped from non-important designs.
    pub strict_tags: Vec<TagType>,
    pub include_tokens: Vec<String>,
    pub exclude_tokens: Vec<String>,
    /// Output file stem, defaults to the root document name.
    pub index_name: Option<String>,
    pub source_map: SourceMapMode,
}

/// Compiled stylesheet lines and their source mappings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stylesheet {
    pub lines: Vec<String>,
    pub mappings: Vec<Mapping>,
}

impl Stylesheet {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Origin {
    location: SourceLocation,
    url: String,
    name: String,
}

impl Origin {
    fn of(location: Option<SourceLocation>, url: Option<&str>, name: &str) -> Option<Self> {
        Some(Self {
            location: location?,
            url: url?.to_string(),
            name: name.to_string(),
        })
    }
}

#[derive(Clone, Debug)]
struct Line {
    text: String,
    origin: Option<Origin>,
}

#[derive(Clone, Debug, Default)]
struct Lines(Vec<Line>);

impl Lines {
    fn put(&mut self, text: impl Into<String>) {
        self.put_mapped(text, None);
    }

    fn put_mapped(&mut self, text: impl Into<String>, origin: Option<Origin>) {
        self.0.push(Line {
            text: text.into(),
            origin,
        });
    }

    fn append(&mut self, other: Lines) {
        self.0.extend(other.0);
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Nested blocks, a blank line after every top-level block and between
    /// nested siblings.
    fn put_declarations(&mut self, declarations: &Declarations, indent: &str) {
        for (property, value) in &declarations.values {
            self.put(format!("{indent}{property}: {value};"));
        }

        let count = declarations.blocks.len();
        for (i, (key, block)) in declarations.blocks.iter().enumerate() {
            self.put(format!("{indent}{key} {{"));
            self.put_declarations(block, &format!("{indent}  "));
            self.put(format!("{indent}}}"));

            if i + 1 < count || indent.is_empty() {
                self.put("");
            }
        }
    }

    fn trim_end(&mut self) {
        while self.0.last().is_some_and(|line| line.text.is_empty()) {
            self.0.pop();
        }
    }

    fn indented(self, indent: &str) -> Lines {
        Lines(
            self.0
                .into_iter()
                .map(|line| Line {
                    text: if line.text.is_empty() {
                        line.text
                    } else {
                        format!("{indent}{}", line.text)
                    },
                    origin: line.origin,
                })
                .collect(),
        )
    }

    fn into_stylesheet(self) -> Stylesheet {
        let mut mappings = Vec::new();
        let mut lines = Vec::with_capacity(self.0.len());

        for (i, line) in self.0.into_iter().enumerate() {
            if let Some(origin) = line.origin {
                let column = line.text.len() - line.text.trim_start().len();
                mappings.push(Mapping {
                    output: (i + 1, column),
                    input: (origin.location.line, origin.location.column),
                    source: origin.url,
                    name: Some(origin.name),
                });
            }
            lines.push(line.text);
        }

        Stylesheet { lines, mappings }
    }
}

/// Query scoped declarations: `@media …` → selector → property.
#[derive(Clone, Debug, Default, PartialEq)]
struct Declarations {
    values: IndexMap<String, String>,
    blocks: IndexMap<String, Declarations>,
}

impl Declarations {
    fn block(&mut self, key: &str) -> &mut Declarations {
        self.blocks.entry(key.to_string()).or_default()
    }

    fn set(&mut self, property: &str, value: String) {
        self.values.insert(property.to_string(), value);
    }

    fn is_empty(&self) -> bool {
        self.values.is_empty() && self.blocks.is_empty()
    }

    /// Files a query-scoped declaration under its target.
    fn place(&mut self, target: QueryTarget, scope: &str, property: &str, value: String) {
        let block = match (target.media, target.selector) {
            (Some(media), Some(selector)) => self.block(&media).block(&selector),
            (Some(media), None) => self.block(&media).block(scope),
            (None, Some(selector)) => self.block(&selector),
            (None, None) => self.block(scope),
        };
        block.set(property, value);
    }
}

#[derive(Debug, Default)]
struct Bucket {
    lines: Lines,
    queries: Declarations,
}

impl Bucket {
    fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.queries.is_empty()
    }

    fn flush(self) -> Lines {
        let mut lines = self.lines;
        lines.put_declarations(&self.queries, "");
        lines
    }
}

/// Output of one document: tokens and keyframes, then rule buckets by layer.
#[derive(Debug, Default)]
struct DocumentBlock {
    head: Lines,
    buckets: IndexMap<Option<String>, Bucket>,
}

impl DocumentBlock {
    fn finish(mut self) -> Lines {
        let mut out = self.head;

        if let Some(bucket) = self.buckets.shift_remove(&None) {
            out.append(bucket.flush());
        }

        for (layer, bucket) in self.buckets {
            let Some(layer) = layer else {
                continue;
            };
            if bucket.is_empty() {
                continue;
            }

            let mut inner = bucket.flush();
            inner.trim_end();
            out.put(format!("@layer {layer} {{"));
            out.append(inner.indented("  "));
            out.put("}");
            out.put("");
        }

        out
    }
}

/// Options merged with the root document's settings.
struct Settings {
    prefix: Option<String>,
    scope: Option<String>,
    mode: QueryMode,
    queries: MediaQueryTable,
    color_scheme: Option<String>,
    strict_tags: Vec<TagType>,
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl Settings {
    fn new(options: &CssOptions, root: &Specification) -> Self {
        let spec = &root.overrides;

        let mut queries = MediaQueryTable::new();
        if let Some(own) = &spec.media_queries {
            queries.extend(own);
        }
        queries.extend(&options.media_queries);

        let patterns = |option: &[String], fallback: &Option<Vec<String>>| -> Vec<Regex> {
            let list = if option.is_empty() {
                fallback.as_deref().unwrap_or_default()
            } else {
                option
            };
            list.iter().filter_map(|p| token_pattern(p)).collect()
        };

        Self {
            prefix: options.prefix.clone().or_else(|| spec.variable_prefix.clone()),
            scope: options.scope.clone().or_else(|| spec.root_scope.clone()),
            mode: options
                .custom_query_mode
                .or(spec.custom_query_mode)
                .unwrap_or_default(),
            queries,
            color_scheme: options
                .default_color_scheme
                .clone()
                .or_else(|| spec.default_color_scheme.clone()),
            strict_tags: options.strict_tags.clone(),
            include: patterns(&options.include_tokens, &spec.include_tokens),
            exclude: patterns(&options.exclude_tokens, &spec.exclude_tokens),
        }
    }

    fn scope(&self) -> &str {
        self.scope.as_deref().unwrap_or(ROOT_SCOPE)
    }

    /// Excluded by a pattern and not rescued by an include.
    fn ignores(&self, path: &str) -> bool {
        self.exclude.iter().any(|r| r.is_match(path)) && !self.include.iter().any(|r| r.is_match(path))
    }

    fn selectors(&self, design: &DesignRef) -> Vec<String> {
        if self.strict_tags.is_empty() || design.important {
            return design.selectors.clone();
        }

        design
            .selectors
            .iter()
            .filter(|selector| {
                let selector = selector.as_str();
                let bare = match (&self.scope, design.root) {
                    (Some(scope), false) => selector
                        .strip_prefix(scope.as_str())
                        .map(str::trim_start)
                        .unwrap_or(selector),
                    _ => selector,
                };
                !self.strict_tags.contains(&TagType::of(bare))
            })
            .cloned()
            .collect()
    }
}

/// Include/exclude patterns are regular expressions; a pattern with `*`
/// wildcards and no `.*` is a glob over the whole path.
fn token_pattern(pattern: &str) -> Option<Regex> {
    let source = if pattern.contains('*') && !pattern.contains(".*") {
        format!("^{}$", regex::escape(pattern).replace(r"\*", ".*"))
    } else {
        pattern.to_string()
    };

    match Regex::new(&source) {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!("The token filter \"{}\" is not a valid pattern: {}", pattern, e);
            None
        }
    }
}

/// `--name` becomes `--this-name` so `~name` references find it.
fn local_property(name: &str) -> Cow<'_, str> {
    match name.strip_prefix("--") {
        Some(rest) if !name.starts_with("--this") => Cow::Owned(format!("--this-{rest}")),
        _ => Cow::Borrowed(name),
    }
}

fn is_default_key(key: &str) -> bool {
    key == "@" || key == "."
}

fn write_font_face(lines: &mut Lines, face: &FontFace) {
    let family = if face.font_family.starts_with(['"', '\'']) {
        face.font_family.clone()
    } else {
        format!("\"{}\"", face.font_family)
    };

    lines.put("@font-face {");
    lines.put(format!("  font-family: {family};"));

    let sources = face.sources();
    if !sources.is_empty() {
        lines.put(format!("  src: {};", sources.join(", ")));
    }
    for (property, value) in face.descriptors() {
        lines.put(format!("  {property}: {value};"));
    }

    lines.put("}");
    lines.put("");
}

/// The built-in CSS compiler.
#[derive(Clone, Debug, Default)]
pub struct CssCompiler {
    options: CssOptions,
}

impl CssCompiler {
    pub fn new(options: CssOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CssOptions {
        &self.options
    }

    /// `index.css`, or the configured index name, or the root name.
    pub fn file_name(&self, graph: &SpecGraph, root: SpecId) -> String {
        let stem = self.options.index_name.clone().or_else(|| {
            graph
                .get(root)
                .map(|spec| spec.name().to_lowercase())
                .filter(|name| !name.is_empty())
        });
        format!("{}.css", stem.as_deref().unwrap_or("index"))
    }

    /// Compiles the graph rooted at `root` into stylesheet lines.
    pub fn stylesheet(&self, graph: &SpecGraph, root: SpecId) -> Result<Stylesheet> {
        let spec = graph
            .get(root)
            .ok_or_else(|| ToqinError::UnknownDocument(root.to_string()))?;
        let settings = Settings::new(&self.options, spec);
        let tokens = graph.merged_token_map(root);
        let resolver = Resolver::new(&tokens, settings.prefix.as_deref());

        let mut imports: IndexSet<String> = IndexSet::new();
        let mut layers: IndexSet<String> = IndexSet::new();
        let mut fonts = Lines::default();
        let mut documents = Lines::default();

        for visit in graph.walk(root) {
            let Some(doc) = graph.get(visit.id) else {
                continue;
            };

            imports.extend(doc.document.imports.iter().flatten().cloned());
            layers.extend(doc.document.layers.iter().flatten().cloned());
            for face in &doc.document.font_faces {
                write_font_face(&mut fonts, face);
            }

            let designs = self.design_map(graph, doc, &settings);
            layers.extend(designs.values().filter_map(|d| d.layer.clone()));

            let mut block = DocumentBlock::default();
            write_tokens(&mut block.head, doc, &visit, &settings, &resolver)?;
            write_animations(&mut block.head, doc, &visit, &settings, &resolver)?;
            write_designs(&mut block, &designs, &visit, &settings, &resolver)?;
            documents.append(block.finish());
        }

        let mut sheet = Lines::default();

        for import in &imports {
            sheet.put(format!("@import url(\"{import}\");"));
        }
        if !imports.is_empty() {
            sheet.put("");
        }

        if !layers.is_empty() {
            layers.insert(OVERRIDES_LAYER.to_string());
            let names: Vec<&str> = layers.iter().map(String::as_str).collect();
            sheet.put(format!("@layer {};", names.join(", ")));
            sheet.put("");
        }

        for (selector, scheme) in settings.queries.color_schemes(settings.mode) {
            sheet.put(format!("{selector} {{"));
            sheet.put(format!("  color-scheme: only {scheme};"));
            sheet.put("}");
            sheet.put("");
        }

        match settings.color_scheme.as_deref() {
            Some(scheme @ ("light" | "dark")) => {
                sheet.put(format!("{} {{", settings.scope()));
                sheet.put(format!("  color-scheme: {scheme};"));
                sheet.put("}");
                sheet.put("");
            }
            Some("system") | None => {}
            Some(other) => debug!("color scheme \"{other}\" has no stylesheet counterpart"),
        }

        sheet.append(fonts);
        sheet.append(documents);
        Ok(sheet.into_stylesheet())
    }

    /// The document's design map, rebuilt when the compile scope differs from
    /// the scope it was built with.
    fn design_map<'g>(
        &self,
        graph: &'g SpecGraph,
        doc: &'g Specification,
        settings: &Settings,
    ) -> Cow<'g, DesignMap> {
        if doc.overrides.root_scope == settings.scope {
            return Cow::Borrowed(&doc.design_map);
        }

        debug!("rebuilding designs of {} for scope {:?}", doc.url, settings.scope);
        let lookup = graph.merged_token_map(doc.id);
        Cow::Owned(build_design_map(
            &doc.document,
            &doc.locations,
            settings.scope.as_deref(),
            &lookup,
        ))
    }
}

impl Compiler for CssCompiler {
    fn name(&self) -> &str {
        "css"
    }

    fn compile(
        &self,
        graph: &SpecGraph,
        root: SpecId,
        _options: &CompilerOptions,
    ) -> Result<Vec<DesignOutput>> {
        let sheet = self.stylesheet(graph, root)?;
        let file_name = self.file_name(graph, root);
        let map = SourceMap::new(&file_name, &sheet.mappings);

        let mut content = sheet.text();
        if let Some(comment) = map.comment(self.options.source_map)? {
            content.push_str(&comment);
            content.push('\n');
        }

        let mut outputs = vec![DesignOutput {
            compiler: self.name().to_string(),
            file_name: file_name.clone(),
            content,
        }];
        if self.options.source_map == SourceMapMode::File {
            outputs.push(DesignOutput {
                compiler: self.name().to_string(),
                file_name: format!("{file_name}.map"),
                content: map.to_json()?,
            });
        }
        Ok(outputs)
    }
}

fn write_tokens(
    lines: &mut Lines,
    doc: &Specification,
    visit: &Visit,
    settings: &Settings,
    resolver: &Resolver<'_>,
) -> Result<()> {
    let scope = settings.scope();
    let mut body = Lines::default();
    let mut queries = Declarations::default();

    for (path, token) in &doc.token_map {
        if !visit.allows(Section::Tokens, path) {
            continue;
        }
        if settings.ignores(path) {
            info!("Skipping token \"{}\" due to an exclusion rule", path);
            continue;
        }

        if let Some(captures) = QUERY_SUFFIX.captures(path) {
            let base = &captures[1];
            let key = &captures[2];
            let property = resolver.variable_name(base);
            let value = resolver.resolve(&token.value, base, token.kind, false)?;
            let target = settings.queries.target(key, settings.mode, scope);
            queries.place(target, scope, &property, value);
            continue;
        }

        // `color.:hover` sets `--color` on the scope in that state.
        if let Some(captures) = PSEUDO_SUFFIX.captures(path) {
            let base = &captures[1];
            let property = resolver.variable_name(base);
            let value = resolver.resolve(&token.value, base, token.kind, false)?;
            for variant in pseudo_variants(&captures[2]) {
                queries
                    .block(&format!("{scope}{}", variant.selector))
                    .set(&property, value.clone());
            }
            continue;
        }

        let property = resolver.variable_name(path);
        let value = resolver.resolve(&token.value, path, token.kind, false)?;
        let origin = Origin::of(token.location, token.url.as_deref(), &property);
        body.put_mapped(format!("  {property}: {value};"), origin);
    }

    if !body.is_empty() {
        lines.put(format!("{scope} {{"));
        lines.append(body);
        lines.put("}");
        lines.put("");
    }
    lines.put_declarations(&queries, "");
    Ok(())
}

fn write_animations(
    lines: &mut Lines,
    doc: &Specification,
    visit: &Visit,
    settings: &Settings,
    resolver: &Resolver<'_>,
) -> Result<()> {
    for animation in doc.animation_map.values() {
        if !visit.allows(Section::Animations, &animation.name) {
            continue;
        }

        let header = format!("@keyframes {}", resolver.identifier(&animation.name));
        let mut overrides = Declarations::default();

        let origin = Origin::of(animation.location, animation.url.as_deref(), &animation.name);
        lines.put_mapped(format!("{header} {{"), origin);

        for (frame, rules) in &animation.frames {
            lines.put(format!("  {frame} {{"));

            for (property, value) in rules {
                match value {
                    RuleValue::Literal(raw) => {
                        let value = resolver.resolve(raw, property, TokenType::Any, false)?;
                        lines.put(format!("    {property}: {value};"));
                    }
                    RuleValue::Scoped(scoped) => {
                        for (key, raw) in scoped {
                            let Some(raw) = raw.as_literal() else {
                                debug!("nested value of {property} in {header} skipped");
                                continue;
                            };
                            let value = resolver.resolve(raw, property, TokenType::Any, false)?;

                            if is_default_key(key) {
                                lines.put(format!("    {property}: {value};"));
                                continue;
                            }
                            if !key.starts_with('@') {
                                debug!("key {key} of {property} in {header} skipped");
                                continue;
                            }

                            match settings.queries.target(key, settings.mode, ROOT_SCOPE) {
                                QueryTarget {
                                    media: Some(media),
                                    selector: None,
                                } => overrides
                                    .block(&media)
                                    .block(&header)
                                    .block(frame)
                                    .set(property, value),
                                _ => debug!("custom query {key} has no keyframe form in {header}"),
                            }
                        }
                    }
                }
            }

            lines.put("  }");
        }

        lines.put("}");
        lines.put("");
        lines.put_declarations(&overrides, "");
    }

    Ok(())
}

fn write_designs(
    block: &mut DocumentBlock,
    designs: &DesignMap,
    visit: &Visit,
    settings: &Settings,
    resolver: &Resolver<'_>,
) -> Result<()> {
    for design in designs.values() {
        if !visit.allows(Section::Designs, &design.name) {
            continue;
        }

        let selectors = settings.selectors(design);
        if selectors.is_empty() || design.rules.is_empty() {
            continue;
        }

        let joined = selectors.join(", ");
        let bucket = block.buckets.entry(design.layer.clone()).or_default();
        let mut body = Lines::default();

        for (name, value) in &design.rules {
            let property = local_property(name);

            match value {
                RuleValue::Literal(raw) => {
                    let value = resolver.resolve(raw, &property, TokenType::Any, false)?;
                    body.put(format!("  {property}: {value};"));
                }
                RuleValue::Scoped(scoped) => {
                    for (key, raw) in scoped {
                        let Some(raw) = raw.as_literal() else {
                            debug!("nested value of {property} in {joined} skipped");
                            continue;
                        };

                        if is_default_key(key) {
                            let value = resolver.resolve(raw, &property, TokenType::Any, false)?;
                            body.put(format!("  {property}: {value};"));
                        } else if key.starts_with('@') {
                            let value = resolver.resolve(raw, &property, TokenType::Any, false)?;
                            let target = settings.queries.target(key, settings.mode, &joined);
                            bucket.queries.place(target, &joined, &property, value);
                        } else {
                            debug!("key {key} of {property} in {joined} skipped");
                        }
                    }
                }
            }
        }

        if body.is_empty() {
            continue;
        }

        let origin = Origin::of(design.location, design.url.as_deref(), &joined);
        bucket.lines.put_mapped(format!("{joined} {{"), origin);
        bucket.lines.append(body);
        bucket.lines.put("}");
        bucket.lines.put("");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==== HELPER TESTS ====

    #[test]
    fn test_local_property() {
        assert_eq!(local_property("--gap"), "--this-gap");
        assert_eq!(local_property("--this-gap"), "--this-gap");
        assert_eq!(local_property("color"), "color");
    }

    #[test]
    fn test_token_pattern_glob() {
        let glob = token_pattern("color.prim*").unwrap();
        assert!(glob.is_match("color.primary"));
        assert!(!glob.is_match("spacing.color.primary"));

        let regex = token_pattern("^size\\.").unwrap();
        assert!(regex.is_match("size.sm"));

        assert!(token_pattern("(").is_none());
    }

    // ==== DECLARATION TESTS ====

    #[test]
    fn test_put_declarations_layout() {
        let mut queries = Declarations::default();
        queries
            .block("@media print")
            .block(".a")
            .set("color", "red".to_string());
        queries
            .block("@media print")
            .block(".b")
            .set("color", "blue".to_string());

        let mut lines = Lines::default();
        lines.put_declarations(&queries, "");
        let text: Vec<String> = lines.0.into_iter().map(|l| l.text).collect();

        assert_eq!(
            text,
            vec![
                "@media print {",
                "  .a {",
                "    color: red;",
                "  }",
                "",
                "  .b {",
                "    color: blue;",
                "  }",
                "}",
                "",
            ]
        );
    }

    #[test]
    fn test_layer_buckets_are_wrapped() {
        let mut block = DocumentBlock::default();
        let bucket = block.buckets.entry(Some("base".to_string())).or_default();
        bucket.lines.put(".a {");
        bucket.lines.put("  color: red;");
        bucket.lines.put("}");
        bucket.lines.put("");
        block.buckets.entry(None).or_default().lines.put(".b {}");

        let text: Vec<String> = block.finish().0.into_iter().map(|l| l.text).collect();

        assert_eq!(
            text,
            vec![".b {}", "@layer base {", "  .a {", "    color: red;", "  }", "}", ""]
        );
    }
}
