//! # dspec - Design Specification Core
//!
//! The synchronous half of the Toqin design compiler. A design specification
//! is a JSON document of design tokens, style rules (designs), keyframe
//! animations and media query aliases. This crate provides:
//!
//! - **Parsing**: Convert document text into a typed [`DesignSpec`](types::DesignSpec)
//!   plus a map of source locations
//! - **Maps**: Flatten token, design and animation trees into path-keyed maps
//! - **Expressions**: Evaluate the value substitution language used in token
//!   and rule values
//! - **Graph**: Hold `extends`/`includes` documents in an arena with
//!   inherited overrides
//!
//! Loading from disk or the network, stylesheet emission and file watching
//! live in the `toqin` crate.
//!
//! ## Quick Start
//!
//! ```rust
//! use dspec::maps::build_maps;
//! use dspec::parser::parse_document;
//! use dspec::resolve::Resolver;
//! use dspec::types::TokenType;
//!
//! let source = r##"{
//!     "name": "base",
//!     "tokens": [
//!         { "name": "color", "type": "color", "value": { "@": "#336699", "@dark": "#112233" } }
//!     ],
//!     "designs": [
//!         { "name": "btn", "rules": { "color": "$color!50" } }
//!     ]
//! }"##;
//!
//! let doc = parse_document(source, false).expect("valid document");
//! let maps = build_maps(&doc.spec, &doc.locations, None);
//! assert_eq!(maps.tokens["color.@dark"].value, "#112233");
//!
//! let resolver = Resolver::new(&maps.tokens, None);
//! let raw = maps.designs[".btn"].rules["color"].as_literal().unwrap();
//! let value = resolver.resolve(raw, "color", TokenType::Any, false).unwrap();
//! assert_eq!(value, "rgba(51, 102, 153, 0.5)");
//! ```
//!
//! ## Value Expressions
//!
//! | Form | Meaning |
//! |---|---|
//! | `@name[\|fallback]` | global custom property, or the literal value when inlined |
//! | `~name[\|fallback]` | design-local custom property `--this-name` |
//! | `$name[!n]` | copy of the token value, with an optional color transform |
//! | `+name[:extra][=alpha]` | shortcut for a reference or an alpha copy |
//! | `{name}` | prefixed identifier, e.g. an animation name |
//! | `#hex<n` | color transform on a literal |
//! | `16px(*1.5)` | unit arithmetic |
//!
//! Color transforms: `!n`/`=n` alpha, `<n` darken, `>n` lighten, `^n`
//! contrast shade.
//!
//! ## Media Queries
//!
//! Values keyed by `@light`, `@dark`, `@sm`, `@md`, `@lg`, `@xl` or `@print`
//! expand into media blocks. Aliases combine (`@md@dark`) and documents can
//! add their own, including bracketed custom queries (`[dark]`) that select
//! by class, id or attribute instead.

pub mod error;
pub mod graph;
pub mod maps;
pub mod parser;
pub mod resolve;
pub mod types;

pub use error::{Result, SpecError};
pub use graph::{SpecEdge, SpecGraph, SpecId, Specification, Visit};
pub use parser::{LoadOptions, ParsedDocument, parse_document};
pub use resolve::Resolver;
