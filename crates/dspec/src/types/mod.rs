//! Document model: tokens, designs, animations, fonts and the document itself.

pub mod animation;
pub mod color;
pub mod design;
pub mod font;
pub mod location;
pub mod spec;
pub mod token;

pub use animation::{Animation, AnimationMap, AnimationRef};
pub use color::{ColorFormat, ColorParseError, ColorTransform, RgbaColor};
pub use design::{
    Design, DesignKind, DesignMap, DesignRef, Mixin, RuleMap, RuleValue, TagType, merge_rules,
};
pub use font::{FontFace, FontSource};
pub use location::{LocationMap, SourceLocation};
pub use spec::{DesignSpec, EdgeFilter, ExternalRef, MediaQuery, QueryMode, Section};
pub use token::{Scalar, Token, TokenMap, TokenRef, TokenType, TokenValue};
