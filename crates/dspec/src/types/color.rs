//! Color literals and the color transforms of the value expression language.
//!
//! [`RgbaColor`] parses every color literal a design document may carry:
//!
//! - **Hex**: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`
//! - **RGB**: `rgb(r, g, b)`, `rgba(r, g, b, a)`
//! - **HSL**: `hsl(h, s%, l%)`, `hsla(h, s%, l%, a)`
//! - **Named**: CSS color names like `red`, `aliceblue`, `rebeccapurple`
//!
//! [`ColorTransform`] implements the `!n`/`=n`, `<n`, `>n` and `^n` suffixes.
//! Transforms keep the notation of their input where the notation can carry
//! the result:
//!
//! ```
//! use dspec::types::ColorTransform;
//!
//! let faded = ColorTransform::Alpha(50.0).apply("#336699");
//! assert_eq!(faded.as_deref(), Some("rgba(51, 102, 153, 0.5)"));
//!
//! let darker = ColorTransform::Darken(50.0).apply("#ffffff");
//! assert_eq!(darker.as_deref(), Some("#808080"));
//! ```

use std::fmt;

/// Error returned when color parsing fails.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorParseError {
    /// Human-readable description of the parsing error.
    pub message: String,
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ColorParseError {}

/// Notation a color literal was written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorFormat {
    Hex,
    Rgb,
    Rgba,
    Hsl,
    Hsla,
    Named,
}

impl ColorFormat {
    /// Detects the notation of a literal without validating it.
    pub fn detect(input: &str) -> Self {
        let lower = input.trim().to_ascii_lowercase();

        if lower.starts_with('#') {
            ColorFormat::Hex
        } else if lower.starts_with("rgba") {
            ColorFormat::Rgba
        } else if lower.starts_with("rgb") {
            ColorFormat::Rgb
        } else if lower.starts_with("hsla") {
            ColorFormat::Hsla
        } else if lower.starts_with("hsl") {
            ColorFormat::Hsl
        } else {
            ColorFormat::Named
        }
    }
}

/// An sRGB color with straight alpha.
///
/// # Examples
///
/// ```
/// use dspec::types::RgbaColor;
///
/// let blue = RgbaColor::parse("#0000ff").unwrap();
/// assert_eq!(blue, RgbaColor::rgb(0, 0, 255));
///
/// let coral = RgbaColor::parse("coral").unwrap();
/// assert_eq!(coral.to_hex(), "#ff7f50");
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RgbaColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// 0.0 is transparent, 1.0 is opaque.
    pub a: f32,
}

impl Default for RgbaColor {
    fn default() -> Self {
        Self::rgb(0, 0, 0)
    }
}

impl RgbaColor {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn transparent() -> Self {
        Self::rgba(0, 0, 0, 0.0)
    }

    /// Perceived brightness on a 0-255 scale (ITU-R BT.601 weights).
    pub fn luma(&self) -> f32 {
        0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32
    }

    /// Moves every channel `percent` of the way towards black.
    pub fn darken(&self, percent: f64) -> Self {
        let factor = 1.0 - (percent.clamp(0.0, 100.0) / 100.0);
        let channel = |c: u8| (c as f64 * factor).round() as u8;

        Self::rgba(channel(self.r), channel(self.g), channel(self.b), self.a)
    }

    /// Moves every channel `percent` of the way towards white.
    pub fn lighten(&self, percent: f64) -> Self {
        let factor = percent.clamp(0.0, 100.0) / 100.0;
        let channel = |c: u8| (c as f64 + (255.0 - c as f64) * factor).round() as u8;

        Self::rgba(channel(self.r), channel(self.g), channel(self.b), self.a)
    }

    /// Darkens light colors and lightens dark ones.
    pub fn contrast(&self, percent: f64) -> Self {
        if self.luma() > 186.0 {
            self.darken(percent)
        } else {
            self.lighten(percent)
        }
    }

    /// Parse a color literal.
    ///
    /// Accepts hex, `rgb()`/`rgba()`, `hsl()`/`hsla()`, the CSS named colors
    /// and `transparent`.
    pub fn parse(input: &str) -> Result<Self, ColorParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ColorParseError {
                message: "empty color string".to_string(),
            });
        }

        let lower = input.to_lowercase();

        if lower == "transparent" {
            return Ok(Self::transparent());
        }

        if let Some(hex) = lower.strip_prefix('#') {
            return Self::parse_hex(hex);
        }

        if lower.starts_with("rgb") {
            return Self::parse_rgb_func(&lower);
        }

        if lower.starts_with("hsl") {
            return Self::parse_hsl_func(&lower);
        }

        Self::parse_named(&lower)
    }

    fn parse_hex(hex: &str) -> Result<Self, ColorParseError> {
        let digits = hex
            .chars()
            .map(Self::parse_hex_digit)
            .collect::<Result<Vec<u8>, _>>()?;

        match digits.as_slice() {
            [r, g, b] => Ok(Self::rgb(r * 17, g * 17, b * 17)),
            [r, g, b, a] => Ok(Self::rgba(r * 17, g * 17, b * 17, (a * 17) as f32 / 255.0)),
            [r1, r2, g1, g2, b1, b2] => Ok(Self::rgb(r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2)),
            [r1, r2, g1, g2, b1, b2, a1, a2] => Ok(Self::rgba(
                r1 * 16 + r2,
                g1 * 16 + g2,
                b1 * 16 + b2,
                (a1 * 16 + a2) as f32 / 255.0,
            )),
            _ => Err(ColorParseError {
                message: format!("invalid hex color length: {}", digits.len()),
            }),
        }
    }

    fn parse_hex_digit(c: char) -> Result<u8, ColorParseError> {
        c.to_digit(16).map(|d| d as u8).ok_or_else(|| ColorParseError {
            message: format!("invalid hex digit: {}", c),
        })
    }

    /// Splits `name(a, b, c[, d])` into its trimmed arguments.
    fn function_args<'a>(input: &'a str, name: &str) -> Result<Vec<&'a str>, ColorParseError> {
        let start = input.find('(').ok_or_else(|| ColorParseError {
            message: format!("missing '(' in {} function", name),
        })?;
        let end = input.rfind(')').ok_or_else(|| ColorParseError {
            message: format!("missing ')' in {} function", name),
        })?;
        if end < start || !input[end + 1..].trim().is_empty() {
            return Err(ColorParseError {
                message: format!("malformed {} function", name),
            });
        }

        let parts: Vec<&str> = input[start + 1..end].split(',').map(str::trim).collect();
        if parts.len() < 3 || parts.len() > 4 {
            return Err(ColorParseError {
                message: format!("{} requires 3 or 4 components", name),
            });
        }

        Ok(parts)
    }

    fn parse_rgb_func(input: &str) -> Result<Self, ColorParseError> {
        let parts = Self::function_args(input, "rgb")?;

        let r = Self::parse_u8(parts[0])?;
        let g = Self::parse_u8(parts[1])?;
        let b = Self::parse_u8(parts[2])?;
        let a = match parts.get(3) {
            Some(alpha) => Self::parse_f32(alpha)?,
            None => 1.0,
        };

        Ok(Self::rgba(r, g, b, a))
    }

    fn parse_hsl_func(input: &str) -> Result<Self, ColorParseError> {
        let parts = Self::function_args(input, "hsl")?;

        let h: f32 = parts[0]
            .trim_end_matches("deg")
            .parse()
            .map_err(|_| ColorParseError {
                message: format!("invalid hue: {}", parts[0]),
            })?;
        let s = Self::parse_percentage(parts[1])?;
        let l = Self::parse_percentage(parts[2])?;
        let a = match parts.get(3) {
            Some(alpha) => Self::parse_f32(alpha)?,
            None => 1.0,
        };

        Ok(Self::from_hsl(h, s, l, a))
    }

    fn parse_u8(s: &str) -> Result<u8, ColorParseError> {
        let val: i32 = s.parse().map_err(|_| ColorParseError {
            message: format!("invalid number: {}", s),
        })?;
        u8::try_from(val).map_err(|_| ColorParseError {
            message: format!("value out of range (0-255): {}", val),
        })
    }

    fn parse_f32(s: &str) -> Result<f32, ColorParseError> {
        s.parse().map_err(|_| ColorParseError {
            message: format!("invalid float: {}", s),
        })
    }

    fn parse_percentage(s: &str) -> Result<f32, ColorParseError> {
        let s = s.trim_end_matches('%');
        let val: f32 = s.parse().map_err(|_| ColorParseError {
            message: format!("invalid percentage: {}", s),
        })?;
        Ok(val / 100.0)
    }

    fn parse_named(name: &str) -> Result<Self, ColorParseError> {
        NAMED_COLORS
            .binary_search_by(|(candidate, _)| candidate.cmp(&name))
            .map(|i| {
                let (r, g, b) = NAMED_COLORS[i].1;
                Self::rgb(r, g, b)
            })
            .map_err(|_| ColorParseError {
                message: format!("unknown color name: {}", name),
            })
    }

    /// Hue in degrees, saturation and lightness in 0.0-1.0.
    pub fn to_hsl(&self) -> (f32, f32, f32) {
        let r = self.r as f32 / 255.0;
        let g = self.g as f32 / 255.0;
        let b = self.b as f32 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        if max == min {
            return (0.0, 0.0, l);
        }

        let d = max - min;
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        let h = if max == r {
            (g - b) / d + (if g < b { 6.0 } else { 0.0 })
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };

        (h / 6.0 * 360.0, s, l)
    }

    pub fn from_hsl(h: f32, s: f32, l: f32, a: f32) -> Self {
        let h = h.rem_euclid(360.0) / 360.0;
        let (r, g, b) = if s == 0.0 {
            (l, l, l)
        } else {
            let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
            let p = 2.0 * l - q;
            (
                Self::hue_to_rgb(p, q, h + 1.0 / 3.0),
                Self::hue_to_rgb(p, q, h),
                Self::hue_to_rgb(p, q, h - 1.0 / 3.0),
            )
        };

        Self::rgba(
            (r * 255.0).round() as u8,
            (g * 255.0).round() as u8,
            (b * 255.0).round() as u8,
            a,
        )
    }

    fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }

        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    /// `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a < 1.0 {
            let alpha = (self.a.clamp(0.0, 1.0) * 255.0).round() as u8;
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, alpha)
        } else {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        }
    }

    /// Serializes the color in the given notation.
    pub fn to_css(&self, format: ColorFormat) -> String {
        let alpha = format_alpha(self.a as f64);

        match format {
            ColorFormat::Hex | ColorFormat::Named => self.to_hex(),
            ColorFormat::Rgb if self.a >= 1.0 => format!("rgb({}, {}, {})", self.r, self.g, self.b),
            ColorFormat::Rgb | ColorFormat::Rgba => {
                format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
            }
            ColorFormat::Hsl | ColorFormat::Hsla => {
                let (h, s, l) = self.to_hsl();
                let (h, s, l) = (h.round(), (s * 100.0).round(), (l * 100.0).round());

                if format == ColorFormat::Hsl && self.a >= 1.0 {
                    format!("hsl({}, {}%, {}%)", h, s, l)
                } else {
                    format!("hsla({}, {}%, {}%, {})", h, s, l, alpha)
                }
            }
        }
    }
}

/// One color transform suffix of the value expression language.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColorTransform {
    /// `!n` or `=n`: set the alpha channel to `n` percent.
    Alpha(f64),
    /// `<n`: darken every channel by `n` percent.
    Darken(f64),
    /// `>n`: lighten every channel by `n` percent.
    Lighten(f64),
    /// `^n`: darken light colors, lighten dark ones.
    Contrast(f64),
}

impl ColorTransform {
    /// Builds a transform from its sigil and amount.
    pub fn from_sigil(sigil: char, amount: f64) -> Option<Self> {
        match sigil {
            '!' | '=' => Some(ColorTransform::Alpha(amount)),
            '<' => Some(ColorTransform::Darken(amount)),
            '>' => Some(ColorTransform::Lighten(amount)),
            '^' => Some(ColorTransform::Contrast(amount)),
            _ => None,
        }
    }

    /// Applies the transform, or returns `None` when `value` is not a color.
    pub fn apply(&self, value: &str) -> Option<String> {
        match *self {
            ColorTransform::Alpha(percent) => with_alpha(value, percent),
            ColorTransform::Darken(percent) => shade(value, |c| c.darken(percent)),
            ColorTransform::Lighten(percent) => shade(value, |c| c.lighten(percent)),
            ColorTransform::Contrast(percent) => shade(value, |c| c.contrast(percent)),
        }
    }
}

fn shade(value: &str, op: impl Fn(&RgbaColor) -> RgbaColor) -> Option<String> {
    let color = RgbaColor::parse(value).ok()?;
    Some(op(&color).to_css(ColorFormat::detect(value)))
}

/// Functional notations keep their own components; hex and named colors
/// become `rgba()`.
fn with_alpha(value: &str, percent: f64) -> Option<String> {
    let alpha = format_alpha(percent.clamp(0.0, 100.0) / 100.0);
    let trimmed = value.trim();

    match ColorFormat::detect(trimmed) {
        format @ (ColorFormat::Rgb | ColorFormat::Rgba | ColorFormat::Hsl | ColorFormat::Hsla) => {
            RgbaColor::parse(trimmed).ok()?;

            let base = match format {
                ColorFormat::Rgb | ColorFormat::Rgba => "rgb",
                _ => "hsl",
            };
            let open = trimmed.find('(')?;
            let close = trimmed.rfind(')')?;
            let args: Vec<&str> = trimmed[open + 1..close].split(',').map(str::trim).collect();

            Some(format!("{base}a({}, {}, {}, {alpha})", args[0], args[1], args[2]))
        }
        ColorFormat::Hex | ColorFormat::Named => {
            let color = RgbaColor::parse(trimmed).ok()?;
            Some(format!("rgba({}, {}, {}, {alpha})", color.r, color.g, color.b))
        }
    }
}

/// Formats an alpha value without float noise (`0.07`, not `0.07000000000000001`).
fn format_alpha(alpha: f64) -> String {
    let rounded = (alpha * 10_000.0).round() / 10_000.0;
    format!("{}", rounded)
}

/// CSS named colors, sorted for binary search.
const NAMED_COLORS: &[(&str, (u8, u8, u8))] = &[
    ("aliceblue", (240, 248, 255)),
    ("antiquewhite", (250, 235, 215)),
    ("aqua", (0, 255, 255)),
    ("aquamarine", (127, 255, 212)),
    ("azure", (240, 255, 255)),
    ("beige", (245, 245, 220)),
    ("bisque", (255, 228, 196)),
    ("black", (0, 0, 0)),
    ("blanchedalmond", (255, 235, 205)),
    ("blue", (0, 0, 255)),
    ("blueviolet", (138, 43, 226)),
    ("brown", (165, 42, 42)),
    ("burlywood", (222, 184, 135)),
    ("cadetblue", (95, 158, 160)),
    ("chartreuse", (127, 255, 0)),
    ("chocolate", (210, 105, 30)),
    ("coral", (255, 127, 80)),
    ("cornflowerblue", (100, 149, 237)),
    ("cornsilk", (255, 248, 220)),
    ("crimson", (220, 20, 60)),
    ("cyan", (0, 255, 255)),
    ("darkblue", (0, 0, 139)),
    ("darkcyan", (0, 139, 139)),
    ("darkgoldenrod", (184, 134, 11)),
    ("darkgray", (169, 169, 169)),
    ("darkgreen", (0, 100, 0)),
    ("darkgrey", (169, 169, 169)),
    ("darkkhaki", (189, 183, 107)),
    ("darkmagenta", (139, 0, 139)),
    ("darkolivegreen", (85, 107, 47)),
    ("darkorange", (255, 140, 0)),
    ("darkorchid", (153, 50, 204)),
    ("darkred", (139, 0, 0)),
    ("darksalmon", (233, 150, 122)),
    ("darkseagreen", (143, 188, 143)),
    ("darkslateblue", (72, 61, 139)),
    ("darkslategray", (47, 79, 79)),
    ("darkslategrey", (47, 79, 79)),
    ("darkturquoise", (0, 206, 209)),
    ("darkviolet", (148, 0, 211)),
    ("deeppink", (255, 20, 147)),
    ("deepskyblue", (0, 191, 255)),
    ("dimgray", (105, 105, 105)),
    ("dimgrey", (105, 105, 105)),
    ("dodgerblue", (30, 144, 255)),
    ("firebrick", (178, 34, 34)),
    ("floralwhite", (255, 250, 240)),
    ("forestgreen", (34, 139, 34)),
    ("fuchsia", (255, 0, 255)),
    ("gainsboro", (220, 220, 220)),
    ("ghostwhite", (248, 248, 255)),
    ("gold", (255, 215, 0)),
    ("goldenrod", (218, 165, 32)),
    ("gray", (128, 128, 128)),
    ("green", (0, 128, 0)),
    ("greenyellow", (173, 255, 47)),
    ("grey", (128, 128, 128)),
    ("honeydew", (240, 255, 240)),
    ("hotpink", (255, 105, 180)),
    ("indianred", (205, 92, 92)),
    ("indigo", (75, 0, 130)),
    ("ivory", (255, 255, 240)),
    ("khaki", (240, 230, 140)),
    ("lavender", (230, 230, 250)),
    ("lavenderblush", (255, 240, 245)),
    ("lawngreen", (124, 252, 0)),
    ("lemonchiffon", (255, 250, 205)),
    ("lightblue", (173, 216, 230)),
    ("lightcoral", (240, 128, 128)),
    ("lightcyan", (224, 255, 255)),
    ("lightgoldenrodyellow", (250, 250, 210)),
    ("lightgray", (211, 211, 211)),
    ("lightgreen", (144, 238, 144)),
    ("lightgrey", (211, 211, 211)),
    ("lightpink", (255, 182, 193)),
    ("lightsalmon", (255, 160, 122)),
    ("lightseagreen", (32, 178, 170)),
    ("lightskyblue", (135, 206, 250)),
    ("lightslategray", (119, 136, 153)),
    ("lightslategrey", (119, 136, 153)),
    ("lightsteelblue", (176, 196, 222)),
    ("lightyellow", (255, 255, 224)),
    ("lime", (0, 255, 0)),
    ("limegreen", (50, 205, 50)),
    ("linen", (250, 240, 230)),
    ("magenta", (255, 0, 255)),
    ("maroon", (128, 0, 0)),
    ("mediumaquamarine", (102, 205, 170)),
    ("mediumblue", (0, 0, 205)),
    ("mediumorchid", (186, 85, 211)),
    ("mediumpurple", (147, 112, 219)),
    ("mediumseagreen", (60, 179, 113)),
    ("mediumslateblue", (123, 104, 238)),
    ("mediumspringgreen", (0, 250, 154)),
    ("mediumturquoise", (72, 209, 204)),
    ("mediumvioletred", (199, 21, 133)),
    ("midnightblue", (25, 25, 112)),
    ("mintcream", (245, 255, 250)),
    ("mistyrose", (255, 228, 225)),
    ("moccasin", (255, 228, 181)),
    ("navajowhite", (255, 222, 173)),
    ("navy", (0, 0, 128)),
    ("oldlace", (253, 245, 230)),
    ("olive", (128, 128, 0)),
    ("olivedrab", (107, 142, 35)),
    ("orange", (255, 165, 0)),
    ("orangered", (255, 69, 0)),
    ("orchid", (218, 112, 214)),
    ("palegoldenrod", (238, 232, 170)),
    ("palegreen", (152, 251, 152)),
    ("paleturquoise", (175, 238, 238)),
    ("palevioletred", (219, 112, 147)),
    ("papayawhip", (255, 239, 213)),
    ("peachpuff", (255, 218, 185)),
    ("peru", (205, 133, 63)),
    ("pink", (255, 192, 203)),
    ("plum", (221, 160, 221)),
    ("powderblue", (176, 224, 230)),
    ("purple", (128, 0, 128)),
    ("rebeccapurple", (102, 51, 153)),
    ("red", (255, 0, 0)),
    ("rosybrown", (188, 143, 143)),
    ("royalblue", (65, 105, 225)),
    ("saddlebrown", (139, 69, 19)),
    ("salmon", (250, 128, 114)),
    ("sandybrown", (244, 164, 96)),
    ("seagreen", (46, 139, 87)),
    ("seashell", (255, 245, 238)),
    ("sienna", (160, 82, 45)),
    ("silver", (192, 192, 192)),
    ("skyblue", (135, 206, 235)),
    ("slateblue", (106, 90, 205)),
    ("slategray", (112, 128, 144)),
    ("slategrey", (112, 128, 144)),
    ("snow", (255, 250, 250)),
    ("springgreen", (0, 255, 127)),
    ("steelblue", (70, 130, 180)),
    ("tan", (210, 180, 140)),
    ("teal", (0, 128, 128)),
    ("thistle", (216, 191, 216)),
    ("tomato", (255, 99, 71)),
    ("turquoise", (64, 224, 208)),
    ("white", (255, 255, 255)),
    ("yellow", (255, 255, 0)),
];

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== PARSING TESTS ====================

    #[test]
    fn test_hex_short_and_long() {
        assert_eq!(RgbaColor::parse("#f00").unwrap(), RgbaColor::rgb(255, 0, 0));
        assert_eq!(RgbaColor::parse("#abc").unwrap(), RgbaColor::rgb(0xaa, 0xbb, 0xcc));
        assert_eq!(RgbaColor::parse("#336699").unwrap(), RgbaColor::rgb(51, 102, 153));
        assert_eq!(RgbaColor::parse("#FF0000").unwrap(), RgbaColor::rgb(255, 0, 0));
    }

    #[test]
    fn test_hex_with_alpha() {
        let color = RgbaColor::parse("#ff000080").unwrap();
        assert_eq!((color.r, color.g, color.b), (255, 0, 0));
        assert!((color.a - 128.0 / 255.0).abs() < 0.001);
    }

    #[test]
    fn test_rgb_and_rgba() {
        assert_eq!(RgbaColor::parse("rgb(1, 2, 3)").unwrap(), RgbaColor::rgb(1, 2, 3));
        assert_eq!(
            RgbaColor::parse("rgba(1,2,3,0.5)").unwrap(),
            RgbaColor::rgba(1, 2, 3, 0.5)
        );
    }

    #[test]
    fn test_hsl() {
        assert_eq!(RgbaColor::parse("hsl(0, 100%, 50%)").unwrap(), RgbaColor::rgb(255, 0, 0));
        assert_eq!(RgbaColor::parse("hsl(120, 100%, 50%)").unwrap(), RgbaColor::rgb(0, 255, 0));
        assert_eq!(RgbaColor::parse("hsla(0, 0%, 100%, 0.5)").unwrap().a, 0.5);
    }

    #[test]
    fn test_named_colors() {
        assert_eq!(RgbaColor::parse("red").unwrap(), RgbaColor::rgb(255, 0, 0));
        assert_eq!(RgbaColor::parse("RebeccaPurple").unwrap(), RgbaColor::rgb(102, 51, 153));
        assert_eq!(RgbaColor::parse("transparent").unwrap(), RgbaColor::transparent());
    }

    #[test]
    fn test_named_table_is_sorted() {
        assert!(NAMED_COLORS.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_invalid_colors() {
        assert!(RgbaColor::parse("").is_err());
        assert!(RgbaColor::parse("#gg0000").is_err());
        assert!(RgbaColor::parse("#12345").is_err());
        assert!(RgbaColor::parse("rgb(300, 0, 0)").is_err());
        assert!(RgbaColor::parse("rgb(1, 2)").is_err());
        assert!(RgbaColor::parse("notacolor").is_err());
        assert!(RgbaColor::parse("16px").is_err());
    }

    #[test]
    fn test_hsl_roundtrip() {
        let color = RgbaColor::rgb(51, 102, 153);
        let (h, s, l) = color.to_hsl();
        assert_eq!(RgbaColor::from_hsl(h, s, l, 1.0), color);
    }

    // ==================== TRANSFORM TESTS ====================

    #[test]
    fn test_alpha_from_hex() {
        let result = ColorTransform::Alpha(50.0).apply("#336699");
        assert_eq!(result.as_deref(), Some("rgba(51, 102, 153, 0.5)"));
    }

    #[test]
    fn test_alpha_keeps_functional_notation() {
        assert_eq!(
            ColorTransform::Alpha(25.0).apply("rgb(1, 2, 3)").as_deref(),
            Some("rgba(1, 2, 3, 0.25)")
        );
        assert_eq!(
            ColorTransform::Alpha(10.0).apply("rgba(1, 2, 3, 0.9)").as_deref(),
            Some("rgba(1, 2, 3, 0.1)")
        );
        assert_eq!(
            ColorTransform::Alpha(50.0).apply("hsl(210, 50%, 40%)").as_deref(),
            Some("hsla(210, 50%, 40%, 0.5)")
        );
        assert_eq!(
            ColorTransform::Alpha(7.0).apply("hsla(210, 50%, 40%, 1)").as_deref(),
            Some("hsla(210, 50%, 40%, 0.07)")
        );
    }

    #[test]
    fn test_darken_and_lighten() {
        assert_eq!(ColorTransform::Darken(50.0).apply("#ffffff").as_deref(), Some("#808080"));
        assert_eq!(ColorTransform::Lighten(50.0).apply("#000000").as_deref(), Some("#808080"));
        assert_eq!(
            ColorTransform::Darken(10.0).apply("rgb(100, 200, 50)").as_deref(),
            Some("rgb(90, 180, 45)")
        );
    }

    #[test]
    fn test_contrast_uses_luma_threshold() {
        // White is light, so contrast darkens it.
        assert_eq!(ColorTransform::Contrast(20.0).apply("#ffffff").as_deref(), Some("#cccccc"));
        // Navy is dark, so contrast lightens it.
        assert_eq!(ColorTransform::Contrast(100.0).apply("#000080").as_deref(), Some("#ffffff"));
    }

    #[test]
    fn test_transform_ignores_non_colors() {
        assert_eq!(ColorTransform::Alpha(50.0).apply("16px"), None);
        assert_eq!(ColorTransform::Darken(50.0).apply("var(--x)"), None);
    }

    #[test]
    fn test_from_sigil() {
        assert_eq!(ColorTransform::from_sigil('=', 5.0), Some(ColorTransform::Alpha(5.0)));
        assert_eq!(ColorTransform::from_sigil('^', 5.0), Some(ColorTransform::Contrast(5.0)));
        assert_eq!(ColorTransform::from_sigil('?', 5.0), None);
    }
}
