//! `@font-face` declarations.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontFace {
    pub font_family: String,
    /// Prefix joined with each font source name.
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub fonts: Vec<FontSource>,
    /// Locally installed font name tried before any download.
    #[serde(default)]
    pub local: Option<String>,
    #[serde(default)]
    pub font_display: Option<String>,
    #[serde(default)]
    pub font_stretch: Option<String>,
    #[serde(default)]
    pub font_style: Option<String>,
    #[serde(default)]
    pub font_weight: Option<String>,
    #[serde(default)]
    pub font_feature_settings: Option<String>,
    #[serde(default)]
    pub font_variation_settings: Option<String>,
    #[serde(default)]
    pub size_adjust: Option<String>,
    #[serde(default)]
    pub unicode_range: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FontSource {
    pub name: String,
    #[serde(default)]
    pub format: Option<String>,
}

impl FontFace {
    /// Optional descriptors as CSS property/value pairs, in a fixed order.
    pub fn descriptors(&self) -> Vec<(&'static str, &str)> {
        [
            ("font-display", &self.font_display),
            ("font-stretch", &self.font_stretch),
            ("font-style", &self.font_style),
            ("font-weight", &self.font_weight),
            ("font-feature-settings", &self.font_feature_settings),
            ("font-variation-settings", &self.font_variation_settings),
            ("size-adjust", &self.size_adjust),
            ("unicode-range", &self.unicode_range),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }

    /// The `src` list: `local()` first, then one `url()` per font.
    pub fn sources(&self) -> Vec<String> {
        let base = self.base_url.trim_end_matches('/');
        let mut sources: Vec<String> = self
            .local
            .iter()
            .map(|name| format!("local(\"{name}\")"))
            .collect();

        for font in &self.fonts {
            let url = if base.is_empty() {
                font.name.clone()
            } else {
                format!("{base}/{}", font.name)
            };

            match &font.format {
                Some(format) => sources.push(format!("url(\"{url}\") format(\"{format}\")")),
                None => sources.push(format!("url(\"{url}\")")),
            }
        }

        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_order() {
        let face: FontFace = serde_json::from_str(
            r#"{
                "fontFamily": "Inter",
                "baseUrl": "/fonts/",
                "local": "Inter",
                "fonts": [{"name": "inter.woff2", "format": "woff2"}, {"name": "inter.ttf"}],
                "fontWeight": "400"
            }"#,
        )
        .unwrap();

        assert_eq!(
            face.sources(),
            vec![
                "local(\"Inter\")",
                "url(\"/fonts/inter.woff2\") format(\"woff2\")",
                "url(\"/fonts/inter.ttf\")",
            ]
        );
        assert_eq!(face.descriptors(), vec![("font-weight", "400")]);
    }
}
