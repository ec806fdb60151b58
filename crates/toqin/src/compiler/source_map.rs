//! Source Map v3 encoding for compiled stylesheets.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use indexmap::IndexSet;
use serde::Serialize;

use crate::error::{Result, ToqinError};

const VLQ_DIGITS: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Links one output position to the document position it came from.
///
/// Lines are 1-based, columns 0-based.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mapping {
    pub output: (usize, usize),
    pub input: (usize, usize),
    pub source: String,
    pub name: Option<String>,
}

/// How a compiled stylesheet references its source map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SourceMapMode {
    /// Appended as a base64 `data:` URL comment.
    Inline,
    /// Written next to the stylesheet as `<file>.map`.
    File,
    #[default]
    None,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    pub file: String,
    pub sources: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    pub fn new(file: &str, mappings: &[Mapping]) -> Self {
        let mut sorted: Vec<&Mapping> = mappings.iter().collect();
        sorted.sort_by_key(|m| m.output);

        let sources: IndexSet<&str> = sorted.iter().map(|m| m.source.as_str()).collect();
        let names: IndexSet<&str> = sorted.iter().filter_map(|m| m.name.as_deref()).collect();

        let mut encoded = String::new();
        let mut line = 1;
        let mut previous_source = 0i64;
        let mut previous_line = 0i64;
        let mut previous_column = 0i64;
        let mut previous_name = 0i64;
        let mut previous_output_column = 0i64;
        let mut first_in_line = true;

        for mapping in sorted {
            while line < mapping.output.0 {
                encoded.push(';');
                line += 1;
                previous_output_column = 0;
                first_in_line = true;
            }
            if !first_in_line {
                encoded.push(',');
            }
            first_in_line = false;

            let column = mapping.output.1 as i64;
            let source = sources.get_index_of(mapping.source.as_str()).unwrap_or(0) as i64;
            let input_line = mapping.input.0.saturating_sub(1) as i64;
            let input_column = mapping.input.1 as i64;

            encode_vlq(column - previous_output_column, &mut encoded);
            encode_vlq(source - previous_source, &mut encoded);
            encode_vlq(input_line - previous_line, &mut encoded);
            encode_vlq(input_column - previous_column, &mut encoded);

            if let Some(name) = mapping.name.as_deref().and_then(|n| names.get_index_of(n)) {
                let name = name as i64;
                encode_vlq(name - previous_name, &mut encoded);
                previous_name = name;
            }

            previous_output_column = column;
            previous_source = source;
            previous_line = input_line;
            previous_column = input_column;
        }

        Self {
            version: 3,
            file: file.to_string(),
            sources: sources.into_iter().map(str::to_string).collect(),
            names: names.into_iter().map(str::to_string).collect(),
            mappings: encoded,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ToqinError::Spec(e.into()))
    }

    /// The trailing comment for the given mode, if any.
    pub fn comment(&self, mode: SourceMapMode) -> Result<Option<String>> {
        Ok(match mode {
            SourceMapMode::Inline => Some(format!(
                "/*# sourceMappingURL=data:application/json;base64,{} */",
                STANDARD.encode(self.to_json()?)
            )),
            SourceMapMode::File => Some(format!("/*# sourceMappingURL={}.map */", self.file)),
            SourceMapMode::None => None,
        })
    }
}

/// Appends `value` as a Base64 VLQ.
pub fn encode_vlq(value: i64, out: &mut String) {
    let mut vlq = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };

    loop {
        let mut digit = (vlq & 0b11111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b100000;
        }
        out.push(VLQ_DIGITS[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vlq(value: i64) -> String {
        let mut out = String::new();
        encode_vlq(value, &mut out);
        out
    }

    #[test]
    fn test_encode_vlq() {
        assert_eq!(vlq(0), "A");
        assert_eq!(vlq(1), "C");
        assert_eq!(vlq(-1), "D");
        assert_eq!(vlq(15), "e");
        assert_eq!(vlq(16), "gB");
        assert_eq!(vlq(123), "2H");
    }

    #[test]
    fn test_mappings_are_relative() {
        let mappings = vec![
            Mapping {
                output: (1, 0),
                input: (3, 4),
                source: "a.json".into(),
                name: Some("--color".into()),
            },
            Mapping {
                output: (3, 2),
                input: (5, 6),
                source: "a.json".into(),
                name: None,
            },
        ];

        let map = SourceMap::new("index.css", &mappings);

        assert_eq!(map.sources, vec!["a.json"]);
        assert_eq!(map.names, vec!["--color"]);
        // line 1: col 0, src 0, line 2, col 4, name 0; line 3: col 2, src 0, +2 lines, +2 cols
        assert_eq!(map.mappings, "AAEIA;;EAEE");
    }

    #[test]
    fn test_comment_modes() {
        let map = SourceMap::new("index.css", &[]);
        assert_eq!(
            map.comment(SourceMapMode::File).unwrap().as_deref(),
            Some("/*# sourceMappingURL=index.css.map */")
        );
        assert!(map.comment(SourceMapMode::None).unwrap().is_none());

        let inline = map.comment(SourceMapMode::Inline).unwrap().unwrap();
        assert!(inline.starts_with("/*# sourceMappingURL=data:application/json;base64,"));
    }
}
