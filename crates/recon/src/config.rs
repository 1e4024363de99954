use serde::Deserialize;

use crate::error::ReconError;
use crate::model::CanonicalField;

/// Default noise marker: the Hebrew word for "supplier/vendor".
pub const DEFAULT_NOISE_MARKER: &str = "ספק";

const MAX_SHEET_NAME_LEN: usize = 31;
const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeConfig {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub classify: ClassifyConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Case-sensitive substrings; a column whose raw label contains any of
    /// them is dropped before classification.
    #[serde(default = "default_noise_markers")]
    pub noise_markers: Vec<String>,
}

fn default_noise_markers() -> Vec<String> {
    vec![DEFAULT_NOISE_MARKER.to_string()]
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            noise_markers: default_noise_markers(),
        }
    }
}

// ---------------------------------------------------------------------------
// Classify
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifyConfig {
    #[serde(default = "default_true")]
    pub content_email_fallback: bool,
    #[serde(default)]
    pub extra_tokens: ExtraTokens,
}

fn default_true() -> bool {
    true
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            content_email_fallback: true,
            extra_tokens: ExtraTokens::default(),
        }
    }
}

/// Tokens appended to the built-in rule table. Matched against the
/// normalized (trimmed, latin-lowercased) label.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtraTokens {
    #[serde(default)]
    pub email: Vec<String>,
    #[serde(default)]
    pub phone: Vec<String>,
    #[serde(default)]
    pub name: Vec<String>,
    #[serde(default)]
    pub phone_alt_qualifiers: Vec<String>,
    #[serde(default)]
    pub english_qualifiers: Vec<String>,
    #[serde(default)]
    pub hebrew_qualifiers: Vec<String>,
}

impl ExtraTokens {
    fn all(&self) -> impl Iterator<Item = (&'static str, &String)> {
        let groups: [(&'static str, &Vec<String>); 6] = [
            ("email", &self.email),
            ("phone", &self.phone),
            ("name", &self.name),
            ("phone_alt_qualifiers", &self.phone_alt_qualifiers),
            ("english_qualifiers", &self.english_qualifiers),
            ("hebrew_qualifiers", &self.hebrew_qualifiers),
        ];
        groups
            .into_iter()
            .flat_map(|(group, tokens)| tokens.iter().map(move |t| (group, t)))
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderLanguage {
    #[default]
    Hebrew,
    English,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    #[serde(default)]
    pub header_language: HeaderLanguage,
}

fn default_sheet_name() -> String {
    "Contacts".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sheet_name: default_sheet_name(),
            header_language: HeaderLanguage::default(),
        }
    }
}

impl OutputConfig {
    /// Header labels in export column order.
    pub fn header_labels(&self) -> [&'static str; 5] {
        CanonicalField::ALL.map(|f| match self.header_language {
            HeaderLanguage::Hebrew => f.hebrew_label(),
            HeaderLanguage::English => f.english_label(),
        })
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MergeConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: MergeConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.filter.noise_markers.iter().any(|m| m.is_empty()) {
            return Err(ReconError::ConfigValidation(
                "filter.noise_markers must not contain empty strings".into(),
            ));
        }

        if let Some((group, _)) = self
            .classify
            .extra_tokens
            .all()
            .find(|(_, t)| t.trim().is_empty())
        {
            return Err(ReconError::ConfigValidation(format!(
                "classify.extra_tokens.{group} must not contain empty tokens"
            )));
        }

        let name = &self.output.sheet_name;
        let len = name.chars().count();
        if len == 0 || len > MAX_SHEET_NAME_LEN {
            return Err(ReconError::ConfigValidation(format!(
                "output.sheet_name must be 1 to {MAX_SHEET_NAME_LEN} characters, got {len}"
            )));
        }
        if let Some(c) = name.chars().find(|c| FORBIDDEN_SHEET_CHARS.contains(c)) {
            return Err(ReconError::ConfigValidation(format!(
                "output.sheet_name contains forbidden character '{c}'"
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_gives_defaults() {
        let config = MergeConfig::from_toml("").unwrap();
        assert_eq!(config.filter.noise_markers, vec!["ספק"]);
        assert!(config.classify.content_email_fallback);
        assert_eq!(config.output.sheet_name, "Contacts");
        assert_eq!(config.output.header_language, HeaderLanguage::Hebrew);
        assert_eq!(config.output.header_labels()[0], "שם בעברית");
    }

    #[test]
    fn parse_full_config() {
        let input = r#"
[filter]
noise_markers = ["ספק", "Vendor"]

[classify]
content_email_fallback = false

[classify.extra_tokens]
email = ["correo"]
phone_alt_qualifiers = ["2"]

[output]
sheet_name = "Merged"
header_language = "english"
"#;
        let config = MergeConfig::from_toml(input).unwrap();
        assert_eq!(config.filter.noise_markers.len(), 2);
        assert!(!config.classify.content_email_fallback);
        assert_eq!(config.classify.extra_tokens.email, vec!["correo"]);
        assert_eq!(config.classify.extra_tokens.phone_alt_qualifiers, vec!["2"]);
        assert_eq!(config.output.sheet_name, "Merged");
        assert_eq!(config.output.header_labels()[3], "Phone (Alt)");
    }

    #[test]
    fn reject_unknown_key() {
        let err = MergeConfig::from_toml("[filter]\nnoise = [\"x\"]\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_empty_noise_marker() {
        let err = MergeConfig::from_toml("[filter]\nnoise_markers = [\"\"]\n").unwrap_err();
        assert!(err.to_string().contains("noise_markers"));
    }

    #[test]
    fn reject_blank_extra_token() {
        let err =
            MergeConfig::from_toml("[classify.extra_tokens]\nphone = [\" \"]\n").unwrap_err();
        assert!(err.to_string().contains("extra_tokens.phone"));
    }

    #[test]
    fn reject_bad_sheet_name() {
        let err = MergeConfig::from_toml("[output]\nsheet_name = \"a/b\"\n").unwrap_err();
        assert!(err.to_string().contains("'/'"));

        let long = format!("[output]\nsheet_name = \"{}\"\n", "x".repeat(32));
        let err = MergeConfig::from_toml(&long).unwrap_err();
        assert!(err.to_string().contains("1 to 31"));
    }

    #[test]
    fn reject_unknown_header_language() {
        assert!(MergeConfig::from_toml("[output]\nheader_language = \"french\"\n").is_err());
    }
}
