//! Presentation rules embedded in the document head.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeStyle {
    /// Local fonts only; the document must render without network access.
    pub font_family: String,
    pub font_size: FontSizes,
    pub spacing: Spacing,
    pub colors: Colors,
    pub margins: Margins,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSizes {
    pub h1: String,
    pub h2: String,
    pub body: String,
    pub small: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spacing {
    pub section: String,
    pub item: String,
    pub line: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Colors {
    pub primary: String,
    pub text: String,
    pub link: String,
    pub border: String,
    pub muted: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub page: String,
}

impl Default for ResumeStyle {
    fn default() -> Self {
        Self {
            font_family: "'Source Serif 4', 'Source Serif Pro', Georgia, serif".to_string(),
            font_size: FontSizes::default(),
            spacing: Spacing::default(),
            colors: Colors::default(),
            margins: Margins::default(),
        }
    }
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            h1: "1.2rem".to_string(),
            h2: "1rem".to_string(),
            body: "0.82rem".to_string(),
            small: "0.7rem".to_string(),
        }
    }
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            section: "0.55rem".to_string(),
            item: "0.25rem".to_string(),
            line: "1.15".to_string(),
        }
    }
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            primary: "#2c3e50".to_string(),
            text: "#333333".to_string(),
            link: "#2563eb".to_string(),
            border: "#e5e7eb".to_string(),
            muted: "#666666".to_string(),
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            page: "0.5rem".to_string(),
        }
    }
}

impl ResumeStyle {
    /// The stylesheet placed in the `<style>` element of the head.
    pub fn to_css(&self) -> String {
        let Self {
            font_family,
            font_size,
            spacing,
            colors,
            margins,
        } = self;

        format!(
            r#"
* {{ margin: 0; padding: 0; box-sizing: border-box; font-family: {font_family}; line-height: {line}; }}
body {{ margin: {page} auto; color: {text}; padding: 0 {page}; }}
h1 {{ font-size: {h1}; color: {primary}; margin-bottom: {section}; text-align: center; font-weight: 600; }}
h2 {{ font-size: {h2}; color: {primary}; margin-bottom: {item}; border-bottom: 1px solid {border}; text-transform: uppercase; font-weight: 600; padding-bottom: 0.15rem; }}
nav {{ text-align: center; margin-bottom: {section}; font-size: {small}; }}
nav > * {{ margin: 0 0.25rem; }}
nav > * + *::before {{ content: "\2022"; margin: 0 0.25rem; color: {text}; }}
a {{ color: {link}; text-decoration: none; }}
section {{ margin-bottom: {section}; }}
.section-item {{ margin-bottom: {item}; position: relative; padding-right: 7rem; }}
p {{ font-size: {body}; margin-bottom: {item}; }}
.title {{ font-weight: 600; }}
.description ul {{ margin-left: 0.1rem; padding-left: 1rem; font-size: {body}; }}
.date-container {{ position: absolute; right: 0; top: 0; font-size: {small}; color: {muted}; font-style: italic; text-align: right; width: 11rem; overflow: hidden; white-space: nowrap; }}
.project-links {{ margin-top: 0.15rem; font-size: {small}; font-style: italic; }}
.project-links a {{ margin-right: 0.75rem; }}
"#,
            line = spacing.line,
            page = margins.page,
            text = colors.text,
            h1 = font_size.h1,
            h2 = font_size.h2,
            body = font_size.body,
            small = font_size.small,
            primary = colors.primary,
            border = colors.border,
            link = colors.link,
            muted = colors.muted,
            section = spacing.section,
            item = spacing.item,
        )
    }
}
