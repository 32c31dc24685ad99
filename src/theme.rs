use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub primary_color: String,
    pub primary_text_color: String,
    pub primary_border_color: String,
    pub line_color: String,
    pub cross_color: String,
    pub background: String,
    /// Fill colour per highlight tag, emitted as `.highlight-<tag>` rules.
    pub highlight_colors: BTreeMap<String, String>,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 16.0,
            primary_color: "#FFFFFF".to_string(),
            primary_text_color: "#333333".to_string(),
            primary_border_color: "#333333".to_string(),
            line_color: "#333333".to_string(),
            cross_color: "#999999".to_string(),
            background: "#FFFFFF".to_string(),
            highlight_colors: highlight_palette([
                ("active", "#FFE08A"),
                ("compare", "#9FD3FF"),
                ("swap", "#FFB3A7"),
                ("done", "#B8E6B0"),
            ]),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            primary_color: "#F8FAFF".to_string(),
            primary_text_color: "#1C2430".to_string(),
            primary_border_color: "#C7D2E5".to_string(),
            line_color: "#7A8AA6".to_string(),
            cross_color: "#C7D2E5".to_string(),
            background: "#FFFFFF".to_string(),
            highlight_colors: highlight_palette([
                ("active", "#FDE68A"),
                ("compare", "#BFDBFE"),
                ("swap", "#FECACA"),
                ("done", "#BBF7D0"),
            ]),
        }
    }

    pub fn highlight_color(&self, tag: &str) -> Option<&str> {
        self.highlight_colors.get(tag).map(String::as_str)
    }
}

fn highlight_palette<const N: usize>(entries: [(&str, &str); N]) -> BTreeMap<String, String> {
    entries
        .into_iter()
        .map(|(tag, color)| (tag.to_string(), color.to_string()))
        .collect()
}
