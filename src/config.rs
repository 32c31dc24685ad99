use crate::easing::Easing;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 480.0,
        }
    }
}

/// Timing of connector transitions and of the step driver, in logical time
/// units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimationConfig {
    pub duration: f64,
    pub step: f64,
    pub quick_step: f64,
    pub easing: Easing,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            duration: 0.5,
            step: 0.5,
            quick_step: 0.2,
            easing: Easing::Linear,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    pub padding: f32,
    pub background: String,
    pub stroke_width: f32,
    /// Draw shapes that are hidden at zero opacity instead of omitting them.
    pub keep_hidden: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            padding: 0.0,
            background: "#FFFFFF".to_string(),
            stroke_width: 1.5,
            keep_hidden: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub canvas: CanvasConfig,
    pub animation: AnimationConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::classic();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            canvas: CanvasConfig::default(),
            animation: AnimationConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    primary_color: Option<String>,
    primary_text_color: Option<String>,
    primary_border_color: Option<String>,
    line_color: Option<String>,
    cross_color: Option<String>,
    background: Option<String>,
    highlight_colors: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    canvas: Option<CanvasConfig>,
    animation: Option<AnimationConfig>,
    render: Option<RenderConfig>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;
    apply_config_file(&mut config, parsed)?;
    Ok(config)
}

/// Same as [`load_config`] but from an in-memory JSON string.
pub fn parse_config(json: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(json)?;
    apply_config_file(&mut config, parsed)?;
    Ok(config)
}

impl AnimationConfig {
    /// Every timing must be a finite, positive amount of logical time.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("duration", self.duration),
            ("step", self.step),
            ("quickStep", self.quick_step),
        ] {
            anyhow::ensure!(
                value.is_finite() && value > 0.0,
                "animation.{name} must be a positive number of time units, got {value}"
            );
        }
        Ok(())
    }
}

fn apply_config_file(config: &mut Config, parsed: ConfigFile) -> anyhow::Result<()> {
    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "modern" => config.theme = Theme::modern(),
            "classic" | "default" | "base" => config.theme = Theme::classic(),
            other => log::warn!("unknown theme `{other}`, keeping the default"),
        }
        config.render.background = config.theme.background.clone();
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.primary_color {
            config.theme.primary_color = v;
        }
        if let Some(v) = vars.primary_text_color {
            config.theme.primary_text_color = v;
        }
        if let Some(v) = vars.primary_border_color {
            config.theme.primary_border_color = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.cross_color {
            config.theme.cross_color = v;
        }
        if let Some(v) = vars.background {
            config.render.background = v.clone();
            config.theme.background = v;
        }
        if let Some(colors) = vars.highlight_colors {
            config.theme.highlight_colors.extend(colors);
        }
    }

    if let Some(canvas) = parsed.canvas {
        config.canvas = canvas;
    }
    if let Some(animation) = parsed.animation {
        animation.validate()?;
        config.animation = animation;
    }
    if let Some(render) = parsed.render {
        config.render = render;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_timings() {
        let config = Config::default();
        assert_eq!(config.animation.duration, 0.5);
        assert_eq!(config.animation.step, 0.5);
        assert_eq!(config.animation.quick_step, 0.2);
        assert_eq!(config.canvas.width, 640.0);
        assert_eq!(config.canvas.height, 480.0);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let config = parse_config(
            r##"{
                "theme": "modern",
                "themeVariables": { "lineColor": "#FF0000", "highlightColors": { "pivot": "#00FF00" } },
                "animation": { "duration": 1.0 }
            }"##,
        )
        .unwrap();
        assert_eq!(config.theme.line_color, "#FF0000");
        assert_eq!(config.theme.highlight_color("pivot"), Some("#00FF00"));
        assert!(config.theme.highlight_color("active").is_some());
        assert_eq!(config.animation.duration, 1.0);
        assert_eq!(config.animation.quick_step, 0.2);
        assert_eq!(config.canvas.width, 640.0);
    }

    #[test]
    fn non_positive_timings_are_rejected() {
        let err = parse_config(r#"{ "animation": { "step": 0 } }"#).unwrap_err();
        assert!(err.to_string().contains("animation.step"));
        let err = parse_config(r#"{ "animation": { "duration": -0.5 } }"#).unwrap_err();
        assert!(err.to_string().contains("animation.duration"));
        let err = parse_config(r#"{ "animation": { "quickStep": 0.0 } }"#).unwrap_err();
        assert!(err.to_string().contains("animation.quickStep"));
        assert!(Config::default().animation.validate().is_ok());
    }

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.theme.font_size, Theme::classic().font_size);
    }
}
