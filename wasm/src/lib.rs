use algoviz::{RenderOptions, Theme, render_scene};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    steps: Option<usize>,
    at: Option<f64>,
    seed: Option<u64>,
}

fn build_render_options(options: SceneRenderOptions) -> RenderOptions {
    let mut render_options = RenderOptions::default();
    if options.theme.as_deref() == Some("modern") {
        render_options.config.theme = Theme::modern();
    }
    if let Some(font_family) = options.font_family {
        render_options.config.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        render_options.config.theme.font_size = font_size;
    }
    render_options.steps = options.steps.unwrap_or(0);
    render_options.at = options.at;
    render_options.seed = options.seed;
    render_options
}

/// Renders a JSON5 scene file after replaying `steps` of its steps.
#[wasm_bindgen]
pub fn render_scene_svg(scene: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<SceneRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        SceneRenderOptions::default()
    };

    render_scene(scene, build_render_options(options)).map_err(|error| JsValue::from_str(&error.to_string()))
}
