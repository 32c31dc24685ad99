#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod easing;
pub mod error;
pub mod geometry;
pub mod procedures;
pub mod render;
pub mod scene;
pub mod scene_dump;
pub mod script;
pub mod step;
pub mod structures;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, load_config};
pub use error::SceneError;
pub use render::render_svg;
pub use scene::Canvas;
pub use script::{ScriptedProcedure, parse_scene};
pub use step::{ActiveLines, Step, StepDriver};
pub use theme::Theme;

/// Settings for [`render_scene`].
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub config: Config,
    /// Steps to take after the scene is built.
    pub steps: usize,
    /// Logical time to advance before rendering; `None` settles every
    /// pending transition.
    pub at: Option<f64>,
    pub seed: Option<u64>,
}

/// Builds a scene file, replays `options.steps` of its steps and renders the
/// result to SVG.
pub fn render_scene(input: &str, options: RenderOptions) -> anyhow::Result<String> {
    let scene = parse_scene(input)?;
    let mut config = options.config;
    if let Some(width) = scene.width {
        config.canvas.width = width;
    }
    if let Some(height) = scene.height {
        config.canvas.height = height;
    }
    let canvas = match options.seed {
        Some(seed) => Canvas::with_seed(&config, seed),
        None => Canvas::with_config(&config),
    };
    let mut driver = StepDriver::new(canvas, ActiveLines::default(), ScriptedProcedure::factory(scene));
    driver.start()?;
    for _ in 0..options.steps {
        if driver.next()?.is_done() {
            break;
        }
    }
    match options.at {
        Some(at) => driver.tick(at)?,
        None => driver.canvas_mut().settle(),
    }
    Ok(render_svg(driver.canvas(), &config.theme, &config.render))
}
