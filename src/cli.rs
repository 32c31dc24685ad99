use crate::config::{Config, load_config};
use crate::procedures::BubbleSortProcedure;
use crate::render::{render_svg, write_output_svg};
use crate::scene::Canvas;
use crate::scene_dump::write_scene_dump;
use crate::script::{ScriptedProcedure, parse_scene};
use crate::step::{ActiveLines, ProcedureFactory, StepDriver};
use crate::structures::{GenerationKind, StructureOptions};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "algoviz", version, about = "Render algorithm visualization scenes to SVG")]
pub struct Args {
    /// Scene file (.json5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png/json). Defaults to stdout for SVG and JSON.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme, themeVariables, animation, canvas, render)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Canvas width, overriding the config and the scene file
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Canvas height, overriding the config and the scene file
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Steps to take after the procedure starts
    #[arg(long = "steps", default_value_t = 0)]
    pub steps: usize,

    /// Logical time to advance before rendering. Without it every pending
    /// transition is settled.
    #[arg(long = "at")]
    pub at: Option<f64>,

    /// Run a built-in procedure instead of a scene file
    #[arg(long = "demo", value_enum)]
    pub demo: Option<Demo>,

    /// Seed for randomly generated values
    #[arg(long = "seed")]
    pub seed: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    BubbleSort,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())
        .with_context(|| format!("failed to load config {:?}", args.config))?;

    let factory = match args.demo {
        Some(Demo::BubbleSort) => demo_factory(),
        None => {
            let input = read_input(args.input.as_deref())?;
            let scene = parse_scene(&input)?;
            if let Some(width) = scene.width {
                config.canvas.width = width;
            }
            if let Some(height) = scene.height {
                config.canvas.height = height;
            }
            ScriptedProcedure::factory(scene)
        }
    };
    if let Some(width) = args.width {
        config.canvas.width = width;
    }
    if let Some(height) = args.height {
        config.canvas.height = height;
    }

    let canvas = match args.seed {
        Some(seed) => Canvas::with_seed(&config, seed),
        None => Canvas::with_config(&config),
    };
    let mut driver = StepDriver::new(canvas, ActiveLines::default(), factory);
    drive(&mut driver, args.steps, args.at)?;
    log::info!(
        "rendering after {} steps, active lines {:?}",
        driver.steps_taken(),
        driver.panel().lines()
    );

    write_output(&args, &config, driver.canvas())
}

fn demo_factory() -> ProcedureFactory {
    let options = StructureOptions {
        x: Some(40.0),
        y: Some(120.0),
        radius: Some(20.0),
        kind: Some(GenerationKind::Random),
        num: Some(8),
        max: Some(100),
        ..Default::default()
    };
    BubbleSortProcedure::factory(options, None)
}

/// Starts the procedure, takes `steps` further steps (stopping early once it
/// finishes), then either advances the clock by `at` or settles.
fn drive(driver: &mut StepDriver, steps: usize, at: Option<f64>) -> Result<()> {
    driver.start()?;
    for _ in 0..steps {
        if driver.is_done() {
            log::info!("procedure finished after {} steps", driver.steps_taken());
            break;
        }
        driver.next()?;
    }
    match at {
        Some(at) => driver.tick(at)?,
        None => driver.canvas_mut().settle(),
    }
    Ok(())
}

fn write_output(args: &Args, config: &Config, canvas: &Canvas) -> Result<()> {
    match args.output_format {
        OutputFormat::Svg => {
            let svg = render_svg(canvas, &config.theme, &config.render);
            write_output_svg(&svg, args.output.as_deref())
        }
        OutputFormat::Json => write_scene_dump(args.output.as_deref(), canvas),
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_png(canvas, config, &output)
        }
    }
}

#[cfg(feature = "png")]
fn write_png(canvas: &Canvas, config: &Config, output: &Path) -> Result<()> {
    let svg = render_svg(canvas, &config.theme, &config.render);
    crate::render::write_output_png(&svg, output)
}

#[cfg(not(feature = "png"))]
fn write_png(_canvas: &Canvas, _config: &Config, _output: &Path) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}
