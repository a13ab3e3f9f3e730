//! Command-line entry point: activity export in, OpenSCAD skyline out.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use activity_skyline::{build_scene, load_activity_grid, SkylineConfig, SkylineError};
use clap::{ArgAction, Parser, ValueHint};
use log::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Build a 3D-printable skyline of a year of activities", long_about = None)]
struct Cli {
    /// Strava `activities.csv` export
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Activity type to include
    #[arg(long, default_value = "Run")]
    activity_type: String,

    /// First day included (m/d/Y)
    #[arg(long, default_value = "1/1/2024")]
    min_date: String,

    /// Last day included (m/d/Y), same calendar year as --min-date
    #[arg(long, default_value = "12/31/2024")]
    max_date: String,

    /// Output file name, relative to --output-dir
    #[arg(short, long, default_value = "skyline.scad", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Directory for generated files
    #[arg(long, default_value = "output", value_hint = ValueHint::DirPath)]
    output_dir: PathBuf,

    /// Write into a fresh YYYYmmdd_HHMMSS subdirectory of --output-dir
    #[arg(long, action = ArgAction::SetTrue)]
    timestamped: bool,

    /// Also write the CSG tree as JSON next to the model
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// JSON file with skyline settings; flags below override it
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    #[arg(long)]
    base_height: Option<f64>,

    #[arg(long)]
    border_spacing: Option<f64>,

    /// Label on the left of the front face
    #[arg(long)]
    label_left: Option<String>,

    /// Label on the right of the front face
    #[arg(long)]
    label_right: Option<String>,

    #[arg(long)]
    max_bar_height: Option<f64>,

    #[arg(long)]
    scale_factor: Option<f64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace prints the grid)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn skyline_config(&self) -> Result<SkylineConfig, SkylineError> {
        let mut config = match &self.config {
            Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
            None => SkylineConfig::default(),
        };
        if let Some(v) = self.base_height {
            config.base_height = v;
        }
        if let Some(v) = self.border_spacing {
            config.border_spacing = v;
        }
        if let Some(v) = &self.label_left {
            config.label_left = v.clone();
        }
        if let Some(v) = &self.label_right {
            config.label_right = v.clone();
        }
        if let Some(v) = self.max_bar_height {
            config.max_bar_height = v;
        }
        if let Some(v) = self.scale_factor {
            config.scale_factor = v;
        }
        Ok(config)
    }

    fn output_dir(&self) -> PathBuf {
        if self.timestamped {
            let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
            self.output_dir.join(stamp)
        } else {
            self.output_dir.clone()
        }
    }
}

fn run(cli: &Cli) -> Result<PathBuf, SkylineError> {
    let config = cli.skyline_config()?;
    config.validate()?;

    let grid = load_activity_grid(&cli.input, &cli.activity_type, &cli.min_date, &cli.max_date)?;
    let scene = build_scene(&grid, &config)?;

    let dir = cli.output_dir();
    let scad_path = dir.join(&cli.output);
    scene.write_scad(&scad_path)?;

    if cli.json {
        scene.write_json(json_path(&scad_path))?;
    }

    info!(
        "{} {}..{}: {} active days, {:.1} mi total, busiest day {:.1} mi",
        cli.activity_type,
        cli.min_date,
        cli.max_date,
        grid.active_days(),
        grid.total(),
        grid.max_value()
    );
    Ok(scad_path)
}

fn json_path(scad_path: &Path) -> PathBuf {
    scad_path.with_extension("json")
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(path) => {
            println!("OpenSCAD file with text saved as {}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
