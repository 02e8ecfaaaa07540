use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use neonway_common::EnvironmentConfig;
use neonway_kernel::Environment;
use neonway_render::{DebugTextRenderer, RenderView, Renderer};
use neonway_tools::EnvironmentInspector;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "neonway-cli", about = "CLI tool for the neonway corridor")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Config file plus the overrides shared by every environment command.
#[derive(Args)]
struct ConfigArgs {
    /// Environment config (.yaml, .yml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the star count
    #[arg(long)]
    stars: Option<usize>,

    /// Override the star seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the lane width
    #[arg(long)]
    lane_width: Option<f32>,
}

impl ConfigArgs {
    fn resolve(&self) -> anyhow::Result<EnvironmentConfig> {
        let mut config = match &self.config {
            Some(path) => EnvironmentConfig::load(path)?,
            None => EnvironmentConfig::default(),
        };
        if let Some(stars) = self.stars {
            config.star_count = stars;
        }
        if let Some(seed) = self.seed {
            config.star_seed = seed;
        }
        if let Some(width) = self.lane_width {
            config.lane_width = width;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Run the corridor headless and print the text render
    Simulate {
        /// Number of ticks to run
        #[arg(short, long, default_value = "60")]
        ticks: u64,
        /// Seconds per tick
        #[arg(long, default_value = "0.016")]
        dt: f32,
        /// Velocity reported by the host (non-positive falls back to 5)
        #[arg(short, long, default_value = "5.0")]
        speed: f32,
        /// Lane count reported by the host
        #[arg(short, long, default_value = "3")]
        lanes: u32,
        /// Print a frame every N ticks (0 prints only the last)
        #[arg(long, default_value = "0")]
        every: u64,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Show lane separators and centers for a lane count
    Lanes {
        #[arg(default_value = "3")]
        count: u32,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Show the sun placement and shading at a point in time
    Sun {
        /// Seconds since mount
        #[arg(short, long, default_value = "0.0")]
        time: f32,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Print the effective config as YAML
    Config {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

fn mounted(config: EnvironmentConfig, speed: f32, lanes: u32) -> Environment {
    let mut env = Environment::new(config, Arc::new(speed), Arc::new(lanes));
    env.mount();
    env
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("neonway-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", neonway_common::crate_info());
            println!("render: {}", neonway_render::crate_info());
            println!("tools: {}", neonway_tools::crate_info());
            let defaults = EnvironmentConfig::default();
            println!(
                "defaults: stars={} lanes={} x {} sun_radius={} fog=[{}, {}]",
                defaults.star_count,
                defaults.lane_count,
                defaults.lane_width,
                defaults.sun_radius,
                defaults.lighting.fog_near,
                defaults.lighting.fog_far
            );
        }
        Commands::Simulate {
            ticks,
            dt,
            speed,
            lanes,
            every,
            config,
        } => {
            anyhow::ensure!(dt >= 0.0, "dt must be non-negative, got {dt}");
            let config = config.resolve()?;
            tracing::info!(ticks, dt, speed, lanes, "simulating");

            let mut env = mounted(config, speed, lanes);
            let renderer = DebugTextRenderer::new();
            let view = RenderView::default();
            for i in 1..=ticks {
                env.tick(i as f32 * dt, dt);
                if every > 0 && i % every == 0 && i != ticks {
                    print!("{}", renderer.render(&env, &view));
                }
            }
            print!("{}", renderer.render(&env, &view));
            println!(
                "{}",
                EnvironmentInspector::summary(&env, view.view_matrix())
            );
        }
        Commands::Lanes { count, config } => {
            anyhow::ensure!(count > 0, "lane count must be at least 1");
            let env = mounted(config.resolve()?, 0.0, count);
            if let Some(info) = EnvironmentInspector::lanes(&env) {
                println!("{info}");
            }
        }
        Commands::Sun { time, config } => {
            let mut env = mounted(config.resolve()?, 0.0, 3);
            env.tick(time, 0.0);
            if let Some(info) = EnvironmentInspector::sun(&env) {
                println!("{info}");
            }
            if let Some(layers) = env.layers() {
                for step in 0..=4 {
                    let v = step as f32 / 4.0;
                    println!("  v={v:.2} color={}", layers.sun.shade(v));
                }
            }
        }
        Commands::Config { config } => {
            print!("{}", config.resolve()?.to_yaml_string()?);
        }
    }

    Ok(())
}
