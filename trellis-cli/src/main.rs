use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use trellis_common::options::Options;
use trellis_common::table::MemoryTable;
use trellis_layout::chart::{ChartDefiner, ChartSize};
use trellis_scales::decorations::{supply_decorations, DecorationConfig};
use trellis_scales::mapper::linear::LinearMapper;
use trellis_scales::mapper::power::PowerMapper;
use trellis_scales::mapper::Mapper;
use trellis_text::measurement::FixedAdvanceMeasurer;

/// Chart layout from the command line
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lay out a chart document and print its definition as JSON
    Layout {
        /// Chart document with `table`, `options` and `size` (reads stdin when omitted)
        file_path: Option<PathBuf>,

        /// Override the document width
        #[arg(long)]
        width: Option<f64>,

        /// Override the document height
        #[arg(long)]
        height: Option<f64>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        pretty: bool,
    },

    /// Print the decorations chosen for a data range
    Ticks {
        #[arg(allow_hyphen_values = true)]
        min: f64,

        #[arg(allow_hyphen_values = true)]
        max: f64,

        /// Axis length in pixels
        #[arg(short, long, default_value_t = 400.0)]
        length: f64,

        #[arg(long, default_value_t = 40.0)]
        min_spacing: f64,

        #[arg(long, value_enum, default_value_t = TickScale::Linear)]
        scale: TickScale,

        /// Values closer to zero than this are treated linearly on a log scale
        #[arg(long, default_value_t = 1.0)]
        epsilon: f64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TickScale {
    Linear,
    Log,
}

#[derive(Deserialize)]
struct ChartDocument {
    table: MemoryTable,
    #[serde(default)]
    options: Options,
    #[serde(default)]
    size: ChartSize,
}

fn read_document(file_path: Option<&PathBuf>) -> anyhow::Result<ChartDocument> {
    let text = match file_path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            text
        }
    };
    serde_json::from_str(&text).context("Failed to parse chart document")
}

fn write_json(
    value: &impl serde::Serialize,
    output: Option<&PathBuf>,
    pretty: bool,
) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Logging goes to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let measurer = FixedAdvanceMeasurer::default();

    match cli.command {
        Commands::Layout {
            file_path,
            width,
            height,
            output,
            pretty,
        } => {
            let document = read_document(file_path.as_ref())?;
            let size = ChartSize {
                width: width.unwrap_or(document.size.width),
                height: height.unwrap_or(document.size.height),
            };
            if size.width <= 0.0 || size.height <= 0.0 {
                bail!("Chart size must be positive, got {}x{}", size.width, size.height);
            }
            let definition =
                ChartDefiner::new(&document.table, &document.options, &measurer, size).define()?;
            write_json(&definition, output.as_ref(), pretty)?;
        }
        Commands::Ticks {
            min,
            max,
            length,
            min_spacing,
            scale,
            epsilon,
        } => {
            let mapper: Mapper = match scale {
                TickScale::Linear => LinearMapper::new((min, max), (0.0, length)).into(),
                TickScale::Log => {
                    PowerMapper::try_new((min, max), (0.0, length), 10.0, epsilon)?.into()
                }
            };
            let config = DecorationConfig::default().with_min_spacing(min_spacing);
            let decorations = supply_decorations(&mapper, &config, &measurer);
            write_json(&decorations, None, true)?;
        }
    }
    Ok(())
}
