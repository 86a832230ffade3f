use clap::{Parser, ValueEnum};
use env_logger::Env;
use flashplan_core::{
    DEFAULT_MCUBOOT_SIZE, DEFAULT_SCRATCH_SIZE, DEFAULT_STORAGE_SIZE, NRF52840_FLASH_SIZE,
};
use log::*;

use std::{io::Write, path::PathBuf};

use crate::{footprint::footprint, generate::generate};

mod footprint;
mod generate;
mod report;

#[derive(Parser, Debug)]
enum Command {
    /// Compute the partition layout and write pm_static.yml and app.overlay
    Generate {
        /// Total flash capacity in bytes
        #[clap(long, default_value_t = NRF52840_FLASH_SIZE)]
        flash_size: u64,

        /// MCUboot bootloader partition size in bytes
        #[clap(long, default_value_t = DEFAULT_MCUBOOT_SIZE)]
        mcuboot_size: u64,

        /// Settings storage partition size in bytes
        #[clap(long, default_value_t = DEFAULT_STORAGE_SIZE)]
        storage_size: u64,

        /// MCUboot scratch partition size in bytes
        #[clap(long, default_value_t = DEFAULT_SCRATCH_SIZE)]
        scratch_size: u64,

        /// Size of each application slot; defaults to an equal split of the
        /// flash left after the fixed partitions
        #[clap(long)]
        slot_size: Option<u64>,

        /// Directory the artifacts are written to
        #[clap(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Report flash and RAM usage of the built images
    Footprint {
        /// Build directory holding the zephyr images
        #[clap(short, long, default_value = "build")]
        build_dir: PathBuf,

        /// pm_static.yml to compare the partition budgets against
        #[clap(long, default_value = "pm_static.yml")]
        pm_static: PathBuf,
    },
}

#[derive(Parser, Debug, Default)]
#[clap(version, about, long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Set the logging verbosity
    #[clap(short, long, value_enum, global = true, default_value_t = LogLevel::Info)]
    verbose: LogLevel,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Off => LevelFilter::Off,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default())
        .filter_level(cli.verbose.into())
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            let level = record.level();
            if level == Level::Info {
                writeln!(buf, "{}", record.args())
            } else {
                writeln!(buf, "{}: {}", record.level(), record.args())
            }
        })
        .init();

    let command = match cli.command {
        Some(command) => command,
        None => return Ok(()),
    };

    match command {
        Command::Generate {
            flash_size,
            mcuboot_size,
            storage_size,
            scratch_size,
            slot_size,
            out_dir,
        } => generate(
            flash_size,
            mcuboot_size,
            storage_size,
            scratch_size,
            slot_size,
            &out_dir,
        ),
        Command::Footprint {
            build_dir,
            pm_static,
        } => footprint(&build_dir, &pm_static),
    }
}
