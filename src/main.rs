use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};

use strata::mesh::CubeMesher;
use strata::stream::read_events;
use strata::{AssetLoader, Config, DispatchController, HeadlessScene};

#[derive(Parser, Debug)]
#[command(name = "strata", version, about = "Voxel section streaming and meshing")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a JSON-lines world stream through a headless scene
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Stream file, one event per line
    stream: PathBuf,
    #[arg(long, default_value = "strata.toml")]
    config: PathBuf,
    #[arg(long)]
    workers: Option<usize>,
    #[arg(long)]
    tick_ms: Option<u64>,
    /// Data version to start with, before the stream's own version events
    #[arg(long = "version")]
    data_version: Option<String>,
    /// Upper bound for each settle
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,
    #[arg(long)]
    log_level: Option<String>,
}

fn init_logging(cfg: &Config) {
    let level = cfg.level_filter();
    let log_cfg = ConfigBuilder::new().build();
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        log_cfg.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = &cfg.log.file {
        match File::create(path) {
            Ok(f) => loggers.push(WriteLogger::new(level, log_cfg, f)),
            Err(e) => eprintln!("cannot open log file {}: {}", path.display(), e),
        }
    }
    let _ = CombinedLogger::init(loggers);
}

fn replay(args: ReplayArgs) -> Result<bool, Box<dyn Error>> {
    let mut cfg = Config::load(&args.config)?;
    cfg.apply_env();
    if let Some(w) = args.workers {
        cfg.workers = w;
    }
    if let Some(t) = args.tick_ms {
        cfg.tick_ms = t;
    }
    if let Some(level) = args.log_level {
        cfg.log.level = level;
    }
    init_logging(&cfg);

    let mut assets = AssetLoader::from_config(&cfg.assets);
    let mut ctl = DispatchController::new(
        cfg.pool_config(),
        Arc::new(CubeMesher::new()),
        HeadlessScene::new(),
    )?;
    if let Some(path) = &cfg.assets.table_override {
        let table = strata::blocks::BlockStateTable::from_path(path)?;
        ctl.set_block_table(Some(Arc::new(table)));
    }
    ctl.set_texture_override(cfg.assets.texture_override.clone());

    let timeout = Duration::from_millis(args.timeout_ms);
    if let Some(v) = &args.data_version {
        ctl.set_version(v, &mut assets);
    }

    let events = read_events(BufReader::new(File::open(&args.stream)?));
    log::info!("replaying {} events from {:?}", events.len(), args.stream);
    let mut ok = true;
    for ev in events {
        ok &= ev.apply(&mut ctl, &mut assets, timeout);
        ctl.pump();
    }
    ok &= ctl.wait_until_settled(timeout);

    let stats = ctl.stats();
    log::info!(
        "columns {} meshes {} triangles {} | marks {} completions {} applied {} empty {} stale {} disposed {}",
        ctl.loaded_columns(),
        ctl.live_meshes(),
        ctl.scene().triangle_count(),
        stats.marks,
        stats.completions,
        stats.geometry_applied,
        stats.empty_geometry,
        stats.stale_discarded,
        stats.meshes_disposed
    );
    Ok(ok)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let res = match cli.command {
        Command::Replay(args) => replay(args),
    };
    match res {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("strata: {e}");
            ExitCode::FAILURE
        }
    }
}
