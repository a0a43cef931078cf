use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use cutio_engine::config::EngineConfig;
use cutio_engine::error::Result;
use cutio_engine::ops::migrations::migrate_timeline;
use cutio_engine::ops::time_math::{clip_boundaries, clip_duration};
use cutio_engine::types::project::ProjectRecord;

#[derive(Parser, Debug)]
#[command(name = "cutio-engine")]
#[command(about = "Inspect and upgrade saved timeline projects")]
#[command(version)]
struct Cli {
    /// TOML file with engine tunables.
    #[arg(short, long, global = true, default_value = "cutio.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upgrade a saved project to the current timeline schema.
    Migrate {
        file: PathBuf,
        /// Report what would change without writing.
        #[arg(long)]
        dry_run: bool,
        /// Write the result here instead of over the input.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print clip positions and durations.
    Inspect { file: PathBuf },
}

fn migrate(file: PathBuf, dry_run: bool, output: Option<PathBuf>) -> Result<()> {
    let mut record = ProjectRecord::load_from_file(&file)?;
    let migrated = migrate_timeline(record.timeline);
    record.timeline = migrated.timeline;
    if !migrated.changed {
        println!("{}: already current", file.display());
        return Ok(());
    }
    if dry_run {
        println!("{}: would migrate ({} clip(s))", file.display(), record.timeline.clips.len());
        return Ok(());
    }
    let target = output.unwrap_or(file);
    record.save_to_file(&target)?;
    log::info!("wrote migrated project {} to {}", record.id, target.display());
    println!("{}: migrated", target.display());
    Ok(())
}

fn inspect(file: PathBuf, config: &EngineConfig) -> Result<()> {
    let record = ProjectRecord::load_from_file(&file)?;
    let timeline = &record.timeline;
    println!("project {} ({})", record.id, timeline.version.as_str());
    let starts = timeline.clip_starts();
    for (i, (clip, start)) in timeline.clips.iter().zip(&starts).enumerate() {
        println!(
            "{i:>3}  {:<24} upload {:<6} start {:>7.1}s  length {:>6.1}s",
            clip.id,
            clip.upload_id,
            start,
            clip_duration(clip)
        );
    }
    let total = timeline.total_duration();
    println!("total {total:.1}s, playhead {:.1}s", timeline.playhead_seconds);
    println!("boundaries {:?}", clip_boundaries(&timeline.clips));
    println!("ruler width {:.0}px at {} px/s", total * config.px_per_second, config.px_per_second);
    if timeline.clips.iter().any(|c| c.has_freeze_padding()) || timeline.audio_track.is_some() {
        println!("legacy fields present, run `migrate`");
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = EngineConfig::load_from_file(&cli.config).and_then(|config| match cli.command {
        Command::Migrate { file, dry_run, output } => migrate(file, dry_run, output),
        Command::Inspect { file } => inspect(file, &config),
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
