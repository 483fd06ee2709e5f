//! Command line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Raster Foundry batch tasks.
#[derive(Parser, Debug)]
#[command(name = "rf-tasks", version, about)]
pub struct Cli {
    /// Path to a TOML config file.
    #[arg(long, env = "RF_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ingest a scene into the tile server.
    IngestScene(IngestSceneArgs),
}

#[derive(Args, Debug)]
pub struct IngestSceneArgs {
    /// ID of the scene to ingest.
    pub scene_id: String,

    /// Ingest even if the scene was already ingested or is ingesting.
    #[arg(long)]
    pub ignore_previous: bool,

    /// Run Spark locally instead of on the EMR cluster.
    #[arg(long)]
    pub local: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingest_scene() {
        let cli = Cli::try_parse_from([
            "rf-tasks",
            "ingest-scene",
            "3c0a8f6e-1d2b-4c5e-8f9a-0b1c2d3e4f50",
            "--local",
        ])
        .unwrap();

        assert_eq!(cli.log_format, LogFormat::Pretty);
        let Command::IngestScene(args) = cli.command;
        assert_eq!(args.scene_id, "3c0a8f6e-1d2b-4c5e-8f9a-0b1c2d3e4f50");
        assert!(args.local);
        assert!(!args.ignore_previous);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "rf-tasks",
            "ingest-scene",
            "scene-1",
            "--ignore-previous",
            "--config",
            "/etc/rf/tasks.toml",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/etc/rf/tasks.toml")));
        assert_eq!(cli.log_format, LogFormat::Json);
        let Command::IngestScene(args) = cli.command;
        assert!(args.ignore_previous);
        assert!(!args.local);
    }

    #[test]
    fn test_scene_id_required() {
        assert!(Cli::try_parse_from(["rf-tasks", "ingest-scene"]).is_err());
    }
}
