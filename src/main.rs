use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io::Write;
use std::path::PathBuf;

mod commands;

/// enginedist - Bundle engine modules into a distribution
#[derive(Parser)]
#[command(name = "enginedist")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and download the modules a distribution bundles
    Modules {
        /// The key of the distribution to package
        #[arg(long)]
        dist_key: String,

        /// The folder where the engine is built
        #[arg(long)]
        engine_folder: PathBuf,

        /// Directory modules are extracted into (<dir>/<name>/<version>)
        #[arg(long)]
        target_dir: PathBuf,

        /// Profile.json that receives the resolved module list
        #[arg(long)]
        profile: PathBuf,

        /// Distribution manifest
        #[arg(long, default_value = enginedist::MANIFEST_NAME)]
        manifest: PathBuf,

        /// Replace existing profile entries with the same module name instead of appending
        #[arg(long)]
        dedupe_profile: bool,

        /// Show what would be bundled without downloading or writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// List the modules a distribution bundles, including its includes
    EffectiveModules {
        /// The key of the distribution
        #[arg(long)]
        dist_key: String,

        /// Distribution manifest
        #[arg(long, default_value = enginedist::MANIFEST_NAME)]
        manifest: PathBuf,
    },

    /// Show the engine's plugin and subsystem API versions
    ApiVersions {
        /// The folder where the engine is built
        #[arg(long)]
        engine_folder: PathBuf,
    },

    /// Show the release tag and artifact names from the environment
    ReleaseInfo {
        /// Distribution key, for the bundled archive name
        #[arg(long)]
        dist_key: Option<String>,

        /// Distribution manifest
        #[arg(long, default_value = enginedist::MANIFEST_NAME)]
        manifest: PathBuf,

        /// Also require the code-signing credentials to be set
        #[arg(long)]
        require_signing: bool,
    },

    /// Point an EngineSettings.json at the distribution's indexes
    UpdateSettings {
        /// The key of the distribution
        #[arg(long)]
        dist_key: String,

        /// Path to EngineSettings.json
        #[arg(long)]
        settings: PathBuf,

        /// Distribution manifest
        #[arg(long, default_value = enginedist::MANIFEST_NAME)]
        manifest: PathBuf,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Initialize the logger; RUST_LOG overrides the level
fn init_logger(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[Distribute] {} {} {}",
                buf.timestamp_millis(),
                record.level(),
                record.args()
            )
        })
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let result = match cli.command {
        Commands::Modules {
            dist_key,
            engine_folder,
            target_dir,
            profile,
            manifest,
            dedupe_profile,
            dry_run,
        } => commands::modules::run(commands::modules::ModulesArgs {
            dist_key,
            engine_folder,
            target_dir,
            profile,
            manifest,
            dedupe_profile,
            dry_run,
        }),
        Commands::EffectiveModules { dist_key, manifest } => {
            commands::effective_modules::run(&dist_key, &manifest)
        }
        Commands::ApiVersions { engine_folder } => commands::api_versions::run(&engine_folder),
        Commands::ReleaseInfo {
            dist_key,
            manifest,
            require_signing,
        } => commands::release_info::run(dist_key.as_deref(), &manifest, require_signing),
        Commands::UpdateSettings {
            dist_key,
            settings,
            manifest,
        } => commands::update_settings::run(&dist_key, &settings, &manifest),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "enginedist", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
