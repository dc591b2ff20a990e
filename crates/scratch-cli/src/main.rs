mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, lesson::LessonSubcommand, llm::LlmSubcommand, task::TaskSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "scratch",
    about = "Agent scratchpad: track the current task's steps and query LLM providers",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .scratch/ or .git/)
    #[arg(long, global = true, env = "SCRATCH_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .scratch/ with a default config, an empty scratchpad and lessons file
    Init,

    /// Plan and track the current task
    Task {
        #[command(subcommand)]
        subcommand: TaskSubcommand,
    },

    /// Record and list lessons learned
    Lesson {
        #[command(subcommand)]
        subcommand: LessonSubcommand,
    },

    /// Send prompts to an LLM provider
    Llm {
        #[command(subcommand)]
        subcommand: LlmSubcommand,
    },

    /// Show or validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    // Results go to stdout; diagnostics stay on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, cli.json),
        Commands::Task { subcommand } => cmd::task::run(&root, subcommand, cli.json),
        Commands::Lesson { subcommand } => cmd::lesson::run(&root, subcommand, cli.json),
        Commands::Llm { subcommand } => cmd::llm::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
