use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use worldcmd_core::Locals;
use worldcmd_dispatch::{Dispatcher, DispatcherConfig, to_json, to_yaml};

mod demo;

use demo::{Actor, EditSession, actor_locals};

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "WORLDCMD_LOG";

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "worldcmd")]
#[command(about = "Resolve, dispatch and complete world-edit style commands")]
struct Cli {
    /// Log resolution details to stderr (overridden by WORLDCMD_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Execute command lines through the dispatcher.
    Run(RunArgs),
    /// Print completions for a partially typed line.
    Suggest(SuggestArgs),
    /// Print help data for the commands visible to the actor.
    List(ListArgs),
}

#[derive(Debug, Args)]
struct ActorArgs {
    /// Dispatcher configuration file (YAML).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Name of the issuing actor.
    #[arg(long, default_value = "console")]
    actor: String,
    /// Permission granted to the actor; repeatable. Without any grant the
    /// actor holds every permission.
    #[arg(long = "grant")]
    grants: Vec<String>,
}

impl ActorArgs {
    fn dispatcher(&self) -> Result<Dispatcher, String> {
        let config = match &self.config {
            Some(path) => DispatcherConfig::load(path)
                .map_err(|err| format!("failed to load config {}: {err}", path.display()))?,
            None => DispatcherConfig::default(),
        };
        demo::dispatcher(config).map_err(|err| format!("failed to register commands: {err}"))
    }

    fn locals(&self) -> (Arc<Actor>, Locals) {
        let permissions = if self.grants.is_empty() {
            vec!["*".to_string()]
        } else {
            self.grants.clone()
        };
        let actor = Arc::new(Actor::new(&self.actor, permissions));
        let locals = actor_locals(Arc::clone(&actor), Arc::new(EditSession::new()));
        (actor, locals)
    }
}

#[derive(Debug, Args)]
struct RunArgs {
    #[command(flatten)]
    actor: ActorArgs,
    /// Command lines to execute; read from stdin when omitted.
    #[arg(allow_hyphen_values = true)]
    lines: Vec<String>,
}

#[derive(Debug, Args)]
struct SuggestArgs {
    #[command(flatten)]
    actor: ActorArgs,
    /// Partially typed command line.
    #[arg(allow_hyphen_values = true)]
    partial: String,
}

#[derive(Debug, Args)]
struct ListArgs {
    #[command(flatten)]
    actor: ActorArgs,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Run(args) => run_dispatch(args),
        Command::Suggest(args) => run_suggest(args),
        Command::List(args) => run_list(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run_dispatch(args: RunArgs) -> Result<(), String> {
    let dispatcher = args.actor.dispatcher()?;
    let (actor, locals) = args.actor.locals();

    let lines = if args.lines.is_empty() {
        io::stdin()
            .lock()
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| format!("failed to read stdin: {err}"))?
    } else {
        args.lines
    };

    let mut total = 0;
    let mut failed = 0;
    for line in lines.iter().filter(|line| !line.trim().is_empty()) {
        total += 1;
        let outcome = dispatcher.dispatch(line, &locals);
        for message in actor.take_messages() {
            println!("{message}");
        }
        match outcome {
            Ok(true) => {}
            Ok(false) => {
                eprintln!("Unknown command: {}", line.trim());
                failed += 1;
            }
            Err(err) => {
                debug!(line = line.as_str(), error = ?err, "command failed");
                eprintln!("{err}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(format!("{failed} of {total} command lines failed"));
    }
    Ok(())
}

fn run_suggest(args: SuggestArgs) -> Result<(), String> {
    let dispatcher = args.actor.dispatcher()?;
    let (_, locals) = args.actor.locals();

    for proposal in dispatcher.suggest(&args.partial, &locals) {
        println!("{}", proposal.text());
    }
    Ok(())
}

fn run_list(args: ListArgs) -> Result<(), String> {
    let dispatcher = args.actor.dispatcher()?;
    let (_, locals) = args.actor.locals();

    let help = dispatcher.help(&locals);
    let output = match args.format {
        CliOutputFormat::Json => to_json(&help),
        CliOutputFormat::Yaml => to_yaml(&help),
    }
    .map_err(|err| format!("failed to render help: {err}"))?;
    println!("{}", output.trim_end());
    Ok(())
}
