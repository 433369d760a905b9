mod cmd;
mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use packermate_lib::Target;

use crate::output::print_error;

#[derive(Parser)]
#[command(name = "packermate")]
#[command(author, version, about = "Generate and run Packer builds from flat YAML configuration")]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Generate packer.json, validate it and run packer build
  Build {
    /// Targets to build (default: the `targets` configuration key)
    #[arg(value_enum)]
    targets: Vec<TargetArg>,

    #[command(flatten)]
    config: ConfigArgs,

    /// Validate the generated configuration without building
    #[arg(long)]
    dry_run: bool,

    /// Also write the generated configuration to ./packer.json
    #[arg(long)]
    dump: bool,
  },

  /// Print the generated Packer configuration without running packer
  Render {
    /// Targets to render (default: the `targets` configuration key)
    #[arg(value_enum)]
    targets: Vec<TargetArg>,

    #[command(flatten)]
    config: ConfigArgs,
  },
}

#[derive(Args)]
struct ConfigArgs {
  /// Configuration file (default: packermate.yml when present)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Override a configuration value
  #[arg(long = "set", value_name = "KEY=VALUE")]
  overrides: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TargetArg {
  Virtualbox,
  Aws,
}

impl From<TargetArg> for Target {
  fn from(arg: TargetArg) -> Self {
    match arg {
      TargetArg::Virtualbox => Target::Virtualbox,
      TargetArg::Aws => Target::Aws,
    }
  }
}

fn targets(args: Vec<TargetArg>) -> Vec<Target> {
  args.into_iter().map(Target::from).collect()
}

fn main() {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Build {
      targets: target_args,
      config,
      dry_run,
      dump,
    } => cmd::cmd_build(
      config.config.as_deref(),
      &config.overrides,
      &targets(target_args),
      dry_run,
      dump,
    ),
    Commands::Render {
      targets: target_args,
      config,
    } => cmd::cmd_render(config.config.as_deref(), &config.overrides, &targets(target_args)),
  };

  if let Err(err) = result {
    print_error(&format!("{:#}", err));
    std::process::exit(1);
  }
}
