use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use phishlens::handlers::{
    handle_batch, handle_email, handle_inspect, handle_model_info, handle_predict, print_banner,
};
use tracing_subscriber::EnvFilter;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");
    let verbose = chosen_command.get_flag("verbose");

    init_logging(verbose);

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    let outcome = match chosen_command.subcommand() {
        Some(("predict", primary_command)) => handle_predict(primary_command).await,
        Some(("batch", primary_command)) => handle_batch(primary_command).await,
        Some(("email", primary_command)) => handle_email(primary_command),
        Some(("inspect", primary_command)) => handle_inspect(primary_command).await,
        Some(("model-info", primary_command)) => handle_model_info(primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = outcome {
        fail(&chosen_command, e);
    }
}

/// Logs go to stderr so reports on stdout stay pipeable. `RUST_LOG` wins
/// over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose {
        "phishlens=debug,phishlens_core=debug,phishlens_scanner=debug"
    } else {
        "phishlens=info,phishlens_core=info,phishlens_scanner=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn fail(matches: &ArgMatches, error: anyhow::Error) -> ! {
    let command = matches.subcommand_name().unwrap_or("phishlens");
    eprintln!("{} {}: {:#}", "✗".red().bold(), command, error);
    std::process::exit(1);
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
