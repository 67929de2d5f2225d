use crate::CLAP_STYLING;
use clap::{Arg, arg, command};
use std::path::PathBuf;

fn model_arg(default: &'static str) -> Arg {
    arg!(-m --"model" <PATH>)
        .required(false)
        .help("Path to the JSON model bundle")
        .value_parser(clap::value_parser!(String))
        .default_value(default)
}

fn format_arg() -> Arg {
    arg!(-f --"format" <FORMAT>)
        .required(false)
        .help("Report format: text, json")
        .value_parser(["text", "json"])
        .default_value("text")
}

fn output_arg() -> Arg {
    arg!(-o --"output" <PATH>)
        .required(false)
        .help("Save report to file (default: display to screen)")
        .value_parser(clap::value_parser!(PathBuf))
}

fn timeout_arg() -> Arg {
    arg!(--"timeout" <SECONDS>)
        .required(false)
        .help("Per-attempt fetch timeout in seconds (at least 1)")
        .value_parser(clap::value_parser!(u64).range(1..))
        .default_value("15")
}

/// Flags shared by the commands that run the full URL pipeline.
fn pipeline_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(model_arg("~/.config/phishlens/url_model.json"))
        .arg(
            arg!(--"offline")
                .required(false)
                .help("Skip reputation lookups; their features take failure sentinels")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(--"page-rank-key" <KEY>)
                .required(false)
                .help("Open PageRank API key")
                .env("PHISHLENS_OPR_KEY"),
        )
        .arg(
            arg!(--"suffix-list" <PATH>)
                .required(false)
                .help("Public suffix list to use instead of the bundled one"),
        )
        .arg(timeout_arg())
        .arg(format_arg())
        .arg(output_arg())
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("phishlens")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("phishlens")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(arg!(-v --"verbose" "Enable debug logging").required(false))
        .subcommand_required(false)
        .subcommand(pipeline_args(
            command!("predict")
                .about("Score a single URL for phishing likelihood")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The URL to score (https:// is assumed when no scheme is given)"),
                ),
        ))
        .subcommand(pipeline_args(
            command!("batch")
                .about("Score up to 100 URLs from a file, preserving input order")
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(true)
                        .help("Path to a newline-delimited file of URLs (http:// is assumed)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("Number of URLs fetched concurrently (1-10)")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("5"),
                ),
        ))
        .subcommand(
            command!("email")
                .about("Score an email address for phishing likelihood")
                .arg(
                    arg!(-e --"email" <ADDRESS>)
                        .required(true)
                        .help("The email address to score"),
                )
                .arg(model_arg("~/.config/phishlens/email_model.json"))
                .arg(
                    arg!(--"suffix-list" <PATH>)
                        .required(false)
                        .help("Public suffix list to use instead of the bundled one"),
                )
                .arg(format_arg())
                .arg(output_arg()),
        )
        .subcommand(
            command!("inspect")
                .about("Fetch a URL and report what the extractor sees, for troubleshooting")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The URL to inspect"),
                )
                .arg(timeout_arg())
                .arg(format_arg())
                .arg(output_arg()),
        )
        .subcommand(
            command!("model-info")
                .about("Show metadata of a model bundle")
                .arg(model_arg("~/.config/phishlens/url_model.json"))
                .arg(format_arg()),
        )
}
