use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use phishlens_core::analyze::{Analyzer, BatchEntry, BatchProgressCallback};
use phishlens_core::config::AnalyzerConfig;
use phishlens_core::diagnose::diagnose;
use phishlens_core::email::EmailAnalyzer;
use phishlens_core::model::ModelBundle;
use phishlens_core::report::{self, ReportFormat};
use phishlens_core::url::{DefaultScheme, UrlNormalizer};
use phishlens_scanner::Fetcher;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub fn print_banner() {
    let banner = r#"
         __   _      __   __
   ___  / /  (_)__ / /  / /__ ___  ___
  / _ \/ _ \/ (_-</ _ \/ / -_) _ \(_-<
 / .__/_//_/_/___/_//_/_/\__/_//_/___/
/_/"#;
    eprintln!("{}", banner.bright_cyan().bold());
    eprintln!(
        "{}\n",
        format!("  phishing likelihood scoring v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}

/// Expand a leading `~` in a user-supplied path.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Load and parse URLs from a file
pub fn load_urls_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content.lines().filter_map(parse_url_line).collect();

    if urls.is_empty() {
        return Err(format!("No URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// One URL per line; blank lines and `#` comments yield nothing. Scheme
/// defaulting is left to the analyzer.
pub fn parse_url_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    Some(line.to_string())
}

pub fn report_format(args: &ArgMatches) -> ReportFormat {
    args.get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text)
}

/// Build the analyzer configuration from whichever pipeline flags the
/// subcommand defines.
pub fn analyzer_config(args: &ArgMatches) -> AnalyzerConfig {
    let mut config = AnalyzerConfig::default();

    if let Ok(Some(timeout)) = args.try_get_one::<u64>("timeout") {
        config = config.with_timeout(Duration::from_secs(*timeout));
    }
    if let Ok(Some(threads)) = args.try_get_one::<usize>("threads") {
        config = config.with_concurrency(*threads);
    }
    if let Ok(Some(true)) = args.try_get_one::<bool>("offline") {
        config = config.offline();
    }
    if let Ok(key) = args.try_get_one::<String>("page-rank-key") {
        config.page_rank_key = key.cloned();
    }
    if let Ok(Some(path)) = args.try_get_one::<String>("suffix-list") {
        config.suffix_list = Some(expand_path(path));
    }

    debug!(
        workers = config.concurrency(),
        lookups = config.lookups_enabled,
        timeout = ?config.fetch.timeout,
        "analyzer configuration"
    );
    config
}

pub fn load_model(args: &ArgMatches) -> Result<ModelBundle> {
    let path = args
        .get_one::<String>("model")
        .map(|p| expand_path(p))
        .ok_or_else(|| anyhow!("No model path given"))?;
    ModelBundle::load(&path).with_context(|| format!("Cannot load model {}", path.display()))
}

fn normalizer_for(args: &ArgMatches) -> Result<UrlNormalizer> {
    let normalizer = match args.try_get_one::<String>("suffix-list") {
        Ok(Some(path)) => UrlNormalizer::from_list_file(&expand_path(path))?,
        _ => UrlNormalizer::new()?,
    };
    Ok(normalizer)
}

/// Print the report, or save it when an output path was given.
pub fn write_report(content: &str, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            report::save_report(content, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!("{} Report saved to {}", "✓".green(), path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message.to_string());
    spinner
}

fn build_analyzer(args: &ArgMatches) -> Result<Analyzer> {
    let model = load_model(args)?;
    let analyzer = Analyzer::new(analyzer_config(args), Arc::new(model))?;
    Ok(analyzer)
}

pub async fn handle_predict(args: &ArgMatches) -> Result<()> {
    let url = args
        .get_one::<String>("url")
        .ok_or_else(|| anyhow!("--url is required"))?;
    let analyzer = build_analyzer(args)?;

    let progress = spinner(&format!("Analyzing {}", url));
    let result = analyzer.analyze(url, DefaultScheme::Https).await;
    progress.finish_and_clear();
    let analysis = result?;

    let content = match report_format(args) {
        ReportFormat::Text => report::generate_text_report(&analysis),
        ReportFormat::Json => report::generate_json_report(&analysis)?,
    };
    write_report(&content, args.get_one::<PathBuf>("output"))
}

pub async fn handle_batch(args: &ArgMatches) -> Result<()> {
    let hosts_file = args
        .get_one::<PathBuf>("hosts-file")
        .ok_or_else(|| anyhow!("--hosts-file is required"))?;
    let urls = load_urls_from_file(&expand_path(&hosts_file.to_string_lossy()))
        .map_err(|e| anyhow!(e))?;
    let analyzer = build_analyzer(args)?;

    let progress = Arc::new(spinner(&format!("Analyzing {} URLs...", urls.len())));
    let progress_clone = progress.clone();
    let callback: BatchProgressCallback = Arc::new(move |done, total, url| {
        progress_clone.set_message(format!("[{}/{}] {}", done, total, url));
    });

    let result = analyzer.analyze_batch(&urls, Some(callback)).await;
    progress.finish_and_clear();
    let entries = result?;

    let failures = entries
        .iter()
        .filter(|e| matches!(e, BatchEntry::Failure { .. }))
        .count();
    eprintln!(
        "{} {} URLs analyzed, {} failed",
        "✓".green(),
        entries.len(),
        failures
    );

    let content = match report_format(args) {
        ReportFormat::Text => report::generate_batch_text_report(&entries),
        ReportFormat::Json => report::generate_batch_json_report(&entries)?,
    };
    write_report(&content, args.get_one::<PathBuf>("output"))
}

pub fn handle_email(args: &ArgMatches) -> Result<()> {
    let email = args
        .get_one::<String>("email")
        .ok_or_else(|| anyhow!("--email is required"))?;
    let model = load_model(args)?;
    let analyzer = EmailAnalyzer::new(normalizer_for(args)?, Arc::new(model));

    let analysis = analyzer.analyze(email)?;

    let content = match report_format(args) {
        ReportFormat::Text => report::generate_email_text_report(&analysis),
        ReportFormat::Json => report::generate_email_json_report(&analysis)?,
    };
    write_report(&content, args.get_one::<PathBuf>("output"))
}

pub async fn handle_inspect(args: &ArgMatches) -> Result<()> {
    let url = args
        .get_one::<String>("url")
        .ok_or_else(|| anyhow!("--url is required"))?;
    let config = analyzer_config(args);
    let candidate = UrlNormalizer::new()?.normalize(url, DefaultScheme::Https)?;
    let fetcher = Fetcher::with_config(config.fetch)?;

    let progress = spinner(&format!("Inspecting {}", candidate.url));
    let diagnosis = diagnose(&fetcher, url, &candidate.url).await;
    progress.finish_and_clear();

    let content = match report_format(args) {
        ReportFormat::Text => report::generate_diagnosis_text_report(&diagnosis),
        ReportFormat::Json => report::generate_diagnosis_json_report(&diagnosis)?,
    };
    write_report(&content, args.get_one::<PathBuf>("output"))
}

pub fn handle_model_info(args: &ArgMatches) -> Result<()> {
    let model = load_model(args)?;

    let content = match report_format(args) {
        ReportFormat::Text => report::generate_model_info_text_report(&model),
        ReportFormat::Json => report::generate_model_info_json_report(&model)?,
    };
    write_report(&content, None)
}
