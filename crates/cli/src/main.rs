use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use pixelpage_sanitizer::{CssSanitizer, SanitizerConfig, SchemePolicyBuilder, THEME_PREVIEW_SCOPE};

#[derive(Parser, Debug)]
#[command(name = "pixelpage-css", version)]
#[command(about = "Sanitize untrusted profile CSS and scope it to its owner")]
struct Args {
    /// Stylesheet to read. Reads stdin when omitted.
    input: Option<PathBuf>,

    /// Only run the size guard and pattern scan; no CSS is produced.
    #[arg(long)]
    validate: bool,

    /// Key of the sandbox container the output is scoped to.
    #[arg(short, long, default_value = THEME_PREVIEW_SCOPE)]
    scope: String,

    /// JSON file with `max_css_size`, `max_rules` and `max_nesting_depth`.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// URL scheme allowed inside url(). Repeat to allow several.
    /// Defaults to http and https.
    #[arg(long = "allow-scheme", value_name = "SCHEME")]
    allow_schemes: Vec<String>,

    /// Reject url() values without a scheme.
    #[arg(long)]
    no_relative_urls: bool,
}

fn main() -> Result<ExitCode> {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();
    let sanitizer = build_sanitizer(&args)?;
    let css = read_input(args.input.as_deref())?;

    let (json, ok) = run(&sanitizer, &args, &css)?;
    println!("{}", json);

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn build_sanitizer(args: &Args) -> Result<CssSanitizer> {
    let config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            SanitizerConfig::from_json(&json)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => SanitizerConfig::default(),
    };

    let schemes: Vec<&str> = if args.allow_schemes.is_empty() {
        vec!["http", "https"]
    } else {
        args.allow_schemes.iter().map(String::as_str).collect()
    };
    let policy = SchemePolicyBuilder::new()
        .allow_schemes(schemes)
        .allow_relative(!args.no_relative_urls)
        .build()
        .context("Invalid URL policy")?;

    log::debug!("Using {:?} with {:?}", config, policy);
    Ok(CssSanitizer::new(config)?.with_policy(policy))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        None => {
            let mut css = String::new();
            io::stdin()
                .read_to_string(&mut css)
                .context("Failed to read stylesheet from stdin")?;
            Ok(css)
        }
    }
}

/// Pretty JSON for the chosen operation, and whether it passed.
fn run(sanitizer: &CssSanitizer, args: &Args, css: &str) -> Result<(String, bool)> {
    if args.validate {
        let result = sanitizer.validate(css);
        log::info!("Validation found {} error(s)", result.errors.len());
        return Ok((serde_json::to_string_pretty(&result)?, result.valid));
    }

    let result = sanitizer.sanitize(css, &args.scope);
    log::info!(
        "Sanitized {} bytes for {:?}: {} removal(s), {} warning(s)",
        css.len(),
        args.scope,
        result.removed.len(),
        result.warnings.len()
    );
    Ok((serde_json::to_string_pretty(&result)?, result.success))
}
