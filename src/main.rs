//! displaykit - evaluate a display formula from the command line
//!
//! ```text
//! displaykit [--legacy] [--ast] [--config PATH] [--map ALIAS=ID]... <formula> [ID=VALUE]...
//! ```

use anyhow::{bail, Context};
use displaykit::config::EngineConfig;
use displaykit::formula::{CompiledFormula, Dialect};
use displaykit::types::{DataSourceStatus, Scalar};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const USAGE: &str = concat!(
    "usage: displaykit [--legacy] [--ast] [--config PATH] [--map ALIAS=ID]... ",
    "<formula> [ID=VALUE]..."
);

#[derive(Debug, Default)]
struct Args {
    legacy: bool,
    print_ast: bool,
    config: Option<PathBuf>,
    mappings: Vec<(String, String)>,
    formula: String,
    values: Vec<(String, Scalar)>,
}

fn split_pair(arg: &str) -> anyhow::Result<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => bail!("expected KEY=VALUE, got '{}'", arg),
    }
}

/// Numbers and `true`/`false` are typed, anything else is a string
fn parse_scalar(text: &str) -> Scalar {
    match text {
        "true" => Scalar::Boolean(true),
        "false" => Scalar::Boolean(false),
        _ => text
            .parse::<f64>()
            .map(Scalar::Number)
            .unwrap_or_else(|_| Scalar::String(text.to_string())),
    }
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> anyhow::Result<Args> {
    let mut args = Args::default();
    let mut formula = None;

    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--legacy" => args.legacy = true,
            "--ast" => args.print_ast = true,
            "--config" => {
                let path = raw.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--map" => {
                let pair = raw.next().context("--map needs ALIAS=ID")?;
                args.mappings.push(split_pair(&pair)?);
            }
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            _ if formula.is_none() => formula = Some(arg.clone()),
            _ => {
                let (id, value) = split_pair(&arg)?;
                args.values.push((id, parse_scalar(&value)));
            }
        }
    }

    args.formula = formula.context(USAGE)?;
    Ok(args)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,displaykit=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = parse_args(std::env::args().skip(1))?;

    let engine = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::load_or_default(),
    };

    let mut options = engine.formula.parse_options();
    if args.legacy {
        options.dialect = Dialect::Legacy;
    }

    let mut formula = CompiledFormula::compile_with(&args.formula, &options)
        .with_context(|| format!("Failed to parse '{}'", args.formula))?;

    if args.print_ast {
        println!("{}", serde_json::to_string_pretty(formula.formula())?);
    }

    for (alias, id) in &args.mappings {
        formula.register_data_source_mapping(alias.as_str(), id.as_str());
    }
    for (id, value) in &args.values {
        formula.update_data_source(id, DataSourceStatus::new(value.clone()));
    }

    let parameters = formula.get_parameters();
    if !parameters.is_empty() {
        println!("parameters: {}", parameters.join(", "));
    }

    let value = formula.try_execute()?;
    println!("{}", value);
    Ok(())
}
