//! kanon - bind requests against the tutorial operations from the command line

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use kanon::bind::{Binder, FieldSpec, ParamSource, RawRequest, Requirement};
use kanon::config::{ConfigLoader, KanonConfig, DEFAULT_ENV_PREFIX};
use kanon::tutorial::{Catalog, DispatchError};
use tracing::debug;

#[derive(Parser)]
#[command(name = "kanon")]
#[command(about = "Declarative request parameter binding and validation", long_about = None)]
struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(short, long, global = true, env = "KANON_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List operations and their parameters
    List,

    /// Bind a request against an operation and run its handler
    Bind {
        /// Operation name (see `kanon list`)
        operation: String,

        /// Path parameter as NAME=VALUE (repeatable)
        #[arg(short, long = "path", value_name = "NAME=VALUE")]
        path: Vec<String>,

        /// Raw query string, e.g. "skip=0&limit=2"
        #[arg(short, long)]
        query: Option<String>,

        /// Header as NAME:VALUE (repeatable)
        #[arg(short = 'H', long = "header", value_name = "NAME:VALUE")]
        header: Vec<String>,

        /// Cookie as NAME=VALUE (repeatable)
        #[arg(short = 'C', long = "cookie", value_name = "NAME=VALUE")]
        cookie: Vec<String>,

        /// Raw JSON body
        #[arg(short, long)]
        body: Option<String>,

        /// Print Prometheus metrics to stderr afterwards
        #[arg(long)]
        metrics: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::List => {
            let catalog = Catalog::tutorial()?;
            print!("{}", describe_catalog(&catalog));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Bind {
            operation,
            path,
            query,
            header,
            cookie,
            body,
            metrics,
        } => {
            kanon::telemetry::init_telemetry(&config.telemetry())?;
            debug!(?config, "configuration loaded");
            let catalog = Catalog::tutorial()?;
            let request = build_request(&path, query, &header, &cookie, body)?;
            let binder = Binder::new(config.bind_options());

            let code = match catalog.dispatch(&binder, &operation, &request) {
                Ok(response) => {
                    println!("{}", serde_json::to_string_pretty(&response)?);
                    ExitCode::SUCCESS
                }
                Err(DispatchError::Rejected(errors)) => {
                    let envelope = binder.envelope(&errors);
                    println!("{}", serde_json::to_string_pretty(&envelope)?);
                    ExitCode::FAILURE
                }
                Err(e) => return Err(e.into()),
            };

            if metrics {
                if let Some(rendered) = kanon::telemetry::render_metrics() {
                    eprint!("{rendered}");
                }
            }
            Ok(code)
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<KanonConfig> {
    let mut loader = ConfigLoader::new().with_dotenv()?;
    if let Some(path) = path {
        loader = loader
            .with_file(path)
            .with_context(|| format!("loading {}", path.display()))?;
    }
    Ok(loader.with_env_prefix(DEFAULT_ENV_PREFIX).load()?)
}

fn split_pair<'a>(arg: &'a str, separator: char, flag: &str) -> Result<(&'a str, &'a str)> {
    match arg.split_once(separator) {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value.trim())),
        _ => bail!("invalid --{flag} '{arg}': expected NAME{separator}VALUE"),
    }
}

fn build_request(
    path: &[String],
    query: Option<String>,
    headers: &[String],
    cookies: &[String],
    body: Option<String>,
) -> Result<RawRequest> {
    let mut builder = RawRequest::builder();

    for arg in path {
        let (name, value) = split_pair(arg, '=', "path")?;
        builder = builder.path_param(name, value);
    }
    if let Some(query) = query {
        builder = builder.query(query.trim_start_matches('?').to_string());
    }

    let mut has_content_type = false;
    for arg in headers {
        let (name, value) = split_pair(arg, ':', "header")?;
        has_content_type |= name.eq_ignore_ascii_case("content-type");
        builder = builder.header(name, value);
    }
    for arg in cookies {
        let (name, value) = split_pair(arg, '=', "cookie")?;
        builder = builder.cookie(name, value);
    }

    if let Some(body) = body {
        if !has_content_type {
            builder = builder.header("content-type", "application/json");
        }
        builder = builder.body(body);
    }
    Ok(builder.build())
}

fn describe_catalog(catalog: &Catalog) -> String {
    let mut out = String::new();
    for operation in catalog {
        out.push_str(&format!(
            "{} {} {}\n",
            operation.name(),
            operation.method(),
            operation.route()
        ));
        for param in operation.endpoint().params() {
            let source = match param.source() {
                ParamSource::Body if param.is_embedded() => "body (embedded)".to_string(),
                source => source.to_string(),
            };
            out.push_str(&format!(
                "    {:<16} {:<16} {}\n",
                param.name(),
                source,
                describe_field(param.field())
            ));
        }
    }
    out
}

fn describe_field(field: &FieldSpec) -> String {
    let requirement = match field.requirement() {
        Requirement::Required => "required".to_string(),
        Requirement::Optional => "optional".to_string(),
        Requirement::Default(value) => format!("default {}", value.to_json()),
    };
    match field.description() {
        Some(description) => format!("{} {requirement} - {description}", field.ty()),
        None => format!("{} {requirement}", field.ty()),
    }
}
