// Copyright 2026 Fieldscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fieldscope CLI entry point.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use fieldscope::{
    AnalysisInput, AnalysisResponse, Analyzer, AnalyzerConfig, DataTypeGroup, Field, Sanitizer,
};

#[derive(Parser)]
#[command(
    name = "fieldscope",
    about = "Detect the fields of an HTML form for synthetic test data generation",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a form from a file, stdin or a URL.
    Analyze {
        /// HTML file to read. Reads stdin when omitted and no URL is given.
        file: Option<PathBuf>,

        /// Fetch the form from this address instead.
        #[arg(long)]
        url: Option<String>,

        /// Inference service endpoint.
        /// Also reads from FIELDSCOPE_INFERENCE_URL.
        #[arg(long)]
        inference_url: Option<String>,

        /// Name refinement service endpoint.
        /// Also reads from FIELDSCOPE_REFINE_URL.
        #[arg(long)]
        refine_url: Option<String>,

        /// Bearer token for both services.
        /// Also reads from FIELDSCOPE_API_KEY.
        #[arg(long)]
        api_key: Option<String>,

        /// Print the success/error envelope as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the sanitized markup that would be sent for inference.
    Sanitize {
        /// HTML file to read. Reads stdin when omitted.
        file: Option<PathBuf>,
    },

    /// List the supported data types by group.
    Types {
        /// Print as a JSON object of group label to type names.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   fieldscope completions bash > ~/.local/share/bash-completion/completions/fieldscope
    ///   fieldscope completions zsh > ~/.zfunc/_fieldscope
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze {
            file,
            url,
            inference_url,
            refine_url,
            api_key,
            json,
        } => {
            let mut config = AnalyzerConfig::from_env();
            if inference_url.is_some() {
                config.inference_url = inference_url;
            }
            if refine_url.is_some() {
                config.refine_url = refine_url;
            }
            if api_key.is_some() {
                config.api_key = api_key;
            }

            let markup = match (&url, &file) {
                (Some(_), _) => None,
                (None, file) => Some(read_source(file.as_ref())?),
            };

            let result = match AnalysisInput::from_parts(markup, url) {
                Ok(input) => Analyzer::from_config(&config).analyze(input).await,
                Err(e) => Err(e),
            };
            let failed = result.is_err();

            if json {
                let response = AnalysisResponse::from(result);
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                match &result {
                    Ok(fields) => print_fields(fields),
                    Err(e) => eprintln!("error: {e}"),
                }
            }

            if failed {
                std::process::exit(1);
            }
        }

        Commands::Sanitize { file } => {
            let config = AnalyzerConfig::from_env();
            let markup = read_source(file.as_ref())?;
            println!(
                "{}",
                Sanitizer::with_extra_tags(&config.extra_strip_tags).sanitize(&markup)
            );
        }

        Commands::Types { json } => {
            if json {
                let groups: serde_json::Map<String, serde_json::Value> = DataTypeGroup::ALL
                    .iter()
                    .map(|group| {
                        let names = group.members().map(|t| t.as_str()).collect::<Vec<_>>();
                        (group.label().to_string(), serde_json::json!(names))
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&groups)?);
            } else {
                for group in DataTypeGroup::ALL {
                    println!("{}", group.label());
                    for data_type in group.members() {
                        println!("  {data_type}");
                    }
                }
            }
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "fieldscope", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Read markup from `file`, or from stdin when no file is given.
fn read_source(file: Option<&PathBuf>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn print_fields(fields: &[Field]) {
    let width = fields
        .iter()
        .map(|f| f.field_name.len())
        .max()
        .unwrap_or(0);
    for field in fields {
        println!("{:<width$}  {}", field.field_name, field.data_type);
    }
}
