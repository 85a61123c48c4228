//! ppbridge CLI
//!
//! Command-line interface for macro expansion with host callbacks.

mod builtins;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ppbridge_core::token::spell;
use ppbridge_core::{CallbackConfig, IncludePathConfig, SessionConfig, Token};
use ppbridge_host::Session;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ppbridge")]
#[command(author, version, about = "C preprocessor with host callback macros", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Macro-expand a source file
    Preprocess {
        /// Source file to expand
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Define a macro (NAME, NAME=body, NAME(a,b)=body)
        #[arg(short = 'D', long = "define", value_name = "MACRO")]
        defines: Vec<String>,

        /// Add a user include path
        #[arg(short = 'I', long = "include", value_name = "DIR")]
        includes: Vec<PathBuf>,

        /// Add a system include path
        #[arg(long, value_name = "DIR")]
        isystem: Vec<PathBuf>,

        /// Session config file (yaml or json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Bind a built-in callable as a function macro
        #[arg(long = "callback", value_name = "NAME=BUILTIN")]
        callbacks: Vec<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Dump the raw tokens of a source file
    Tokens {
        /// Source file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Keep comments as tokens
        #[arg(long)]
        keep_comments: bool,
    },

    /// List the built-in callables
    Builtins,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Preprocess {
            file,
            defines,
            includes,
            isystem,
            config,
            callbacks,
            format,
            output,
        } => {
            let mut config = match config {
                Some(path) => SessionConfig::from_path(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => SessionConfig::default(),
            };
            config.defines.extend(defines);
            config.include_paths.extend(
                includes
                    .into_iter()
                    .map(|path| IncludePathConfig { path, system: false })
                    .chain(
                        isystem
                            .into_iter()
                            .map(|path| IncludePathConfig { path, system: true }),
                    ),
            );
            for binding in &callbacks {
                config.callbacks.push(parse_callback(binding)?);
            }
            cmd_preprocess(&file, config, &format, output.as_deref())?;
        }
        Commands::Tokens {
            file,
            keep_comments,
        } => {
            cmd_tokens(&file, keep_comments)?;
        }
        Commands::Builtins => {
            for (name, description) in builtins::BUILTINS {
                println!("  {:<10} {}", name, description);
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse `NAME=BUILTIN`
fn parse_callback(binding: &str) -> Result<CallbackConfig> {
    match binding.split_once('=') {
        Some((name, callable)) if !name.is_empty() && !callable.is_empty() => Ok(CallbackConfig {
            name: name.trim().to_string(),
            callable: callable.trim().to_string(),
        }),
        _ => bail!("Invalid callback binding '{}', expected NAME=BUILTIN", binding),
    }
}

fn cmd_preprocess(
    file: &Path,
    mut config: SessionConfig,
    format: &str,
    output: Option<&Path>,
) -> Result<()> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    config.input_name = file.display().to_string();

    let mut session = Session::with_config(file.display().to_string(), &config);
    session.bind_callbacks(&config, builtins::lookup)?;
    info!("Preprocessing {} with {} macro(s)", file.display(), session.macro_names().len());

    let tokens = session
        .preprocess(&source)?
        .collect::<ppbridge_core::Result<Vec<Token>>>()?;

    let rendered = match format {
        "text" => spell(&tokens),
        "json" => {
            let items: Vec<_> = tokens
                .iter()
                .map(|token| {
                    serde_json::json!({
                        "kind": token.kind,
                        "spelling": token.spelling,
                        "location": session.resolve(token.position).ok().map(|l| l.to_string()),
                    })
                })
                .collect();
            let result = serde_json::json!({
                "file": file.to_string_lossy(),
                "text": spell(&tokens),
                "tokens": items,
            });
            serde_json::to_string_pretty(&result)?
        }
        other => bail!("Unknown format: {}", other),
    };

    if let Some(out_path) = output {
        std::fs::write(out_path, &rendered)?;
        println!("Output written to: {}", out_path.display());
    } else {
        println!("{}", rendered);
    }

    Ok(())
}

fn cmd_tokens(file: &Path, keep_comments: bool) -> Result<()> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;

    let mut config = SessionConfig::default();
    config.lex.keep_comments = keep_comments;
    let session = Session::with_config(file.display().to_string(), &config);

    let tokens = session.tokenize_named(&file.display().to_string(), &source)?;
    for token in &tokens {
        let location = session.resolve(token.position)?;
        println!("{:<24} {:<14} {}", location.to_string(), token.kind.as_str(), token.spelling);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_callback() {
        let binding = parse_callback("SWAP=reverse").unwrap();
        assert_eq!(binding.name, "SWAP");
        assert_eq!(binding.callable, "reverse");

        assert!(parse_callback("SWAP").is_err());
        assert!(parse_callback("=reverse").is_err());
        assert!(parse_callback("SWAP=").is_err());
    }

    #[test]
    fn test_cli_parses_preprocess_flags() {
        let cli = Cli::try_parse_from([
            "ppbridge",
            "preprocess",
            "a.c",
            "-D",
            "N=1",
            "-I",
            "inc",
            "--callback",
            "R=reverse",
            "--format",
            "json",
        ])
        .unwrap();

        match cli.command {
            Commands::Preprocess {
                defines,
                includes,
                callbacks,
                format,
                ..
            } => {
                assert_eq!(defines, vec!["N=1"]);
                assert_eq!(includes, vec![PathBuf::from("inc")]);
                assert_eq!(callbacks, vec!["R=reverse"]);
                assert_eq!(format, "json");
            }
            _ => panic!("expected preprocess"),
        }
    }
}
