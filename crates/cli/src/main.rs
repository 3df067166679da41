use std::path::{Path, PathBuf};
use std::process;

use asyncgen_core::{
    compile_file, render, CompileError, CompileOptions, Diagnostic, ProtocolRegistry,
};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// AsyncAPI document compiler.
#[derive(Parser)]
#[command(name = "asyncgen", version, about = "AsyncAPI document compiler")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress warnings and error details
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a document and print the rendered model
    Compile {
        /// Path to the root document (JSON)
        document: PathBuf,
        /// TOML file with compile options
        #[arg(long)]
        options: Option<PathBuf>,
        /// Only compile this server (repeatable)
        #[arg(long = "server", value_name = "NAME")]
        servers: Vec<String>,
    },

    /// List the supported protocols
    Protocols,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Compile {
            document,
            options,
            servers,
        } => {
            cmd_compile(
                &document,
                options.as_deref(),
                servers,
                cli.output,
                cli.quiet,
            );
        }
        Commands::Protocols => {
            cmd_protocols(cli.output);
        }
    }
}

/// `RUST_LOG` wins over `-v` and `-q`.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn cmd_compile(
    document: &Path,
    options_path: Option<&Path>,
    servers: Vec<String>,
    output: OutputFormat,
    quiet: bool,
) {
    let mut options = match options_path {
        Some(path) => match load_options(path) {
            Ok(o) => o,
            Err(msg) => {
                report_error(&msg, output, quiet);
                process::exit(1);
            }
        },
        None => CompileOptions::default(),
    };
    if !servers.is_empty() {
        options
            .servers
            .allow
            .get_or_insert_with(Vec::new)
            .extend(servers);
    }

    let protocols = ProtocolRegistry::default();
    let compiled = match compile_file(document, &options, &protocols) {
        Ok(c) => c,
        Err(e) => {
            report_compile_error(&e, output, quiet);
            process::exit(1);
        }
    };
    if !quiet {
        report_diagnostics(&compiled.diagnostics, output);
    }

    let model = render(&compiled.model);
    log::info!(
        "{} declarations, protocols: {:?}",
        model.declarations.len(),
        model.protocols
    );
    let pretty = serde_json::to_string_pretty(&model)
        .unwrap_or_else(|e| format!("serialization error: {}", e));
    println!("{}", pretty);
}

fn cmd_protocols(output: OutputFormat) {
    let registry = ProtocolRegistry::default();
    let names = registry.names();
    match output {
        OutputFormat::Json => {
            let list: Vec<serde_json::Value> = names
                .iter()
                .map(|(name, title)| serde_json::json!({ "name": name, "title": title }))
                .collect();
            let pretty = serde_json::to_string_pretty(&list)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            for (name, title) in names {
                println!("{:<8} {}", name, title);
            }
        }
    }
}

fn load_options(path: &Path) -> Result<CompileOptions, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("error reading options '{}': {}", path.display(), e))?;
    toml::from_str(&text).map_err(|e| format!("invalid options '{}': {}", path.display(), e))
}

fn report_compile_error(e: &CompileError, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => {
            let err_json = serde_json::to_string_pretty(&e.to_json_value())
                .unwrap_or_else(|_| format!("{{\"error\": \"{:?}\"}}", e));
            eprintln!("{}", err_json);
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!("error (pass {}): {}", e.pass(), e);
            }
        }
    }
}

fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!("error: {}", msg);
            }
        }
    }
}

fn report_diagnostics(diagnostics: &[Diagnostic], output: OutputFormat) {
    for d in diagnostics {
        match output {
            OutputFormat::Json => {
                let line = serde_json::to_string(d).unwrap_or_else(|_| format!("{:?}", d));
                eprintln!("{}", line);
            }
            OutputFormat::Text => {
                eprintln!("warning: {}: {}", d.path, d.message);
            }
        }
    }
}
