//! File Generator CLI
//!
//! Usage:
//!   generate-files [OPTIONS] <MODULE_NAMES>...
//!
//! Options:
//!   -t, --template-file <FILE>  Template file (default: ./template.toml)
//!   -o, --output-dir <DIR>      Output directory (default: current directory)
//!   -v...                       Increase log verbosity
//!   --dry-run                   Print the files that would be written
//!   --check                     Report malformed placeholders and exit
//!   -h, --help                  Print help

use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, info};

use file_generator::{check_templates, generate_module, plan_module, GeneratorConfig};

#[derive(Parser)]
#[command(name = "generate-files")]
#[command(version)]
#[command(about = "Generate files according to a template file")]
struct Cli {
    /// Module names for which the files are generated
    #[arg(required = true)]
    module_names: Vec<String>,

    /// Path to the template file
    #[arg(short, long, default_value = "./template.toml")]
    template_file: PathBuf,

    /// Directory where generated files are written (default: current directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Log verbosity: -v errors, -vv warnings, -vvv info, -vvvv debug
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print the files that would be generated without writing them
    #[arg(long)]
    dry_run: bool,

    /// Report malformed placeholders in the template file and exit
    #[arg(long)]
    check: bool,
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "off",
        1 => "error",
        2 => "warn",
        3 => "info",
        _ => "debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 4)
        .with_writer(std::io::stderr)
        .init();

    // Load the template file
    if !cli.template_file.is_file() {
        eprintln!(
            "Error: failed to open template file '{}'",
            cli.template_file.display()
        );
        std::process::exit(1);
    }

    info!(
        "Loading templates from: {}",
        cli.template_file.display()
    );

    let config = match GeneratorConfig::from_file(&cli.template_file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!(
                "Error loading template file '{}': {}",
                cli.template_file.display(),
                e
            );
            std::process::exit(1);
        }
    };

    if let Some(name) = &config.name {
        debug!("Template set: {}", name);
    }

    if cli.check {
        let problems = check_templates(&config);
        for (name, errors) in &problems {
            let source = config
                .templates
                .get(name)
                .and_then(|t| t.text.as_deref())
                .unwrap_or_default();
            for error in errors {
                eprintln!("{}", error.format(source, name));
            }
        }
        if !problems.is_empty() {
            std::process::exit(1);
        }
        println!("{} templates OK", config.templates.len());
        return;
    }

    let output_dir = match cli.output_dir {
        Some(dir) => dir,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("Error reading current directory: {}", e);
                std::process::exit(1);
            }
        },
    };

    let today = chrono::Local::now().date_naive();

    for module_name in &cli.module_names {
        if cli.dry_run {
            for file in plan_module(&config, module_name, today) {
                println!("==> {} <==", output_dir.join(&file.path).display());
                println!("{}", file.contents);
            }
            continue;
        }

        match generate_module(&config, module_name, today, &output_dir) {
            Ok(paths) => {
                for path in paths {
                    debug!("Wrote {}", path.display());
                }
            }
            Err(e) => {
                eprintln!("Error generating module '{}': {}", module_name, e);
                std::process::exit(1);
            }
        }
        info!("-------------------");
    }

    info!("Done!");
}
