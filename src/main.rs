//! Docweaver CLI
//!
//! Usage:
//!   docweaver [OPTIONS] [DATA]
//!
//! Options:
//!   -t, --template <FILE>   Fill this template instead of the one named in the data
//!   -n, --name <NAME>       Name of the generated document
//!   -o, --output <DIR>      Output directory
//!   -c, --config <FILE>     Configuration file (TOML format)
//!   --check <FILE>          Check a template and list its insertion points
//!   --labels                List the registered label types
//!   --html                  Also write an HTML preview of each document
//!   --list-templates        List the catalog templates
//!   -h, --help              Print help

use std::path::{Path, PathBuf};

use clap::Parser;

use docweaver::data::DataLoader;
use docweaver::{
    Document, DocumentProcessor, EngineConfig, GenerationReport, JsonDataLoader, ProcessError,
    TemplateEngine,
};

#[derive(Parser)]
#[command(name = "docweaver")]
#[command(about = "Fill labelled document templates with data")]
struct Cli {
    /// JSON data file: one object or an array of objects
    data: Option<PathBuf>,

    /// Template file to fill, registered in the catalog first
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Name of the generated document
    #[arg(short, long)]
    name: Option<String>,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Check a template and list its insertion points
    #[arg(long, value_name = "TEMPLATE")]
    check: Option<PathBuf>,

    /// List the registered label types
    #[arg(long)]
    labels: bool,

    /// Also write an HTML preview of each document
    #[arg(long)]
    html: bool,

    /// List the catalog templates
    #[arg(long)]
    list_templates: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match EngineConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };
    if let Some(dir) = &cli.output {
        config = config.with_output_dir(dir);
    }
    if cli.html {
        config = config.with_html_preview(true);
    }

    if cli.labels {
        println!("{}", config.registry().describe());
        return;
    }

    if let Some(path) = &cli.check {
        check_template(path, &config);
        return;
    }

    let mut processor = match DocumentProcessor::from_config(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if cli.list_templates {
        println!("{}", processor.catalog().describe());
        return;
    }

    let Some(data_path) = &cli.data else {
        eprintln!("Error: no data file given (see --help)");
        std::process::exit(1);
    };
    let mut loader = match JsonDataLoader::open(data_path) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let save_dir = config.output.directory.clone();
    let mut failures = 0;
    loop {
        let data = match loader.load_data() {
            Ok(Some(data)) => data,
            Ok(None) => break,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };
        let result = if cli.template.is_some() || cli.name.is_some() {
            processor.create_document_with(&save_dir, &data, cli.template.as_deref(), cli.name.as_deref())
        } else {
            processor.create_document(&save_dir, &data)
        };
        match result {
            Ok(report) => print_report(&report),
            Err(e) => {
                failures += 1;
                print_error(&e);
            }
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
}

fn check_template(path: &Path, config: &EngineConfig) {
    let engine = TemplateEngine::from_config(config);
    let document = match Document::open(path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    match engine.check(document) {
        Ok(output) => println!("{}", output.summary(true)),
        Err(e) => {
            eprintln!("{}", e.format(&path.display().to_string()));
            eprintln!("Error: {} {}", e.code(), e);
            std::process::exit(1);
        }
    }
}

fn print_report(report: &GenerationReport) {
    println!("{}: {}", report.template, report.output.display());
    if let Some(preview) = &report.preview {
        println!("  preview: {}", preview.display());
    }
    if !report.dispatch.is_complete() {
        println!("  {}", report.dispatch.describe().replace('\n', "\n  "));
    }
}

fn print_error(error: &ProcessError) {
    if let ProcessError::Check { template, source } = error {
        eprintln!("{}", source.format(template));
    }
    eprintln!("Error: {}", error);
}
