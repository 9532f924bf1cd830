//! plcgen command-line interface

use anyhow::Context;
use clap::{Parser, Subcommand};
use plcgen::config::ConfigLoader;
use plcgen::telemetry::init_tracing;
use plcgen::vendor::{detect_vendor, Vendor};
use plcgen::{GenerationRequest, Orchestrator};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "plcgen")]
#[command(version)]
#[command(about = "Generate vendor-specific PLC projects from a plain-text specification", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline for a specification file
    Generate {
        /// Specification text file
        #[arg(short, long, value_name = "FILE")]
        spec: PathBuf,

        /// Target vendor (siemens, rockwell, beckhoff, generic); detected when omitted
        #[arg(long)]
        vendor: Option<String>,

        /// Project directory name
        #[arg(short = 'n', long)]
        project_name: Option<String>,

        /// Output root (overrides config)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Print the whole result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the vendor profiles
    Vendors,
    /// Show which vendor a specification would be routed to
    Detect {
        /// Specification text file
        #[arg(short, long, value_name = "FILE")]
        spec: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            spec,
            vendor,
            project_name,
            out_dir,
            config,
            json,
        } => {
            let mut loader = ConfigLoader::new();
            if let Some(path) = config {
                loader = loader.with_path(path);
            }
            let mut config = loader.load().await.context("failed to load configuration")?;

            if let Some(out_dir) = out_dir {
                config.pipeline.out_dir = out_dir;
            }
            if cli.verbose {
                config.logging.level = "debug".to_string();
            }
            init_tracing(&config.logging)?;

            let spec_text = read_spec(&spec).await?;
            let orchestrator = Orchestrator::from_config(&config)?;

            let mut request = GenerationRequest::new(spec_text);
            request.vendor = vendor;
            request.project_name = project_name;

            let result = orchestrator.generate(request).await?;

            if json {
                let mut value = serde_json::to_value(&result)?;
                if let Some(obj) = value.as_object_mut() {
                    obj.insert("vendor".to_string(), result.vendor.as_str().into());
                }
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("Vendor:      {}", result.vendor.profile().name);
                println!("Project dir: {}", result.bundle.project_dir.display());
                println!("Files:");
                for relpath in result.files.keys() {
                    println!("  {}", relpath);
                }
                println!("  README.md");
            }
        }
        Commands::Vendors => {
            println!("{:<10} {:<10} {:<6} EXT", "VENDOR", "NAME", "LANG");
            for vendor in Vendor::ALL {
                let profile = vendor.profile();
                println!(
                    "{:<10} {:<10} {:<6} {}",
                    vendor.as_str(),
                    profile.name,
                    profile.lang,
                    profile.file_ext
                );
            }
        }
        Commands::Detect { spec } => {
            let spec_text = read_spec(&spec).await?;
            let vendor = detect_vendor(&spec_text);
            let profile = vendor.profile();
            println!("{} ({}, {})", vendor, profile.lang, profile.file_ext);
        }
    }

    Ok(())
}

async fn read_spec(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read specification {}", path.display()))
}
