use clap::{Parser, Subcommand};
use jelly::{config, output, site};
use tracing::warn;

#[derive(Parser)]
#[command(name = "jelly")]
#[command(about = "Static site generator with partials and per-locale pages")]
#[command(long_about = "\
Static site generator with partials and per-locale pages

Project structure:

  site.toml                 # Optional config (paths, render limits, threads)
  locale/<code>.json        # Flat \"key\": \"value\" tables, one per locale
  src/partials/<name>.html  # Included with <!-- %include.<name>% -->
  src/pages/**/*.html       # Rendered once per locale into build/<code>/
  vendor/  public/  assets/ # Copied verbatim into build/

Locale variables are written %locale.<key>%.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy static trees and render every page into build/
    Build,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("jelly=info")),
        )
        .init();

    match cli.command {
        Command::Build => {
            let root = std::env::current_dir()?;
            let site_config = config::load_config(&root)?;
            init_thread_pool(&site_config.processing);

            println!("==> Building {}", root.display());
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                let mut formatter = output::EventFormatter::new();
                for event in rx {
                    for line in formatter.format(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = site::build(&site_config, &root, Some(tx));
            if printer.join().is_err() {
                warn!("Progress printer stopped early");
            }
            let summary = result?;
            output::print_summary(&summary);
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
