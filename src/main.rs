use clap::{Parser, Subcommand};
use sitebake::{config, optimize, output, pipeline};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sitebake")]
#[command(about = "Static site build pipeline and responsive image generator")]
#[command(long_about = "\
Static site build pipeline and responsive image generator

Source layout:

  src/
  ├── index.html                   # Top-level documents → minified into dist/
  ├── assets/
  │   ├── css/*.css                # Partials → dist/assets/css/styles.min.css
  │   ├── js/*.js                  # Partials → dist/assets/js/app.min.js
  │   ├── fonts/                   # Copied to dist/assets/fonts/
  │   └── imagens/
  │       ├── original/            # Input of optimize-images
  │       └── optimized/           # Its output, copied to dist/assets/imagens/
  └── templates/                   # Copied to dist/templates/

Run 'sitebake optimize-images' before 'sitebake build' to refresh image
variants. Run 'sitebake gen-config' to print a documented sitebake.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file means stock defaults)
    #[arg(long, default_value = config::CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    /// Source directory (overrides `source` in the config file)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Output directory (overrides `output` in the config file)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: clean → markup → styles → scripts → assets → templates → sitemap
    Build,
    /// Generate every size × format variant of the original images
    OptimizeImages,
    /// Print a stock sitebake.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Build) {
        Command::Build => {
            let build_config = load(&cli.config, cli.source, cli.output)?;
            println!(
                "==> Building {} → {}",
                build_config.source.display(),
                build_config.output.display()
            );

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_pipeline_event(&event);
                }
            });
            let report =
                pipeline::run_on(&build_config, chrono::Utc::now().date_naive(), Some(tx));
            printer.join().ok();

            output::print_build_summary(&report, &build_config.output);
            if let Err(e) = report.into_result() {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Command::OptimizeImages => {
            let build_config = load(&cli.config, cli.source, cli.output)?;
            init_thread_pool(&build_config.processing);
            println!(
                "==> Optimizing {} → {}",
                build_config.original_images_dir().display(),
                build_config.optimized_images_dir().display()
            );

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_optimize_event(&event);
                }
            });
            let result = optimize::optimize_images(&build_config, Some(tx));
            printer.join().ok();

            output::print_optimize_summary(&result?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config file, apply CLI root overrides, then validate.
fn load(
    path: &std::path::Path,
    source: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<config::BuildConfig, config::ConfigError> {
    let build_config = config::load_config(path)?.with_roots(source, output);
    build_config.validate()?;
    Ok(build_config)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: the config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
