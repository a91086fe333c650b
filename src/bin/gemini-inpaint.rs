use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use gemini_watermark_inpaint::{
    default_output_path, process_directory, process_file, CalibrationTable, ProcessOptions,
    ProcessResult, ReconstructOptions, WatermarkEngine,
};

#[derive(Parser)]
#[command(
    name = "gemini-inpaint",
    about = "Remove the visible Gemini AI watermark by calibrated region inpainting",
    version,
    after_help = "Simple usage: gemini-inpaint <image>  (writes unwatermarked_<name>.png)\n\n\
                  NOTE: This tool only removes the VISIBLE Gemini watermark (sparkle logo).\n\
                  It cannot remove SynthID (invisible watermark)."
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: unwatermarked_{name}.png)
    #[arg(short, long)]
    output: Option<String>,

    /// Print the watermark size and position without writing anything
    #[arg(long)]
    info: bool,

    /// Calibration table JSON overriding the embedded one
    #[arg(long)]
    calibration: Option<PathBuf>,

    /// Border band thickness in pixels (1-256)
    #[arg(
        long,
        default_value_t = ReconstructOptions::default().band,
        value_parser = clap::value_parser!(u32).range(1..=256)
    )]
    band: u32,

    /// Pixels feathered along each edge of the region
    #[arg(long, default_value_t = ReconstructOptions::default().feather)]
    feather: u32,

    /// Band luma standard deviation below which a smooth fill is used
    #[arg(long, default_value_t = ReconstructOptions::default().smooth_threshold)]
    smooth_threshold: f32,

    /// Maximum input file size in MiB
    #[arg(long, default_value_t = 20)]
    max_size_mb: u64,

    /// Worker threads for directory processing (default: all cores)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if cli.smooth_threshold < 0.0 {
        eprintln!("Error: Smooth threshold must not be negative");
        process::exit(1);
    }

    if let Some(jobs) = cli.jobs {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.max(1))
            .build_global()
        {
            tracing::warn!(error = %e, "could not configure worker threads");
        }
    }

    let table = match &cli.calibration {
        Some(path) => CalibrationTable::from_path(path),
        None => CalibrationTable::load().map_err(Into::into),
    };
    let engine = match table {
        Ok(table) => WatermarkEngine::with_table(table).with_options(ReconstructOptions {
            band: cli.band,
            feather: cli.feather,
            smooth_threshold: cli.smooth_threshold,
        }),
        Err(e) => {
            eprintln!("Fatal: Failed to initialize engine: {e}");
            process::exit(1);
        }
    };

    let opts = ProcessOptions {
        max_file_size: cli.max_size_mb.saturating_mul(1024 * 1024),
    };

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    if cli.info {
        if input_path.is_dir() {
            eprintln!("Error: --info expects a single image file");
            process::exit(1);
        }
        print_info(&engine, input_path);
        return;
    }

    let results = if input_path.is_dir() {
        let output_dir = if let Some(o) = &cli.output {
            PathBuf::from(o)
        } else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: gemini-inpaint <input_dir> -o <output_dir>");
            process::exit(1);
        };
        process_directory(&engine, input_path, &output_dir, &opts)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path),
        };
        vec![process_file(&engine, input_path, &output_path, &opts)]
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, cli.verbose, cli.quiet);
        if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !cli.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_info(engine: &WatermarkEngine, path: &Path) {
    let (width, height) = match image::image_dimensions(path) {
        Ok(dims) => dims,
        Err(e) => {
            eprintln!("Error: Failed to read {}: {e}", path.display());
            process::exit(1);
        }
    };

    match engine.describe(width, height) {
        Ok(info) => {
            println!("Size: {width}x{height}");
            println!("Watermark: {0}x{0}", info.size);
            println!("Position: ({},{})", info.position.x, info.position.y);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn print_result(result: &ProcessResult, verbose: bool, quiet: bool) {
    if quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.success {
        match (&result.output, &result.info) {
            (Some(out), Some(info)) => eprintln!(
                "[OK] {filename} -> {} ({1}x{1} at {2},{3})",
                out.display(),
                info.size,
                info.position.x,
                info.position.y
            ),
            _ => eprintln!("[OK] {filename}"),
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
