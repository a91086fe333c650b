//! Remove the Gemini watermark from a single image.
//!
//! Usage:
//! ```sh
//! cargo run --example remove_watermark -- input.jpg output.png
//! ```

use std::env;
use std::process;

use gemini_watermark_inpaint::{process_file, ProcessOptions, WatermarkEngine};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <input> <output>", args[0]);
        process::exit(1);
    }

    let input = &args[1];
    let output = &args[2];

    let engine = WatermarkEngine::new().expect("failed to initialize engine");
    let opts = ProcessOptions::default();
    let result = process_file(&engine, input.as_ref(), output.as_ref(), &opts);

    if result.success {
        if let Some(info) = result.info {
            println!(
                "Done: {0}x{0} region at ({1},{2})",
                info.size, info.position.x, info.position.y
            );
        }
    } else {
        eprintln!("Error: {}", result.message);
        process::exit(1);
    }
}
