//! # Barcoder CLI
//!
//! Command-line interface for barcode generation.
//!
//! ## Usage
//!
//! ```bash
//! # List supported formats
//! barcoder formats
//!
//! # Write a 400x120 Code 128 label as PNG
//! barcoder generate "HELLO-42" --width 400 --height 120 -o label.png
//!
//! # Dithered 1-bit preview of a QR code
//! barcoder generate "https://example.com" --format QR_CODE --output bitonal --dither -o qr.png
//!
//! # Raw packed bits for a printer driver
//! barcoder generate "590123412345" --format EAN_13 --output raw -o label.bin
//!
//! # Run the HTTP API
//! barcoder serve --listen 0.0.0.0:8080
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use barcoder::{
    BarcoderError, ScaleMode, barcode,
    generate::{self, GenerateRequest, OutputKind},
    server::{self, ServerConfig},
};

/// Barcoder - barcode images for label printers
#[derive(Parser, Debug)]
#[command(name = "barcoder")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List supported barcode formats
    Formats,

    /// Generate a barcode image
    Generate {
        /// Content to encode
        content: String,

        /// Barcode format (see `barcoder formats`)
        #[arg(long, default_value = "CODE_128")]
        format: String,

        /// Canvas width in pixels
        #[arg(long, default_value = "200")]
        width: usize,

        /// Canvas height in pixels
        #[arg(long, default_value = "200")]
        height: usize,

        /// Quiet zone in modules
        #[arg(long, default_value = "0")]
        margin: usize,

        /// How the symbol is fitted into the canvas
        #[arg(long, value_enum, default_value = "shrink")]
        mode: ScaleMode,

        /// Background color (#RRGGBB, #RRGGBBAA or transparent)
        #[arg(long)]
        background: Option<String>,

        /// Output kind
        #[arg(long, value_enum, default_value = "png")]
        output: OutputKind,

        /// Use ordered dithering for bitonal output
        #[arg(long)]
        dither: bool,

        /// Output file
        #[arg(short = 'o', long = "out", value_name = "FILE")]
        out: PathBuf,
    },

    /// Run the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,

        /// Largest canvas width accepted
        #[arg(long, default_value = "4096")]
        max_width: usize,

        /// Largest canvas height accepted
        #[arg(long, default_value = "4096")]
        max_height: usize,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), BarcoderError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Formats => {
            for name in barcode::list_formats() {
                println!("{}", name);
            }
        }
        Commands::Generate {
            content,
            format,
            width,
            height,
            margin,
            mode,
            background,
            output,
            dither,
            out,
        } => {
            let req = GenerateRequest {
                content,
                format,
                width,
                height,
                margin,
                stretch: false,
                mode: Some(mode),
                background,
                output,
                dither,
            };

            let image = generate::generate(&req)?;
            std::fs::write(&out, &image.bytes)?;
            info!(
                path = %out.display(),
                bytes = image.bytes.len(),
                "Wrote {}x{} {}",
                image.width,
                image.height,
                image.content_type
            );
        }
        Commands::Serve {
            listen,
            max_width,
            max_height,
        } => {
            let config = ServerConfig {
                listen_addr: listen,
                max_width,
                max_height,
            };
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(config))?;
        }
    }

    Ok(())
}
