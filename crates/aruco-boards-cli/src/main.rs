//! Batch ChArUco camera calibration.
//!
//! Scans a directory for board images, detects the board on each, runs one
//! calibration call over the accumulated views, and writes
//! `camera_matrix.csv` plus `distortion_coefficients.csv` into the output
//! directory.

use std::path::PathBuf;
use std::process::ExitCode;

use aruco_boards::calibration::{self, CalibrationConfig};
use aruco_boards::charuco::CharucoBoardSpec;
use aruco_boards::core::{CAMERA_MATRIX_FILE, DISTORTION_FILE};
use clap::Parser;
use log::{error, LevelFilter};

#[derive(Parser, Debug)]
#[command(
    name = "charuco-calibrate",
    version,
    about = "Estimate camera intrinsics from ChArUco board images"
)]
struct Args {
    /// Directory of calibration images
    #[arg(long, default_value = "./data")]
    impath: PathBuf,

    /// Image file suffix, without the leading dot
    #[arg(long, default_value = "jpg")]
    suffix: String,

    /// Output directory for camera parameters
    #[arg(long, default_value = "./camera_params")]
    output: PathBuf,

    /// Physical size of one board square, in millimetres
    #[arg(long, default_value_t = 57)]
    size: u32,

    /// JSON board description overriding the built-in 5x7 board
    #[arg(long)]
    board_config: Option<PathBuf>,

    /// Log more (-v: info, -vv: debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let _ = aruco_boards_core::init_with_level(level);

    let mut config = CalibrationConfig {
        image_dir: args.impath,
        suffix: args.suffix,
        output_dir: args.output,
        square_size_mm: f64::from(args.size),
        ..CalibrationConfig::default()
    };
    if let Some(path) = &args.board_config {
        match CharucoBoardSpec::load_json(path) {
            Ok(board) => config.board = board,
            Err(err) => {
                error!("{}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    match calibration::run(&config) {
        Ok(outcome) => {
            println!("reprojection error: {}", outcome.reprojection_error);
            println!(
                "wrote {} and {} ({} of {} views used)",
                config.output_dir.join(CAMERA_MATRIX_FILE).display(),
                config.output_dir.join(DISTORTION_FILE).display(),
                outcome.used_views,
                outcome.total_images,
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("calibration failed: {err}");
            ExitCode::FAILURE
        }
    }
}
