//! Render marker and board bitmaps to image files for printing.

use std::path::PathBuf;
use std::process::ExitCode;

use aruco_boards::charuco::CharucoBoardSpec;
use aruco_boards::grid::GridBoardSpec;
use aruco_boards::{CharucoDetector, DictionaryKind, GridBoardDetector, MarkerDetector};
use clap::{Parser, ValueEnum};
use log::{error, LevelFilter};
use opencv::core::{Mat, Size};
use opencv::imgcodecs;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum TargetKind {
    Marker,
    Grid,
    Charuco,
}

#[derive(Parser, Debug)]
#[command(
    name = "board-gen",
    version,
    about = "Render an ArUco marker, grid board, or ChArUco board bitmap"
)]
struct Args {
    /// What to render
    #[arg(long, value_enum, default_value_t = TargetKind::Charuco)]
    kind: TargetKind,

    /// Marker id (marker kind only)
    #[arg(long, default_value_t = 0)]
    id: i32,

    /// Output bitmap width in pixels (also the marker side length)
    #[arg(long, default_value_t = 500)]
    width: i32,

    /// Output bitmap height in pixels (board kinds only)
    #[arg(long, default_value_t = 700)]
    height: i32,

    /// White margin in pixels (board kinds only)
    #[arg(long, default_value_t = 10)]
    margin: i32,

    /// Dictionary, in the DICT_* spelling
    #[arg(long, default_value = "DICT_6X6_50")]
    dictionary: DictionaryKind,

    /// Output image path
    #[arg(long, default_value = "board.png")]
    out: PathBuf,
}

fn render(args: &Args) -> Result<Mat, Box<dyn std::error::Error>> {
    let size = Size::new(args.width, args.height);
    let img = match args.kind {
        TargetKind::Marker => MarkerDetector::new(args.dictionary)?.generate(args.id, args.width)?,
        TargetKind::Grid => {
            let spec = GridBoardSpec {
                dictionary: args.dictionary,
                ..GridBoardSpec::default()
            };
            GridBoardDetector::new(spec)?.generate(size, args.margin)?
        }
        TargetKind::Charuco => {
            let mut spec = CharucoBoardSpec::default();
            spec.dictionary = args.dictionary;
            CharucoDetector::new(spec)?.generate(size, args.margin)?
        }
    };
    Ok(img)
}

fn main() -> ExitCode {
    let args = Args::parse();
    let _ = aruco_boards_core::init_with_level(LevelFilter::Warn);

    let img = match render(&args) {
        Ok(img) => img,
        Err(err) => {
            error!("render failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    let path = args.out.to_string_lossy();
    match imgcodecs::imwrite_def(path.as_ref(), &img) {
        Ok(true) => {
            println!("wrote {}", args.out.display());
            ExitCode::SUCCESS
        }
        Ok(false) => {
            error!("{}: encoder refused to write", args.out.display());
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("{}: {err}", args.out.display());
            ExitCode::FAILURE
        }
    }
}
