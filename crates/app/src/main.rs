use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use cube_visualiser_core::{
    AppConfig, ColourClassifier, ColourSubstitution, CubeVizError, DecodeService, FaceletString,
    FixedSolution, Frame, PlaybackEvent, Resolution, Rgb, ScanEvent, SolveSession, TickOutcome,
};
use tracing_subscriber::EnvFilter;

fn main() -> cube_visualiser_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Classify { r, g, b } => run_classify(&config, Rgb::new(r, g, b)),
        Commands::Scan { images } => run_scan(config, &images),
        Commands::Play {
            facelets,
            moves,
            realtime,
        } => run_play(config, &facelets, &moves, realtime),
    }
}

fn run_classify(config: &AppConfig, rgb: Rgb) -> cube_visualiser_core::Result<()> {
    let classifier = ColourClassifier::new(&config.scan)?;
    let result = classifier.classify(rgb);
    let hsv = result.hsv;
    println!(
        "{} (distance {:.1}, hsv {:.1}/{:.1}/{:.1})",
        result.colour, result.distance, hsv.hue, hsv.saturation, hsv.value
    );
    Ok(())
}

fn run_scan(config: AppConfig, images: &[PathBuf]) -> cube_visualiser_core::Result<()> {
    tracing::info!(faces = images.len(), "scanning from still images");
    let mut session = SolveSession::new(config)?;

    for path in images {
        let frame = load_frame(path)?;
        let scanner = session.scanner_mut();
        match scanner.tick(&frame) {
            TickOutcome::Review(face) => {
                tracing::debug!(?path, total = face.total_distance, "face read");
            }
            TickOutcome::Retry { .. } => {
                // A still image will not improve on a second look.
                return Err(CubeVizError::msg(format!(
                    "{} could not be read reliably",
                    path.display()
                )));
            }
            TickOutcome::Idle => break,
        }

        for event in scanner.accept()? {
            match event {
                ScanEvent::FaceAccepted { face, letters } => {
                    println!("face {}: {letters}", face + 1)
                }
                ScanEvent::Flip(cue) => println!("  flip {:?}", cue.direction),
                ScanEvent::Completed(raw) => println!("raw:     {raw}"),
            }
        }
    }

    let raw = session
        .scanner()
        .facelets()
        .cloned()
        .ok_or_else(|| CubeVizError::msg("six images are needed to scan the whole cube"))?;
    let decoded = ColourSubstitution.decode(raw.as_str())?;
    println!("decoded: {decoded}");
    Ok(())
}

fn run_play(
    config: AppConfig,
    facelets: &str,
    moves: &str,
    realtime: bool,
) -> cube_visualiser_core::Result<()> {
    let raw = FaceletString::parse(facelets)?;
    let frame_step = config.playback.tick();
    let resolution = Resolution::from_raw(
        config,
        raw,
        &ColourSubstitution,
        &FixedSolution(moves.to_string()),
    );
    let mut playback = resolution.start_playback();

    while !playback.is_finished() {
        for event in playback.advance(frame_step) {
            print_event(&event);
        }
        if realtime {
            std::thread::sleep(frame_step);
        }
    }

    let model = playback.into_model();
    println!("final:   {}", model.read_facelets()?);
    Ok(())
}

fn print_event(event: &PlaybackEvent) {
    match event {
        PlaybackEvent::MoveStarted { index, token, at } => {
            println!("{:>6}ms  [{index}] {token}", at.as_millis())
        }
        PlaybackEvent::MoveCompleted { index, at } => {
            tracing::debug!(index, at_ms = at.as_millis() as u64, "turn complete")
        }
        PlaybackEvent::HighlightEnded { .. } => {}
        PlaybackEvent::Finished { at } => println!("{:>6}ms  done", at.as_millis()),
    }
}

fn load_frame(path: &Path) -> cube_visualiser_core::Result<Frame> {
    let image = image::open(path)
        .map_err(|err| CubeVizError::msg(format!("{}: {err}", path.display())))?
        .to_rgb8();
    let (width, height) = image.dimensions();
    Frame::new(width as usize, height as usize, image.into_raw())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Scan a Rubik's cube and replay its solution",
    long_about = None
)]
struct Cli {
    /// Optional JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a single averaged RGB sample.
    Classify { r: u8, g: u8, b: u8 },
    /// Read six still images, one per face in scan order.
    Scan {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Replay a move sequence on a cube state.
    Play {
        /// 54-symbol facelet string, raw colours or face letters.
        #[arg(short, long)]
        facelets: String,
        /// Space separated moves, e.g. "R U R' U'".
        #[arg(short, long, default_value = "")]
        moves: String,
        /// Pace the replay in wall-clock time.
        #[arg(long)]
        realtime: bool,
    },
}
