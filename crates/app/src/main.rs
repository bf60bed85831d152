use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::json;
use session_scrubber_core::{
    calc::{format_time, generate_time_labels},
    frame::FRAME_MS,
    store::selectors,
    SessionData, TimelineController, TimelineState,
};
use tracing_subscriber::EnvFilter;

/// Simulated surface the session is replayed on.
const SURFACE_WIDTH: f64 = 1000.0;
const SURFACE_HEIGHT: f64 = 80.0;

fn main() -> session_scrubber_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { session, zoom } => run_inspect(&session, zoom),
        Commands::Play {
            session,
            speed,
            seconds,
            looping,
        } => run_play(&session, speed, seconds, looping),
        Commands::Flick {
            session,
            from,
            velocity,
        } => run_flick(&session, from, velocity),
    }
}

fn load(path: &Path) -> session_scrubber_core::Result<TimelineController> {
    let raw = std::fs::read_to_string(path)?;
    let session = SessionData::from_json(&raw)?;
    tracing::info!(
        path = %path.display(),
        events = session.events.len(),
        duration = session.duration,
        "session loaded"
    );

    let mut controller = TimelineController::default();
    controller.attach(SURFACE_WIDTH, SURFACE_HEIGHT);
    controller.load_session(&session, 0.0)?;
    Ok(controller)
}

fn run_inspect(path: &PathBuf, zoom: Option<f64>) -> session_scrubber_core::Result<()> {
    let mut controller = load(path)?;
    if let Some(level) = zoom {
        controller.store_mut().zoom_to(level, None);
    }

    let state = controller.state();
    let labels = generate_time_labels(
        state.viewport.visible_range(),
        state.viewport.container_width,
        80.0,
        10,
    );
    let report = json!({
        "duration": selectors::formatted_duration(state),
        "zoom": state.zoom.level,
        "visibleRange": [state.viewport.visible_start, state.viewport.visible_end],
        "labels": labels.iter().map(|label| label.text.as_str()).collect::<Vec<_>>(),
        "visibleEvents": selectors::visible_events(state)
            .iter()
            .map(|event| json!({
                "id": event.id,
                "at": format_time(event.timestamp),
                "percent": selectors::event_percent(state, event),
                "severity": event.severity,
            }))
            .collect::<Vec<_>>(),
    });
    print_json(&report)
}

fn run_play(
    path: &PathBuf,
    speed: f64,
    seconds: f64,
    looping: bool,
) -> session_scrubber_core::Result<()> {
    let mut controller = load(path)?;
    let snapped = controller.set_speed(speed);
    if snapped != speed {
        tracing::warn!(requested = speed, snapped, "speed snapped to ladder");
    }
    controller.set_looping(looping);
    controller.play();

    let mut now = 0.0;
    let mut last_highlight = None;
    while now <= seconds * 1000.0 {
        controller.frame(now);
        let state = controller.state();
        if state.selection.highlighted_event_id != last_highlight {
            last_highlight = state.selection.highlighted_event_id.clone();
            if let Some(id) = &last_highlight {
                tracing::info!(at = %selectors::formatted_current_time(state), id, "highlight");
            }
        }
        if !state.playback.is_playing {
            break;
        }
        now += FRAME_MS;
    }
    print_json(&summary(controller.state()))
}

fn run_flick(path: &PathBuf, from: f64, velocity: f64) -> session_scrubber_core::Result<()> {
    let mut controller = load(path)?;
    controller.seek(from);

    // Synthesize a short horizontal swipe at `velocity` px/s.
    let y = SURFACE_HEIGHT / 2.0;
    let mut x = SURFACE_WIDTH / 2.0;
    let mut now = 0.0;
    controller.pointer_down(1, x, y, now);
    for _ in 0..4 {
        now += FRAME_MS;
        x += velocity * FRAME_MS / 1000.0;
        controller.pointer_move(1, x, y, now);
        controller.frame(now);
    }
    controller.pointer_up(1, x, y, now);

    let released = controller.state().current_time;
    let mut frames = 0;
    loop {
        now += FRAME_MS;
        controller.frame(now);
        frames += 1;
        if !controller.state().physics.has_momentum || frames > 2000 {
            break;
        }
    }
    tracing::info!(released, frames, "momentum settled");
    print_json(&summary(controller.state()))
}

fn summary(state: &TimelineState) -> serde_json::Value {
    json!({
        "time": state.current_time,
        "formatted": selectors::formatted_current_time(state),
        "progress": selectors::progress(state),
        "playback": state.playback,
        "highlighted": state.selection.highlighted_event_id,
    })
}

fn print_json(value: &serde_json::Value) -> session_scrubber_core::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Replay recorded sessions through the timeline scrubber",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the viewport, time labels and visible events of a session.
    Inspect {
        /// Session JSON file.
        session: PathBuf,
        /// Zoom level to apply before inspecting.
        #[arg(short, long)]
        zoom: Option<f64>,
    },
    /// Autoplay a session and report the highlighted events.
    Play {
        /// Session JSON file.
        session: PathBuf,
        /// Playback speed, snapped to the configured ladder.
        #[arg(short, long, default_value_t = 1.0)]
        speed: f64,
        /// Wall-clock seconds to simulate.
        #[arg(long, default_value_t = 10.0)]
        seconds: f64,
        /// Wrap to the start instead of stopping at the end.
        #[arg(short = 'l', long = "loop")]
        looping: bool,
    },
    /// Release a synthetic swipe and report where momentum settles.
    Flick {
        /// Session JSON file.
        session: PathBuf,
        /// Session time to start from, in seconds.
        #[arg(long, default_value_t = 0.0)]
        from: f64,
        /// Swipe speed in pixels per second; negative swipes backwards.
        #[arg(long, default_value_t = 2000.0, allow_hyphen_values = true)]
        velocity: f64,
    },
}
