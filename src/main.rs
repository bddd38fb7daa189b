//! replay3d CLI - Inspect, export and generate `.rap` recordings.

use std::error::Error;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use glam::DVec3;
use replay3d::{
    export,
    package::{self, FORMAT_VERSION},
    playback::{FiredEvent, HeadlessFactory, PlaybackEngine},
    record::{ManualClock, SessionRecorder},
    schema::{EulerAngles, LifecycleKind, PlaybackConfig, Recording, RecorderConfig},
};

fn print_usage(program: &str) {
    eprintln!("Usage: {} <command> [args]", program);
    eprintln!();
    eprintln!("Inspect, export and generate recordings (.rap v{}).", FORMAT_VERSION);
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  info <file.rap>          Summarize every recording in a file");
    eprintln!("  json <file.rap>          Write recordings as JSON to stdout");
    eprintln!("  csv <file.rap> <dir>     Write recordings as CSV tables into dir");
    eprintln!("  demo <out.rap> [--play]  Record a synthetic session, optionally replay it");
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("replay3d");

    let result = match args.get(1).map(String::as_str) {
        Some("info") if args.len() == 3 => print_info(&args[2]),
        Some("json") if args.len() == 3 => export_json(&args[2]),
        Some("csv") if args.len() == 4 => export_csv(&args[2], &args[3]),
        Some("demo") if args.len() >= 3 => {
            run_demo(PathBuf::from(&args[2]), args.iter().any(|a| a == "--play"))
        }
        _ => {
            print_usage(program);
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load(path: &str) -> Result<Vec<Recording>, Box<dyn Error>> {
    Ok(package::read_file(path)?)
}

fn print_info(path: &str) -> Result<(), Box<dyn Error>> {
    let count = package::peek_file(path)?;
    let recordings = load(path)?;

    println!("{}", path);
    println!("Recordings: {}", count);
    for (i, recording) in recordings.iter().enumerate() {
        println!();
        println!("[{}] {:?}", i, recording.name());
        println!("  Duration: {:.3}s", recording.duration());
        println!("  Session events: {}", recording.events().len());
        for (key, value) in recording.metadata() {
            println!("  {} = {}", key, value);
        }
        for subject in recording.subjects() {
            println!(
                "  Subject {} {:?}: {} positions, {} rotations, {} lifecycle, {} events",
                subject.id,
                subject.name,
                subject.positions.len(),
                subject.rotations.len(),
                subject.lifecycle.len(),
                subject.events.len()
            );
        }
    }
    Ok(())
}

fn export_json(path: &str) -> Result<(), Box<dyn Error>> {
    let recordings = load(path)?;
    let mut out = BufWriter::new(io::stdout().lock());
    export::write_json(&mut out, &recordings, true)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn export_csv(path: &str, dir: &str) -> Result<(), Box<dyn Error>> {
    let recordings = load(path)?;
    for written in export::write_csv_dir(dir, &recordings)? {
        println!("{}", written.display());
    }
    Ok(())
}

/// Record a ball thrown across a yard with a two second pause half way.
fn record_demo() -> Result<Recording, Box<dyn Error>> {
    const FPS: f64 = 60.0;

    let clock = ManualClock::new(0.0);
    let config = RecorderConfig {
        recording_name: "demo".to_string(),
        ..Default::default()
    };
    let mut recorder = SessionRecorder::new(clock.clone(), config)?;
    recorder.register_subject(1, "ball")?;
    recorder.register_subject(2, "gate")?;
    recorder.set_subject_metadata(1, "radius", "0.1")?;
    recorder.set_metadata("scene", "yard");

    recorder.start()?;
    recorder.capture_lifecycle_event(1, LifecycleKind::Start)?;
    recorder.capture_custom_event("throw", "")?;

    for frame in 0..=120u32 {
        // Pause one frame after the apex; events on a pause boundary are cut.
        if frame == 61 {
            recorder.pause()?;
            clock.advance(2.0);
            recorder.resume()?;
        }

        let t = f64::from(frame) / FPS;
        let ball = DVec3::new(3.0 * t, 5.0 * t - 2.5 * t * t, 0.0);
        recorder.capture_orientation(1, ball, EulerAngles::new(0.0, 0.0, -90.0 * t))?;
        recorder.capture_orientation(2, DVec3::new(6.0, 0.0, 0.0), EulerAngles::ZERO)?;

        match frame {
            60 => {
                recorder.capture_subject_event(1, "apex", format!("{:.2}", ball.y))?;
            }
            120 => {
                recorder.capture_subject_event(2, "hit", "ball")?;
                recorder.capture_lifecycle_event(2, LifecycleKind::Disable)?;
            }
            _ => {}
        }
        clock.advance(1.0 / FPS);
    }

    Ok(recorder.finish()?)
}

fn run_demo(out: PathBuf, play: bool) -> Result<(), Box<dyn Error>> {
    let recording = record_demo()?;
    package::write_file(&out, std::slice::from_ref(&recording))?;

    println!("Wrote {}", out.display());
    println!("  Duration: {:.3}s", recording.duration());
    for subject in recording.subjects() {
        println!(
            "  Subject {} {:?}: {} positions kept",
            subject.id,
            subject.name,
            subject.positions.len()
        );
    }

    if !play {
        return Ok(());
    }

    println!();
    println!("Replaying at 30 ticks/s...");
    let mut engine = PlaybackEngine::new(recording, HeadlessFactory, PlaybackConfig::default())?;
    let mut fired: Vec<FiredEvent> = Vec::new();
    engine.play();
    while engine.is_playing() {
        engine.tick(1.0 / 30.0, &mut fired);
    }

    for event in &fired {
        let owner = event
            .subject
            .map_or_else(|| "session".to_string(), |id| format!("subject {}", id));
        println!(
            "  {:>7.3}s {} {:?} {:?}",
            event.time, owner, event.event.name, event.event.contents
        );
    }
    for actor in engine.actors() {
        let pose = actor.cursor.pose();
        println!(
            "  {} ends at ({:.2}, {:.2}, {:.2}), visible={}",
            actor.representation.name,
            pose.position.x,
            pose.position.y,
            pose.position.z,
            pose.visible
        );
    }
    Ok(())
}
