#[macro_use]
extern crate log;

use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use env_logger::Env;
use uuid::Uuid;

use signal_lens::algorithms::geodesy::destination_point;
use signal_lens::api::types::find_projection;
use signal_lens::core::ConnectionType;
use signal_lens::interfaces::CommResult;
use signal_lens::{
    ConfigurationManager, GeoPoint, JsonFileStore, LocalStore, MemoryStore, MockBackend, NetworkStats,
    NetworkStatsProvider, OrientationSample, OutputFormat, Reading, ReadingOrigin, SensorEvent, SessionEvent,
    SurveySession,
};

/// Simulated walk through a network survey
#[derive(Parser, Debug)]
#[command(name = "signal-lens")]
#[command(about = "Walk a simulated survey route and print the AR overlay")]
#[command(version)]
struct Args {
    /// Configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Persist local readings to this JSON file instead of memory
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Starting latitude
    #[arg(long, default_value_t = 47.3769, allow_hyphen_values = true)]
    lat: f64,

    /// Starting longitude
    #[arg(long, default_value_t = 8.5417, allow_hyphen_values = true)]
    lon: f64,

    /// Walking direction and camera heading (degrees)
    #[arg(long, default_value_t = 0.0)]
    heading: f64,

    /// Number of one-second steps to walk
    #[arg(long, default_value_t = 30)]
    steps: u32,

    /// Meters walked per step
    #[arg(long, default_value_t = 1.4)]
    step_m: f64,

    /// Readings from other contributors placed ahead of the route
    #[arg(long, default_value_t = 6)]
    nearby: u32,

    /// Export format for the final reading list
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

/// Link whose signal fades as the walker moves away from the access point
struct SimulatedLink {
    samples: u32,
}

impl NetworkStatsProvider for SimulatedLink {
    fn current_stats(&mut self) -> CommResult<NetworkStats> {
        self.samples += 1;
        let fade = (self.samples as f64 * 0.15).sin() * 6.0 + self.samples as f64 * 0.6;
        let signal_dbm = (-45.0 - fade).round().clamp(-100.0, -30.0) as i32;
        Ok(NetworkStats {
            signal_dbm,
            latency_ms: 12 + self.samples / 2,
            bandwidth_mbps: signal_lens::algorithms::quality::estimated_bandwidth_mbps(signal_dbm),
            quality_percent: None,
            connection_type: ConnectionType::Wifi,
            provider_name: "demo-wifi".to_string(),
        })
    }
}

fn nearby_readings(args: &Args) -> Vec<Reading> {
    (0..args.nearby)
        .map(|i| {
            let ahead_m = 8.0 + i as f64 * 7.0;
            let offset = if i % 2 == 0 { -12.0 } else { 12.0 };
            let (lat, lon) = destination_point(&(args.lat, args.lon), args.heading + offset, ahead_m);
            let signal_dbm = -55 - (i as i32 * 6);
            Reading {
                id: Uuid::new_v4(),
                latitude: lat,
                longitude: lon,
                signal_dbm,
                latency_ms: 30 + i * 5,
                bandwidth_mbps: signal_lens::algorithms::quality::estimated_bandwidth_mbps(signal_dbm),
                quality_percent: signal_lens::algorithms::quality::estimate_quality_percent(signal_dbm),
                connection_type: ConnectionType::Cellular,
                provider_name: "metro-mobile".to_string(),
                captured_at: Utc::now(),
                origin: ReadingOrigin::Cloud,
            }
        })
        .collect()
}

fn print_events(session: &mut SurveySession) {
    for event in session.drain_events() {
        match event {
            SessionEvent::Notice(message) => println!("  ! {}", message),
            SessionEvent::Captured { reading, manual } => println!(
                "  + {} capture {:.6}, {:.6} at {} dBm",
                if manual { "manual" } else { "auto" },
                reading.latitude,
                reading.longitude,
                reading.signal_dbm
            ),
            SessionEvent::Synced(outcome) => println!(
                "  ~ sync: {} uploaded, {} nearby{}",
                outcome.uploaded,
                outcome.nearby,
                if outcome.fetch_failed { " (fetch failed)" } else { "" }
            ),
            SessionEvent::SensorLost(sensor) => println!("  ! {:?} sensor lost", sensor),
            SessionEvent::LocalCleared { removed } => println!("  - cleared {} readings", removed),
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let manager = match &args.config {
        Some(path) => ConfigurationManager::from_file(path)?,
        None => ConfigurationManager::new(),
    };
    let config = manager.get_system_config().clone();

    let store_path = args
        .store
        .clone()
        .or_else(|| config.store.local_store_path.as_ref().map(PathBuf::from));
    let local_store: Box<dyn LocalStore> = match store_path {
        Some(path) => {
            info!("Persisting readings to {}", path.display());
            Box::new(JsonFileStore::new(path))
        }
        None => Box::new(MemoryStore::new()),
    };

    let backend = MockBackend::new();
    backend.seed(nearby_readings(&args));

    let frame_interval_ms = config.scheduler.frame_interval_ms.max(1);
    let mut session = SurveySession::new(config, Box::new(SimulatedLink { samples: 0 }), Box::new(backend.clone()), local_store);

    let mut now_ms = Utc::now().timestamp_millis().max(0) as u64;
    session.start(now_ms)?;

    for step in 0..args.steps {
        let (lat, lon) = destination_point(&(args.lat, args.lon), args.heading, step as f64 * args.step_m);
        let jitter = ((step * 7919) % 11) as f64 - 5.0;
        session.handle_event(
            SensorEvent::Location {
                timestamp_ms: now_ms,
                point: GeoPoint::new(lat, lon, 4.0 + jitter.abs()),
            },
            now_ms,
        );
        session.handle_event(
            SensorEvent::Orientation {
                timestamp_ms: now_ms,
                sample: OrientationSample::new(args.heading + jitter * 0.3, 90.0 + jitter * 0.5),
            },
            now_ms,
        );

        let mut last_frame = Vec::new();
        let step_end = now_ms + 1000;
        while now_ms < step_end {
            if let Some(frame) = session.tick(now_ms).frame {
                last_frame = frame;
            }
            now_ms += frame_interval_ms;
        }

        println!("step {:>3}: {} markers in view", step, last_frame.len());
        for projection in &last_frame {
            println!(
                "    {} x={:5.1}% y={:5.1}% scale={:.2} z={} ({:.1} m)",
                projection.reading_id.simple(),
                projection.screen_x_percent,
                projection.screen_y_percent,
                projection.scale,
                projection.z_order,
                projection.distance_m
            );
        }
        print_events(&mut session);
    }

    let pinned = session.drop_pin(now_ms)?;
    let frame = session.project_frame();
    if let Some(projection) = find_projection(&frame, pinned.id) {
        println!("pin dropped under the device, drawn at scale {:.2}", projection.scale);
    }
    print_events(&mut session);

    let ahead = destination_point(&(args.lat, args.lon), args.heading, args.steps as f64 * args.step_m + 10.0);
    match session.predict_signal(ahead.0, ahead.1) {
        Some(signal) => println!("predicted signal 10 m past the route end: {} dBm", signal),
        None => println!("not enough readings to predict signal"),
    }

    println!("{}", serde_json::to_string_pretty(&session.status())?);
    println!("heatmap points: {}", session.heatmap().len());
    println!("providers: {}", session.providers().join(", "));
    println!("{}", session.export(args.format)?);

    session.stop();
    info!("Backend now holds {} readings", backend.stored().len());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("{}", e);
        std::process::exit(1);
    }
}
