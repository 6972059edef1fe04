//! Dump every connected gamepad as JSON, with capabilities.
//!
//! Usage: `cargo run --example diagnose [config.toml]`

use padstream::{AxisInfo, BackendConfig, GamepadInfo, Gamepads};
use serde::Serialize;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct Report {
    info: GamepadInfo,
    buttons: Vec<u32>,
    axes: Vec<(u32, Option<AxisInfo>)>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => BackendConfig::load(&path).expect("load config"),
        None => BackendConfig::default(),
    };
    let mut pads = Gamepads::with_config(&config).expect("valid config");

    // Give hotplug notifications a moment to arrive.
    pads.poll_timeout(250);
    std::thread::sleep(Duration::from_millis(50));
    pads.poll();

    let reports: Vec<Report> = pads
        .gamepads()
        .into_iter()
        .map(|info| Report {
            buttons: pads.buttons(info.id),
            axes: pads
                .axes(info.id)
                .into_iter()
                .map(|code| (code, pads.axis_info(info.id, code)))
                .collect(),
            info,
        })
        .collect();

    eprintln!("backend {}: {} gamepad(s)", pads.backend_name(), reports.len());
    println!("{}", serde_json::to_string_pretty(&reports).expect("serialize report"));
}
