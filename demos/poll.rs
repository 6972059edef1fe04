use padstream::{codes, EventKind, GamepadId, Gamepads};
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

fn label(code: u32) -> String {
    let name = match code {
        codes::BTN_SOUTH => "South",
        codes::BTN_EAST => "East",
        codes::BTN_NORTH => "North",
        codes::BTN_WEST => "West",
        codes::BTN_LT => "LB",
        codes::BTN_RT => "RB",
        codes::BTN_LT2 => "LT",
        codes::BTN_RT2 => "RT",
        codes::BTN_SELECT => "Select",
        codes::BTN_START => "Start",
        codes::BTN_MODE => "Mode",
        codes::BTN_DPAD_UP => "Up",
        codes::BTN_DPAD_DOWN => "Down",
        codes::BTN_DPAD_LEFT => "Left",
        codes::BTN_DPAD_RIGHT => "Right",
        codes::AXIS_LSTICKX => "LX",
        codes::AXIS_LSTICKY => "LY",
        codes::AXIS_RSTICKX => "RX",
        codes::AXIS_RSTICKY => "RY",
        codes::AXIS_DPADX => "HatX",
        codes::AXIS_DPADY => "HatY",
        _ => return format!("{code:#x}"),
    };
    name.to_string()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut pads = Gamepads::new();
    println!("backend: {}", pads.backend_name());

    // Axis values are coalesced per flush window; button edges are printed as they come.
    let flush_every = Duration::from_millis(40);
    let mut last_flush = Instant::now();
    let mut axes: BTreeMap<(GamepadId, u32), f64> = BTreeMap::new();

    loop {
        pads.poll_timeout(10);
        while let Some(ev) = pads.next_event() {
            match ev.kind {
                EventKind::Connected => {
                    println!(
                        "[{}] connected: {} ({:04x}:{:04x}) uuid={}",
                        ev.id,
                        pads.name(ev.id).unwrap_or_default(),
                        pads.vendor_id(ev.id),
                        pads.product_id(ev.id),
                        pads.uuid(ev.id).unwrap_or_default(),
                    );
                    for code in pads.axes(ev.id) {
                        if let Some(info) = pads.axis_info(ev.id, code) {
                            println!("  axis {} [{}..{}]", label(code), info.min, info.max);
                        }
                    }
                    let buttons: Vec<String> = pads.buttons(ev.id).into_iter().map(label).collect();
                    println!("  buttons {}", buttons.join(" "));
                }
                EventKind::Disconnected => {
                    println!("[{}] disconnected", ev.id);
                    axes.retain(|&(id, _), _| id != ev.id);
                }
                EventKind::ButtonPressed { code } => println!("[{}] {} down", ev.id, label(code)),
                EventKind::ButtonReleased { code } => println!("[{}] {} up", ev.id, label(code)),
                EventKind::ButtonChanged { code, value } | EventKind::AxisChanged { code, value } => {
                    axes.insert((ev.id, code), value);
                }
            }
        }

        if last_flush.elapsed() >= flush_every && !axes.is_empty() {
            let ids: BTreeSet<GamepadId> = axes.keys().map(|&(id, _)| id).collect();
            for id in ids {
                let parts: Vec<String> = axes
                    .iter()
                    .filter(|(&(k, _), _)| k == id)
                    .map(|(&(_, code), v)| format!("{}={:.3}", label(code), v))
                    .collect();
                println!("[{id}] {}", parts.join(" "));
            }
            axes.clear();
            last_flush = Instant::now();
        }
    }
}
