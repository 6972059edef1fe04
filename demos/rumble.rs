use padstream::{EventKind, Gamepads};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut pads = Gamepads::new();
    println!("press South on a gamepad to rumble it, Ctrl-C to quit");

    let start = Instant::now();
    loop {
        let Some(ev) = pads.next_event_timeout(100) else {
            continue;
        };
        match ev.kind {
            EventKind::Connected if !pads.is_force_feedback_supported(ev.id) => {
                println!("[{}] {} has no force feedback", ev.id, pads.name(ev.id).unwrap_or_default());
            }
            EventKind::ButtonPressed { code: padstream::codes::BTN_SOUTH } => {
                // Alternate between the heavy and the light motor.
                let heavy = (start.elapsed().as_secs() % 2) == 0;
                let (strong, weak) = if heavy { (1.0, 0.0) } else { (0.0, 1.0) };
                let ok = pads.set_rumble(ev.id, strong, weak, 300);
                println!("[{}] rumble strong={strong} weak={weak}: {ok}", ev.id);
            }
            EventKind::ButtonPressed { code: padstream::codes::BTN_EAST } => {
                pads.set_rumble(ev.id, 0.0, 0.0, 0);
            }
            _ => {}
        }
    }
}
