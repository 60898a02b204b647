// Keyboard teleop: W/S drive, A/D turn, Space panic, G/H guards, R/F speed, Q quit
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::{Duration, Instant};
use tracing::info;

use couch_drive_runtime::config::TOPIC_CMD_INPUT;
use couch_drive_runtime::messages::{Channel, InputEvent, SafetyInput};

const SPEEDS: [f32; 3] = [0.3, 0.6, 1.0]; // fraction of the full stick range
const INPUT_TIMEOUT_MS: u64 = 150; // Re-center the sticks after this much time with no input

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_INPUT).await?;

    info!("Controls: W/S=drive, A/D=turn, Space=panic, G/H=guards, R/F=speed, Q=quit");
    info!("Speed: LOW");

    enable_raw_mode()?;
    let result = run_teleop(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut speed_idx: usize = 0;

    // Persistent stick state
    let mut drive = 0.0f32;
    let mut turn = 0.0f32;
    let mut panic_active = false;
    let mut left_guard = false;
    let mut right_guard = false;
    let mut last_movement_input = Instant::now();

    loop {
        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;

                match code {
                    // Movement - update stick state and refresh timestamp
                    KeyCode::Char('w') if pressed => {
                        drive = SPEEDS[speed_idx];
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('s') if pressed => {
                        drive = -SPEEDS[speed_idx];
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('a') if pressed => {
                        turn = -SPEEDS[speed_idx];
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('d') if pressed => {
                        turn = SPEEDS[speed_idx];
                        last_movement_input = Instant::now();
                    }

                    // Safety toggles
                    KeyCode::Char(' ') if pressed => {
                        panic_active = !panic_active;
                        info!("Panic: {}", if panic_active { "ACTIVE" } else { "clear" });
                        publish(
                            publisher,
                            InputEvent::Button {
                                input: SafetyInput::Panic,
                                pressed: panic_active,
                            },
                        )
                        .await?;
                    }
                    KeyCode::Char('g') if pressed => {
                        left_guard = !left_guard;
                        info!("Left guard: {}", if left_guard { "TRIGGERED" } else { "clear" });
                        publish(
                            publisher,
                            InputEvent::Button {
                                input: SafetyInput::LeftGuard,
                                pressed: left_guard,
                            },
                        )
                        .await?;
                    }
                    KeyCode::Char('h') if pressed => {
                        right_guard = !right_guard;
                        info!(
                            "Right guard: {}",
                            if right_guard { "TRIGGERED" } else { "clear" }
                        );
                        publish(
                            publisher,
                            InputEvent::Button {
                                input: SafetyInput::RightGuard,
                                pressed: right_guard,
                            },
                        )
                        .await?;
                    }

                    // Speed control
                    KeyCode::Char('r') if pressed => {
                        speed_idx = (speed_idx + 1).min(2);
                        print_speed(speed_idx);
                    }
                    KeyCode::Char('f') if pressed => {
                        speed_idx = speed_idx.saturating_sub(1);
                        print_speed(speed_idx);
                    }

                    // Quit
                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,

                    _ => {}
                }
            }
        }

        // Re-center the sticks if no movement input for INPUT_TIMEOUT_MS
        if last_movement_input.elapsed() > Duration::from_millis(INPUT_TIMEOUT_MS) {
            drive = 0.0;
            turn = 0.0;
        }

        // Differential mix onto the two channels
        let left = (drive + turn).clamp(-1.0, 1.0);
        let right = (drive - turn).clamp(-1.0, 1.0);
        publish(
            publisher,
            InputEvent::Axis {
                channel: Channel::Left,
                value: left,
            },
        )
        .await?;
        publish(
            publisher,
            InputEvent::Axis {
                channel: Channel::Right,
                value: right,
            },
        )
        .await?;
    }

    // Center the sticks on the way out
    for channel in Channel::ALL {
        publish(publisher, InputEvent::Axis { channel, value: 0.0 }).await?;
    }

    Ok(())
}

async fn publish(
    publisher: &zenoh::pubsub::Publisher<'_>,
    event: InputEvent,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    publisher.put(serde_json::to_string(&event)?).await?;
    Ok(())
}

fn print_speed(idx: usize) {
    let label = ["LOW", "MED", "HIGH"][idx];
    info!("Speed: {}", label);
}
