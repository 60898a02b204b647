// Link check: careful, step-by-step serial test for the motor driver
//
// Usage: cargo run --bin link_check -- [port]
// Example: cargo run --bin link_check -- /dev/ttyS0
//
// Safety features:
// - Explicit confirmation before any motion
// - Starts with zero speed
// - Very slow test speeds
// - Easy abort with Ctrl+C

use std::io::{self, Write};
use std::thread::sleep;
use std::time::Duration;

use couch_drive_runtime::config::{Address, Baudrate, DEFAULT_ADDRESS, DEFAULT_PORT, WRITE_TIMEOUT};
use couch_drive_runtime::motor::{Motor, SabertoothLink};

const TEST_SPEED: f32 = 15.0; // percent - slow walking pace
const TEST_DURATION: Duration = Duration::from_millis(500);
const PAUSE_DURATION: Duration = Duration::from_millis(500);

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush().unwrap();
    let mut input = String::new();
    io::stdin().read_line(&mut input).unwrap();
    input.trim().eq_ignore_ascii_case("y")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("debug".parse().unwrap()),
        )
        .init();

    // Get port from args or use default
    let port = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_PORT.to_string());

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              Motor Link Check (WITH MOTION)                  ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║  ⚠  This tool WILL drive the motors!                         ║");
    println!("║  ⚠  Make sure wheels are OFF THE GROUND before proceeding!   ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("Serial port: {}", port);
    println!("Driver address: {}", DEFAULT_ADDRESS);
    println!();

    if !confirm("Are the wheels OFF THE GROUND (platform elevated/on blocks)?") {
        println!("Please elevate the platform so the wheels can spin freely.");
        return Ok(());
    }

    println!();
    println!("Step 1: Opening serial port...");
    let address = Address::new(DEFAULT_ADDRESS)?;
    let mut link = match SabertoothLink::open(&port, address, Baudrate::B9600, WRITE_TIMEOUT) {
        Ok(link) => {
            println!("  ✓ Serial port opened, driver woken");
            link
        }
        Err(e) => {
            println!("  ✗ Failed to open serial port: {}", e);
            println!();
            println!("Troubleshooting:");
            println!("  - Check the port path is correct");
            println!("  - On a Pi, add enable_uart=1 to /boot/config.txt");
            println!("  - Verify the driver has power and DIP switches 1,2 low");
            return Err(e.into());
        }
    };
    println!();

    // ========== STEP 2: Zero both motors ==========
    println!("Step 2: Sending ZERO speed to both motors...");
    println!("  This should NOT cause any movement.");
    println!();

    if !confirm("Send zero-speed command?") {
        println!("Aborted.");
        return Ok(());
    }

    link.stop()?;
    println!("  ✓ Zero speed sent");
    sleep(PAUSE_DURATION);
    println!();

    // ========== STEP 3: Slow motion test ==========
    println!("Step 3: Slow motion test");
    println!("  Speed: {}% per motor, one direction at a time", TEST_SPEED);
    println!();
    println!("  ⚠  WATCH THE WHEELS - each should spin slowly in turn!");
    println!("  ⚠  Press Ctrl+C at any time to abort!");
    println!();

    if !confirm("Proceed with motion test?") {
        link.stop()?;
        println!("Aborted.");
        return Ok(());
    }

    let tests = [
        ("Motor 1 forward", Motor::One, TEST_SPEED),
        ("Motor 1 reverse", Motor::One, -TEST_SPEED),
        ("Motor 2 forward", Motor::Two, TEST_SPEED),
        ("Motor 2 reverse", Motor::Two, -TEST_SPEED),
    ];

    for (name, motor, speed) in tests {
        println!("  Testing: {}...", name);
        link.drive(motor, speed)?;
        sleep(TEST_DURATION);

        // Stop between tests
        link.drive(motor, 0.0)?;
        sleep(PAUSE_DURATION);
    }

    // ========== FINAL: Stop ==========
    println!();
    println!("Step 4: Stopping motors...");
    link.stop()?;
    println!("  ✓ Motors stopped");

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Check Complete!                           ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("If both wheels moved as expected, the link is working correctly.");
    println!("You can now run the full runtime with: cargo run");

    Ok(())
}
