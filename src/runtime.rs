// Ramp scheduler: fixed-interval tick loop driving the motor link
//
// The runtime is the sole writer of the current outputs and the sole sender
// on the link. Input events are applied in arrival order at the tick
// boundary, so a ramp step never sees a half-updated target and a safety
// stop always wins over input written in the same tick.

use std::io::Write;
use std::sync::Arc;

use tokio::sync::Notify;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::config::{DriveConfig, TOPIC_CMD_INPUT, TOPIC_HEALTH, TOPIC_RT_DRIVE, WRITE_TIMEOUT};
use crate::messages::{Channel, DriveHealth, DriveOutputs, InputEvent};
use crate::motor::link::{self, SabertoothLink};
use crate::ramp::{RampRates, step_toward};
use crate::safety::SafetySupervisor;

pub struct DriveRuntime<T: Write + Send> {
    link: SabertoothLink<T>,
    supervisor: SafetySupervisor,
    rates: RampRates,
    max_speed: f32,
    stick_deadband: f32,
    retry_budget: u32,
    setpoints: [f32; 2],
    outputs: [f32; 2],
    consecutive_failures: u32,
    disabled: bool,
    stopped: bool,
}

impl<T: Write + Send> DriveRuntime<T> {
    pub fn new(config: &DriveConfig, link: SabertoothLink<T>) -> Self {
        Self {
            link,
            supervisor: SafetySupervisor::new(),
            rates: RampRates::new(
                config.acceleration,
                config.max_speed,
                config.stop_deceleration_time,
                config.tick_interval,
            ),
            max_speed: config.max_speed,
            stick_deadband: config.stick_deadband,
            retry_budget: config.link_retry_budget,
            setpoints: [0.0; 2],
            outputs: [0.0; 2],
            consecutive_failures: 0,
            disabled: false,
            stopped: false,
        }
    }

    /// Apply one input event at the tick boundary
    pub fn on_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::Axis { channel, value } => {
                self.setpoints[channel.index()] = value.clamp(-1.0, 1.0) * self.max_speed;
            }
            InputEvent::Button { input, pressed } => {
                self.supervisor.on_button(input, pressed);
            }
        }
    }

    /// Advance both channels one ramp step; pure state update, no I/O
    fn advance(&mut self) -> DriveOutputs {
        let fast = self.supervisor.demands_fast_stop(
            self.setpoints[0],
            self.setpoints[1],
            self.stick_deadband,
        );
        let step = self.rates.step(fast);
        for channel in Channel::ALL {
            let i = channel.index();
            // a demanded fast stop pins the target to zero, overriding any
            // setpoint written in the same tick
            let target = if fast { 0.0 } else { self.setpoints[i] };
            self.outputs[i] = step_toward(self.outputs[i], target, step);
        }
        self.outputs()
    }

    /// One scheduler tick: ramp, then transmit both channels together.
    /// A send failure is absorbed here; the scheduler keeps ticking.
    pub fn tick(&mut self) -> DriveOutputs {
        if self.disabled || self.stopped {
            return self.outputs();
        }

        let outputs = self.advance();
        match self.link.drive_both(outputs.left, outputs.right) {
            Ok(()) => self.consecutive_failures = 0,
            Err(e) => {
                self.consecutive_failures += 1;
                warn!(
                    "Motor link send failed ({}/{}): {}",
                    self.consecutive_failures, self.retry_budget, e
                );
                if self.consecutive_failures >= self.retry_budget {
                    error!("Motor link failure budget exhausted, disabling drive");
                    self.disable();
                }
            }
        }
        outputs
    }

    fn disable(&mut self) {
        self.disabled = true;
        self.setpoints = [0.0; 2];
        self.outputs = [0.0; 2];
        self.supervisor.clear();
    }

    /// Re-enable the link path after a failure-budget disable
    pub fn reset(&mut self) {
        info!("Resetting motor link state");
        self.disabled = false;
        self.consecutive_failures = 0;
        self.setpoints = [0.0; 2];
        self.outputs = [0.0; 2];
        self.supervisor.clear();
    }

    /// The outputs last handed to the link
    pub fn outputs(&self) -> DriveOutputs {
        DriveOutputs {
            left: self.outputs[0],
            right: self.outputs[1],
        }
    }

    pub fn health(&self) -> DriveHealth {
        if self.disabled {
            DriveHealth::LinkDisabled
        } else if self.consecutive_failures > 0 {
            DriveHealth::LinkDegraded
        } else if self.supervisor.fast_stop() {
            DriveHealth::FastStop
        } else {
            DriveHealth::Ok
        }
    }

    /// Final zero-speed transmission before the transport is released.
    /// Idempotent: the first successful stop wins, later calls are no-ops.
    pub fn stop(&mut self) -> link::Result<()> {
        self.setpoints = [0.0; 2];
        self.outputs = [0.0; 2];
        if self.stopped {
            return Ok(());
        }
        self.link.stop()?;
        self.stopped = true;
        Ok(())
    }
}

/// Run the drive runtime until ctrl-c
pub async fn run(config: DriveConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let subscriber = session.declare_subscriber(TOPIC_CMD_INPUT).await?;
    let pub_drive = session.declare_publisher(TOPIC_RT_DRIVE).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    let link = SabertoothLink::open(
        &config.port,
        config.address,
        config.baudrate,
        WRITE_TIMEOUT,
    )?;
    let mut runtime = DriveRuntime::new(&config, link);

    let shutdown = Arc::new(Notify::new());
    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.notify_waiters();
            }
        });
    }

    let mut tick = interval(config.tick_duration());

    info!(
        "Drive runtime started: {:.0}ms tick, max speed {}%",
        config.tick_interval * 1000.0,
        config.max_speed
    );
    info!("Subscribed to: {}", TOPIC_CMD_INPUT);
    info!("Publishing to: {}, {}", TOPIC_RT_DRIVE, TOPIC_HEALTH);

    loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = shutdown.notified() => break,
        }

        // 1. Drain all pending input events (non-blocking), in arrival order
        while let Ok(Some(sample)) = subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<InputEvent>(&payload) {
                Ok(event) => {
                    debug!("Received input event: {:?}", event);
                    runtime.on_event(event);
                }
                Err(e) => {
                    warn!("Failed to parse input event: {}", e);
                }
            }
        }

        // 2. Ramp and transmit
        let outputs = runtime.tick();

        // 3. Publish outputs and health
        pub_drive.put(serde_json::to_string(&outputs)?).await?;
        pub_health.put(serde_json::to_string(&runtime.health())?).await?;
    }

    // The scheduler has stopped ticking; the fail-safe zero-speed send runs
    // before the transport is released
    info!("Shutting down, stopping motors");
    runtime.stop()?;
    Ok(())
}
