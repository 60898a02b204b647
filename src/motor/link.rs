// Serial link to the Sabertooth driver
//
// Owns the transport and is its only writer. Sequences command frames onto
// the wire and sends a zero-speed command before the transport is released.

use std::io::Write;
use std::thread;
use std::time::Duration;

use serialport::{self, SerialPort};
use tracing::{debug, info, warn};

use super::sabertooth::{Command, CommandError, Motor};
use crate::config::{Address, Baudrate, SETTLE_INTERVAL};

/// Wake byte written after open and after a baud change
const WAKE_BYTE: u8 = 0xAA;

/// Transport failures; recoverable, the tick loop absorbs and retries
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid command: {0}")]
    Command(#[from] CommandError),
}

pub type Result<T> = std::result::Result<T, LinkError>;

/// Motor link over an exclusively-owned transport
pub struct SabertoothLink<T: Write + Send> {
    transport: T,
    address: Address,
}

impl SabertoothLink<Box<dyn SerialPort>> {
    /// Open the serial port, wake the driver, and wait for it to settle.
    /// The write timeout bounds every frame write.
    pub fn open(
        port_name: &str,
        address: Address,
        baudrate: Baudrate,
        write_timeout: Duration,
    ) -> Result<Self> {
        info!(
            "Opening motor link on {} at {} baud, address {}",
            port_name,
            baudrate.as_u32(),
            address.get()
        );
        let port = serialport::new(port_name, baudrate.as_u32())
            .timeout(write_timeout)
            .open()?;

        let mut link = Self::with_transport(port, address);
        link.wake()?;
        thread::sleep(SETTLE_INTERVAL);
        Ok(link)
    }

    /// Send the baud-rate command, then reconfigure the port to the new rate
    pub fn set_baudrate(&mut self, rate: Baudrate) -> Result<()> {
        info!("Switching motor link to {} baud", rate.as_u32());
        self.send(&Command::baud_rate(self.address, rate))?;
        self.transport.write_all(&[WAKE_BYTE])?;
        self.transport.set_baud_rate(rate.as_u32())?;
        thread::sleep(SETTLE_INTERVAL);
        Ok(())
    }
}

impl<T: Write + Send> SabertoothLink<T> {
    /// Build a link over an already-open transport
    pub fn with_transport(transport: T, address: Address) -> Self {
        Self { transport, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn wake(&mut self) -> Result<()> {
        self.transport.write_all(&[WAKE_BYTE])?;
        self.transport.write_all(&[WAKE_BYTE])?;
        Ok(())
    }

    /// Write one command frame. No flush: the next frame may follow
    /// immediately.
    pub fn send(&mut self, command: &Command) -> Result<()> {
        let frame = command.as_bytes();
        debug!("TX {:02X?}", frame);
        self.transport.write_all(&frame)?;
        Ok(())
    }

    /// Drive one motor at a signed percent speed
    pub fn drive(&mut self, motor: Motor, speed: f32) -> Result<()> {
        self.send(&Command::motor(self.address, motor, speed)?)
    }

    /// Update both channels back to back as one logical send
    pub fn drive_both(&mut self, motor1: f32, motor2: f32) -> Result<()> {
        self.drive(Motor::One, motor1)?;
        self.drive(Motor::Two, motor2)
    }

    /// Zero both motors
    pub fn stop(&mut self) -> Result<()> {
        self.drive_both(0.0, 0.0)
    }
}

impl<T: Write + Send> Drop for SabertoothLink<T> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Failed to stop motors on link close: {}", e);
        }
    }
}

#[cfg(test)]
pub(crate) mod test_transport {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    pub struct Recording {
        pub bytes: Vec<u8>,
        pub flushes: usize,
    }

    impl Recording {
        /// Wire traffic split into 4-byte command frames
        pub fn frames(&self) -> Vec<[u8; 4]> {
            self.bytes
                .chunks_exact(4)
                .map(|chunk| [chunk[0], chunk[1], chunk[2], chunk[3]])
                .collect()
        }
    }

    /// In-memory transport; the test keeps a handle to the shared recording
    #[derive(Clone, Default)]
    pub struct RecordingTransport(pub Arc<Mutex<Recording>>);

    impl Write for RecordingTransport {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.0.lock().unwrap().flushes += 1;
            Ok(())
        }
    }

    /// Transport whose every write fails, for failure-path tests
    pub struct FailingTransport;

    impl Write for FailingTransport {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "write timed out"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_transport::RecordingTransport;
    use super::*;

    fn test_link() -> (SabertoothLink<RecordingTransport>, RecordingTransport) {
        let transport = RecordingTransport::default();
        let link = SabertoothLink::with_transport(transport.clone(), Address::new(128).unwrap());
        (link, transport)
    }

    #[test]
    fn test_drive_both_writes_two_frames() {
        let (mut link, transport) = test_link();
        link.drive_both(50.0, -50.0).unwrap();

        let recording = transport.0.lock().unwrap();
        let frames = recording.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], [128, 0x00, 64, (128 + 64) & 0x7F]);
        assert_eq!(frames[1], [128, 0x05, 64, (128 + 5 + 64) & 0x7F]);
    }

    #[test]
    fn test_no_flush_between_frames() {
        let (mut link, transport) = test_link();
        link.drive(Motor::One, 10.0).unwrap();
        link.drive(Motor::Two, 10.0).unwrap();

        let recording = transport.0.lock().unwrap();
        assert_eq!(recording.frames().len(), 2);
        assert_eq!(recording.flushes, 0, "frames must not require a flush");
    }

    #[test]
    fn test_drop_sends_stop() {
        let transport = RecordingTransport::default();
        {
            let mut link =
                SabertoothLink::with_transport(transport.clone(), Address::new(129).unwrap());
            link.drive_both(80.0, 80.0).unwrap();
        }

        let recording = transport.0.lock().unwrap();
        let frames = recording.frames();
        assert_eq!(frames.len(), 4);
        // last two frames are the fail-safe zero-speed commands
        assert_eq!(frames[2][2], 0);
        assert_eq!(frames[3][2], 0);
        assert_eq!(frames[2][1], 0x00);
        assert_eq!(frames[3][1], 0x04);
    }
}
