//! LED board communication: trait + PiGlow backend.

use std::cell::RefCell;
use std::fmt;

use serde::Serialize;

use crate::led::{Color, MAX_INTENSITY};

/// Number of arms on the board.
pub const ARM_COUNT: u8 = 3;

/// Number of LEDs on the board (six per arm).
pub const LED_COUNT: u8 = ARM_COUNT * 6;

// ── Error type ──

/// Board communication errors.
///
/// String payloads follow the convention **"context: details"**, e.g.
/// `"I2C bus 1: Permission denied"`.
#[derive(Debug)]
pub enum BoardError {
    NotFound,
    OpenFailed(String),
    WriteFailed(String),
    InvalidArm(u8),
    InvalidLed(u8),
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::NotFound => write!(f, "PiGlow board not found"),
            BoardError::OpenFailed(e) => write!(f, "Failed to open board: {e}"),
            BoardError::WriteFailed(e) => write!(f, "Board write failed: {e}"),
            BoardError::InvalidArm(a) => {
                write!(f, "Invalid arm index: {a} (expected 0-{})", ARM_COUNT - 1)
            }
            BoardError::InvalidLed(i) => {
                write!(f, "Invalid LED index: {i} (expected 0-{})", LED_COUNT - 1)
            }
        }
    }
}

impl std::error::Error for BoardError {}

pub type Result<T> = std::result::Result<T, BoardError>;

// ── Addressing ──

/// Board LED index for a given arm and color.
pub fn led_index(arm: u8, color: Color) -> u8 {
    arm * 6 + color.position()
}

fn check_arm(arm: u8) -> Result<()> {
    if arm < ARM_COUNT {
        Ok(())
    } else {
        Err(BoardError::InvalidArm(arm))
    }
}

fn check_led(index: u8) -> Result<()> {
    if index < LED_COUNT {
        Ok(())
    } else {
        Err(BoardError::InvalidLed(index))
    }
}

// ── Operations ──

/// A single board write, as issued by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BoardOp {
    All { intensity: u8 },
    Color { color: Color, intensity: u8 },
    Arm { arm: u8, intensity: u8 },
    Led { index: u8, intensity: u8 },
}

impl BoardOp {
    /// Issue this operation on a board.
    pub fn apply(&self, board: &impl GlowBoard) -> Result<()> {
        match *self {
            BoardOp::All { intensity } => board.set_all(intensity),
            BoardOp::Color { color, intensity } => board.set_color(color, intensity),
            BoardOp::Arm { arm, intensity } => board.set_arm(arm, intensity),
            BoardOp::Led { index, intensity } => board.set_led(index, intensity),
        }
    }

    pub fn intensity(&self) -> u8 {
        match *self {
            BoardOp::All { intensity }
            | BoardOp::Color { intensity, .. }
            | BoardOp::Arm { intensity, .. }
            | BoardOp::Led { intensity, .. } => intensity,
        }
    }
}

// ── Level buffer shared by backends ──

/// Per-LED intensity buffer. All writes clamp to [`MAX_INTENSITY`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Levels([u8; LED_COUNT as usize]);

impl Levels {
    pub fn get(&self, index: u8) -> u8 {
        self.0[index as usize]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Whether every LED is off.
    pub fn is_dark(&self) -> bool {
        self.0.iter().all(|&v| v == 0)
    }

    /// Apply an operation to the buffer, validating indices.
    pub fn apply(&mut self, op: BoardOp) -> Result<()> {
        let v = op.intensity().min(MAX_INTENSITY);
        match op {
            BoardOp::All { .. } => self.0.fill(v),
            BoardOp::Color { color, .. } => {
                for arm in 0..ARM_COUNT {
                    self.0[led_index(arm, color) as usize] = v;
                }
            }
            BoardOp::Arm { arm, .. } => {
                check_arm(arm)?;
                let start = arm as usize * 6;
                self.0[start..start + 6].fill(v);
            }
            BoardOp::Led { index, .. } => {
                check_led(index)?;
                self.0[index as usize] = v;
            }
        }
        Ok(())
    }
}

// ── Trait ──

/// An addressable 18-LED indicator board.
///
/// Intensities are 0–100; larger values are clamped. Methods take `&self`
/// because backends buffer levels internally and flush on every call.
pub trait GlowBoard {
    fn open() -> Result<Self>
    where
        Self: Sized;
    fn set_led(&self, index: u8, intensity: u8) -> Result<()>;
    fn set_arm(&self, arm: u8, intensity: u8) -> Result<()>;
    fn set_color(&self, color: Color, intensity: u8) -> Result<()>;
    fn set_all(&self, intensity: u8) -> Result<()>;

    /// Turn every LED off.
    fn clear(&self) -> Result<()> {
        self.set_all(0)
    }
}

// ── PiGlow (SN3218 over I2C) ──

/// SN3218 register map and the PiGlow wiring of its 18 PWM channels.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
mod sn3218 {
    pub const I2C_BUS: u8 = 1;
    pub const I2C_ADDRESS: u16 = 0x54;

    pub const REG_ENABLE_OUTPUT: u8 = 0x00;
    pub const REG_PWM_BASE: u8 = 0x01;
    pub const REG_ENABLE_LEDS: u8 = 0x13;
    pub const REG_UPDATE: u8 = 0x16;

    /// PWM register for each board LED (arm-major, colors in arm order).
    pub const LED_REGISTERS: [u8; 18] = [
        0x07, 0x08, 0x09, 0x06, 0x05, 0x0A, // arm 0
        0x12, 0x11, 0x10, 0x0E, 0x0C, 0x0B, // arm 1
        0x01, 0x02, 0x03, 0x04, 0x0F, 0x0D, // arm 2
    ];

    /// Map a 0–100 intensity onto the 0–255 PWM range.
    pub fn pwm(intensity: u8) -> u8 {
        (intensity.min(100) as u16 * 255 / 100) as u8
    }
}

/// Build the PWM frame (register base followed by 18 channel values).
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn pwm_frame(levels: &Levels) -> [u8; 19] {
    let mut frame = [0u8; 19];
    frame[0] = sn3218::REG_PWM_BASE;
    for (led, &reg) in sn3218::LED_REGISTERS.iter().enumerate() {
        let channel = (reg - sn3218::REG_PWM_BASE) as usize;
        frame[1 + channel] = sn3218::pwm(levels.get(led as u8));
    }
    frame
}

/// Raw register writes to an SN3218: first byte is the start register.
pub trait RegisterBus {
    fn write_registers(&mut self, bytes: &[u8]) -> Result<()>;
}

#[cfg(target_os = "linux")]
impl RegisterBus for rppal::i2c::I2c {
    fn write_registers(&mut self, bytes: &[u8]) -> Result<()> {
        self.write(bytes).map(|_| ()).map_err(|e| {
            let reg = bytes.first().copied().unwrap_or_default();
            BoardError::WriteFailed(format!("I2C register 0x{reg:02X}: {e}"))
        })
    }
}

/// Buffered SN3218 driver: every change rewrites the full PWM frame and
/// latches it with an update.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
struct Sn3218<W> {
    bus: RefCell<W>,
    levels: RefCell<Levels>,
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
impl<W: RegisterBus> Sn3218<W> {
    fn new(bus: W) -> Self {
        Sn3218 {
            bus: RefCell::new(bus),
            levels: RefCell::new(Levels::default()),
        }
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        self.bus.borrow_mut().write_registers(bytes)
    }

    /// Enable the chip and all channels, then start dark.
    fn init(&self) -> Result<()> {
        // Fails here when nothing acknowledges at 0x54.
        self.write(&[sn3218::REG_ENABLE_OUTPUT, 0x01])
            .map_err(|_| BoardError::NotFound)?;
        self.write(&[sn3218::REG_ENABLE_LEDS, 0xFF, 0xFF, 0xFF])?;
        self.update(BoardOp::All { intensity: 0 })
    }

    fn update(&self, op: BoardOp) -> Result<()> {
        self.levels.borrow_mut().apply(op)?;
        let frame = pwm_frame(&self.levels.borrow());
        self.write(&frame)?;
        self.write(&[sn3218::REG_UPDATE, 0xFF])
    }
}

#[cfg(target_os = "linux")]
pub struct PiGlowBoard {
    chip: Sn3218<rppal::i2c::I2c>,
}

#[cfg(target_os = "linux")]
impl GlowBoard for PiGlowBoard {
    fn open() -> Result<Self> {
        use rppal::i2c::{Error as I2cError, I2c};

        let mut i2c = I2c::with_bus(sn3218::I2C_BUS).map_err(|e| match e {
            I2cError::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
                BoardError::NotFound
            }
            e => BoardError::OpenFailed(format!("I2C bus {}: {e}", sn3218::I2C_BUS)),
        })?;
        i2c.set_slave_address(sn3218::I2C_ADDRESS)
            .map_err(|e| BoardError::OpenFailed(format!("I2C address: {e}")))?;

        let chip = Sn3218::new(i2c);
        chip.init()?;
        log::debug!("PiGlow opened on I2C bus {}", sn3218::I2C_BUS);
        Ok(PiGlowBoard { chip })
    }

    fn set_led(&self, index: u8, intensity: u8) -> Result<()> {
        self.chip.update(BoardOp::Led { index, intensity })
    }

    fn set_arm(&self, arm: u8, intensity: u8) -> Result<()> {
        self.chip.update(BoardOp::Arm { arm, intensity })
    }

    fn set_color(&self, color: Color, intensity: u8) -> Result<()> {
        self.chip.update(BoardOp::Color { color, intensity })
    }

    fn set_all(&self, intensity: u8) -> Result<()> {
        self.chip.update(BoardOp::All { intensity })
    }
}

// ── Stub (platforms without I2C) ──

#[cfg(not(target_os = "linux"))]
pub struct StubBoard;

#[cfg(not(target_os = "linux"))]
impl GlowBoard for StubBoard {
    fn open() -> Result<Self> {
        Err(BoardError::OpenFailed(
            "PiGlow is only supported on Linux".into(),
        ))
    }

    fn set_led(&self, _index: u8, _intensity: u8) -> Result<()> {
        Err(BoardError::NotFound)
    }

    fn set_arm(&self, _arm: u8, _intensity: u8) -> Result<()> {
        Err(BoardError::NotFound)
    }

    fn set_color(&self, _color: Color, _intensity: u8) -> Result<()> {
        Err(BoardError::NotFound)
    }

    fn set_all(&self, _intensity: u8) -> Result<()> {
        Err(BoardError::NotFound)
    }
}

/// Concrete board type for the current platform.
#[cfg(target_os = "linux")]
pub type PlatformBoard = PiGlowBoard;
#[cfg(not(target_os = "linux"))]
pub type PlatformBoard = StubBoard;

/// Open the platform board.
pub fn open_board() -> Result<PlatformBoard> {
    PlatformBoard::open()
}

// ── Mock board for testing ──

/// In-memory recording board for unit and integration tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::Cell;

    /// Records every operation in order and tracks the resulting LED levels.
    #[derive(Default)]
    pub struct RecordingBoard {
        pub ops: RefCell<Vec<BoardOp>>,
        pub levels: RefCell<Levels>,
        /// If true, every write returns an error (and is not recorded).
        pub fail_writes: Cell<bool>,
    }

    impl RecordingBoard {
        pub fn new() -> Self {
            Self::default()
        }

        /// Drain the recorded operations.
        pub fn take_ops(&self) -> Vec<BoardOp> {
            std::mem::take(&mut *self.ops.borrow_mut())
        }

        pub fn is_dark(&self) -> bool {
            self.levels.borrow().is_dark()
        }

        fn record(&self, op: BoardOp) -> Result<()> {
            if self.fail_writes.get() {
                return Err(BoardError::WriteFailed(
                    "mock: write failure injected".into(),
                ));
            }
            self.levels.borrow_mut().apply(op)?;
            self.ops.borrow_mut().push(op);
            Ok(())
        }
    }

    impl GlowBoard for RecordingBoard {
        fn open() -> Result<Self> {
            Ok(Self::new())
        }

        fn set_led(&self, index: u8, intensity: u8) -> Result<()> {
            self.record(BoardOp::Led { index, intensity })
        }

        fn set_arm(&self, arm: u8, intensity: u8) -> Result<()> {
            self.record(BoardOp::Arm { arm, intensity })
        }

        fn set_color(&self, color: Color, intensity: u8) -> Result<()> {
            self.record(BoardOp::Color { color, intensity })
        }

        fn set_all(&self, intensity: u8) -> Result<()> {
            self.record(BoardOp::All { intensity })
        }
    }
}
