//! Motor controllers supported by the drivetrain.
//!
//! The family is chosen once from configuration; every call afterwards goes
//! through the closed [`MotorController`] enum. Each variant keeps the last
//! commanded output and its device configuration, which is what the
//! hardware layer flushes to the bus.

use tagdrive_common::drive::config::{ControllerType, IdleMode};

// ─── SPARK MAX ──────────────────────────────────────────────────────

/// REV SPARK MAX idle setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SparkIdleMode {
    Coast,
    Brake,
}

/// REV SPARK MAX (brushless).
#[derive(Debug, Clone, PartialEq)]
pub struct SparkMax {
    can_id: u8,
    output: f64,
    inverted: bool,
    idle_mode: SparkIdleMode,
}

impl SparkMax {
    pub fn new(can_id: u8) -> Self {
        Self {
            can_id,
            output: 0.0,
            inverted: false,
            idle_mode: SparkIdleMode::Brake,
        }
    }
}

// ─── Talon FX ───────────────────────────────────────────────────────

/// Talon FX positive rotation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvertedValue {
    CounterClockwisePositive,
    ClockwisePositive,
}

/// Talon FX neutral (idle) behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeutralMode {
    Coast,
    Brake,
}

/// Device configuration pushed to a Talon FX on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TalonFxConfig {
    pub inverted: InvertedValue,
    pub neutral_mode: NeutralMode,
}

impl Default for TalonFxConfig {
    fn default() -> Self {
        Self {
            inverted: InvertedValue::CounterClockwisePositive,
            neutral_mode: NeutralMode::Brake,
        }
    }
}

/// CTRE Talon FX in duty-cycle mode.
#[derive(Debug, Clone, PartialEq)]
pub struct TalonFx {
    can_id: u8,
    duty_cycle: f64,
    config: TalonFxConfig,
    /// Number of configuration applies (each one is a bus transaction).
    config_applies: u32,
    disabled: bool,
}

impl TalonFx {
    pub fn new(can_id: u8) -> Self {
        Self {
            can_id,
            duty_cycle: 0.0,
            config: TalonFxConfig::default(),
            config_applies: 0,
            disabled: false,
        }
    }

    pub fn config(&self) -> TalonFxConfig {
        self.config
    }

    pub fn config_applies(&self) -> u32 {
        self.config_applies
    }

    fn apply(&mut self) {
        self.config_applies += 1;
    }

    /// Stop and ignore further `set` calls.
    pub fn disable(&mut self) {
        self.duty_cycle = 0.0;
        self.disabled = true;
    }
}

// ─── Closed variant ─────────────────────────────────────────────────

/// A drivetrain motor controller.
#[derive(Debug, Clone, PartialEq)]
pub enum MotorController {
    SparkMax(SparkMax),
    TalonFx(TalonFx),
}

impl MotorController {
    /// Build the variant selected by `kind`.
    pub fn new(kind: ControllerType, can_id: u8) -> Self {
        match kind {
            ControllerType::SparkMax => Self::SparkMax(SparkMax::new(can_id)),
            ControllerType::TalonFx => Self::TalonFx(TalonFx::new(can_id)),
        }
    }

    pub fn kind(&self) -> ControllerType {
        match self {
            Self::SparkMax(_) => ControllerType::SparkMax,
            Self::TalonFx(_) => ControllerType::TalonFx,
        }
    }

    pub fn can_id(&self) -> u8 {
        match self {
            Self::SparkMax(m) => m.can_id,
            Self::TalonFx(m) => m.can_id,
        }
    }

    /// Command a normalized output in [-1, 1].
    pub fn set(&mut self, speed: f64) {
        let speed = speed.clamp(-1.0, 1.0);
        match self {
            Self::SparkMax(m) => m.output = speed,
            Self::TalonFx(m) => {
                if !m.disabled {
                    m.duty_cycle = speed;
                }
            }
        }
    }

    /// Last commanded output (before inversion).
    pub fn get(&self) -> f64 {
        match self {
            Self::SparkMax(m) => m.output,
            Self::TalonFx(m) => m.duty_cycle,
        }
    }

    pub fn set_inverted(&mut self, inverted: bool) {
        match self {
            Self::SparkMax(m) => m.inverted = inverted,
            Self::TalonFx(m) => {
                m.config.inverted = if inverted {
                    InvertedValue::ClockwisePositive
                } else {
                    InvertedValue::CounterClockwisePositive
                };
                m.apply();
            }
        }
    }

    pub fn inverted(&self) -> bool {
        match self {
            Self::SparkMax(m) => m.inverted,
            Self::TalonFx(m) => m.config.inverted == InvertedValue::ClockwisePositive,
        }
    }

    pub fn set_idle_mode(&mut self, mode: IdleMode) {
        match self {
            Self::SparkMax(m) => {
                m.idle_mode = match mode {
                    IdleMode::Coast => SparkIdleMode::Coast,
                    IdleMode::Brake => SparkIdleMode::Brake,
                }
            }
            Self::TalonFx(m) => {
                m.config.neutral_mode = match mode {
                    IdleMode::Coast => NeutralMode::Coast,
                    IdleMode::Brake => NeutralMode::Brake,
                };
                m.apply();
            }
        }
    }

    pub fn idle_mode(&self) -> IdleMode {
        let brake = match self {
            Self::SparkMax(m) => m.idle_mode == SparkIdleMode::Brake,
            Self::TalonFx(m) => m.config.neutral_mode == NeutralMode::Brake,
        };
        if brake { IdleMode::Brake } else { IdleMode::Coast }
    }

    pub fn stop(&mut self) {
        self.set(0.0);
    }

    /// Output as seen at the motor shaft (inversion applied).
    pub fn applied_output(&self) -> f64 {
        if self.inverted() { -self.get() } else { self.get() }
    }
}
