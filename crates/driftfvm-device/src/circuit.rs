// crates/driftfvm-device/src/circuit.rs

//! External circuit attached to one electrode: series R and L, shunt C,
//! and a voltage or current source, contributing one unknown (the
//! electrode potential) and one MNA-style equation.

use serde::{Deserialize, Serialize};

/// How the electrode is driven.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitDrive {
    /// Voltage source behind the series R/L.
    Voltage,
    /// Current source into the electrode.
    Current,
    /// Tied to an interconnect hub through the series resistance.
    InterConnect,
    /// Floating: zero net terminal current.
    Float,
}

/// Per-electrode circuit state.
///
/// `current`, `cap_current` and `potential` are the committed step
/// history; the `_itering` fields hold the values of the Newton iterate
/// currently being assembled and are promoted by [`ExtCircuit::update`]
/// on step acceptance.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ExtCircuit {
    /// Series resistance [Ω].
    pub r: f64,
    /// Shunt capacitance [F].
    pub c: f64,
    /// Series inductance [H].
    pub l: f64,
    /// Applied source voltage [V] (voltage drive).
    pub v_app: f64,
    /// Applied source current [A] (current drive).
    pub i_app: f64,
    /// Drive mode.
    pub drive: CircuitDrive,

    /// Committed terminal current `I` of the last accepted step [A].
    pub current: f64,
    /// Committed capacitor current `I_c` of the last accepted step [A].
    pub cap_current: f64,
    /// Committed electrode potential `P` of the last accepted step [V].
    pub potential: f64,
    /// Terminal current of the Newton iterate being assembled.
    pub current_itering: f64,
    /// Electrode potential of the Newton iterate being assembled.
    pub potential_itering: f64,
}

impl ExtCircuit {
    /// A plain voltage-driven electrode with no parasitics.
    #[must_use]
    pub fn voltage(v_app: f64) -> Self {
        Self {
            r: 0.0,
            c: 0.0,
            l: 0.0,
            v_app,
            i_app: 0.0,
            drive: CircuitDrive::Voltage,
            current: 0.0,
            cap_current: 0.0,
            potential: v_app,
            current_itering: 0.0,
            potential_itering: v_app,
        }
    }

    /// A current-driven electrode.
    #[must_use]
    pub fn current_source(i_app: f64) -> Self {
        Self {
            i_app,
            drive: CircuitDrive::Current,
            ..Self::voltage(0.0)
        }
    }

    /// A floating electrode (zero net current).
    #[must_use]
    pub fn floating() -> Self {
        Self {
            drive: CircuitDrive::Float,
            ..Self::voltage(0.0)
        }
    }

    /// Attach series resistance/inductance and shunt capacitance.
    #[must_use]
    pub fn with_rlc(mut self, r: f64, c: f64, l: f64) -> Self {
        self.r = r;
        self.c = c;
        self.l = l;
        self
    }

    /// Whether the drive is a voltage source.
    #[must_use]
    pub fn is_voltage_driven(&self) -> bool {
        self.drive == CircuitDrive::Voltage
    }

    /// Whether the drive is a current source.
    #[must_use]
    pub fn is_current_driven(&self) -> bool {
        self.drive == CircuitDrive::Current
    }

    /// Scale factor applied to the integrated terminal current in the
    /// electrode equation: `L/dt + R` for voltage drive, `1` otherwise.
    /// `dt <= 0` means steady state, where the inductor is a short.
    #[must_use]
    pub fn mna_scaling(&self, dt: f64) -> f64 {
        match self.drive {
            CircuitDrive::Voltage => {
                if dt > 0.0 {
                    self.l / dt + self.r
                } else {
                    self.r
                }
            }
            CircuitDrive::InterConnect => self.r,
            CircuitDrive::Current | CircuitDrive::Float => 1.0,
        }
    }

    /// Source-side residual of the electrode equation (the part that does
    /// not contain the integrated terminal current).
    #[must_use]
    pub fn mna_function(&self, dt: f64) -> f64 {
        let ve = self.potential_itering;
        match self.drive {
            CircuitDrive::Voltage => {
                if dt > 0.0 {
                    let a = (self.l / dt + self.r) * self.c / dt;
                    (ve - self.v_app) + a * ve - a * self.potential
                        - self.l / dt * (self.current + self.cap_current)
                } else {
                    ve - self.v_app
                }
            }
            CircuitDrive::Current => {
                if dt > 0.0 {
                    self.cap_current - self.i_app
                } else {
                    -self.i_app
                }
            }
            CircuitDrive::InterConnect | CircuitDrive::Float => 0.0,
        }
    }

    /// `d(mna_function)/d(V_e)`.
    #[must_use]
    pub fn mna_jacobian(&self, dt: f64) -> f64 {
        match self.drive {
            CircuitDrive::Voltage => {
                if dt > 0.0 {
                    1.0 + (self.l / dt + self.r) * self.c / dt
                } else {
                    1.0
                }
            }
            CircuitDrive::Current | CircuitDrive::InterConnect | CircuitDrive::Float => 0.0,
        }
    }

    /// Commit the iterate on step acceptance: promote `I` and `V_e`,
    /// recompute the capacitor current from the potential step.
    pub fn update(&mut self, dt: f64) {
        self.cap_current = if dt > 0.0 {
            self.c * (self.potential_itering - self.potential) / dt
        } else {
            0.0
        };
        self.current = self.current_itering;
        self.potential = self.potential_itering;
    }
}
