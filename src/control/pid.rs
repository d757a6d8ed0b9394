//! PID kettle control.
//!
//! The PID output (0..=max_output %) is turned into a duty cycle for an
//! on/off heater: within each `sample_time` window the element is on for
//! `output %` of the window and off for the rest.

use std::time::Duration;

use anyhow::Context as _;
use log::{debug, info, warn};

use crate::error::ConfigError;

use super::{AlgorithmParams, ControlLoop, ControlLoopConfig, ControlLoopFactory, check_param, param};

const DEFAULT_P: f64 = 44.0;
const DEFAULT_I: f64 = 165.0;
const DEFAULT_D: f64 = 4.0;
const DEFAULT_MAX_OUTPUT: f64 = 100.0;
const DEFAULT_SAMPLE_TIME_S: f64 = 5.0;

/// PID controller
///
/// Derivative acts on the measurement, not the error, so setpoint jumps
/// do not kick the output.
pub struct PidController {
    kp: f64,
    ki: f64,
    kd: f64,
    integral: f64,
    last_input: Option<f64>,
    output_min: f64,
    output_max: f64,
}

impl PidController {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            integral: 0.0,
            last_input: None,
            output_min: 0.0,
            output_max: 100.0,
        }
    }

    /// Set output limits
    pub fn set_limits(&mut self, min: f64, max: f64) {
        self.output_min = min;
        self.output_max = max;
        self.integral = self.integral.clamp(min, max);
    }

    /// Compute the output for one sample of `dt` seconds.
    pub fn compute(&mut self, input: f64, setpoint: f64, dt: f64) -> f64 {
        let error = setpoint - input;

        // Integral term is clamped in place (anti-windup).
        self.integral = (self.integral + self.ki * error * dt).clamp(self.output_min, self.output_max);

        let derivative = match self.last_input {
            Some(last) if dt > 0.0 => -(input - last) / dt,
            _ => 0.0,
        };
        self.last_input = Some(input);

        (self.kp * error + self.integral + self.kd * derivative)
            .clamp(self.output_min, self.output_max)
    }

    /// Reset controller state
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_input = None;
    }
}

pub struct PidFactory;

impl ControlLoopFactory for PidFactory {
    fn name(&self) -> &'static str {
        "pid"
    }

    fn validate(&self, params: &AlgorithmParams) -> Result<(), ConfigError> {
        check_param(params, "p", 0.0, 10_000.0)?;
        check_param(params, "i", 0.0, 10_000.0)?;
        check_param(params, "d", 0.0, 10_000.0)?;
        check_param(params, "max_output", 0.0, 100.0)?;
        check_param(params, "sample_time", 0.01, 3600.0)
    }

    fn construct(&self, config: ControlLoopConfig) -> anyhow::Result<Box<dyn ControlLoop>> {
        self.validate(&config.params)?;

        let p = &config.params;
        let mut pid = PidController::new(
            param(p, "p", DEFAULT_P),
            param(p, "i", DEFAULT_I),
            param(p, "d", DEFAULT_D),
        );
        pid.set_limits(0.0, param(p, "max_output", DEFAULT_MAX_OUTPUT));
        let sample_time = param(p, "sample_time", DEFAULT_SAMPLE_TIME_S);

        Ok(Box::new(PidLoop {
            pid,
            sample_time,
            config,
        }))
    }
}

/// Split one sample window into heater on/off durations.  A non-finite
/// output keeps the heater off for the whole window; a non-finite or
/// negative window yields no time at all.
pub fn duty_cycle(output_pct: f64, window_s: f64) -> (Duration, Duration) {
    if !window_s.is_finite() || window_s <= 0.0 {
        return (Duration::ZERO, Duration::ZERO);
    }
    if !output_pct.is_finite() {
        return (Duration::ZERO, Duration::from_secs_f64(window_s));
    }
    let on = (window_s * output_pct.clamp(0.0, 100.0) / 100.0).clamp(0.0, window_s);
    (
        Duration::from_secs_f64(on),
        Duration::from_secs_f64(window_s - on),
    )
}

struct PidLoop {
    config: ControlLoopConfig,
    pid: PidController,
    sample_time: f64,
}

impl PidLoop {
    /// Run one sample window.  Returns `true` once stop was requested.
    fn window(&mut self) -> anyhow::Result<bool> {
        let heater = self.config.heater;
        let stop = &self.config.stop;

        let output = match self.config.sensors.read_temperature(self.config.sensor) {
            Ok(temp) if !temp.is_finite() => {
                warn!("Kettle {} reading {} is not usable, heater off this window", self.config.kettle, temp);
                0.0
            }
            Ok(temp) => {
                let out = self.pid.compute(temp, self.config.setpoint.get(), self.sample_time);
                debug!("Kettle {} pid: temp={:.2} out={:.1}%", self.config.kettle, temp, out);
                out
            }
            Err(e) => {
                warn!("Kettle {} reading unavailable ({}), heater off this window", self.config.kettle, e);
                0.0
            }
        };

        let (on, off) = duty_cycle(output, self.sample_time);
        if !on.is_zero() {
            self.config
                .actuators
                .turn_on(heater)
                .with_context(|| format!("switching heater {heater} on"))?;
            if stop.wait(on) {
                return Ok(true);
            }
        }
        if !off.is_zero() {
            self.config
                .actuators
                .turn_off(heater)
                .with_context(|| format!("switching heater {heater} off"))?;
            if stop.wait(off) {
                return Ok(true);
            }
        }
        Ok(stop.is_stopped())
    }
}

impl ControlLoop for PidLoop {
    fn run(&mut self) -> anyhow::Result<()> {
        info!(
            "Kettle {} pid loop started (sample {:.1}s)",
            self.config.kettle, self.sample_time
        );

        let mut result = Ok(());
        while !self.config.stop.is_stopped() {
            match self.window() {
                Ok(true) => break,
                Ok(false) => {}
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        let off = self
            .config
            .actuators
            .turn_off(self.config.heater)
            .with_context(|| format!("switching heater {} off", self.config.heater));
        result.and(off)
    }
}
