//! On/off hysteresis control.
//!
//! The heater switches on once the kettle drops below
//! `target - on_offset` and off again at `target - off_offset`, leaving a
//! dead band in between where the last command is kept.

use std::time::Duration;

use anyhow::Context as _;
use log::{debug, info, warn};

use crate::error::ConfigError;

use super::{AlgorithmParams, ControlLoop, ControlLoopConfig, ControlLoopFactory, check_param, param};

const DEFAULT_ON_OFFSET: f64 = 0.5;
const DEFAULT_OFF_OFFSET: f64 = 0.0;
const DEFAULT_INTERVAL_S: f64 = 1.0;

pub struct HysteresisFactory;

impl ControlLoopFactory for HysteresisFactory {
    fn name(&self) -> &'static str {
        "hysteresis"
    }

    fn validate(&self, params: &AlgorithmParams) -> Result<(), ConfigError> {
        check_param(params, "on_offset", -50.0, 50.0)?;
        check_param(params, "off_offset", -50.0, 50.0)?;
        check_param(params, "interval", 0.001, 3600.0)?;

        let on = param(params, "on_offset", DEFAULT_ON_OFFSET);
        let off = param(params, "off_offset", DEFAULT_OFF_OFFSET);
        if on < off {
            return Err(ConfigError::InvalidProperty {
                name: "on_offset".into(),
                reason: format!("{on} must not be below off_offset {off}"),
            });
        }
        Ok(())
    }

    fn construct(&self, config: ControlLoopConfig) -> anyhow::Result<Box<dyn ControlLoop>> {
        self.validate(&config.params)?;
        Ok(Box::new(HysteresisLoop {
            band: Band {
                on_offset: param(&config.params, "on_offset", DEFAULT_ON_OFFSET),
                off_offset: param(&config.params, "off_offset", DEFAULT_OFF_OFFSET),
            },
            interval: Duration::from_secs_f64(param(&config.params, "interval", DEFAULT_INTERVAL_S)),
            heater_on: false,
            config,
        }))
    }
}

/// Switching thresholds relative to the setpoint.
#[derive(Debug, Clone, Copy)]
pub struct Band {
    pub on_offset: f64,
    pub off_offset: f64,
}

impl Band {
    /// Desired heater state for one reading.  A non-finite reading
    /// always asks for the heater off.
    pub fn decide(&self, temp: f64, target: f64, heater_on: bool) -> bool {
        if !temp.is_finite() {
            false
        } else if temp < target - self.on_offset {
            true
        } else if temp >= target - self.off_offset {
            false
        } else {
            heater_on
        }
    }
}

struct HysteresisLoop {
    config: ControlLoopConfig,
    band: Band,
    interval: Duration,
    /// Last state commanded by this loop.  The band decision uses it,
    /// but the actuator is written every iteration: a predecessor loop
    /// exiting late may have switched the element behind our back.
    heater_on: bool,
}

impl HysteresisLoop {
    fn switch(&mut self, on: bool) -> anyhow::Result<()> {
        let heater = self.config.heater;
        let switched = if on {
            self.config.actuators.turn_on(heater)
        } else {
            self.config.actuators.turn_off(heater)
        };
        switched.with_context(|| format!("switching heater {heater}"))?;
        if on != self.heater_on {
            debug!("Kettle {} heater {}", self.config.kettle, if on { "ON" } else { "OFF" });
        }
        self.heater_on = on;
        Ok(())
    }

    fn iterate(&mut self) -> anyhow::Result<()> {
        match self.config.sensors.read_temperature(self.config.sensor) {
            Ok(temp) if temp.is_finite() => {
                let want = self.band.decide(temp, self.config.setpoint.get(), self.heater_on);
                self.switch(want)
            }
            Ok(temp) => {
                warn!("Kettle {} reading {} is not usable, heater off", self.config.kettle, temp);
                self.switch(false)
            }
            Err(e) => {
                warn!("Kettle {} reading unavailable ({}), heater off", self.config.kettle, e);
                self.switch(false)
            }
        }
    }
}

impl ControlLoop for HysteresisLoop {
    fn run(&mut self) -> anyhow::Result<()> {
        info!(
            "Kettle {} hysteresis loop started (on -{:.1} / off -{:.1})",
            self.config.kettle, self.band.on_offset, self.band.off_offset
        );

        let mut result = Ok(());
        while !self.config.stop.is_stopped() {
            if let Err(e) = self.iterate() {
                result = Err(e);
                break;
            }
            if self.config.stop.wait(self.interval) {
                break;
            }
        }

        // Leave the element off however we got here.
        let off = self.switch(false);
        result.and(off)
    }
}
