//! A device that only reports what it would do.
//!
//! Used with `--dry-run` to rehearse a profile (usually together with
//! `--speed`) when no bulb is on the network.

use super::{DeviceConnector, DeviceError, LightDevice, LightState};

#[derive(Debug, Clone, Default)]
pub struct DryRunConnector {
    pub verbose: bool,
}

impl DeviceConnector for DryRunConnector {
    fn connect(&self, address: &str) -> Result<Box<dyn LightDevice>, DeviceError> {
        if self.verbose {
            log_debug!("Dry run: pretending to connect to {address}");
        }
        Ok(Box::new(DryRunDevice::new(address, self.verbose)))
    }
}

#[derive(Debug, Clone)]
pub struct DryRunDevice {
    state: LightState,
    verbose: bool,
}

impl DryRunDevice {
    pub fn new(address: &str, verbose: bool) -> Self {
        Self {
            state: LightState {
                alias: format!("dry run ({address})"),
                model: "simulated".to_string(),
                ..LightState::default()
            },
            verbose,
        }
    }

    fn report(&self, command: &str) {
        if self.verbose {
            log_indented!("dry run → {command}");
        }
    }
}

impl LightDevice for DryRunDevice {
    fn refresh_state(&mut self) -> Result<LightState, DeviceError> {
        Ok(self.state.clone())
    }

    fn is_on(&self) -> bool {
        self.state.is_on
    }

    fn turn_on(&mut self) -> Result<(), DeviceError> {
        self.report("power on");
        self.state.is_on = true;
        Ok(())
    }

    fn turn_off(&mut self) -> Result<(), DeviceError> {
        self.report("power off");
        self.state.is_on = false;
        Ok(())
    }

    fn set_brightness(&mut self, percent: u8) -> Result<(), DeviceError> {
        self.report(&format!("brightness {percent}%"));
        self.state.brightness = Some(percent);
        Ok(())
    }

    fn set_color_temperature(&mut self, kelvin: u16) -> Result<(), DeviceError> {
        let (low, high) = self.temperature_range();
        let kelvin = kelvin.clamp(low, high);
        self.report(&format!("color temperature {kelvin}K"));
        self.state.color_temperature = Some(kelvin);
        Ok(())
    }
}
