/**
 * @file config.rs
 * @date 17/10/2026
 * @brief Configuration handling for the runner.
 */
use crate::session::RunnerError;
use serde::{Deserialize, Serialize};

/// Fixed voltage applied to a circuit node for the whole run
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NodeVoltage {
    pub node: String,
    pub volts: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Intel HEX image to run
    pub hex: String,
    pub chip: String,
    /// Overrides the default clock of the chip, in Hz
    pub frequency: Option<f64>,
    /// Simulated seconds to run for
    pub duration: f64,
    /// Simulated seconds between two synchronization steps
    pub timestep: f64,
    pub pin_sync: bool,
    /// Print one JSON line per step and pin change on stdout
    pub trace: bool,
    pub voltages: Vec<NodeVoltage>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            hex: String::from("./firmware.hex"),
            chip: String::from("atmega328p"),
            frequency: None,
            duration: 1.0,
            timestep: 1e-3,
            pin_sync: true,
            trace: false,
            voltages: Vec::new(),
        }
    }
}

impl RunnerConfig {
    pub fn parse(path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Config::try_from(&RunnerConfig::default())?)
            .add_source(config::File::with_name(path).required(false))
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> Result<(), RunnerError> {
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(RunnerError::InvalidConfig(format!(
                "duration must be a positive number of seconds, got {}",
                self.duration
            )));
        }

        if !(self.timestep.is_finite() && self.timestep > 0.0) {
            return Err(RunnerError::InvalidConfig(format!(
                "timestep must be a positive number of seconds, got {}",
                self.timestep
            )));
        }

        if let Some(source) = self.voltages.iter().find(|source| !source.volts.is_finite()) {
            return Err(RunnerError::InvalidConfig(format!(
                "voltage of node {} must be finite",
                source.node
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = RunnerConfig::parse("./does-not-exist.toml").unwrap();
        assert_eq!(config, RunnerConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("avr8-runner-{}.toml", std::process::id()));
        fs::write(
            &path,
            r#"
hex = "blink.hex"
frequency = 8000000.0
duration = 0.5
trace = true

[[voltages]]
node = "A0"
volts = 2.5
"#,
        )
        .unwrap();

        let config = RunnerConfig::parse(path.to_str().unwrap()).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.hex, "blink.hex");
        assert_eq!(config.chip, "atmega328p");
        assert_eq!(config.frequency, Some(8e6));
        assert_eq!(config.duration, 0.5);
        assert_eq!(config.timestep, 1e-3);
        assert!(config.trace);
        assert_eq!(
            config.voltages,
            [NodeVoltage {
                node: "A0".to_string(),
                volts: 2.5
            }]
        );
    }

    #[test]
    fn test_file_without_voltages() {
        let path = std::env::temp_dir().join(format!(
            "avr8-runner-novoltages-{}.toml",
            std::process::id()
        ));
        fs::write(&path, "hex = \"blink.hex\"\nduration = 0.5\n").unwrap();

        let config = RunnerConfig::parse(path.to_str().unwrap()).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.hex, "blink.hex");
        assert_eq!(config.duration, 0.5);
        assert_eq!(config.frequency, None);
        assert!(config.voltages.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let config = RunnerConfig {
            timestep: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(RunnerError::InvalidConfig(_))));

        let config = RunnerConfig {
            duration: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
