/**
 * @file session.rs
 * @date 17/10/2026
 * @brief A simulated bench: one MCU, a fixed-voltage circuit and their tasks
 */
use crate::config::RunnerConfig;
use crate::trace::TraceInspector;
use avr8::processor::IdleCore;
use avr8::simulator::SyncStats;
use avr8::{Circuit, FixedCircuit, Mcu, PinSyncMode, Simulator, TaskHandle, TaskScheduler};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;
use tokio::fs;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read {path}: {source}")]
    FileSystemError {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Simulator(#[from] avr8::SimulatorError),
}

pub struct Tasks {
    pub clock: TaskHandle,
    pub simulator: TaskHandle,
}

impl Tasks {
    pub fn is_finished(&self) -> bool {
        self.clock.is_stopped() || self.simulator.is_stopped()
    }

    pub fn stop(&self) {
        self.clock.stop();
        self.simulator.stop();
    }
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub chip: String,
    pub frequency: f64,
    pub time: f64,
    pub cycles: u64,
    pub pc: u32,
    pub ticks: u64,
    pub instructions: u64,
    pub overshoot_cycles: u64,
    pub clock_anomalies: u64,
    pub conversions: u64,
    /// Levels last driven onto the circuit, by pin
    pub outputs: Vec<(usize, bool)>,
}

pub struct Session {
    pub simulator: Rc<RefCell<Simulator>>,
    pub circuit: Rc<RefCell<FixedCircuit>>,
    duration: f64,
    timestep: f64,
}

impl Session {
    pub async fn load(config: &RunnerConfig) -> Result<Self, RunnerError> {
        let text = fs::read_to_string(&config.hex)
            .await
            .map_err(|source| RunnerError::FileSystemError {
                path: config.hex.clone(),
                source,
            })?;

        Self::from_hex(config, &text)
    }

    pub fn from_hex(config: &RunnerConfig, text: &str) -> Result<Self, RunnerError> {
        config.validate()?;

        let chip = avr8::chip::by_name(&config.chip)
            .ok_or_else(|| avr8::SimulatorError::UnknownChip(config.chip.clone()))?;

        let mut mcu = Mcu::new(chip, Box::new(IdleCore::new()))?;
        mcu.load_hex(text)?;

        if config.trace {
            mcu.set_inspector(Rc::new(TraceInspector::new(std::io::stdout())));
        }

        let pin_sync = if config.pin_sync {
            PinSyncMode::Full
        } else {
            PinSyncMode::Disabled
        };

        let mut simulator = Simulator::new(mcu, 0.0).with_pin_sync(pin_sync);
        if let Some(frequency) = config.frequency {
            simulator = simulator.with_frequency(frequency)?;
        }

        let mut circuit = FixedCircuit::new();
        for source in &config.voltages {
            circuit.set_voltage(&source.node, source.volts);
        }

        log::info!(
            "Running {} at {} Hz for {}s in steps of {}s",
            chip.name,
            simulator.frequency(),
            config.duration,
            config.timestep
        );

        Ok(Self {
            simulator: Rc::new(RefCell::new(simulator)),
            circuit: Rc::new(RefCell::new(circuit)),
            duration: config.duration,
            timestep: config.timestep,
        })
    }

    /// Queue the clock task, then the simulator task, so every round first
    /// advances the circuit by one timestep and then catches the MCU up.
    pub fn start(&self, scheduler: &TaskScheduler) -> Tasks {
        let circuit = self.circuit.clone();
        let (duration, timestep) = (self.duration, self.timestep);

        let clock = scheduler.start("clock", move |handle| {
            let mut circuit = circuit.borrow_mut();
            let next = (circuit.time() + timestep).min(duration);
            circuit.set_time(next);

            if next >= duration {
                handle.stop();
            }
        });

        let simulator = Simulator::spawn(self.simulator.clone(), self.circuit.clone(), scheduler);

        Tasks { clock, simulator }
    }

    pub fn summary(&self) -> Summary {
        let simulator = self.simulator.borrow();
        let stats: SyncStats = simulator.stats();
        let mcu = &simulator.mcu;

        let outputs = (0..mcu.pin_count())
            .filter_map(|pin| simulator.bridge().driven(pin).map(|high| (pin, high)))
            .collect();

        Summary {
            chip: mcu.chip().name.to_string(),
            frequency: simulator.frequency(),
            time: simulator.clock().last_time(),
            cycles: mcu.cycles(),
            pc: mcu.pc(),
            ticks: stats.ticks,
            instructions: stats.instructions,
            overshoot_cycles: stats.overshoot_cycles,
            clock_anomalies: stats.clock_anomalies,
            conversions: stats.conversions,
            outputs,
        }
    }
}
