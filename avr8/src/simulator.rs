/**
 * @file simulator.rs
 * @date 17/10/2026
 * @brief Lockstep execution of the emulated MCU against external simulated time
 */
pub mod stats;

use crate::bridge::PinBridge;
use crate::circuit::Circuit;
use crate::clock::{Elapsed, SyncClock};
use crate::common::Seconds;
use crate::inspector::InspectionEvent;
use crate::mcu::Mcu;
use crate::task::{TaskHandle, TaskScheduler};
use crate::{Result, SimulatorError};
pub use stats::SyncStats;
use std::cell::RefCell;
use std::rc::Rc;

pub type Observer = Box<dyn FnMut(&Mcu)>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PinSyncMode {
    /// Sample inputs before and drive outputs after every step
    #[default]
    Full,
    /// Pins are left alone, only time and the ADC are synchronized
    Disabled,
}

/// Outcome of a single synchronization step
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub time: Seconds,
    pub elapsed: Seconds,
    pub budget: u64,
    pub executed_cycles: u64,
    pub instructions: u64,
    pub overshoot: u64,
}

pub struct Simulator {
    pub mcu: Mcu,
    clock: SyncClock,
    bridge: PinBridge,
    observer: Option<Observer>,
    stats: SyncStats,
    pin_sync: PinSyncMode,
}

impl Simulator {
    /// Synchronize `mcu` starting from external time `start`,
    /// clocked at the default frequency of its chip
    pub fn new(mcu: Mcu, start: Seconds) -> Self {
        let clock = SyncClock::new(start, mcu.chip().default_frequency);
        let bridge = PinBridge::new(mcu.pin_count());

        Self {
            mcu,
            clock,
            bridge,
            observer: None,
            stats: SyncStats::default(),
            pin_sync: PinSyncMode::default(),
        }
    }

    pub fn with_frequency(mut self, frequency: f64) -> Result<Self> {
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(SimulatorError::InvalidFrequency(frequency));
        }

        self.clock.set_frequency(frequency);
        Ok(self)
    }

    pub fn with_pin_sync(mut self, mode: PinSyncMode) -> Self {
        self.pin_sync = mode;
        self
    }

    /// Called once after every step with the state left by the batch
    pub fn set_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&Mcu) + 'static,
    {
        self.observer = Some(Box::new(observer));
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    pub fn clock(&self) -> &SyncClock {
        &self.clock
    }

    pub fn frequency(&self) -> f64 {
        self.clock.frequency()
    }

    pub fn pin_sync(&self) -> PinSyncMode {
        self.pin_sync
    }

    pub fn bridge(&self) -> &PinBridge {
        &self.bridge
    }

    pub fn stats(&self) -> SyncStats {
        SyncStats {
            conversions: self.mcu.adc().map_or(0, |adc| adc.conversions()),
            ..self.stats
        }
    }

    /// Reset the MCU and restart synchronization from `start`
    pub fn reset(&mut self, start: Seconds) {
        self.mcu.reset();
        self.clock = SyncClock::new(start, self.clock.frequency());
        self.bridge = PinBridge::new(self.mcu.pin_count());
        self.stats = SyncStats::default();
    }

    /// Bring the MCU up to the current time of `circuit`
    pub fn step(&mut self, circuit: &mut dyn Circuit) -> StepReport {
        let now = circuit.time();
        self.step_to(circuit, now)
    }

    /// Execute the cycles covering the time since the last step, then
    /// exchange pin levels with `circuit` and notify the observer.
    pub fn step_to(&mut self, circuit: &mut dyn Circuit, now: Seconds) -> StepReport {
        let elapsed = match self.clock.elapsed(now) {
            Elapsed::Forward(elapsed) => elapsed,
            Elapsed::Stalled => {
                self.stats.stalled_ticks += 1;
                0.0
            }
            Elapsed::Backwards(_) => {
                let last = self.clock.last_time();
                log::warn!("Simulated time went backwards from {last}s to {now}s");
                self.mcu
                    .inspector()
                    .raise(InspectionEvent::ClockAnomaly { last, now });
                self.stats.clock_anomalies += 1;
                0.0
            }
        };

        let start = self.mcu.cycles();
        let budget = match self.clock.budget(elapsed) {
            Some(budget) if start.checked_add(budget).is_some() => budget,
            _ => {
                let last = self.clock.last_time();
                log::warn!("Cannot execute a jump from {last}s to {now}s, skipping it");
                self.mcu
                    .inspector()
                    .raise(InspectionEvent::ClockAnomaly { last, now });
                self.stats.clock_anomalies += 1;
                0
            }
        };

        if self.pin_sync == PinSyncMode::Full {
            self.bridge.sync_pins_in(&mut self.mcu, &*circuit);
        }

        let target = start + budget;
        let mut instructions = 0;

        while self.mcu.cycles() < target {
            self.mcu.tick(circuit);
            instructions += 1;
        }

        let executed_cycles = self.mcu.cycles() - start;
        let overshoot = executed_cycles - budget;
        self.clock.advance(now);

        if self.pin_sync == PinSyncMode::Full {
            self.bridge.sync_pins_out(&self.mcu, circuit);
        }

        self.stats.ticks += 1;
        self.stats.executed_cycles += executed_cycles;
        self.stats.instructions += instructions;
        self.stats.overshoot_cycles += overshoot;

        self.mcu.inspector().raise(InspectionEvent::StepCompleted {
            time: now,
            executed_cycles,
            total_cycles: self.mcu.cycles(),
        });

        if let Some(observer) = self.observer.as_mut() {
            observer(&self.mcu);
        }

        StepReport {
            time: now,
            elapsed,
            budget,
            executed_cycles,
            instructions,
            overshoot,
        }
    }

    /// Step through shared handles. A step requested while another one is
    /// still running, or while the circuit is borrowed, is refused.
    pub fn step_shared<C: Circuit>(
        simulator: &RefCell<Self>,
        circuit: &RefCell<C>,
    ) -> Result<StepReport> {
        let mut simulator = simulator
            .try_borrow_mut()
            .map_err(|_| SimulatorError::ReentrantStep)?;
        let mut circuit = circuit
            .try_borrow_mut()
            .map_err(|_| SimulatorError::CircuitBusy)?;

        Ok(simulator.step(&mut *circuit))
    }

    /// Step on every run of a repeating task until the returned handle is stopped.
    /// The task stops itself on a refused step.
    pub fn spawn<C: Circuit + 'static>(
        simulator: Rc<RefCell<Self>>,
        circuit: Rc<RefCell<C>>,
        scheduler: &TaskScheduler,
    ) -> TaskHandle {
        scheduler.start("simulator", move |handle| {
            if let Err(why) = Self::step_shared(&simulator, &*circuit) {
                log::error!("Stopping simulator task: {why}");
                handle.stop();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::ATMEGA328P;
    use crate::chip::atmega328p::{ADC, PORT_B};
    use crate::circuit::FixedCircuit;
    use crate::common::MHZ;
    use crate::inspector::tests::RecordingInspector;
    use crate::mcu::tests::{Op, ScriptCore};
    use crate::processor::IdleCore;
    use std::cell::Cell;

    const F: f64 = 16.0 * MHZ;

    macro_rules! setup {
        ($sim:ident) => {
            let mcu = Mcu::new(&ATMEGA328P, Box::new(IdleCore::new())).unwrap();
            #[allow(unused_mut)]
            let mut $sim = Simulator::new(mcu, 0.0);
        };
        ($sim:ident, $script:expr) => {
            let mcu = Mcu::new(&ATMEGA328P, Box::new(ScriptCore::new($script))).unwrap();
            #[allow(unused_mut)]
            let mut $sim = Simulator::new(mcu, 0.0);
        };
    }

    #[test]
    fn test_single_cycle_step() {
        setup!(sim);
        let calls = Rc::new(Cell::new(0));

        let counter = calls.clone();
        sim.set_observer(move |mcu| {
            assert_eq!(mcu.pc(), 1);
            counter.set(counter.get() + 1);
        });

        let mut circuit = FixedCircuit::new();
        let report = sim.step_to(&mut circuit, 1.0 / F);

        assert_eq!(report.executed_cycles, 1);
        assert_eq!(report.instructions, 1);
        assert_eq!(report.overshoot, 0);
        assert_eq!(sim.mcu.pc(), 1);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_cycles_follow_time() {
        setup!(sim);
        let mut circuit = FixedCircuit::new();

        let times = [
            (1e-6, 16),
            (1.5e-6, 8),
            (2.0e-6, 8),
            (0.01, 159_968),
            (0.010_000_03, 1),
            (0.02, 160_000),
        ];

        for (now, budget) in times {
            let report = sim.step_to(&mut circuit, now);

            assert_eq!(report.budget, budget);
            assert_eq!(report.executed_cycles, budget);
        }

        assert_eq!(sim.mcu.cycles(), 320_001);
        assert_eq!(sim.stats().executed_cycles, 320_001);
        assert_eq!(sim.stats().ticks, times.len() as u64);
    }

    #[test]
    fn test_step_reads_circuit_time() {
        setup!(sim);
        let mut circuit = FixedCircuit::new();

        circuit.advance(1e-3);
        assert_eq!(sim.step(&mut circuit).executed_cycles, 16_000);
        circuit.advance(1e-3);
        assert_eq!(sim.step(&mut circuit).executed_cycles, 16_000);
        assert_eq!(sim.clock().last_time(), circuit.time());
    }

    #[test]
    fn test_overshoot_is_recorded() {
        setup!(sim, &[Op::Wait(4)]);
        let mut circuit = FixedCircuit::new();

        let report = sim.step_to(&mut circuit, 1.0 / F);
        assert_eq!(report.budget, 1);
        assert_eq!(report.executed_cycles, 4);
        assert_eq!(report.overshoot, 3);

        let report = sim.step_to(&mut circuit, 3.0 / F);
        assert_eq!(report.executed_cycles, 2);
        assert_eq!(report.overshoot, 0);

        assert_eq!(sim.stats().overshoot_cycles, 3);
        assert_eq!(sim.mcu.cycles(), 6);
    }

    #[test]
    fn test_zero_elapsed_steps() {
        setup!(sim);
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        sim.set_observer(move |_| counter.set(counter.get() + 1));

        let mut circuit = FixedCircuit::new().with_voltage("pin2", 5.0);

        for _ in 0..2 {
            let report = sim.step_to(&mut circuit, 0.0);
            assert_eq!(report.executed_cycles, 0);
            assert_eq!(report.instructions, 0);
        }

        assert_eq!(sim.mcu.cycles(), 0);
        assert_eq!(calls.get(), 2);
        assert_eq!(sim.stats().stalled_ticks, 2);
        // still resampled
        assert_eq!(sim.bridge().sampled(2), Some(true));
    }

    #[test]
    fn test_time_going_backwards() {
        setup!(sim);
        let recorder = Rc::new(RecordingInspector::default());
        sim.mcu.set_inspector(recorder.clone());

        let mut circuit = FixedCircuit::new();
        sim.step_to(&mut circuit, 2e-6);

        let report = sim.step_to(&mut circuit, 1e-6);
        assert_eq!(report.executed_cycles, 0);
        assert_eq!(sim.clock().last_time(), 1e-6);
        assert_eq!(sim.stats().clock_anomalies, 1);

        assert!(recorder.events.borrow().contains(&InspectionEvent::ClockAnomaly {
            last: 2e-6,
            now: 1e-6
        }));

        // continues from the new reference point
        assert_eq!(sim.step_to(&mut circuit, 2e-6).executed_cycles, 16);
    }

    #[test]
    fn test_unrepresentable_jump_is_skipped() {
        setup!(sim);
        let recorder = Rc::new(RecordingInspector::default());
        sim.mcu.set_inspector(recorder.clone());

        let mut circuit = FixedCircuit::new();
        sim.step_to(&mut circuit, 1e-6);

        let report = sim.step_to(&mut circuit, 1e13);
        assert_eq!(report.budget, 0);
        assert_eq!(report.executed_cycles, 0);
        assert_eq!(sim.mcu.cycles(), 16);
        assert_eq!(sim.clock().last_time(), 1e13);
        assert_eq!(sim.stats().clock_anomalies, 1);
        assert!(recorder.events.borrow().contains(&InspectionEvent::ClockAnomaly {
            last: 1e-6,
            now: 1e13
        }));

        // a representable step afterwards runs normally
        assert_eq!(sim.step_to(&mut circuit, 1e13 + 1.0).executed_cycles, 16_000_000);
    }

    #[test]
    fn test_blink_drives_pin_13() {
        setup!(
            sim,
            &[Op::Write(PORT_B.ddr, 0x20), Op::Write(PORT_B.port, 0x20)]
        );
        let seen = Rc::new(Cell::new(None));

        let state = seen.clone();
        sim.set_observer(move |mcu| state.set(mcu.pin_state(13)));

        let mut circuit = FixedCircuit::new();
        sim.step_to(&mut circuit, 4.0 / F);

        assert_eq!(circuit.driven("pin13"), Some(5.0));
        assert_eq!(seen.get(), Some(crate::gpio::PinState::DrivenHigh));
    }

    #[test]
    fn test_pin_sync_disabled() {
        setup!(
            sim,
            &[Op::Write(PORT_B.ddr, 0x20), Op::Write(PORT_B.port, 0x20)]
        );
        let mut sim = sim.with_pin_sync(PinSyncMode::Disabled);

        let mut circuit = FixedCircuit::new().with_voltage("pin2", 5.0);
        sim.step_to(&mut circuit, 4.0 / F);

        assert_eq!(circuit.driven("pin13"), None);
        assert_eq!(sim.bridge().sampled(2), None);
    }

    #[test]
    fn test_adc_samples_during_batch() {
        setup!(
            sim,
            &[Op::Write(ADC.admux, 0x43), Op::Write(ADC.adcsra, 0xC7)]
        );

        let mut circuit = FixedCircuit::new().with_voltage("A3", 2.5);
        sim.step_to(&mut circuit, 4.0 / F);

        let data = sim.mcu.data();
        assert_eq!(data.reg(ADC.adcl), 0x00);
        assert_eq!(data.reg(ADC.adch), 0x02);
        assert_eq!(sim.stats().conversions, 1);
    }

    #[test]
    fn test_frequency_override() {
        setup!(sim);
        let mut sim = sim.with_frequency(8.0 * MHZ).unwrap();

        let mut circuit = FixedCircuit::new();
        assert_eq!(sim.step_to(&mut circuit, 1e-3).executed_cycles, 8_000);

        for frequency in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            setup!(sim);
            assert!(matches!(
                sim.with_frequency(frequency),
                Err(SimulatorError::InvalidFrequency(_))
            ));
        }
    }

    #[test]
    fn test_reentrant_step_is_refused() {
        setup!(sim);
        let sim = Rc::new(RefCell::new(sim));
        let circuit = Rc::new(RefCell::new(FixedCircuit::new()));

        let result = Rc::new(RefCell::new(None));
        {
            let (inner, circuit, result) = (sim.clone(), circuit.clone(), result.clone());
            sim.borrow_mut().set_observer(move |_| {
                *result.borrow_mut() = Some(Simulator::step_shared(&inner, &*circuit));
            });
        }

        circuit.borrow_mut().advance(1e-6);
        let outer = Simulator::step_shared(&sim, &*circuit);

        // the circuit is free again once the outer step returned
        assert!(outer.is_ok());
        assert_eq!(
            result.borrow_mut().take(),
            Some(Err(SimulatorError::ReentrantStep))
        );

        let _busy = circuit.borrow_mut();
        assert_eq!(
            Simulator::step_shared(&sim, &*circuit),
            Err(SimulatorError::CircuitBusy)
        );
    }

    #[test]
    fn test_spawned_task() {
        setup!(sim);
        let sim = Rc::new(RefCell::new(sim));
        let circuit = Rc::new(RefCell::new(FixedCircuit::new()));
        let scheduler = TaskScheduler::new();

        let clock = circuit.clone();
        let advance = scheduler.start("clock", move |_| clock.borrow_mut().advance(1e-6));
        let handle = Simulator::spawn(sim.clone(), circuit.clone(), &scheduler);

        for _ in 0..3 {
            scheduler.run_round();
        }

        assert_eq!(sim.borrow().mcu.cycles(), 48);
        assert_eq!(sim.borrow().stats().ticks, 3);

        handle.stop();
        scheduler.run_round();
        assert_eq!(sim.borrow().stats().ticks, 3);

        advance.stop();
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_spawned_task_stops_on_busy_circuit() {
        setup!(sim);
        let sim = Rc::new(RefCell::new(sim));
        let circuit = Rc::new(RefCell::new(FixedCircuit::new()));
        let scheduler = TaskScheduler::new();

        let handle = Simulator::spawn(sim.clone(), circuit.clone(), &scheduler);

        let guard = circuit.borrow_mut();
        scheduler.run_round();
        drop(guard);

        assert!(handle.is_stopped());
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_reset() {
        setup!(sim);
        let mut circuit = FixedCircuit::new();
        sim.step_to(&mut circuit, 1e-3);

        sim.reset(5.0);
        assert_eq!(sim.mcu.cycles(), 0);
        assert_eq!(sim.stats(), SyncStats::default());
        assert_eq!(sim.step_to(&mut circuit, 5.0 + 1e-6).executed_cycles, 16);
    }
}
