//! The loop thread: steps the simulation and applies commands.
//!
//! The loop thread owns the [`Simulation`] exclusively (moved in via
//! `thread::spawn`) and hands it back when it exits. Commands arrive on
//! an unbounded crossbeam channel:
//!
//! - `Init` / `Paused`: block on the channel;
//! - `Running`: drain whatever is queued, then take one step;
//! - single step: take the step first, then pause.
//!
//! Every status change is published to the shared snapshot and signalled
//! on its condition variable.

use std::sync::Arc;

use alembic_core::Status;
use crossbeam_channel::{Receiver, TryRecvError};
use tracing::{debug, error, info};

use crate::command::{Command, CommandContext};
use crate::engine::Shared;
use crate::error::SimulationError;
use crate::simulation::{Simulation, StepOutcome};

pub(crate) struct LoopThreadState {
    simulation: Simulation,
    commands: Receiver<Command>,
    shared: Arc<Shared>,
    status: Status,
    single_step: bool,
}

impl LoopThreadState {
    pub(crate) fn new(simulation: Simulation, commands: Receiver<Command>, shared: Arc<Shared>) -> Self {
        Self {
            simulation,
            commands,
            shared,
            status: Status::Init,
            single_step: false,
        }
    }

    pub(crate) fn run(mut self) -> Simulation {
        info!("loop thread started");
        if let Err(err) = self.simulation.initialize() {
            self.fail(err);
        }
        self.publish();
        while !self.status.is_final() {
            match self.status {
                Status::Running => self.run_once(),
                _ => match self.commands.recv() {
                    Ok(command) => self.apply(command),
                    // Every handle is gone and nothing can resume us.
                    Err(_) => self.set_status(Status::Stopped),
                },
            }
        }
        info!(status = %self.status, "loop thread exiting");
        self.simulation
    }

    fn run_once(&mut self) {
        // A requested single step runs before anything queued behind it.
        while !self.single_step {
            match self.commands.try_recv() {
                Ok(command) => self.apply(command),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        if self.status != Status::Running {
            return;
        }
        match self.simulation.step() {
            Ok(StepOutcome::Finished(reason)) => {
                debug!(?reason, "simulation reached a termination bound");
                self.set_status(Status::Terminated);
            }
            Ok(_) => {
                if self.single_step {
                    self.single_step = false;
                    self.set_status(Status::Paused);
                } else {
                    self.publish();
                }
            }
            Err(err) => self.fail(err),
        }
    }

    fn apply(&mut self, command: Command) {
        let mut ctx = CommandContext::new(&mut self.simulation, self.status);
        command(&mut ctx);
        let (requested, single_step) = ctx.into_requests();
        match requested {
            Some(next) if next != self.status => self.set_status(next),
            // Commands may have changed the simulation without a status change.
            _ => self.publish(),
        }
        // A step request only survives if the command left us running.
        if single_step && self.status == Status::Running {
            self.single_step = true;
        }
    }

    fn fail(&mut self, err: SimulationError) {
        error!(error = %err, time = %self.simulation.time(), "simulation failed");
        self.shared.record_error(err);
        self.set_status(Status::Stopped);
    }

    fn set_status(&mut self, next: Status) {
        if next.is_final() {
            self.simulation.finish();
        }
        if next != Status::Running {
            self.single_step = false;
        }
        debug!(from = %self.status, to = %next, "status changed");
        self.status = next;
        self.publish();
    }

    fn publish(&self) {
        self.shared.publish(self.status, &self.simulation);
    }
}
