// pharos_node/src/worker.rs

use crate::adapter;
use crate::messages::{BeliefUpdate, MarkerArrayPayload, TwistPayload};
use crossbeam_channel::{never, select, Receiver, Sender};
use log::{debug, info};
use pharos_core::config::FilterConfig;
use pharos_core::error::FilterError;
use pharos_core::estimation::EkfSlam;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Handle for the single estimator worker thread.
///
/// The worker drains two FIFO input channels one message at a time, so
/// prediction and correction can never run in parallel: every accepted
/// message runs to completion (commit or drop) before the next is
/// considered.
pub struct EstimatorWorker {
    handle: JoinHandle<()>,
}

impl EstimatorWorker {
    /// Builds the filter from `config` and spawns the worker thread.
    ///
    /// Commands and marker batches arrive on their own channels; a
    /// `BeliefUpdate` is published on `updates` after every committed pass.
    /// The worker shuts down cleanly once both input channels disconnect.
    pub fn spawn(
        config: FilterConfig,
        commands: Receiver<TwistPayload>,
        markers: Receiver<MarkerArrayPayload>,
        updates: Sender<BeliefUpdate>,
    ) -> Result<Self, FilterError> {
        let filter = EkfSlam::new(config)?;
        let handle = thread::Builder::new()
            .name("estimator".into())
            .spawn(move || run(filter, commands, markers, updates))
            .expect("Failed to spawn estimator thread");
        Ok(Self { handle })
    }

    /// Blocks until the worker exits (both input channels disconnected).
    pub fn join(self) {
        if self.handle.join().is_err() {
            log::error!("estimator thread panicked");
        }
    }
}

fn run(
    mut filter: EkfSlam,
    mut commands: Receiver<TwistPayload>,
    mut markers: Receiver<MarkerArrayPayload>,
    updates: Sender<BeliefUpdate>,
) {
    let start = Instant::now();
    let mut commands_open = true;
    let mut markers_open = true;
    info!("estimator worker started");

    while commands_open || markers_open {
        select! {
            recv(commands) -> msg => match msg {
                Ok(twist) => {
                    let stamp = start.elapsed().as_secs_f64();
                    let command = adapter::command_from_twist(&twist);
                    if filter.predict(&command, stamp) {
                        publish(&filter, &updates);
                    }
                }
                Err(_) => {
                    commands_open = false;
                    commands = never();
                }
            },
            recv(markers) -> msg => match msg {
                Ok(array) => {
                    let batch = adapter::observations_from_markers(&array);
                    filter.correct(&batch);
                    publish(&filter, &updates);
                }
                Err(_) => {
                    markers_open = false;
                    markers = never();
                }
            },
        }
    }

    info!("estimator worker shutting down");
}

fn publish(filter: &EkfSlam, updates: &Sender<BeliefUpdate>) {
    let update = BeliefUpdate {
        state: filter.state_snapshot(),
        covariance: filter.covariance_snapshot(),
    };
    if updates.send(update).is_err() {
        debug!("no snapshot consumers connected");
    }
}
