// pharos_node/src/main.rs

//! Demo node: drives the estimator worker through a short scripted
//! drive-and-observe scenario and logs every published belief snapshot.

use crossbeam_channel::unbounded;
use log::info;
use pharos_node::messages::{MarkerArrayPayload, MarkerPayload, TwistPayload};
use pharos_node::worker::EstimatorWorker;
use std::thread;
use std::time::Duration;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (command_tx, command_rx) = unbounded();
    let (marker_tx, marker_rx) = unbounded();
    let (update_tx, update_rx) = unbounded();

    let worker = EstimatorWorker::spawn(
        pharos_core::config::FilterConfig::default(),
        command_rx,
        marker_rx,
        update_tx,
    )
    .expect("default filter configuration is valid");

    // Drive straight for half a second, observe a marker dead ahead, turn,
    // and observe it again from the new pose.
    let forward = TwistPayload {
        linear: [0.5, 0.0, 0.0],
        angular: [0.0, 0.0, 0.0],
    };
    let turning = TwistPayload {
        linear: [0.5, 0.0, 0.0],
        angular: [0.0, 0.0, 0.4],
    };
    let marker = MarkerArrayPayload {
        markers: vec![MarkerPayload {
            id: 0,
            position: [0.0, 0.0, 2.0],
        }],
    };

    for _ in 0..5 {
        command_tx.send(forward).expect("worker alive");
        thread::sleep(Duration::from_millis(100));
    }
    marker_tx.send(marker.clone()).expect("worker alive");
    for _ in 0..5 {
        command_tx.send(turning).expect("worker alive");
        thread::sleep(Duration::from_millis(100));
    }
    marker_tx.send(marker).expect("worker alive");

    // Closing the input channels lets the worker drain and exit.
    drop(command_tx);
    drop(marker_tx);
    worker.join();

    for update in update_rx.try_iter() {
        let v = &update.state.values;
        info!(
            "belief: pose ({:.3}, {:.3}, {:.3}), {} state components",
            v[0], v[1], v[2], update.state.len
        );
    }
}
