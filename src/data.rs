// Local data samplers
//
// A SampleFeed is the render-loop end of a numeric sample stream: workers
// push f64 samples through a plain mpsc Sender, the chart drains them once
// per frame into a bounded history. Anything that can produce a Sender
// (system samplers here, a broker subscription elsewhere) can feed a chart.

use crate::worker::PeriodicWorker;
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

pub struct SampleFeed {
    rx: Receiver<f64>,
    history: VecDeque<f64>,
    capacity: usize,
}

impl SampleFeed {
    pub fn new(capacity: usize) -> (Self, Sender<f64>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                rx,
                history: VecDeque::with_capacity(capacity),
                capacity: capacity.max(2),
            },
            tx,
        )
    }

    /// Pull all pending samples into the history. Returns whether anything
    /// new arrived; this is the chart's change signal.
    pub fn drain(&mut self) -> bool {
        let mut new = false;
        while let Ok(sample) = self.rx.try_recv() {
            if self.history.len() == self.capacity {
                self.history.pop_front();
            }
            self.history.push_back(sample);
            new = true;
        }
        new
    }

    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

/// Read the 1-minute load average from /proc/loadavg.
fn read_load_average() -> Option<f64> {
    let text = std::fs::read_to_string("/proc/loadavg").ok()?;
    text.split_whitespace().next()?.parse().ok()
}

/// Periodically sample the system load average into `tx`. Once the
/// receiving feed is dropped, further sends are logged at debug until the
/// worker is stopped.
pub fn spawn_load_sampler(interval: Duration, tx: Sender<f64>) -> PeriodicWorker {
    PeriodicWorker::spawn("load-sampler", interval, move || {
        if let Some(load) = read_load_average() {
            if tx.send(load).is_err() {
                tracing::debug!("load sampler feed dropped");
            }
        } else {
            tracing::warn!("could not read /proc/loadavg");
        }
    })
}
