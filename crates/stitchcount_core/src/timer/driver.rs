//! Background ticker for the timer engine.

use crossbeam::channel::{RecvTimeoutError, Sender};
use log::debug;
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Runs a callback on a dedicated thread every `interval` until stopped.
///
/// Dropping the driver cancels the recurring work and joins the thread, so
/// tearing down a view never leaks a ticker.
pub struct TickDriver {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TickDriver {
    pub fn spawn<F>(interval: Duration, mut on_tick: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = crossbeam::channel::bounded::<()>(1);
        let handle = thread::Builder::new()
            .name("stitchcount-tick".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => on_tick(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        debug!(
            "event=tick_driver module=timer status=started interval_ms={}",
            interval.as_millis()
        );
        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stops the ticker and waits for the thread to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.try_send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            debug!("event=tick_driver module=timer status=stopped");
        }
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}
