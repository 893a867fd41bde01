use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::flow::AuthState;

/// Countdown gating the resend-OTP action. One tick per second published
/// through the auth state channel; reaching zero flips `can_resend` and the
/// ticker ends. Starting a new countdown always stops the previous one first,
/// so two tickers never run at once.
pub(crate) struct ResendCooldown {
    secs: u32,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl ResendCooldown {
    pub(crate) fn new(secs: u32) -> Self {
        Self {
            secs,
            ticker: Mutex::new(None),
        }
    }

    /// Reset the countdown to its full duration and start ticking.
    pub(crate) fn start(&self, tx: Arc<watch::Sender<AuthState>>) {
        let mut ticker = self.ticker.lock().unwrap();
        if let Some(old) = ticker.take() {
            old.abort();
        }

        let secs = self.secs;
        tx.send_modify(|state| {
            state.resend.remaining_secs = secs;
            state.resend.can_resend = false;
        });

        *ticker = Some(tokio::spawn(async move {
            for remaining in (0..secs).rev() {
                tokio::time::sleep(Duration::from_secs(1)).await;
                tx.send_modify(|state| state.resend.remaining_secs = remaining);
            }
            debug!("Resend cooldown elapsed");
            tx.send_modify(|state| state.resend.can_resend = true);
        }));
    }

    pub(crate) fn cancel(&self) {
        if let Some(ticker) = self.ticker.lock().unwrap().take() {
            ticker.abort();
        }
    }
}

impl Drop for ResendCooldown {
    fn drop(&mut self) {
        self.cancel();
    }
}
