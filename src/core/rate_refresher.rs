//! Periodic exchange rate refresh
//!
//! The refresher owns a dedicated thread running a single-threaded tokio
//! runtime. Every tick it draws a new table from a [`RandomRateGenerator`] and
//! swaps it into [`ExchangeRates`] as a whole. It stops when the shared
//! cancellation token fires.

use crate::core::exchange_rates::{ExchangeRates, RandomRateGenerator};
use crate::types::BankError;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Shortest accepted refresh period
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle to the running refresh task
#[derive(Debug)]
pub struct RateRefresher {
    handle: Option<JoinHandle<()>>,
}

impl RateRefresher {
    /// Start refreshing `rates` every `period`
    ///
    /// The first refresh happens one full period after start; callers seed the
    /// table themselves before accepting commands. A zero `period` is raised
    /// to [`MIN_PERIOD`].
    pub fn spawn(
        rates: Arc<ExchangeRates>,
        generator: RandomRateGenerator,
        period: Duration,
        token: CancellationToken,
    ) -> Result<Self, BankError> {
        let period = if period < MIN_PERIOD {
            warn!(
                requested_ms = period.as_millis() as u64,
                "rate refresh period too short, using minimum"
            );
            MIN_PERIOD
        } else {
            period
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| BankError::Runtime {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        let handle = thread::Builder::new()
            .name("rate-refresher".to_string())
            .spawn(move || {
                runtime.block_on(refresh_loop(rates, generator, period, token));
            })
            .map_err(|e| BankError::Runtime {
                message: format!("Failed to spawn rate refresher: {}", e),
            })?;

        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wait for the refresher thread to finish
    ///
    /// Only returns once the cancellation token has fired.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("rate refresher thread panicked");
            }
        }
    }
}

async fn refresh_loop(
    rates: Arc<ExchangeRates>,
    generator: RandomRateGenerator,
    period: Duration,
    token: CancellationToken,
) {
    info!(period_secs = period.as_secs_f64(), "rate refresher started");

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let table = generator.generate();
                debug!(?table, "exchange rates refreshed");
                rates.replace(table);
            }
        }
    }

    info!("rate refresher stopped");
}
