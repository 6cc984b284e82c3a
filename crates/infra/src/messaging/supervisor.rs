//! Keeps a consumer alive across broker failures.
//!
//! A session (bind, then consume) ends when the broker closes the stream,
//! the connection drops or an ack cannot be sent. The supervisor logs why
//! and starts a new session after a backoff, until shutdown is signalled.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{error, info, warn};

use emoney_events::BusError;

/// Exponential reconnect delay, doubling from `initial` up to `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(30),
        }
    }
}

/// Resolves once `shutdown` carries `true` (or its sender is gone).
pub async fn stopped(mut shutdown: watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Run `session` over and over until shutdown.
///
/// Each session gets its own shutdown receiver to hand to the consume loop.
/// A session that stayed up longer than `backoff.max` resets the delay.
pub async fn supervise<F, Fut>(
    consumer: &'static str,
    mut session: F,
    shutdown: watch::Receiver<bool>,
    backoff: Backoff,
) where
    F: FnMut(watch::Receiver<bool>) -> Fut,
    Fut: Future<Output = Result<(), BusError>>,
{
    let mut delay = backoff.initial;
    loop {
        if *shutdown.borrow() {
            break;
        }

        let started = Instant::now();
        let outcome = session(shutdown.clone()).await;
        if *shutdown.borrow() {
            break;
        }
        match outcome {
            Ok(()) => warn!(consumer, "consumer session ended, reconnecting"),
            Err(e) => error!(consumer, error = %e, "consumer session failed, reconnecting"),
        }

        if started.elapsed() > backoff.max {
            delay = backoff.initial;
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = stopped(shutdown.clone()) => break,
        }
        delay = (delay * 2).min(backoff.max);
    }
    info!(consumer, "consumer supervisor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast() -> Backoff {
        Backoff {
            initial: Duration::from_millis(1),
            max: Duration::from_millis(4),
        }
    }

    #[tokio::test]
    async fn failed_and_closed_sessions_are_restarted() {
        let (stop_tx, stop_rx) = watch::channel(false);
        let stop_tx = Arc::new(stop_tx);
        let sessions = Arc::new(AtomicUsize::new(0));

        let counter = sessions.clone();
        let signal = stop_tx.clone();
        supervise(
            "test",
            move |_| {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                let signal = signal.clone();
                async move {
                    match attempt {
                        1 => Err(BusError::Connection("connection reset".to_string())),
                        // Broker closed the delivery stream.
                        2 => Ok(()),
                        _ => {
                            let _ = signal.send(true);
                            Ok(())
                        }
                    }
                }
            },
            stop_rx,
            fast(),
        )
        .await;

        assert_eq!(sessions.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn shutdown_ends_a_running_session_and_the_supervisor() {
        let (stop_tx, stop_rx) = watch::channel(false);
        let sessions = Arc::new(AtomicUsize::new(0));

        let counter = sessions.clone();
        let supervisor = tokio::spawn(supervise(
            "test",
            move |stop| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    stopped(stop).await;
                    Ok(())
                }
            },
            stop_rx,
            fast(),
        ));

        tokio::time::sleep(Duration::from_millis(20)).await;
        stop_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), supervisor)
            .await
            .expect("supervisor did not stop")
            .unwrap();

        assert_eq!(sessions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn already_stopped_runs_nothing() {
        let (_stop_tx, stop_rx) = watch::channel(true);
        let sessions = AtomicUsize::new(0);

        supervise(
            "test",
            |_| {
                sessions.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            },
            stop_rx,
            fast(),
        )
        .await;

        assert_eq!(sessions.load(Ordering::SeqCst), 0);
    }
}
