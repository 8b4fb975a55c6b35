use crate::bbo::Bbo;
use crate::cache::BboCache;
use futures_util::StreamExt;
use smol_str::SmolStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use triarb_integration::ExchangeTransport;

pub const MAX_STREAMS_PER_CONNECTION: usize = 200;
pub const MIN_RECONNECT_DELAY: Duration = Duration::from_secs(1);
pub const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);
pub const RECONNECT_MULTIPLIER: u32 = 2;
pub const WS_PING_INTERVAL: Duration = Duration::from_secs(20);
pub const RUNNING_FLAG_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Lifecycle of a single logical connection (one group of subscribed symbols).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Closed,
}

/// Exponential reconnection backoff: starts at `initial`, doubles on every
/// failed attempt up to `max`, and resets to `initial` on a successful
/// connect.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub initial: Duration,
    pub multiplier: u32,
    pub max: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial: MIN_RECONNECT_DELAY,
            multiplier: RECONNECT_MULTIPLIER,
            max: MAX_RECONNECT_DELAY,
        }
    }
}

impl ReconnectPolicy {
    fn next_delay(&self, current: Duration) -> Duration {
        std::cmp::min(current.saturating_mul(self.multiplier), self.max)
    }
}

/// Fans subscribed symbols out across connections of at most
/// `MAX_STREAMS_PER_CONNECTION`, each independently reconnecting with
/// exponential backoff and feeding parsed ticks into a shared `BboCache`.
pub struct StreamIngestor<T> {
    transport: Arc<T>,
    cache: Arc<BboCache>,
    policy: ReconnectPolicy,
    max_streams_per_connection: usize,
    running: Arc<AtomicBool>,
}

impl<T> StreamIngestor<T>
where
    T: ExchangeTransport + 'static,
{
    pub fn new(transport: Arc<T>, cache: Arc<BboCache>) -> Self {
        Self {
            transport,
            cache,
            policy: ReconnectPolicy::default(),
            max_streams_per_connection: MAX_STREAMS_PER_CONNECTION,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The flag every spawned connection task consults between receive
    /// operations. Clearing it (`store(false, ...)`) asks every task to wind
    /// down cooperatively instead of being aborted from the outside.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Spawns one reconnecting task per connection group and returns their
    /// handles. Each task runs until `running_flag()` is cleared or the
    /// process exits; it never returns on its own while both hold.
    pub fn spawn(&self, symbols: Vec<SmolStr>) -> Vec<JoinHandle<()>> {
        symbols
            .chunks(self.max_streams_per_connection)
            .enumerate()
            .map(|(connection_id, group)| {
                let transport = self.transport.clone();
                let cache = self.cache.clone();
                let policy = self.policy;
                let running = self.running.clone();
                let group = group.to_vec();
                tokio::spawn(run_connection(connection_id, transport, cache, policy, group, running))
            })
            .collect()
    }
}

/// Polls `running` and resolves once it has been cleared. Used as a
/// `select!` branch so the receive loop notices shutdown between ticks
/// rather than only at task-abort time.
async fn wait_for_shutdown(running: &AtomicBool) {
    while running.load(Ordering::Acquire) {
        tokio::time::sleep(RUNNING_FLAG_POLL_INTERVAL).await;
    }
}

async fn run_connection<T>(
    connection_id: usize,
    transport: Arc<T>,
    cache: Arc<BboCache>,
    policy: ReconnectPolicy,
    symbols: Vec<SmolStr>,
    running: Arc<AtomicBool>,
) where
    T: ExchangeTransport + 'static,
{
    let mut state = ConnectionState::Disconnected;
    let mut delay = policy.initial;

    while running.load(Ordering::Acquire) {
        state = ConnectionState::Connecting;
        debug!(connection_id, symbols = symbols.len(), ?state, "connecting stream");

        let mut stream = match transport.subscribe_ticks(symbols.clone()).await {
            Ok(stream) => stream,
            Err(error) => {
                warn!(connection_id, %error, "failed to subscribe ticks, backing off");
                state = ConnectionState::Reconnecting;
                tokio::time::sleep(delay).await;
                delay = policy.next_delay(delay);
                continue;
            }
        };

        state = ConnectionState::Connected;
        delay = policy.initial;
        info!(connection_id, ?state, "stream connected");

        let mut ping_timer = tokio::time::interval(WS_PING_INTERVAL);
        ping_timer.tick().await; // first tick fires immediately

        let mut shutting_down = false;
        loop {
            tokio::select! {
                next = stream.next() => {
                    match next {
                        Some(Ok(raw_tick)) => match Bbo::from_raw_tick(&raw_tick) {
                            Ok((symbol, bbo)) => cache.update(symbol, bbo),
                            Err(error) => warn!(connection_id, %error, "dropping malformed tick"),
                        },
                        Some(Err(error)) => {
                            error!(connection_id, %error, "stream error, reconnecting");
                            break;
                        }
                        None => {
                            warn!(connection_id, "stream closed, reconnecting");
                            break;
                        }
                    }
                }
                _ = ping_timer.tick() => {
                    debug!(connection_id, "heartbeat interval elapsed");
                }
                _ = wait_for_shutdown(&running) => {
                    info!(connection_id, "running flag cleared, stream task winding down");
                    shutting_down = true;
                    break;
                }
            }
        }

        if shutting_down {
            return;
        }

        state = ConnectionState::Reconnecting;
        debug!(connection_id, ?state, "entering reconnect backoff");
    }

    debug!(connection_id, "running flag cleared before reconnect, stream task exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let policy = ReconnectPolicy::default();
        let mut delay = policy.initial;
        for _ in 0..10 {
            delay = policy.next_delay(delay);
        }
        assert_eq!(delay, policy.max);
    }

    #[test]
    fn backoff_starts_at_the_initial_delay() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.initial, MIN_RECONNECT_DELAY);
    }

    #[tokio::test]
    async fn wait_for_shutdown_blocks_until_the_flag_clears() {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let waiter = tokio::spawn(async move { wait_for_shutdown(&flag).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        running.store(false, Ordering::SeqCst);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("wait_for_shutdown should resolve once the flag clears")
            .unwrap();
    }
}
