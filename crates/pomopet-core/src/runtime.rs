//! Production tick driver.
//!
//! Two independent fixed-period intervals run in one task: the session
//! countdown (1 s) and volume convergence ([`RAMP_PERIOD`]). Only the session
//! tick can change session state.

use std::future::Future;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::audio::{OutputDevice, RAMP_PERIOD};
use crate::error::SessionError;
use crate::events::Event;
use crate::session::{FocusSession, Haptics, Persistence};
use crate::timer::{SessionMode, SessionStatus};

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub session_period: Duration,
    pub ramp_period: Duration,
    /// Session seconds consumed per session tick. Above 1 fast-forwards.
    pub seconds_per_tick: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            session_period: Duration::from_secs(1),
            ramp_period: RAMP_PERIOD,
            seconds_per_tick: 1,
        }
    }
}

/// Drive a started session until it ends or `shutdown` resolves.
///
/// On shutdown a countdown is cancelled and a stopwatch is finished. Every
/// event is passed to `on_event` as it happens. Returns the final status.
pub async fn drive<D, H, P, F>(
    session: &mut FocusSession<D, H, P>,
    config: &DriverConfig,
    shutdown: F,
    mut on_event: impl FnMut(&Event),
) -> Result<SessionStatus, SessionError>
where
    D: OutputDevice,
    H: Haptics,
    P: Persistence,
    F: Future<Output = ()>,
{
    let mut session_tick = interval(config.session_period);
    session_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ramp_tick = interval(config.ramp_period);
    ramp_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // The first tick of an interval fires immediately.
    session_tick.tick().await;
    tokio::pin!(shutdown);

    loop {
        let status = session.engine().status();
        if status.is_terminal() || status == SessionStatus::Idle {
            return Ok(status);
        }

        tokio::select! {
            biased;

            _ = &mut shutdown => {
                debug!("shutdown requested");
                let events = if session.engine().mode() == Some(SessionMode::Stopwatch) {
                    session.finish()?
                } else {
                    session.cancel()?
                };
                events.iter().for_each(&mut on_event);
                return Ok(session.engine().status());
            }
            _ = session_tick.tick() => {
                if status == SessionStatus::Running {
                    let events = session.tick(config.seconds_per_tick)?;
                    events.iter().for_each(&mut on_event);
                }
            }
            _ = ramp_tick.tick() => {
                session.ramp_tick();
            }
        }
    }
}
