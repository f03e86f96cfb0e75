/// Poll loop: authenticate once, then fetch and walk the snapshot every cycle
use log::{error, info, warn};
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};

use crate::config::NestConfig;
use crate::error::{FetchError, PollError, TransportError};
use crate::models::{CycleReport, DeviceReading, SessionDescriptor, SkippedStructure};
use crate::nest::{self, schema, AccountSnapshot};
use crate::transport::Transport;
use crate::utils::format_datetime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    /// Pause between the end of one cycle and the start of the next.
    pub refresh: Duration,
    /// Number of cycles to run; 0 keeps polling until shutdown.
    pub iterations: u64,
}

impl PollSchedule {
    pub fn is_unbounded(&self) -> bool {
        self.iterations == 0
    }

    fn is_complete(&self, cycles: u64) -> bool {
        !self.is_unbounded() && cycles >= self.iterations
    }
}

/// Log in, then poll until the schedule runs out or shutdown is signalled.
///
/// Returns the number of completed cycles.
pub async fn run_session<T, F>(
    transport: &T,
    config: &NestConfig,
    username: &str,
    password: &str,
    schedule: PollSchedule,
    shutdown: &mut watch::Receiver<bool>,
    on_cycle: F,
) -> Result<u64, PollError>
where
    T: Transport,
    F: FnMut(&CycleReport),
{
    let session = nest::authenticate(transport, username, password, &config.login_url).await?;

    let poller = Poller::new(transport, config, &session);
    poller.run(schedule, shutdown, on_cycle).await
}

/// Snapshot polling bound to one authenticated session.
pub struct Poller<'a, T> {
    transport: &'a T,
    config: &'a NestConfig,
    session: &'a SessionDescriptor,
}

impl<'a, T: Transport> Poller<'a, T> {
    pub fn new(transport: &'a T, config: &'a NestConfig, session: &'a SessionDescriptor) -> Self {
        Poller {
            transport,
            config,
            session,
        }
    }

    pub async fn run<F>(
        &self,
        schedule: PollSchedule,
        shutdown: &mut watch::Receiver<bool>,
        mut on_cycle: F,
    ) -> Result<u64, PollError>
    where
        F: FnMut(&CycleReport),
    {
        if schedule.is_unbounded() {
            info!("Polling every {} ms until stopped", schedule.refresh.as_millis());
        } else {
            info!(
                "Polling every {} ms for {} cycles",
                schedule.refresh.as_millis(),
                schedule.iterations
            );
        }

        let mut completed = 0u64;

        loop {
            if *shutdown.borrow() {
                info!("Shutdown requested before cycle {}", completed + 1);
                break;
            }

            let report = match self.poll_once(completed + 1).await {
                Ok(report) => report,
                Err(e) => {
                    if let FetchError::Transport(t) = &e {
                        if is_auth_rejection(t) {
                            warn!("Snapshot request rejected; the session token may have expired");
                        }
                    }
                    error!("Poll cycle {} failed: {}", completed + 1, e);
                    return Err(e.into());
                }
            };

            log_failures(&report);
            on_cycle(&report);
            completed += 1;

            if schedule.is_complete(completed) {
                break;
            }

            if wait_or_shutdown(schedule.refresh, shutdown).await {
                info!("Shutdown requested after {} cycles", completed);
                break;
            }
        }

        Ok(completed)
    }

    /// Fetch one snapshot and read every reachable device.
    pub async fn poll_once(&self, cycle: u64) -> Result<CycleReport, FetchError> {
        let started_at = OffsetDateTime::now_utc();
        info!("Starting poll cycle {} at: {}", cycle, format_datetime(&started_at));

        let snapshot =
            nest::fetch_snapshot(self.transport, self.session, &self.config.rest_path).await?;
        let report = collect_readings(&snapshot, &self.session.user_id, cycle, started_at)?;

        info!(
            "Poll cycle {} complete: {} devices ({} with failures), {} skipped structures",
            cycle,
            report.readings.len(),
            report.failed_readings(),
            report.skipped.len()
        );
        Ok(report)
    }
}

/// Walk `user -> structures -> devices` and extract both metrics per device.
///
/// An unresolvable user fails the whole cycle; an unresolvable structure is
/// recorded and the remaining structures are still read.
pub fn collect_readings(
    snapshot: &AccountSnapshot,
    user_id: &str,
    cycle: u64,
    started_at: OffsetDateTime,
) -> Result<CycleReport, FetchError> {
    let mut readings = Vec::new();
    let mut skipped = Vec::new();

    for structure_id in snapshot.structure_ids(user_id)? {
        let device_ids = match snapshot.device_ids_in(&structure_id) {
            Ok(ids) => ids,
            Err(error) => {
                skipped.push(SkippedStructure {
                    structure_id,
                    error,
                });
                continue;
            }
        };

        for device_id in device_ids {
            readings.push(DeviceReading {
                humidity: nest::current_humidity(snapshot, &device_id),
                temperature: nest::current_temperature(snapshot, &device_id),
                structure_id: structure_id.clone(),
                device_id,
            });
        }
    }

    Ok(CycleReport {
        cycle,
        started_at,
        readings,
        skipped,
    })
}

/// Console lines for a cycle: humidity then temperature for each device.
///
/// Metrics that could not be read produce no line.
pub fn report_lines(report: &CycleReport) -> Vec<String> {
    let mut lines = Vec::with_capacity(report.readings.len() * 2);
    for reading in &report.readings {
        if let Ok(humidity) = &reading.humidity {
            lines.push(format!("{} : {}", schema::CURRENT_HUMIDITY, humidity));
        }
        if let Ok(temperature) = &reading.temperature {
            lines.push(format!("{} : {}", schema::CURRENT_TEMPERATURE, temperature));
        }
    }
    lines
}

fn log_failures(report: &CycleReport) {
    for skipped in &report.skipped {
        error!(
            "Skipping structure {} in cycle {}: {}",
            skipped.structure_id, report.cycle, skipped.error
        );
    }

    for reading in &report.readings {
        for result in [&reading.humidity, &reading.temperature] {
            if let Err(e) = result {
                error!(
                    "Device {} (structure {}): {}",
                    reading.device_id, reading.structure_id, e
                );
            }
        }
    }

    if report.readings.is_empty() {
        warn!(
            "No devices found in cycle {} started at {}",
            report.cycle,
            format_datetime(&report.started_at)
        );
    }
}

fn is_auth_rejection(error: &TransportError) -> bool {
    matches!(error.status(), Some(401) | Some(403))
}

/// Sleep for `refresh`, returning early with `true` if shutdown is signalled.
async fn wait_or_shutdown(refresh: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    let timer = sleep(refresh);
    tokio::pin!(timer);

    loop {
        let changed = tokio::select! {
            _ = &mut timer => return false,
            changed = shutdown.changed() => changed,
        };

        match changed {
            Ok(()) if *shutdown.borrow() => return true,
            Ok(()) => continue,
            Err(_) => {
                // Sender gone: nobody can ask us to stop any more.
                timer.as_mut().await;
                return false;
            }
        }
    }
}
