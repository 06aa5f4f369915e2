//! The sentinel state machine and its sense-think-act loop.
//!
//! `SentinelCore` owns every piece of mutable state: the operational mode,
//! route health, chaos flag, probe history, journal, and the counters that
//! keep asynchronous work honest. It is fully synchronous; all decisions
//! are made under one lock, never across an await point.
//!
//! `Sentinel` wraps the core for the tokio runtime: it drives the periodic
//! tick, dispatches analysis without blocking the tick cadence, and runs
//! the two delayed actions (failover, route restore) as sleep tasks.
//!
//! Staleness control: the core keeps a `generation` counter, bumped by
//! `stop` and `inject_chaos`. Deferred actions and analysis verdicts carry
//! the generation they were scheduled under and are discarded if it has
//! moved on. Analysis additionally carries a per-dispatch sequence number;
//! only the newest dispatch may apply, and at most one analysis is in
//! flight at a time.

pub mod actuator;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::brain::{Analysis, Analyzer, HealthStatus};
use crate::config::{SentinelConfig, WardenConfig};
use crate::journal::{Journal, LogEntry, LogSeverity, LogSource};
use crate::probe::{self, history::ProbeHistory, ProbeReading, Region};

use self::actuator::RouteActuator;

/// Operational mode of the sentinel. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentinelState {
    Idle,
    Monitoring,
    Analyzing,
    Remediating,
    Recovered,
}

impl std::fmt::Display for SentinelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SentinelState::Idle => write!(f, "IDLE"),
            SentinelState::Monitoring => write!(f, "MONITORING"),
            SentinelState::Analyzing => write!(f, "ANALYZING"),
            SentinelState::Remediating => write!(f, "REMEDIATING"),
            SentinelState::Recovered => write!(f, "RECOVERED"),
        }
    }
}

/// What a tick decided to do after recording telemetry.
#[derive(Debug)]
pub enum TickPlan {
    /// Telemetry recorded; no analysis wanted (or one already in flight).
    Observed,
    /// Dispatch the classifier over these regions.
    Analyze {
        seq: u64,
        generation: u64,
        regions: Vec<Region>,
    },
}

/// Deferred work a verdict asks the runtime to schedule.
#[derive(Debug)]
pub enum FollowUp {
    /// Run the failover actuator after the configured delay.
    Failover { generation: u64 },
}

/// Read-only view of the sentinel for the display surface.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub state: SentinelState,
    pub route_healthy: bool,
    pub chaos_active: bool,
    pub tick_count: u64,
    pub last_analysis: Option<Analysis>,
}

// ---------------------------------------------------------------------------
// SentinelCore
// ---------------------------------------------------------------------------

/// The state machine proper. Owns all mutable state; mutated only through
/// the operator methods and the tick/verdict entry points.
pub struct SentinelCore {
    state: SentinelState,
    route_healthy: bool,
    chaos_active: bool,
    history: ProbeHistory,
    journal: Journal,
    last_analysis: Option<Analysis>,
    tick_count: u64,
    generation: u64,
    analysis_seq: u64,
    analysis_inflight: bool,
    actuator: RouteActuator,
}

impl SentinelCore {
    pub fn new(cfg: &WardenConfig, journal: Journal) -> Self {
        Self {
            state: SentinelState::Idle,
            route_healthy: true,
            chaos_active: false,
            history: ProbeHistory::new(cfg.sentinel.history_len),
            journal,
            last_analysis: None,
            tick_count: 0,
            generation: 0,
            analysis_seq: 0,
            analysis_inflight: false,
            actuator: RouteActuator::new(
                cfg.route.primary_addr.clone(),
                cfg.route.backup_addr.clone(),
            ),
        }
    }

    pub fn state(&self) -> SentinelState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != SentinelState::Idle
    }

    pub fn route_healthy(&self) -> bool {
        self.route_healthy
    }

    pub fn chaos_active(&self) -> bool {
        self.chaos_active
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn history(&self) -> &ProbeHistory {
        &self.history
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            state: self.state,
            route_healthy: self.route_healthy,
            chaos_active: self.chaos_active,
            tick_count: self.tick_count,
            last_analysis: self.last_analysis.clone(),
        }
    }

    /// IDLE -> MONITORING. Returns false if already active.
    pub fn start(&mut self) -> bool {
        if self.is_active() {
            return false;
        }
        self.state = SentinelState::Monitoring;
        self.journal.append(
            LogSource::System,
            "Sentinel activated. Monitoring global latency.",
            LogSeverity::Success,
        );
        true
    }

    /// Any active state -> IDLE. Bumps the generation so every outstanding
    /// deferred action and in-flight verdict becomes stale.
    pub fn stop(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.state = SentinelState::Idle;
        self.generation += 1;
        self.analysis_inflight = false;
        self.journal.append(
            LogSource::System,
            "Sentinel deactivated.",
            LogSeverity::Info,
        );
        true
    }

    /// Turn fault injection on. Ignored while idle or already injected.
    /// Bumps the generation: a pending route restore must not fire into a
    /// freshly re-broken network.
    pub fn inject_chaos(&mut self) -> bool {
        if !self.is_active() || self.chaos_active {
            return false;
        }
        self.chaos_active = true;
        self.generation += 1;
        self.journal.append(
            LogSource::System,
            "CHAOS INJECTED: Simulating Primary DNS Failure",
            LogSeverity::Error,
        );
        true
    }

    /// Turn fault injection off. Returns the generation to key the delayed
    /// route-restore against, or None if chaos was not active.
    pub fn clear_chaos(&mut self) -> Option<u64> {
        if !self.chaos_active {
            return None;
        }
        self.chaos_active = false;
        self.journal.append(
            LogSource::System,
            "Chaos stopped. Systems stabilizing.",
            LogSeverity::Info,
        );
        Some(self.generation)
    }

    /// Delayed follow-up to `clear_chaos`: declare the primary path stable
    /// again. A stale generation means stop or re-injection intervened.
    pub fn confirm_primary(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            debug!("discarding stale route restore");
            return false;
        }
        self.route_healthy = true;
        self.journal.append(
            LogSource::Hammer,
            "Primary route confirmed stable. Reverting DNS.",
            LogSeverity::Success,
        );
        true
    }

    /// Record one probe reading and decide whether to analyze.
    ///
    /// Analysis is throttled: it runs only when chaos is active or traffic
    /// is off the primary route, and never while another analysis is in
    /// flight (the reading is still recorded in that case).
    pub fn begin_tick(&mut self, reading: ProbeReading) -> TickPlan {
        if !self.is_active() {
            return TickPlan::Observed;
        }

        let regions = reading.regions.clone();
        self.history.push(reading);
        self.tick_count += 1;

        let should_analyze = self.chaos_active || !self.route_healthy;
        if !should_analyze {
            self.state = SentinelState::Monitoring;
            return TickPlan::Observed;
        }

        if self.analysis_inflight {
            debug!("analysis already in flight, skipping dispatch");
            return TickPlan::Observed;
        }

        self.state = SentinelState::Analyzing;
        self.analysis_seq += 1;
        self.analysis_inflight = true;
        TickPlan::Analyze {
            seq: self.analysis_seq,
            generation: self.generation,
            regions,
        }
    }

    /// Apply a classifier verdict. Stale verdicts (superseded dispatch or
    /// bumped generation) are discarded without touching any state.
    pub fn apply_verdict(
        &mut self,
        seq: u64,
        generation: u64,
        verdict: anyhow::Result<Analysis>,
    ) -> Option<FollowUp> {
        if generation != self.generation || seq != self.analysis_seq {
            debug!(seq, generation, "discarding stale analysis verdict");
            return None;
        }
        self.analysis_inflight = false;

        let analysis = match verdict {
            Ok(analysis) => analysis,
            Err(e) => {
                // The brain resolves its own failures internally; reaching
                // this arm means even the fallback path was unavailable.
                // Return to MONITORING so the machine never wedges here.
                error!(error = %e, "analysis failed");
                self.journal.append(
                    LogSource::Brain,
                    "AI Analysis failed: connection error",
                    LogSeverity::Error,
                );
                self.state = SentinelState::Monitoring;
                return None;
            }
        };

        self.last_analysis = Some(analysis.clone());

        if analysis.status == HealthStatus::Critical && self.route_healthy {
            self.journal.append(
                LogSource::Brain,
                format!("Anomaly detected: {}", analysis.reasoning),
                LogSeverity::Error,
            );
            self.state = SentinelState::Remediating;
            return Some(FollowUp::Failover {
                generation: self.generation,
            });
        }

        if analysis.status == HealthStatus::Healthy && !self.route_healthy && !self.chaos_active {
            self.journal.append(
                LogSource::Brain,
                "Metrics stabilized. Suggesting return to primary.",
                LogSeverity::Success,
            );
        }
        self.state = SentinelState::Monitoring;
        None
    }

    /// Delayed follow-up to a critical verdict: announce and run the
    /// failover. A stale generation means stop intervened.
    pub fn execute_failover(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            debug!("discarding stale failover");
            return false;
        }
        self.journal.append(
            LogSource::Hammer,
            "Initiating Route Failover Protocol...",
            LogSeverity::Warning,
        );
        self.actuator
            .execute(&mut self.route_healthy, &mut self.journal);
        self.state = SentinelState::Recovered;
        true
    }
}

// ---------------------------------------------------------------------------
// Sentinel (async runtime wrapper)
// ---------------------------------------------------------------------------

/// Timing knobs for the loop and its deferred actions.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    pub tick_interval: Duration,
    pub failover_delay: Duration,
    pub route_restore_delay: Duration,
}

impl Timing {
    pub fn from_config(cfg: &SentinelConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(cfg.tick_interval_ms),
            failover_delay: Duration::from_millis(cfg.failover_delay_ms),
            route_restore_delay: Duration::from_millis(cfg.route_restore_delay_ms),
        }
    }
}

struct Inner {
    core: Mutex<SentinelCore>,
    analyzer: Arc<dyn Analyzer>,
    timing: Timing,
    tick_task: Mutex<Option<JoinHandle<()>>>,
}

/// Handle to the running sentinel. Cheap to clone; all clones share the
/// same core.
#[derive(Clone)]
pub struct Sentinel {
    inner: Arc<Inner>,
}

impl Sentinel {
    pub fn new(cfg: &WardenConfig, analyzer: Arc<dyn Analyzer>, journal: Journal) -> Self {
        Self {
            inner: Arc::new(Inner {
                core: Mutex::new(SentinelCore::new(cfg, journal)),
                analyzer,
                timing: Timing::from_config(&cfg.sentinel),
                tick_task: Mutex::new(None),
            }),
        }
    }

    pub fn timing(&self) -> Timing {
        self.inner.timing
    }

    /// Activate the sentinel and begin the periodic tick.
    pub async fn start(&self) -> bool {
        let started = self.inner.core.lock().await.start();
        if started {
            info!("sentinel activated");
            let sentinel = self.clone();
            let handle = tokio::spawn(async move { sentinel.run_loop().await });
            *self.inner.tick_task.lock().await = Some(handle);
        }
        started
    }

    /// Deactivate the sentinel and cancel the periodic tick. Outstanding
    /// deferred actions become stale via the generation bump in the core.
    pub async fn stop(&self) -> bool {
        let stopped = self.inner.core.lock().await.stop();
        if let Some(handle) = self.inner.tick_task.lock().await.take() {
            handle.abort();
        }
        if stopped {
            info!("sentinel deactivated");
        }
        stopped
    }

    pub async fn inject_chaos(&self) -> bool {
        self.inner.core.lock().await.inject_chaos()
    }

    /// Clear chaos and schedule the delayed primary-route restore.
    pub async fn clear_chaos(&self) -> bool {
        let scheduled = self.inner.core.lock().await.clear_chaos();
        match scheduled {
            Some(generation) => {
                let sentinel = self.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(sentinel.inner.timing.route_restore_delay).await;
                    sentinel
                        .inner
                        .core
                        .lock()
                        .await
                        .confirm_primary(generation);
                });
                true
            }
            None => false,
        }
    }

    pub async fn snapshot(&self) -> StateSnapshot {
        self.inner.core.lock().await.snapshot()
    }

    pub async fn history(&self) -> Vec<ProbeReading> {
        self.inner.core.lock().await.history().snapshot()
    }

    pub async fn logs(&self) -> Vec<LogEntry> {
        self.inner.core.lock().await.journal().snapshot()
    }

    /// Execute one sense-think-act cycle. Returns false once the sentinel
    /// is idle. Analysis runs on its own task so a slow classifier never
    /// stalls the tick cadence; overlap is prevented by the core's
    /// in-flight guard.
    pub async fn run_tick(&self) -> bool {
        let plan = {
            let mut core = self.inner.core.lock().await;
            if !core.is_active() {
                return false;
            }
            let reading = probe::generate(core.chaos_active(), core.route_healthy());
            core.begin_tick(reading)
        };

        if let TickPlan::Analyze {
            seq,
            generation,
            regions,
        } = plan
        {
            let sentinel = self.clone();
            tokio::spawn(async move {
                let verdict = sentinel.inner.analyzer.analyze(&regions).await;
                let follow_up = sentinel
                    .inner
                    .core
                    .lock()
                    .await
                    .apply_verdict(seq, generation, verdict);
                if let Some(FollowUp::Failover { generation }) = follow_up {
                    tokio::time::sleep(sentinel.inner.timing.failover_delay).await;
                    sentinel
                        .inner
                        .core
                        .lock()
                        .await
                        .execute_failover(generation);
                }
            });
        }
        true
    }

    async fn run_loop(&self) {
        let mut interval = tokio::time::interval(self.inner.timing.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick completes immediately; consume it so the
        // first probe lands one full period after activation.
        interval.tick().await;
        loop {
            interval.tick().await;
            if !self.run_tick().await {
                break;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
