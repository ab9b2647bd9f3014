//! Probe responses built from pool checks.

use serde::Serialize;

/// Probe answered by one of the `/health/*` endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeType {
    Liveness,
    Readiness,
    Startup,
}

impl ProbeType {
    /// Verdict returned when one of the probe's checks fails.
    ///
    /// A stopped monitor is fatal for liveness; the other probes only mean
    /// "not yet".
    fn failure(self) -> Verdict {
        match self {
            Self::Liveness => Verdict::Unhealthy,
            Self::Readiness | Self::Startup => Verdict::NotReady,
        }
    }
}

impl std::fmt::Display for ProbeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Liveness => "liveness",
            Self::Readiness => "readiness",
            Self::Startup => "startup",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Healthy,
    NotReady,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Warn,
    Fail,
    Pending,
}

/// Answer to a single probe.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub probe: ProbeType,
    pub status: Verdict,
    /// Message of the first check that did not pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub checks: Vec<CheckResult>,
    /// Pool snapshot, only on a healthy answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

impl HealthStatus {
    /// Fold checks into a verdict.
    ///
    /// Warnings keep the probe healthy; a failed or pending check gives the
    /// probe's failure verdict.
    pub fn from_checks(probe: ProbeType, checks: Vec<CheckResult>) -> Self {
        let blocking = checks
            .iter()
            .find(|c| matches!(c.status, Outcome::Fail | Outcome::Pending));

        let (status, message) = match blocking {
            Some(check) => (
                probe.failure(),
                Some(
                    check
                        .message
                        .clone()
                        .unwrap_or_else(|| format!("{} pending", check.name)),
                ),
            ),
            None => (Verdict::Healthy, None),
        };

        Self {
            probe,
            status,
            message,
            checks,
            details: None,
        }
    }

    /// Attach the pool snapshot when healthy.
    pub fn with_details(mut self, details: impl FnOnce() -> HealthDetails) -> Self {
        if self.is_healthy() {
            self.details = Some(details());
        }
        self
    }

    pub fn is_healthy(&self) -> bool {
        self.status == Verdict::Healthy
    }

    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.name == name)
    }
}

/// One named condition evaluated against a pool snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckResult {
    pub fn pass(name: &'static str) -> Self {
        Self {
            name,
            status: Outcome::Pass,
            message: None,
        }
    }

    /// Pass when `ok`, otherwise `outcome` with the message.
    pub fn require(
        name: &'static str,
        ok: bool,
        outcome: Outcome,
        message: impl FnOnce() -> String,
    ) -> Self {
        if ok {
            return Self::pass(name);
        }
        Self {
            name,
            status: outcome,
            message: Some(message()),
        }
    }
}

/// Pool details included in healthy responses.
#[derive(Debug, Clone, Serialize)]
pub struct HealthDetails {
    pub uptime_seconds: u64,
    pub version: &'static str,
    /// Ready containers
    pub pool_size: usize,
    pub pool_capacity: usize,
    /// Creation workers in flight
    pub workers: usize,
    /// Errors inside the hourly window
    pub recent_errors: usize,
}
