//! Synthetic probe telemetry -- the "Watcher" role.
//!
//! Generates one latency reading per monitored region per tick. There is no
//! real network here: latencies are drawn from fixed ranges, biased by the
//! chaos flag (fault injection) and the current route health.

pub mod history;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Base latency range under nominal conditions (ms, inclusive bounds 20-59).
pub const BASE_LATENCY_MS: std::ops::Range<u32> = 20..60;

/// Latency range for failure-prone regions under chaos (ms, 500-2499).
pub const CHAOS_LATENCY_MS: std::ops::Range<u32> = 500..2500;

/// Extra latency applied to every region while traffic rides the backup route.
pub const BACKUP_ROUTE_PENALTY_MS: u32 = 10;

/// Probability that a failure-prone region under chaos reports TIMEOUT
/// instead of DEGRADED.
pub const TIMEOUT_PROBABILITY: f64 = 0.3;

/// The monitored probe fleet, in canonical order.
pub const FLEET: [(RegionId, &str); 3] = [
    (RegionId::UsCentral1, "US Central (Iowa)"),
    (RegionId::EuropeWest1, "Europe West (Belgium)"),
    (RegionId::AsiaEast1, "Asia East (Taiwan)"),
];

/// Identifier of a monitored region. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionId {
    #[serde(rename = "us-central1")]
    UsCentral1,
    #[serde(rename = "europe-west1")]
    EuropeWest1,
    #[serde(rename = "asia-east1")]
    AsiaEast1,
}

impl RegionId {
    /// The two regions that degrade first when the primary path fails.
    pub fn failure_prone(self) -> bool {
        matches!(self, RegionId::UsCentral1 | RegionId::EuropeWest1)
    }
}

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionId::UsCentral1 => write!(f, "us-central1"),
            RegionId::EuropeWest1 => write!(f, "europe-west1"),
            RegionId::AsiaEast1 => write!(f, "asia-east1"),
        }
    }
}

/// Health of a single region probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegionStatus {
    Healthy,
    Degraded,
    Timeout,
}

impl std::fmt::Display for RegionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionStatus::Healthy => write!(f, "HEALTHY"),
            RegionStatus::Degraded => write!(f, "DEGRADED"),
            RegionStatus::Timeout => write!(f, "TIMEOUT"),
        }
    }
}

/// One region's snapshot within a probe reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub latency: u32,
    pub status: RegionStatus,
}

/// All regions sampled in one tick, in canonical fleet order.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReading {
    pub timestamp: DateTime<Utc>,
    pub regions: Vec<Region>,
}

/// Generate one reading with the process RNG.
pub fn generate(chaos_active: bool, route_healthy: bool) -> ProbeReading {
    generate_with(&mut rand::thread_rng(), chaos_active, route_healthy)
}

/// Generate one reading from an explicit RNG. Pure apart from the RNG and
/// the timestamp; used directly by tests with a seeded source.
pub fn generate_with<R: Rng + ?Sized>(
    rng: &mut R,
    chaos_active: bool,
    route_healthy: bool,
) -> ProbeReading {
    let regions = FLEET
        .iter()
        .map(|&(id, name)| {
            let mut latency = rng.gen_range(BASE_LATENCY_MS);
            let mut status = RegionStatus::Healthy;

            if chaos_active {
                if id.failure_prone() {
                    latency = rng.gen_range(CHAOS_LATENCY_MS);
                    status = if rng.gen_bool(TIMEOUT_PROBABILITY) {
                        RegionStatus::Timeout
                    } else {
                        RegionStatus::Degraded
                    };
                }
            } else if !route_healthy {
                // Healing phase: backup route is slightly slower.
                latency += BACKUP_ROUTE_PENALTY_MS;
            }

            Region {
                id,
                name: name.to_string(),
                latency,
                status,
            }
        })
        .collect();

    ProbeReading {
        timestamp: Utc::now(),
        regions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_calm_generation_stays_in_base_range() {
        let mut rng = rng();
        for _ in 0..200 {
            let reading = generate_with(&mut rng, false, true);
            assert_eq!(reading.regions.len(), FLEET.len());
            for region in &reading.regions {
                assert!((20..60).contains(&region.latency), "latency {}", region.latency);
                assert_eq!(region.status, RegionStatus::Healthy);
            }
        }
    }

    #[test]
    fn test_chaos_degrades_only_prone_regions() {
        let mut rng = rng();
        let mut saw_timeout = false;
        let mut saw_degraded = false;

        for _ in 0..200 {
            let reading = generate_with(&mut rng, true, true);
            for region in &reading.regions {
                if region.id.failure_prone() {
                    assert!((500..2500).contains(&region.latency));
                    match region.status {
                        RegionStatus::Timeout => saw_timeout = true,
                        RegionStatus::Degraded => saw_degraded = true,
                        RegionStatus::Healthy => panic!("prone region reported HEALTHY under chaos"),
                    }
                } else {
                    assert!((20..60).contains(&region.latency));
                    assert_eq!(region.status, RegionStatus::Healthy);
                }
            }
        }

        // Over 200 sweeps both chaos outcomes should occur.
        assert!(saw_timeout);
        assert!(saw_degraded);
    }

    #[test]
    fn test_backup_route_adds_fixed_penalty() {
        let mut rng = rng();
        for _ in 0..200 {
            let reading = generate_with(&mut rng, false, false);
            for region in &reading.regions {
                assert!((30..70).contains(&region.latency), "latency {}", region.latency);
                assert_eq!(region.status, RegionStatus::Healthy);
            }
        }
    }

    #[test]
    fn test_fleet_order_is_canonical() {
        let reading = generate(false, true);
        let ids: Vec<RegionId> = reading.regions.iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec![RegionId::UsCentral1, RegionId::EuropeWest1, RegionId::AsiaEast1]
        );
    }

    #[test]
    fn test_region_id_wire_format() {
        let json = serde_json::to_string(&RegionId::UsCentral1).unwrap();
        assert_eq!(json, "\"us-central1\"");
        let parsed: RegionId = serde_json::from_str("\"asia-east1\"").unwrap();
        assert_eq!(parsed, RegionId::AsiaEast1);
    }

    #[test]
    fn test_region_status_rejects_unknown_value() {
        let parsed: Result<RegionStatus, _> = serde_json::from_str("\"OFFLINE\"");
        assert!(parsed.is_err());
    }
}
