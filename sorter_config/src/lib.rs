#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and scenario parsing for the sorting line.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Scenario CSV loader enforces the header and rejects non-finite weights.
use serde::Deserialize;

/// Smallest median window the sampler accepts.
pub const MIN_SAMPLE_COUNT: usize = 3;
/// Largest median window the sampler accepts.
pub const MAX_SAMPLE_COUNT: usize = 7;

/// Upper bound for any single timing knob.
const MAX_PHASE_MS: u64 = 60_000;

/// Scenario CSV schema: one item weight per row.
///
/// Expected header:
/// grams
///
/// Example:
/// grams
/// 120.0
/// 35.5
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ItemRow {
    pub grams: f32,
}

/// Acceptance band in grams (inclusive on both ends).
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct BandCfg {
    pub min_g: f32,
    pub max_g: f32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SamplingCfg {
    /// Median window per estimate; must be within [3, 7].
    pub sample_count: usize,
    /// Readings below this are treated as an empty platform.
    pub presence_threshold_g: f32,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            sample_count: 5,
            presence_threshold_g: 10.0,
        }
    }
}

/// Belt timing. These depend on the physical installation and must be
/// tuned on site.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimingCfg {
    /// Wait after first detection before the authoritative reading.
    pub settle_ms: u64,
    /// Pusher hold at the push angle.
    pub push_hold_ms: u64,
    /// Travel time from the weighing station to the ejector.
    pub transit_ms: u64,
    /// Ejector hold at the eject angle.
    pub eject_hold_ms: u64,
    /// Final wait before the loop accepts the next item.
    pub clearance_ms: u64,
    /// Control loop period.
    pub tick_ms: u64,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            settle_ms: 500,
            push_hold_ms: 500,
            transit_ms: 1000,
            eject_hold_ms: 500,
            clearance_ms: 300,
            tick_ms: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ActuationCfg {
    pub push_angle: u16,
    pub eject_angle: u16,
    pub rest_angle: u16,
}

impl Default for ActuationCfg {
    fn default() -> Self {
        Self {
            push_angle: 180,
            eject_angle: 145,
            rest_angle: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StartupCfg {
    /// Angle both actuators visit during the power-on self test.
    pub self_test_angle: u16,
    pub self_test_ms: u64,
    pub banner: String,
    pub banner_ms: u64,
}

impl Default for StartupCfg {
    fn default() -> Self {
        Self {
            self_test_angle: 90,
            self_test_ms: 1000,
            banner: "SYSTEM READY...".to_string(),
            banner_ms: 2000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SensorCfg {
    /// Counts-to-grams factor handed to the load cell driver.
    pub calibration_factor: f32,
    /// Zero the scale during start-up (platform must be empty).
    pub tare_on_start: bool,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            calibration_factor: 340.0,
            tare_on_start: true,
        }
    }
}

/// Pin map; informational for the simulator, consumed by board bring-up.
#[derive(Debug, Deserialize, Default)]
pub struct Pins {
    pub loadcell_dout: Option<u8>,
    pub loadcell_sck: Option<u8>,
    pub pusher: Option<u8>,
    pub ejector: Option<u8>,
    pub presence: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub band: BandCfg,
    #[serde(default)]
    pub sampling: SamplingCfg,
    #[serde(default)]
    pub timing: TimingCfg,
    #[serde(default)]
    pub actuation: ActuationCfg,
    #[serde(default)]
    pub startup: StartupCfg,
    #[serde(default)]
    pub sensor: SensorCfg,
    #[serde(default)]
    pub pins: Pins,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Load a scenario of item weights from a CSV file with the exact header `grams`.
pub fn load_items_csv(path: &std::path::Path) -> eyre::Result<Vec<ItemRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open scenario CSV {:?}: {}", path, e))?;

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != ["grams"] {
        eyre::bail!(
            "scenario CSV must have header 'grams', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<ItemRow>().enumerate() {
        match rec {
            Ok(row) if row.grams.is_finite() && row.grams >= 0.0 => rows.push(row),
            Ok(row) => {
                eyre::bail!(
                    "invalid CSV row {}: weight must be finite and >= 0, got {}",
                    idx + 2,
                    row.grams
                );
            }
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    Ok(rows)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Band
        if !self.band.min_g.is_finite() || !self.band.max_g.is_finite() {
            eyre::bail!("band.min_g and band.max_g must be finite");
        }
        if self.band.min_g > self.band.max_g {
            eyre::bail!(
                "band.min_g ({}) must be <= band.max_g ({})",
                self.band.min_g,
                self.band.max_g
            );
        }

        // Sampling
        if !(MIN_SAMPLE_COUNT..=MAX_SAMPLE_COUNT).contains(&self.sampling.sample_count) {
            eyre::bail!(
                "sampling.sample_count must be in [{MIN_SAMPLE_COUNT}, {MAX_SAMPLE_COUNT}]"
            );
        }
        if !self.sampling.presence_threshold_g.is_finite()
            || self.sampling.presence_threshold_g.is_sign_negative()
        {
            eyre::bail!("sampling.presence_threshold_g must be >= 0");
        }
        if self.sampling.presence_threshold_g > self.band.min_g && self.band.min_g > 0.0 {
            // Lower band edge would be unreachable.
            eyre::bail!("sampling.presence_threshold_g must not exceed band.min_g");
        }

        // Timing
        let t = &self.timing;
        for (name, v) in [
            ("settle_ms", t.settle_ms),
            ("push_hold_ms", t.push_hold_ms),
            ("transit_ms", t.transit_ms),
            ("eject_hold_ms", t.eject_hold_ms),
            ("clearance_ms", t.clearance_ms),
            ("tick_ms", t.tick_ms),
        ] {
            if v > MAX_PHASE_MS {
                eyre::bail!("timing.{name} is unreasonably large (>60s)");
            }
        }
        if t.tick_ms == 0 {
            eyre::bail!("timing.tick_ms must be >= 1");
        }

        // Actuation
        let a = &self.actuation;
        for (name, v) in [
            ("push_angle", a.push_angle),
            ("eject_angle", a.eject_angle),
            ("rest_angle", a.rest_angle),
        ] {
            if v > 180 {
                eyre::bail!("actuation.{name} must be in [0, 180]");
            }
        }
        if a.push_angle == a.rest_angle {
            eyre::bail!("actuation.push_angle must differ from rest_angle");
        }

        // Start-up
        if self.startup.self_test_angle > 180 {
            eyre::bail!("startup.self_test_angle must be in [0, 180]");
        }
        if self.startup.self_test_ms > MAX_PHASE_MS || self.startup.banner_ms > MAX_PHASE_MS {
            eyre::bail!("startup durations are unreasonably large (>60s)");
        }

        // Sensor
        if !self.sensor.calibration_factor.is_finite() || self.sensor.calibration_factor == 0.0 {
            eyre::bail!("sensor.calibration_factor must be finite and non-zero");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {r}");
        }

        Ok(())
    }
}
