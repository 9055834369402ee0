//! Config mapping, simulator assembly, and the `run` / `self-check` commands.

use std::path::Path;
use std::time::Duration;

use crossbeam_channel::Receiver;
use eyre::Result;
use serde_json::json;
use sorter_core::{CycleReport, RunParams, RunSummary, SortingLoop};
use sorter_hardware::{SimCfg, SimLine};
use sorter_ui::SharedPanel;

use crate::error_fmt::CliError;

/// Read, parse and validate the config file.
pub fn load_config(path: &Path) -> Result<sorter_config::Config> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        eyre::Report::new(CliError::Config(format!("read {}: {e}", path.display())))
    })?;
    let cfg = sorter_config::load_toml(&text)
        .map_err(|e| eyre::Report::new(CliError::Config(e.to_string())))?;
    cfg.validate()
        .map_err(|e| eyre::Report::new(CliError::Config(format!("{e:#}"))))?;
    Ok(cfg)
}

/// Items used when no scenario file is given: one light, one in band, one heavy.
/// The light item is left out when no detectable weight lies below the band.
fn demo_items(cfg: &sorter_config::Config) -> Vec<f32> {
    let (min, max) = (cfg.band.min_g, cfg.band.max_g);
    let threshold = cfg.sampling.presence_threshold_g;
    let light = (min * 0.8).max(threshold);
    let mut items = Vec::with_capacity(3);
    if light < min {
        items.push(light);
    } else {
        tracing::warn!(
            min_g = min,
            threshold,
            "presence threshold reaches band.min_g; demo batch has no light item"
        );
    }
    items.extend([(min + max) / 2.0, max * 1.2 + 1.0]);
    items
}

/// Simulated belt sized so a reject is still on the belt when the ejector fires.
pub fn sim_line(cfg: &sorter_config::Config, tick_ms: u64) -> SimLine {
    let t = &cfg.timing;
    let to_eject = t
        .push_hold_ms
        .saturating_add(t.transit_ms)
        .saturating_add(t.eject_hold_ms);
    let transit_polls = u32::try_from(to_eject / tick_ms.max(1) + 2).unwrap_or(u32::MAX);
    SimLine::new(SimCfg {
        transit_polls,
        ..SimCfg::default()
    })
}

pub fn build_sorter(
    cfg: &sorter_config::Config,
    line: &SimLine,
    panel: &SharedPanel,
) -> Result<SortingLoop> {
    SortingLoop::builder()
        .with_sensor(line.sensor())
        .with_pusher(line.pusher())
        .with_ejector(line.ejector())
        .with_presence(line.presence())
        .with_display(panel.clone())
        .with_config(cfg)?
        .build()
}

fn report_json(r: &CycleReport) -> serde_json::Value {
    json!({
        "weight_g": r.weight_g,
        "samples": r.samples,
        "result": r.classification.to_string(),
        "pass": r.pass,
        "reject": r.reject,
        "cycle_ms": r.cycle_ms,
    })
}

fn summary_json(s: &RunSummary) -> serde_json::Value {
    json!({
        "cycles": s.cycles,
        "pass": s.pass,
        "reject": s.reject,
        "confirmations": s.confirmations,
        "ticks": s.ticks,
    })
}

pub fn run_sort(
    cfg: &sorter_config::Config,
    items: Option<&Path>,
    max_cycles: Option<u64>,
    tick_ms: Option<u64>,
    json: bool,
    shutdown: Receiver<()>,
) -> Result<RunSummary> {
    let weights: Vec<f32> = match items {
        Some(p) => sorter_config::load_items_csv(p)
            .map_err(|e| eyre::Report::new(CliError::Scenario(format!("{e:#}"))))?
            .into_iter()
            .map(|r| r.grams)
            .collect(),
        None => demo_items(cfg),
    };
    // The platform never reports these as present, so they would block the line forever.
    let threshold = cfg.sampling.presence_threshold_g;
    let (weights, skipped): (Vec<f32>, Vec<f32>) =
        weights.into_iter().partition(|&w| w >= threshold);
    for w in &skipped {
        tracing::warn!(grams = w, threshold, "item below presence threshold; skipping");
    }
    let tick_ms = tick_ms.unwrap_or(cfg.timing.tick_ms);

    let line = sim_line(cfg, tick_ms);
    line.enqueue_all(weights.iter().copied());
    let panel = SharedPanel::new();
    let mut sorter = build_sorter(cfg, &line, &panel)?;
    sorter.start_up();

    tracing::info!(
        items = weights.len(),
        min_g = cfg.band.min_g,
        max_g = cfg.band.max_g,
        "scenario loaded"
    );

    let params = RunParams {
        tick: Duration::from_millis(tick_ms),
        max_cycles,
        max_ticks: None,
    };
    let mut interrupted = false;
    let summary = sorter_core::run_observed(
        &mut sorter,
        params,
        |_| {
            if shutdown.try_recv().is_ok() {
                interrupted = true;
            }
            interrupted || line.is_drained()
        },
        |r| {
            if json {
                println!("{}", report_json(r));
            } else {
                println!("{r}");
            }
            tracing::debug!(panel = ?panel.snapshot().lines(), "display");
        },
    )?;

    if interrupted {
        tracing::warn!("run interrupted");
    }
    let stats = line.stats();
    if json {
        let mut v = summary_json(&summary);
        v["interrupted"] = json!(interrupted);
        v["ejected"] = json!(stats.ejected);
        v["exited"] = json!(stats.exited);
        v["skipped"] = json!(skipped.len());
        println!("{v}");
    } else {
        println!(
            "sorted {} item(s): pass={} reject={} confirmations={}",
            summary.cycles, summary.pass, summary.reject, summary.confirmations
        );
        if !skipped.is_empty() {
            println!("{} item(s) skipped below presence threshold", skipped.len());
        }
        if stats.remaining > 0 || stats.on_platform {
            println!(
                "{} item(s) not sorted",
                stats.remaining + usize::from(stats.on_platform)
            );
        }
    }
    Ok(summary)
}

pub fn self_check(cfg: &sorter_config::Config, json: bool) -> Result<()> {
    let line = sim_line(cfg, cfg.timing.tick_ms);
    let panel = SharedPanel::new();
    let mut sorter = build_sorter(cfg, &line, &panel)?;
    sorter.start_up();

    let band = sorter.band();
    if json {
        println!(
            "{}",
            json!({
                "status": "ok",
                "band": { "min_g": band.min_g(), "max_g": band.max_g() },
                "pusher": line.pusher_angles(),
                "ejector": line.ejector_angles(),
            })
        );
    } else {
        println!(
            "self-check ok: band {:.1}..{:.1} g, pusher {:?}, ejector {:?}",
            band.min_g(),
            band.max_g(),
            line.pusher_angles(),
            line.ejector_angles()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sorter_traits::{Actuator, PresenceSensor, WeightSensor};

    fn cfg() -> sorter_config::Config {
        sorter_config::load_toml(
            r#"
[band]
min_g = 50.0
max_g = 100.0

[timing]
push_hold_ms = 20
transit_ms = 50
eject_hold_ms = 10
tick_ms = 5
"#,
        )
        .unwrap()
    }

    #[test]
    fn demo_batch_covers_all_three_outcomes() {
        let cfg = cfg();
        let items = demo_items(&cfg);
        let band = sorter_core::WeightBand::new(50.0, 100.0).unwrap();
        let classes: Vec<_> = items
            .iter()
            .map(|&w| sorter_core::classify(w, &band))
            .collect();
        assert_eq!(
            classes,
            vec![
                sorter_core::Classification::RejectLight,
                sorter_core::Classification::Accept,
                sorter_core::Classification::RejectHeavy,
            ]
        );
        assert!(items.iter().all(|&w| w >= cfg.sampling.presence_threshold_g));
    }

    #[test]
    fn demo_batch_drops_light_item_when_threshold_reaches_band() {
        let mut cfg = cfg();
        cfg.sampling.presence_threshold_g = 50.0;
        let items = demo_items(&cfg);
        let band = sorter_core::WeightBand::new(50.0, 100.0).unwrap();
        let classes: Vec<_> = items
            .iter()
            .map(|&w| sorter_core::classify(w, &band))
            .collect();
        assert_eq!(
            classes,
            vec![
                sorter_core::Classification::Accept,
                sorter_core::Classification::RejectHeavy,
            ]
        );

        cfg.band.min_g = 0.0;
        cfg.sampling.presence_threshold_g = 0.0;
        assert_eq!(demo_items(&cfg).len(), 2);
    }

    #[test]
    fn sim_transit_outlasts_eject_window() {
        let line = sim_line(&cfg(), 5);
        line.place(120.0);
        // Transit polls must exceed (20 + 50 + 10) / 5 = 16.
        let mut sensor = line.sensor();
        let mut pusher = line.pusher();
        let mut presence = line.presence();
        sensor.read(1).unwrap();
        pusher.set_angle(180).unwrap();
        for _ in 0..16 {
            assert!(presence.is_high().unwrap());
        }
        assert!(line.stats().in_transit);
    }
}
