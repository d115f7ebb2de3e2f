// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Simulate a multiply-accumulate pipeline.
//!
//! See `lib.rs` for details.

use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;

use log::LevelFilter;
use macsim_components::mac_stage::MacResult;
use macsim_engine::sim_error;
use macsim_engine::types::SimError;
use macsim_models::pipeline::TickInput;
use macsim_platform::Platform;
use macsim_track::builder::{TrackerConfig, TrackersConfig, setup_trackers};
use macsim_track::entity::{Entity, toplevel};
use macsim_track::{Track, Tracker, debug, error, info, str_to_level};
use sim_mac::config::Settings;
use sim_mac::stimulus::{StimulusConfig, StimulusGenerator};
use simplelog::{ConfigBuilder, SimpleLogger};

const DEFAULT_PLATFORM: &str = include_str!("../platforms/tree.yaml");

fn level(option: &str, value: Option<&str>) -> Result<log::Level, SimError> {
    let value = value.unwrap_or_default();
    str_to_level(value).ok_or_else(|| SimError(format!("{option}: unknown level '{value}'")))
}

/// Install the `log` backend used by code without an entity.
fn setup_logger(settings: &Settings) -> Result<(), SimError> {
    let level = level("log_level", settings.log_level.as_deref())?;
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off) // No timestamps are printed
        .set_location_level(LevelFilter::Off) // No file locations are printed
        .set_thread_level(LevelFilter::Off) // No thread information is printed
        .set_target_level(LevelFilter::Off) // No target is printed
        .build();
    SimpleLogger::init(level.to_level_filter(), config)
        .map_err(|e| SimError(format!("Unable to install logger: {e}")))
}

fn setup_tracker(settings: &Settings) -> Result<Tracker, SimError> {
    let log_file = settings.log_file.as_deref().unwrap_or_default();
    let config = TrackersConfig {
        stdout: TrackerConfig {
            enable: settings.stdout.unwrap_or(true),
            level: level("stdout_level", settings.stdout_level.as_deref())?,
            filter_regex: settings.stdout_filter_regex.as_deref().unwrap_or_default(),
            file: None,
        },
        log_file: TrackerConfig {
            enable: !log_file.is_empty(),
            level: level("log_file_level", settings.log_file_level.as_deref())?,
            filter_regex: "",
            file: Some(log_file),
        },
    };
    setup_trackers(&config).map_err(|e| SimError(e.to_string()))
}

fn stimulus_config(settings: &Settings) -> StimulusConfig {
    StimulusConfig {
        seed: settings.seed.unwrap_or_default(),
        dot_product_length: settings.dot_product_length.unwrap_or_default(),
        operand_width: settings.operand_width.unwrap_or_default(),
        valid_probability: settings.valid_probability.unwrap_or_default(),
        extra_probability: settings.extra_probability.unwrap_or_default(),
        extra_width: settings.extra_width.unwrap_or_default(),
        negate_probability: settings.negate_probability.unwrap_or_default(),
    }
}

fn build_platform(top: &Rc<Entity>, settings: &Settings) -> Result<Platform, SimError> {
    match settings.platform.as_deref() {
        None | Some("") => Platform::from_string(top, DEFAULT_PLATFORM),
        Some(path) => Platform::from_file(top, Path::new(path)),
    }
}

#[derive(Default)]
struct Summary {
    num_ticks: usize,
    num_dot_products: usize,
    num_overflows: usize,
    num_mismatches: usize,
}

fn main() -> Result<(), SimError> {
    let settings = Settings::parse_all_sources()?;
    setup_logger(&settings)?;
    let tracker = setup_tracker(&settings)?;
    let top = toplevel(&tracker, "top");

    let mut platform = build_platform(&top, &settings)?;
    for line in platform.to_string().lines().filter(|l| !l.is_empty()) {
        info!(top ; "{line}");
    }

    let mut generator = StimulusGenerator::new(
        &stimulus_config(&settings),
        platform.accumulator(),
        platform.topology(),
    )?;
    if generator.dot_product_length() == 0 {
        return sim_error!("dot_product_length must be set when num_summands is 0");
    }

    let mut reference = platform.reference_model();
    let latency = platform.pipeline().pipeline_latency();
    let idle = TickInput::idle(generator.num_lanes());
    let num_dot_products = settings.num_dot_products.unwrap_or_default();
    info!(top ; "Running {num_dot_products} dot products of {} valid ticks", generator.dot_product_length());

    // Reference results waiting for the pipeline, with the end of dot
    // product flag
    let mut pending: VecDeque<(MacResult, bool)> = VecDeque::new();
    let mut num_sent = 0;
    let mut summary = Summary::default();
    loop {
        let input = if num_sent < num_dot_products {
            let stimulus = generator.next_tick();
            if stimulus.last {
                num_sent += 1;
            }
            pending.push_back((reference.step(&stimulus.input), stimulus.last));
            stimulus.input
        } else if pending.is_empty() {
            break;
        } else {
            idle.clone()
        };

        let tick = summary.num_ticks;
        let result = platform.pipeline_mut().advance(&input)?;
        summary.num_ticks += 1;
        if tick < latency {
            continue;
        }

        let Some((expected, last)) = pending.pop_front() else {
            continue;
        };
        if result != expected {
            summary.num_mismatches += 1;
            error!(top ; "tick {tick}: got {result}, expected {expected}");
        }
        if last {
            summary.num_dot_products += 1;
            if result.overflow {
                summary.num_overflows += 1;
            }
            debug!(top ; "dot product {}: {result}", summary.num_dot_products);
        }
    }

    print_summary(&top, latency, &summary);
    tracker.shutdown();

    if summary.num_mismatches != 0 {
        return sim_error!(format!(
            "{} results differ from the reference",
            summary.num_mismatches
        ));
    }
    Ok(())
}

fn print_summary(top: &Rc<Entity>, latency: usize, summary: &Summary) {
    info!(top ; "Pipeline latency: {latency} ticks");
    info!(top ; "Ran {} ticks, {} dot products, {} overflows",
        summary.num_ticks, summary.num_dot_products, summary.num_overflows);
    if summary.num_mismatches == 0 {
        info!(top ; "Pass: every result matches the reference");
    } else {
        error!(top ; "Fail: {} mismatches", summary.num_mismatches);
    }
}
