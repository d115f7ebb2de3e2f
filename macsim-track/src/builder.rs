// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Build the trackers requested by a user.

use std::fs;
use std::io::BufWriter;
use std::rc::Rc;

use crate::tracker::{EntityLevels, MultiTracker, TextTracker, TrackConfigError, stdout_tracker};
use crate::{Tracker, Writer};

/// One text output.
pub struct TrackerConfig<'a> {
    pub enable: bool,

    pub level: log::Level,

    /// Only entities whose full name matches get `level`, the rest only
    /// report errors. Empty applies `level` to every entity.
    pub filter_regex: &'a str,

    /// Output file, for trackers that write to one.
    pub file: Option<&'a str>,
}

impl Default for TrackerConfig<'_> {
    fn default() -> Self {
        Self {
            enable: true,
            level: log::Level::Warn,
            filter_regex: "",
            file: None,
        }
    }
}

pub struct TrackersConfig<'a> {
    pub stdout: TrackerConfig<'a>,
    pub log_file: TrackerConfig<'a>,
}

fn entity_levels(config: &TrackerConfig) -> Result<EntityLevels, TrackConfigError> {
    if config.filter_regex.is_empty() {
        return Ok(EntityLevels::new(config.level));
    }
    let mut levels = EntityLevels::new(log::Level::Error);
    levels.add_filter(config.filter_regex, config.level)?;
    Ok(levels)
}

fn text_tracker(config: &TrackerConfig, writer: Writer) -> Result<Tracker, TrackConfigError> {
    Ok(Rc::new(TextTracker::new(entity_levels(config)?, writer)))
}

fn stdout_text_tracker(config: &TrackerConfig) -> Result<Tracker, TrackConfigError> {
    text_tracker(config, Box::new(BufWriter::new(std::io::stdout())))
}

fn file_text_tracker(config: &TrackerConfig) -> Result<Tracker, TrackConfigError> {
    let path = config
        .file
        .filter(|path| !path.is_empty())
        .ok_or_else(|| TrackConfigError("log file enabled without a file name".to_string()))?;
    let file = fs::File::create(path)
        .map_err(|e| TrackConfigError(format!("Failed to create {path}: {e}")))?;
    text_tracker(config, Box::new(BufWriter::new(file)))
}

/// Create the tracker shared by a whole model.
///
/// With no output enabled, warnings and errors still go to stdout.
pub fn setup_trackers(config: &TrackersConfig) -> Result<Tracker, TrackConfigError> {
    match (config.stdout.enable, config.log_file.enable) {
        (true, true) => {
            let mut tracker = MultiTracker::default();
            tracker.add_tracker(stdout_text_tracker(&config.stdout)?);
            tracker.add_tracker(file_text_tracker(&config.log_file)?);
            Ok(Rc::new(tracker))
        }
        (true, false) => stdout_text_tracker(&config.stdout),
        (false, true) => file_text_tracker(&config.log_file),
        (false, false) => Ok(stdout_tracker(log::Level::Warn)),
    }
}
