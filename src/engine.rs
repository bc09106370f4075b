//! Template engine
//!
//! Owns the label registry and formatting choices shared by every
//! generation run. Per-run state (the static value table) is created by
//! [`TemplateEngine::begin_run`] and passed explicitly, so two runs never
//! share static values.

use crate::config::EngineConfig;
use crate::data::DataMap;
use crate::dispatch::{dispatch, DispatchReport};
use crate::document::Document;
use crate::error::CheckError;
use crate::label::{LabelOptions, LabelRegistry};
use crate::statics::{Clock, LocalClock, StaticContext, StaticValues, DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT};
use crate::template::{is_static_point, scan, InsertionPoint, InsertionPoints, ScanOutput};

/// Scan and dispatch with a fixed label set
#[derive(Debug)]
pub struct TemplateEngine {
    registry: LabelRegistry,
    options: LabelOptions,
    date_format: String,
    time_format: String,
    clock: Box<dyn Clock>,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new(LabelRegistry::with_defaults())
    }
}

impl TemplateEngine {
    /// Create an engine with default formatting and the local clock
    pub fn new(registry: LabelRegistry) -> Self {
        Self {
            registry,
            options: LabelOptions::default(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            clock: Box::new(LocalClock),
        }
    }

    /// Create an engine from the `[labels]` configuration
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            registry: config.registry(),
            options: config.label_options(),
            date_format: config.labels.date_format.clone(),
            time_format: config.labels.time_format.clone(),
            clock: Box::new(LocalClock),
        }
    }

    /// Read the time from `clock` instead of the local clock
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_options(mut self, options: LabelOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &LabelRegistry {
        &self.registry
    }

    pub fn options(&self) -> &LabelOptions {
        &self.options
    }

    /// Context for the current instant
    pub fn static_context(&self) -> StaticContext {
        StaticContext::new(self.clock.now())
            .with_date_format(self.date_format.as_str())
            .with_time_format(self.time_format.as_str())
    }

    /// Fresh static values for one generation run
    pub fn begin_run(&self) -> StaticValues {
        StaticValues::collect(&self.registry, &self.static_context())
    }

    /// Scan a template, resolving content-free labels from `statics`
    pub fn scan(&self, document: Document, statics: &StaticValues) -> Result<ScanOutput, CheckError> {
        scan(document, &self.registry, |point, document| {
            self.resolve_static(point, document, statics)
        })
    }

    fn resolve_static(&self, point: &InsertionPoint, document: &mut Document, statics: &StaticValues) -> bool {
        if point.kind.has_content() {
            return false;
        }
        if let Err(e) = point.kind.apply(point, None, document, statics, &self.options) {
            log::warn!("could not resolve '{}': {}", point.token, e);
        }
        true
    }

    /// Check a template without resolving anything
    pub fn check(&self, document: Document) -> Result<ScanOutput, CheckError> {
        scan(document, &self.registry, |point, _| is_static_point(point))
    }

    /// Apply caller data to scanned insertion points
    pub fn dispatch(
        &self,
        points: &InsertionPoints,
        data: &DataMap,
        document: &mut Document,
        statics: &StaticValues,
    ) -> DispatchReport {
        dispatch(points, data, document, statics, &self.options)
    }

    /// Scan and dispatch one template in a fresh run
    pub fn fill(&self, document: Document, data: &DataMap) -> Result<(Document, DispatchReport), CheckError> {
        let statics = self.begin_run();
        let ScanOutput { points, mut document } = self.scan(document, &statics)?;
        let report = self.dispatch(&points, data, &mut document, &statics);
        Ok((document, report))
    }
}
