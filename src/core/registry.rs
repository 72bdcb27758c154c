use crate::adapters::storage::CalibrationFile;
use crate::core::calibration::CalibrationParser;
use crate::core::layout::DetectorLayout;
use crate::domain::model::{CalibrationRecord, ElementKind, ElementTag, Region, WorldPoint};
use crate::domain::ports::{CalibrationSource, ConfigProvider};
use crate::utils::error::{BedError, Result};
use crate::utils::validation::validate_required_field;
use std::cell::OnceCell;

/// One detector element: its region plus a calibration record loaded on first use.
#[derive(Debug)]
pub struct DetectorElement {
    region: Region,
    calibration: OnceCell<CalibrationRecord>,
}

impl DetectorElement {
    fn new(region: Region) -> Self {
        Self {
            region,
            calibration: OnceCell::new(),
        }
    }

    pub fn tag(&self) -> ElementTag {
        self.region.tag()
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// The record if it has already been loaded.
    pub fn cached_calibration(&self) -> Option<&CalibrationRecord> {
        self.calibration.get()
    }
}

pub struct DetectorRegistry<S: CalibrationSource> {
    layout: DetectorLayout,
    parser: CalibrationParser,
    source: Option<S>,
    bars: Vec<DetectorElement>,
    vetoes: Vec<DetectorElement>,
}

impl DetectorRegistry<CalibrationFile> {
    /// Computes the layout and wires the configured calibration file.
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let counts = config.element_counts()?;
        let layout = DetectorLayout::compute(config.world_bounds(), counts)?;
        let parser = CalibrationParser::new(counts, config.validation_mode());
        let source = config.calibration_path().map(CalibrationFile::new);

        match &source {
            Some(file) => tracing::info!(
                calibration = %file.path().display(),
                mode = ?parser.mode(),
                "detector registry ready"
            ),
            None => tracing::info!("detector registry ready without calibration"),
        }

        Ok(Self::new(layout, parser, source))
    }
}

impl<S: CalibrationSource> DetectorRegistry<S> {
    pub fn new(layout: DetectorLayout, parser: CalibrationParser, source: Option<S>) -> Self {
        let bars = layout.bars().iter().copied().map(DetectorElement::new).collect();
        let vetoes = layout.vetoes().iter().copied().map(DetectorElement::new).collect();
        Self {
            layout,
            parser,
            source,
            bars,
            vetoes,
        }
    }

    pub fn layout(&self) -> &DetectorLayout {
        &self.layout
    }

    pub fn parser(&self) -> &CalibrationParser {
        &self.parser
    }

    pub fn source(&self) -> Option<&S> {
        self.source.as_ref()
    }

    pub fn bars(&self) -> &[DetectorElement] {
        &self.bars
    }

    pub fn vetoes(&self) -> &[DetectorElement] {
        &self.vetoes
    }

    pub fn elements(&self) -> impl Iterator<Item = &DetectorElement> {
        self.bars.iter().chain(self.vetoes.iter())
    }

    pub fn element(&self, tag: &ElementTag) -> Option<&DetectorElement> {
        match tag.kind() {
            ElementKind::Bar => self.bars.get(tag.index()),
            ElementKind::Veto => self.vetoes.get(tag.index()),
        }
    }

    pub fn locate(&self, point: WorldPoint) -> Option<&DetectorElement> {
        let tag = self.layout.locate(point)?;
        self.element(&tag)
    }

    /// Calibration for `tag`, read from the source at most once.
    pub fn calibration(&self, tag: &ElementTag) -> Result<&CalibrationRecord> {
        let element = self.element(tag).ok_or_else(|| BedError::ElementNotFound {
            tag: tag.to_string(),
            file: self.source_name(),
        })?;
        if let Some(record) = element.calibration.get() {
            return Ok(record);
        }

        let source = validate_required_field("calibration.file", &self.source)?;
        let record = self.parser.load(source, tag)?;
        Ok(element.calibration.get_or_init(|| record))
    }

    /// Loads every element's record in one pass over the source.
    pub fn preload(&self) -> Result<usize> {
        let source = validate_required_field("calibration.file", &self.source)?;
        let mut loaded = 0;
        for (tag, record) in self.parser.load_all(source)? {
            if let Some(element) = self.element(&tag) {
                if element.calibration.set(record).is_ok() {
                    loaded += 1;
                }
            } else {
                tracing::warn!(%tag, "calibration record has no matching element");
            }
        }
        tracing::debug!(loaded, "preloaded calibration records");
        Ok(loaded)
    }

    /// Human-readable lines describing what lies under `point`.
    pub fn feedback(&self, point: WorldPoint) -> Vec<String> {
        let mut lines = vec![format!("World ({:.4}, {:.4})", point.x, point.y)];

        let Some(element) = self.locate(point) else {
            return lines;
        };
        let rect = element.region().rect;
        lines.push(format!(
            "{} {} at ({:.4}, {:.4}) size {:.4} x {:.4}",
            element.region().kind,
            element.tag(),
            rect.x,
            rect.y,
            rect.width,
            rect.height
        ));

        if self.source.is_none() {
            return lines;
        }
        match self.calibration(&element.tag()) {
            Ok(record) => lines.extend(record.describe()),
            Err(e) => lines.push(format!("Calibration unavailable: {}", e)),
        }
        lines
    }

    fn source_name(&self) -> String {
        self.source
            .as_ref()
            .map(|s| s.name())
            .unwrap_or_else(|| "<none>".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InlineCalibration;
    use crate::core::tags::tag_universe;
    use crate::domain::model::{ElementCounts, WorldRect};

    fn calibration_text(counts: &ElementCounts) -> String {
        tag_universe(counts)
            .iter()
            .enumerate()
            .map(|(i, tag)| format!("{} {} 1 1 100 0 0 0.05 0.05 {}\n", tag, 10 + i, 50 + i))
            .collect()
    }

    fn registry(source: Option<InlineCalibration>) -> DetectorRegistry<InlineCalibration> {
        let counts = ElementCounts::SINGLE_CRYSTAL;
        let layout = DetectorLayout::compute(WorldRect::default(), counts).unwrap();
        DetectorRegistry::new(layout, CalibrationParser::strict(counts), source)
    }

    #[test]
    fn test_elements_follow_layout_order() {
        let registry = registry(None);
        let tags: Vec<String> = registry.elements().map(|e| e.tag().to_string()).collect();
        assert_eq!(tags.len(), 40);
        assert_eq!(tags[0], "b1");
        assert_eq!(tags[9], "v1");
        assert_eq!(tags[39], "v31");
    }

    #[test]
    fn test_calibration_is_loaded_lazily_once() {
        let counts = ElementCounts::SINGLE_CRYSTAL;
        let registry = registry(Some(InlineCalibration::new("inline", calibration_text(&counts))));
        let tag: ElementTag = "v1".parse().unwrap();

        assert!(registry.element(&tag).unwrap().cached_calibration().is_none());
        let record = registry.calibration(&tag).unwrap();
        assert_eq!(record.effective_velocity, 19.0);
        assert_eq!(record.length, 59.0);
        assert!(registry.element(&tag).unwrap().cached_calibration().is_some());
    }

    #[test]
    fn test_calibration_without_source_is_a_config_error() {
        let registry = registry(None);
        let err = registry.calibration(&"b1".parse().unwrap()).unwrap_err();
        assert!(matches!(err, BedError::MissingConfigError { .. }));
    }

    #[test]
    fn test_unknown_element_is_not_found() {
        let registry = registry(None);
        let err = registry.calibration(&"v40".parse().unwrap()).unwrap_err();
        assert!(matches!(err, BedError::ElementNotFound { .. }));
        assert!(registry.element(&"b10".parse().unwrap()).is_none());
    }

    #[test]
    fn test_preload_fills_every_element() {
        let counts = ElementCounts::SINGLE_CRYSTAL;
        let registry = registry(Some(InlineCalibration::new("inline", calibration_text(&counts))));
        assert_eq!(registry.preload().unwrap(), 40);
        assert!(registry.elements().all(|e| e.cached_calibration().is_some()));
    }

    #[test]
    fn test_feedback_lists_element_and_calibration() {
        let counts = ElementCounts::SINGLE_CRYSTAL;
        let registry = registry(Some(InlineCalibration::new("inline", calibration_text(&counts))));
        let center = registry.layout().bars()[4].rect.center();

        let lines = registry.feedback(center);
        assert!(lines[0].starts_with("World ("));
        assert!(lines[1].starts_with("bar b5"));
        assert_eq!(lines.len(), 2 + 9);
        assert!(lines[2].starts_with("v_eff"));
    }

    #[test]
    fn test_feedback_reports_calibration_failure_inline() {
        let registry = registry(Some(InlineCalibration::new("inline", "")));
        let center = registry.layout().vetoes()[0].rect.center();
        let lines = registry.feedback(center);
        assert!(lines[1].starts_with("veto v1"));
        assert!(lines[2].starts_with("Calibration unavailable"));
    }

    #[test]
    fn test_feedback_outside_detector() {
        let registry = registry(None);
        let lines = registry.feedback(WorldPoint::new(0.0, 0.0));
        assert_eq!(lines.len(), 1);
    }
}
