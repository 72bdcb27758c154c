use crate::utils::error::{BedError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of scintillator bars in the 3×3 matrix.
pub const BARS: usize = 9;
/// Internal ring: four strips per side plus two caps.
pub const INTERNAL_VETOES: usize = 18;
/// External ring: two strips per vertical side, three per horizontal side, plus two caps.
pub const EXTERNAL_VETOES: usize = 12;
/// The crystal column holds at most 11 cells before the inter-crystal gaps consume it.
pub const MAX_CRYSTAL_VETOES: usize = 11;

/// Element counts shared by the layout engine and the calibration tag universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ElementCounts {
    bars: usize,
    crystal_vetoes: usize,
    internal_vetoes: usize,
    external_vetoes: usize,
}

impl ElementCounts {
    /// Single-crystal configuration (31 vetoes).
    pub const SINGLE_CRYSTAL: ElementCounts = ElementCounts {
        bars: BARS,
        crystal_vetoes: 1,
        internal_vetoes: INTERNAL_VETOES,
        external_vetoes: EXTERNAL_VETOES,
    };

    /// Four-crystal configuration (34 vetoes).
    pub const FOUR_CRYSTALS: ElementCounts = ElementCounts {
        bars: BARS,
        crystal_vetoes: 4,
        internal_vetoes: INTERNAL_VETOES,
        external_vetoes: EXTERNAL_VETOES,
    };

    pub fn new(
        bars: usize,
        crystal_vetoes: usize,
        internal_vetoes: usize,
        external_vetoes: usize,
    ) -> Result<Self> {
        if bars != BARS {
            return Err(BedError::InvalidElementCounts {
                reason: format!("the bar matrix has {} bars, got {}", BARS, bars),
            });
        }
        if internal_vetoes != INTERNAL_VETOES {
            return Err(BedError::InvalidElementCounts {
                reason: format!(
                    "the internal ring has {} vetoes, got {}",
                    INTERNAL_VETOES, internal_vetoes
                ),
            });
        }
        if external_vetoes != EXTERNAL_VETOES {
            return Err(BedError::InvalidElementCounts {
                reason: format!(
                    "the external ring has {} vetoes, got {}",
                    EXTERNAL_VETOES, external_vetoes
                ),
            });
        }
        Self::with_crystals(crystal_vetoes)
    }

    pub fn with_crystals(crystal_vetoes: usize) -> Result<Self> {
        if crystal_vetoes == 0 || crystal_vetoes > MAX_CRYSTAL_VETOES {
            return Err(BedError::InvalidElementCounts {
                reason: format!(
                    "crystal veto count must be between 1 and {}, got {}",
                    MAX_CRYSTAL_VETOES, crystal_vetoes
                ),
            });
        }
        Ok(Self {
            crystal_vetoes,
            ..Self::SINGLE_CRYSTAL
        })
    }

    pub fn bars(&self) -> usize {
        self.bars
    }

    pub fn crystal_vetoes(&self) -> usize {
        self.crystal_vetoes
    }

    pub fn internal_vetoes(&self) -> usize {
        self.internal_vetoes
    }

    pub fn external_vetoes(&self) -> usize {
        self.external_vetoes
    }

    pub fn total_vetoes(&self) -> usize {
        self.crystal_vetoes + self.internal_vetoes + self.external_vetoes
    }

    pub fn total_elements(&self) -> usize {
        self.bars + self.total_vetoes()
    }
}

impl Default for ElementCounts {
    fn default() -> Self {
        Self::SINGLE_CRYSTAL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Bar,
    Veto,
}

impl ElementKind {
    pub fn prefix(&self) -> char {
        match self {
            ElementKind::Bar => 'b',
            ElementKind::Veto => 'v',
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Bar => "bar",
            ElementKind::Veto => "veto",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Join key between geometry and calibration data: `b<n>` or `v<n>`, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementTag {
    kind: ElementKind,
    number: usize,
}

impl ElementTag {
    pub fn new(kind: ElementKind, number: usize) -> Result<Self> {
        if number == 0 {
            return Err(BedError::InvalidTag {
                value: format!("{}0", kind.prefix()),
                reason: "element numbers are 1-based".to_string(),
            });
        }
        Ok(Self { kind, number })
    }

    pub fn bar(number: usize) -> Result<Self> {
        Self::new(ElementKind::Bar, number)
    }

    pub fn veto(number: usize) -> Result<Self> {
        Self::new(ElementKind::Veto, number)
    }

    pub(crate) fn from_index(kind: ElementKind, index: usize) -> Self {
        Self {
            kind,
            number: index + 1,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// 1-based element number within its kind.
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn index(&self) -> usize {
        self.number - 1
    }
}

impl fmt::Display for ElementTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.number)
    }
}

impl FromStr for ElementTag {
    type Err = BedError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| BedError::InvalidTag {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let mut chars = s.chars();
        let kind = match chars.next() {
            Some('b') => ElementKind::Bar,
            Some('v') => ElementKind::Veto,
            _ => return Err(invalid("tag must start with 'b' or 'v'")),
        };
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("tag must end with a decimal element number"));
        }
        if digits.len() > 1 && digits.starts_with('0') {
            return Err(invalid("element number has a leading zero"));
        }
        let number: usize = digits
            .parse()
            .map_err(|_| invalid("element number is out of range"))?;
        if number == 0 {
            return Err(invalid("element numbers are 1-based"));
        }
        Ok(Self { kind, number })
    }
}

impl Serialize for ElementTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ElementTag {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

impl WorldPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in world coordinates. `(x, y)` is the minimum corner; y grows upward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl WorldRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning `[left, right) × [bottom, top)`.
    pub fn from_edges(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self::new(left, bottom, right - left, top - bottom)
    }

    pub fn min_x(&self) -> f64 {
        self.x
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn min_y(&self) -> f64 {
        self.y
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> WorldPoint {
        WorldPoint::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }

    /// Half-open containment: points on the max edges are outside.
    pub fn contains(&self, point: WorldPoint) -> bool {
        point.x >= self.min_x()
            && point.x < self.max_x()
            && point.y >= self.min_y()
            && point.y < self.max_y()
    }

    /// True when the rectangles share positive area; touching edges do not count.
    pub fn intersects(&self, other: &WorldRect) -> bool {
        self.min_x() < other.max_x()
            && other.min_x() < self.max_x()
            && self.min_y() < other.max_y()
            && other.min_y() < self.max_y()
    }

    /// True when `other` lies within this rectangle, edges included.
    pub fn encloses(&self, other: &WorldRect) -> bool {
        other.min_x() >= self.min_x()
            && other.max_x() <= self.max_x()
            && other.min_y() >= self.min_y()
            && other.max_y() <= self.max_y()
    }
}

impl Default for WorldRect {
    /// The 3×3 world the side view is drawn in.
    fn default() -> Self {
        Self::new(0.0, 0.0, 3.0, 3.0)
    }
}

/// One labeled rectangle of the side view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Region {
    pub kind: ElementKind,
    /// Zero-based index within `kind`.
    pub index: usize,
    pub rect: WorldRect,
}

impl Region {
    pub fn tag(&self) -> ElementTag {
        ElementTag::from_index(self.kind, self.index)
    }

    pub fn contains(&self, point: WorldPoint) -> bool {
        self.rect.contains(point)
    }
}

/// Positional fields of a calibration record, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationField {
    EffectiveVelocity,
    LeftAdcConversionFactor,
    RightAdcConversionFactor,
    AttenuationLength,
    LeftShift,
    RightShift,
    LeftTdcConversionFactor,
    RightTdcConversionFactor,
    Length,
}

impl CalibrationField {
    pub const ALL: [CalibrationField; 9] = [
        CalibrationField::EffectiveVelocity,
        CalibrationField::LeftAdcConversionFactor,
        CalibrationField::RightAdcConversionFactor,
        CalibrationField::AttenuationLength,
        CalibrationField::LeftShift,
        CalibrationField::RightShift,
        CalibrationField::LeftTdcConversionFactor,
        CalibrationField::RightTdcConversionFactor,
        CalibrationField::Length,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CalibrationField::EffectiveVelocity => "v_eff",
            CalibrationField::LeftAdcConversionFactor => "a_left",
            CalibrationField::RightAdcConversionFactor => "a_right",
            CalibrationField::AttenuationLength => "lambda",
            CalibrationField::LeftShift => "delta_L",
            CalibrationField::RightShift => "delta_R",
            CalibrationField::LeftTdcConversionFactor => "t_left",
            CalibrationField::RightTdcConversionFactor => "t_right",
            CalibrationField::Length => "length",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CalibrationField::EffectiveVelocity => "effective velocity",
            CalibrationField::LeftAdcConversionFactor => "left ADC conversion factor",
            CalibrationField::RightAdcConversionFactor => "right ADC conversion factor",
            CalibrationField::AttenuationLength => "attenuation length",
            CalibrationField::LeftShift => "left shift",
            CalibrationField::RightShift => "right shift",
            CalibrationField::LeftTdcConversionFactor => "left TDC conversion factor",
            CalibrationField::RightTdcConversionFactor => "right TDC conversion factor",
            CalibrationField::Length => "element length",
        }
    }
}

/// Timing and charge constants for one element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub effective_velocity: f64,
    pub left_adc_conversion_factor: f64,
    pub right_adc_conversion_factor: f64,
    pub attenuation_length: f64,
    pub left_shift: f64,
    pub right_shift: f64,
    pub left_tdc_conversion_factor: f64,
    pub right_tdc_conversion_factor: f64,
    pub length: f64,
}

impl CalibrationRecord {
    pub fn from_fields(values: [f64; 9]) -> Self {
        let [
            effective_velocity,
            left_adc_conversion_factor,
            right_adc_conversion_factor,
            attenuation_length,
            left_shift,
            right_shift,
            left_tdc_conversion_factor,
            right_tdc_conversion_factor,
            length,
        ] = values;
        Self {
            effective_velocity,
            left_adc_conversion_factor,
            right_adc_conversion_factor,
            attenuation_length,
            left_shift,
            right_shift,
            left_tdc_conversion_factor,
            right_tdc_conversion_factor,
            length,
        }
    }

    pub fn fields(&self) -> [f64; 9] {
        [
            self.effective_velocity,
            self.left_adc_conversion_factor,
            self.right_adc_conversion_factor,
            self.attenuation_length,
            self.left_shift,
            self.right_shift,
            self.left_tdc_conversion_factor,
            self.right_tdc_conversion_factor,
            self.length,
        ]
    }

    pub fn get(&self, field: CalibrationField) -> f64 {
        match field {
            CalibrationField::EffectiveVelocity => self.effective_velocity,
            CalibrationField::LeftAdcConversionFactor => self.left_adc_conversion_factor,
            CalibrationField::RightAdcConversionFactor => self.right_adc_conversion_factor,
            CalibrationField::AttenuationLength => self.attenuation_length,
            CalibrationField::LeftShift => self.left_shift,
            CalibrationField::RightShift => self.right_shift,
            CalibrationField::LeftTdcConversionFactor => self.left_tdc_conversion_factor,
            CalibrationField::RightTdcConversionFactor => self.right_tdc_conversion_factor,
            CalibrationField::Length => self.length,
        }
    }

    /// One `name (description): value` line per field, in file order.
    pub fn describe(&self) -> Vec<String> {
        CalibrationField::ALL
            .iter()
            .map(|field| format!("{} ({}): {}", field.name(), field.description(), self.get(*field)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_counts_totals() {
        assert_eq!(ElementCounts::SINGLE_CRYSTAL.total_vetoes(), 31);
        assert_eq!(ElementCounts::FOUR_CRYSTALS.total_vetoes(), 34);
        assert_eq!(ElementCounts::default().total_elements(), 40);
    }

    #[test]
    fn test_element_counts_reject_ring_mismatch() {
        assert!(ElementCounts::new(9, 4, 18, 12).is_ok());
        assert!(ElementCounts::new(8, 1, 18, 12).is_err());
        assert!(ElementCounts::new(9, 1, 17, 12).is_err());
        assert!(ElementCounts::new(9, 1, 18, 13).is_err());
        assert!(ElementCounts::with_crystals(0).is_err());
        assert!(ElementCounts::with_crystals(MAX_CRYSTAL_VETOES + 1).is_err());
    }

    #[test]
    fn test_tag_parsing() {
        let tag: ElementTag = "v17".parse().unwrap();
        assert_eq!(tag.kind(), ElementKind::Veto);
        assert_eq!(tag.number(), 17);
        assert_eq!(tag.index(), 16);
        assert_eq!(tag.to_string(), "v17");

        for bad in ["", "b", "x1", "b0", "b01", "v007", "v-1", "b1.5", "B1", " b1", "b1 "] {
            assert!(bad.parse::<ElementTag>().is_err(), "{:?} should not parse", bad);
        }
    }

    #[test]
    fn test_rect_contains_is_half_open() {
        let rect = WorldRect::new(1.0, 1.0, 2.0, 1.0);
        assert!(rect.contains(WorldPoint::new(1.0, 1.0)));
        assert!(rect.contains(WorldPoint::new(2.5, 1.5)));
        assert!(!rect.contains(WorldPoint::new(3.0, 1.5)));
        assert!(!rect.contains(WorldPoint::new(2.0, 2.0)));
    }

    #[test]
    fn test_rect_touching_edges_do_not_intersect() {
        let a = WorldRect::new(0.0, 0.0, 1.0, 1.0);
        let b = WorldRect::new(1.0, 0.0, 1.0, 1.0);
        let c = WorldRect::new(0.5, 0.5, 1.0, 1.0);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
        assert!(b.intersects(&c));
    }

    #[test]
    fn test_record_field_order() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let record = CalibrationRecord::from_fields(values);
        assert_eq!(record.fields(), values);
        assert_eq!(record.get(CalibrationField::AttenuationLength), 4.0);
        assert_eq!(record.right_tdc_conversion_factor, 8.0);
        assert_eq!(record.length, 9.0);

        let lines = record.describe();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "v_eff (effective velocity): 1");
        assert_eq!(lines[8], "length (element length): 9");
    }
}
