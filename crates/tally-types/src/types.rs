//! Summary schema for vessel operation tallies

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Container length class
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContainerSize {
    #[serde(rename = "20")]
    Twenty,
    #[serde(rename = "40")]
    Forty,
    #[serde(rename = "45")]
    FortyFive,
}

impl ContainerSize {
    pub const ALL: [ContainerSize; 3] = [
        ContainerSize::Twenty,
        ContainerSize::Forty,
        ContainerSize::FortyFive,
    ];

    /// Nominal length in feet, as used in field keys and column headers
    pub fn feet(self) -> u32 {
        match self {
            ContainerSize::Twenty => 20,
            ContainerSize::Forty => 40,
            ContainerSize::FortyFive => 45,
        }
    }

    /// TEU contributed by one box of this size
    pub const fn teu_factor(self) -> f64 {
        match self {
            ContainerSize::Twenty => 1.0,
            ContainerSize::Forty => 2.0,
            ContainerSize::FortyFive => 2.25,
        }
    }

    /// TEU for `count` boxes of this size
    pub fn teu(self, count: u32) -> f64 {
        count as f64 * self.teu_factor()
    }
}

impl std::fmt::Display for ContainerSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.feet())
    }
}

/// Trade direction of a box movement
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Import,
    Export,
    Transhipment,
    Shifting,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Import,
        Direction::Export,
        Direction::Transhipment,
        Direction::Shifting,
    ];

    /// Prefix used in raw extraction field keys (`imp_20_full`)
    pub fn key_prefix(self) -> &'static str {
        match self {
            Direction::Import => "imp",
            Direction::Export => "exp",
            Direction::Transhipment => "ts",
            Direction::Shifting => "shift",
        }
    }

    /// Column label used in exports
    pub fn label(self) -> &'static str {
        match self {
            Direction::Import => "IMPORT",
            Direction::Export => "EXPORT",
            Direction::Transhipment => "T/S",
            Direction::Shifting => "SHIFTING",
        }
    }
}

/// Box counts per container size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeCounts {
    #[serde(rename = "20", default)]
    pub twenty: u32,
    #[serde(rename = "40", default)]
    pub forty: u32,
    #[serde(rename = "45", default)]
    pub forty_five: u32,
}

impl SizeCounts {
    pub fn get(&self, size: ContainerSize) -> u32 {
        match size {
            ContainerSize::Twenty => self.twenty,
            ContainerSize::Forty => self.forty,
            ContainerSize::FortyFive => self.forty_five,
        }
    }

    pub fn get_mut(&mut self, size: ContainerSize) -> &mut u32 {
        match size {
            ContainerSize::Twenty => &mut self.twenty,
            ContainerSize::Forty => &mut self.forty,
            ContainerSize::FortyFive => &mut self.forty_five,
        }
    }

    pub fn total(&self) -> u32 {
        self.twenty
            .saturating_add(self.forty)
            .saturating_add(self.forty_five)
    }

    pub fn teu(&self) -> f64 {
        ContainerSize::ALL
            .iter()
            .map(|size| size.teu(self.get(*size)))
            .sum()
    }
}

impl std::ops::AddAssign for SizeCounts {
    fn add_assign(&mut self, other: Self) {
        self.twenty = self.twenty.saturating_add(other.twenty);
        self.forty = self.forty.saturating_add(other.forty);
        self.forty_five = self.forty_five.saturating_add(other.forty_five);
    }
}

/// Laden/empty breakdown for one trade direction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionSummary {
    #[serde(default)]
    pub laden: SizeCounts,
    #[serde(default)]
    pub empty: SizeCounts,
    #[serde(default)]
    pub boxes: u32,
    #[serde(default)]
    pub teu: f64,
}

impl DirectionSummary {
    /// Build a summary with derived box and TEU subtotals
    pub fn from_counts(laden: SizeCounts, empty: SizeCounts) -> Self {
        Self {
            laden,
            empty,
            boxes: laden.total().saturating_add(empty.total()),
            teu: laden.teu() + empty.teu(),
        }
    }

    /// Column-wise sum, including the stored subtotals as they are
    pub fn accumulate(&mut self, other: &DirectionSummary) {
        self.laden += other.laden;
        self.empty += other.empty;
        self.boxes = self.boxes.saturating_add(other.boxes);
        self.teu += other.teu;
    }
}

/// Shifting (restow) aggregate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShiftingSummary {
    #[serde(default)]
    pub boxes: u32,
    #[serde(default)]
    pub teu: f64,
}

/// One reconciled row per processed image / vessel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Sequence number assigned by the session table; `None` on combined rows
    #[serde(default)]
    pub seq: Option<u64>,
    #[serde(default)]
    pub vessel: String,
    #[serde(default)]
    pub service: String,
    /// Source image file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Number of vessel rows summed into this one (combined rows only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combined_from: Option<u32>,

    #[serde(default)]
    pub import: DirectionSummary,
    #[serde(default)]
    pub export: DirectionSummary,
    #[serde(default)]
    pub transhipment: DirectionSummary,
    #[serde(default)]
    pub shifting: ShiftingSummary,

    #[serde(default)]
    pub hatch_cover: u32,

    #[serde(default)]
    pub total_boxes: u32,
    #[serde(default)]
    pub total_teu: f64,

    /// Granular raw-field breakdown kept for audit and correction
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub recon: BTreeMap<String, f64>,
}

impl SummaryRow {
    /// Vessels represented by this row: 1, or the count carried by a combined row
    pub fn vessel_count(&self) -> u32 {
        self.combined_from.unwrap_or(1)
    }

    /// Laden/empty summary for a trade direction (shifting has none)
    pub fn direction(&self, direction: Direction) -> Option<&DirectionSummary> {
        match direction {
            Direction::Import => Some(&self.import),
            Direction::Export => Some(&self.export),
            Direction::Transhipment => Some(&self.transhipment),
            Direction::Shifting => None,
        }
    }

    pub fn direction_mut(&mut self, direction: Direction) -> Option<&mut DirectionSummary> {
        match direction {
            Direction::Import => Some(&mut self.import),
            Direction::Export => Some(&mut self.export),
            Direction::Transhipment => Some(&mut self.transhipment),
            Direction::Shifting => None,
        }
    }

    /// Re-derive direction subtotals and grand totals from the per-size counts.
    ///
    /// Edits never call this on their own; a corrected row keeps whatever
    /// totals the user typed until this is invoked.
    pub fn recompute_totals(&mut self) {
        for summary in [&mut self.import, &mut self.export, &mut self.transhipment] {
            *summary = DirectionSummary::from_counts(summary.laden, summary.empty);
        }
        self.total_boxes = self.subtotal_boxes();
        self.total_teu = self.subtotal_teu();
    }

    /// Sum of the direction and shifting box subtotals (saturating)
    pub fn subtotal_boxes(&self) -> u32 {
        self.import
            .boxes
            .saturating_add(self.export.boxes)
            .saturating_add(self.transhipment.boxes)
            .saturating_add(self.shifting.boxes)
    }

    /// Sum of the direction and shifting TEU subtotals
    pub fn subtotal_teu(&self) -> f64 {
        self.import.teu + self.export.teu + self.transhipment.teu + self.shifting.teu
    }
}
