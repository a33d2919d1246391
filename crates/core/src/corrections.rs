//! Declared corrections to provider geometry
//!
//! Some towns arrive with known-bad multipart geometry (a stray island,
//! a mis-digitized annex). Rather than patching them inline, corrections
//! are declared in a static table and applied to the provider output
//! before any town is processed:
//!
//! ```json
//! [
//!   { "town_id": "1714000", "action": "keep_part", "index": 1 },
//!   { "town_id": "2622000", "action": "drop_parts", "indices": [0, 3] },
//!   { "town_id": "4805000", "action": "replace",
//!     "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]] } }
//! ]
//! ```

use crate::error::Result;
use crate::town::{Town, TownId};
use crate::vector::geojson::GeometryObject;
use geo::{Geometry, MultiPolygon};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// What to do with a town's polygon parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CorrectionAction {
    /// Keep only the part at `index` (input order)
    KeepPart { index: usize },
    /// Remove the parts at `indices`
    DropParts { indices: Vec<usize> },
    /// Substitute the whole boundary
    Replace { geometry: GeometryObject },
}

/// One entry of the correction table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub town_id: TownId,
    #[serde(flatten)]
    pub action: CorrectionAction,
    /// Free-form reason, for the operator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Summary of applying a [`CorrectionTable`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrectionReport {
    pub applied: usize,
    /// Corrections that could not be applied, with the reason
    pub skipped: Vec<(TownId, String)>,
}

/// Static table of geometry corrections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrectionTable {
    corrections: Vec<Correction>,
}

impl CorrectionTable {
    pub fn new(corrections: Vec<Correction>) -> Self {
        Self { corrections }
    }

    /// Parse a table from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a table from a JSON file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn len(&self) -> usize {
        self.corrections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty()
    }

    /// Apply all corrections in table order.
    ///
    /// Corrections naming an unknown town, an out-of-range part, or a
    /// non-polygonal replacement are skipped and reported; they never
    /// abort the run.
    pub fn apply(&self, towns: &mut [Town]) -> CorrectionReport {
        let positions: HashMap<TownId, usize> = towns
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();

        let mut report = CorrectionReport::default();
        for correction in &self.corrections {
            let outcome = match positions.get(&correction.town_id) {
                Some(&i) => apply_one(&mut towns[i], &correction.action),
                None => Err("town not present in input".to_string()),
            };
            match outcome {
                Ok(()) => {
                    debug!("Applied correction to town {}", correction.town_id);
                    report.applied += 1;
                }
                Err(reason) => {
                    warn!("Skipping correction for town {}: {}", correction.town_id, reason);
                    report.skipped.push((correction.town_id.clone(), reason));
                }
            }
        }
        report
    }
}

fn apply_one(town: &mut Town, action: &CorrectionAction) -> std::result::Result<(), String> {
    let count = town.part_count();
    match action {
        CorrectionAction::KeepPart { index } => {
            let part = town
                .parts
                .0
                .get(*index)
                .cloned()
                .ok_or_else(|| format!("part {} out of range ({} parts)", index, count))?;
            town.parts = MultiPolygon::new(vec![part]);
        }
        CorrectionAction::DropParts { indices } => {
            if let Some(bad) = indices.iter().find(|&&i| i >= count) {
                return Err(format!("part {} out of range ({} parts)", bad, count));
            }
            let kept = town
                .parts
                .0
                .iter()
                .enumerate()
                .filter(|(i, _)| !indices.contains(i))
                .map(|(_, p)| p.clone())
                .collect();
            town.parts = MultiPolygon::new(kept);
        }
        CorrectionAction::Replace { geometry } => {
            town.parts = match geometry.to_geometry().map_err(|e| e.to_string())? {
                Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                Geometry::MultiPolygon(mp) => mp,
                _ => return Err("replacement is not a Polygon or MultiPolygon".to_string()),
            };
        }
    }
    Ok(())
}
