// Availability / injury devaluation of player scores.
//
// Adjustments come from an external list (usually produced from a stats
// source's injury news) and are matched to players with the identity
// matcher, since the list's spellings need not agree with the player pool.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SquadError;
use crate::matching::{self, NameRecord};
use crate::player::PlayerRecord;
use crate::table::{Column, ColumnSchema};

/// Column layout of an adjustments file.
pub const ADJUSTMENT_SCHEMA: ColumnSchema = ColumnSchema::new(&[
    Column::left("First Name", 24),
    Column::left("Last Name", 28),
    Column::left("Club", 26),
    Column::left("Adjustment", 20),
    Column::rest("Notes"),
]);

/// One externally supplied devaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentEntry {
    pub first_name: String,
    pub last_name: String,
    pub club: String,
    /// Multiplier in [0, 1] applied to the player's score.
    pub factor: f64,
    pub notes: String,
}

impl NameRecord for AdjustmentEntry {
    fn first_name(&self) -> &str {
        &self.first_name
    }

    fn last_name(&self) -> &str {
        &self.last_name
    }

    fn club(&self) -> &str {
        &self.club
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Score multiplier for `player` given the adjustments list.
///
/// Returns 1.0 when no entry matches, or when the matched factor is at or
/// above `threshold` (the doubt is not severe enough to act on). Otherwise
/// returns the matched entry's factor.
pub fn resolve_factor(
    player: &PlayerRecord,
    adjustments: &[AdjustmentEntry],
    threshold: f64,
) -> f64 {
    let Some(entry) = matching::find_match(player, adjustments) else {
        return 1.0;
    };

    if entry.factor >= threshold {
        debug!(
            "ignoring adjustment {} for {} ({}): at or above threshold {}",
            entry.factor,
            player.full_name(),
            player.club,
            threshold
        );
        return 1.0;
    }

    info!(
        "adjusting {} ({}) by factor {}: {}",
        player.full_name(),
        player.club,
        entry.factor,
        entry.notes
    );
    entry.factor
}

/// Build adjustment entries for every player whose `field` value is below
/// 1.0 (e.g. `availability`, or a provider's chance-of-playing stat).
/// Players without the field are left out.
pub fn entries_from_availability(players: &[PlayerRecord], field: &str) -> Vec<AdjustmentEntry> {
    players
        .iter()
        .filter_map(|p| {
            let chance = p.stat(field)?;
            (chance < 1.0).then(|| AdjustmentEntry {
                first_name: p.first_name.clone(),
                last_name: p.last_name.clone(),
                club: p.club.clone(),
                factor: chance.clamp(0.0, 1.0),
                notes: format!("{:.0}% chance of playing", chance.clamp(0.0, 1.0) * 100.0),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// File format
// ---------------------------------------------------------------------------

/// Parse an adjustments table.
///
/// Blank lines and `---` delimiter rows are skipped. If the first data line
/// has a non-numeric factor it is taken as a header; a non-numeric or
/// out-of-range factor anywhere else is an input error naming the line.
pub fn parse_adjustments(text: &str) -> Result<Vec<AdjustmentEntry>, SquadError> {
    let mut entries = Vec::new();
    let mut seen_first_line = false;

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        if line.trim().is_empty() || ADJUSTMENT_SCHEMA.is_delimiter(line) {
            continue;
        }

        let first_line = !seen_first_line;
        seen_first_line = true;

        let cells = ADJUSTMENT_SCHEMA.split_row(line);
        let factor_cell = cells[3].as_str();
        let factor: f64 = match factor_cell.parse() {
            Ok(f) => f,
            Err(_) if first_line => {
                if !ADJUSTMENT_SCHEMA.is_header(line) {
                    debug!("treating first adjustments line as a header: {line}");
                }
                continue;
            }
            Err(_) => {
                return Err(SquadError::InputData(format!(
                    "adjustments line {line_no}: cannot parse '{factor_cell}' as a factor"
                )));
            }
        };

        if !(0.0..=1.0).contains(&factor) {
            return Err(SquadError::InputData(format!(
                "adjustments line {line_no}: factor {factor} outside [0, 1]"
            )));
        }

        if cells[0].is_empty() && cells[1].is_empty() {
            return Err(SquadError::InputData(format!(
                "adjustments line {line_no}: no player name"
            )));
        }

        entries.push(AdjustmentEntry {
            first_name: cells[0].clone(),
            last_name: cells[1].clone(),
            club: cells[2].clone(),
            factor,
            notes: cells[4].clone(),
        });
    }

    Ok(entries)
}

/// Load an adjustments file.
pub fn load_adjustments(path: &Path) -> Result<Vec<AdjustmentEntry>, SquadError> {
    let text = std::fs::read_to_string(path).map_err(|e| SquadError::io(path, e))?;
    let entries = parse_adjustments(&text).map_err(|e| match e {
        SquadError::InputData(msg) => SquadError::InputData(format!("{}: {msg}", path.display())),
        other => other,
    })?;
    info!("Loaded {} adjustments from {}", entries.len(), path.display());
    Ok(entries)
}

/// Format entries as an adjustments table (header, delimiter, one row each).
///
/// A name or club too wide for its column is an input error: a cut club
/// would silently stop matching its player.
pub fn format_adjustments(entries: &[AdjustmentEntry]) -> Result<String, SquadError> {
    let mut lines = vec![ADJUSTMENT_SCHEMA.header(), ADJUSTMENT_SCHEMA.delimiter()];
    for entry in entries {
        let factor = entry.factor.to_string();
        lines.push(ADJUSTMENT_SCHEMA.format_row(&[
            entry.first_name.as_str(),
            entry.last_name.as_str(),
            entry.club.as_str(),
            factor.as_str(),
            entry.notes.as_str(),
        ])?);
    }

    let mut text = lines.join("\n");
    text.push('\n');
    Ok(text)
}

/// Write entries to `path`, replacing any existing file.
pub fn save_adjustments(path: &Path, entries: &[AdjustmentEntry]) -> Result<(), SquadError> {
    let text = format_adjustments(entries)?;
    std::fs::write(path, text).map_err(|e| SquadError::io(path, e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
