// Rosters: decoding solver output, and the fixed-width roster report.

use std::cmp::Ordering;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SquadError;
use crate::matching::NameRecord;
use crate::model::LinearModel;
use crate::player::Position;
use crate::table::{Column, ColumnSchema};
use crate::variants::{Role, VariantId, VariantPool};

/// Slack smaller than this is float noise and reported as exactly zero.
const SLACK_EPSILON: f64 = 1e-9;

/// Column layout of a roster report.
pub const ROSTER_SCHEMA: ColumnSchema = ColumnSchema::new(&[
    Column::left("First Name", 24),
    Column::left("Last Name", 28),
    Column::left("Position", 12),
    Column::left("Starting", 10),
    Column::center("Capt.", 6),
    Column::left("Club", 26),
    Column::rest("Salary"),
]);

const CAPTAIN_MARK: &str = "X";
const TOTAL_COST_LABEL: &str = "Total Cost:";
const UNDER_BUDGET_LABEL: &str = "Under Budget:";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One squad member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterSlot {
    pub first_name: String,
    pub last_name: String,
    pub club: String,
    pub position: Position,
    pub role: Role,
    pub is_captain: bool,
    pub cost: f64,
}

impl NameRecord for RosterSlot {
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

/// Display order: starters first, then position, then most expensive first.
fn slot_order(a: &RosterSlot, b: &RosterSlot) -> Ordering {
    let role_rank = |s: &RosterSlot| u8::from(s.role == Role::Sub);
    role_rank(a)
        .cmp(&role_rank(b))
        .then(a.position.sort_order().cmp(&b.position.sort_order()))
        .then(b.cost.total_cmp(&a.cost))
}

/// A selected squad with its cost summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    slots: Vec<RosterSlot>,
    total_cost: f64,
    slack: f64,
}

impl Roster {
    /// Build a roster from its members, ordering them for display.
    pub fn from_slots(mut slots: Vec<RosterSlot>, budget: f64) -> Self {
        slots.sort_by(slot_order);
        let total_cost: f64 = slots.iter().map(|s| s.cost).sum();
        let mut slack = budget - total_cost;
        if slack.abs() < SLACK_EPSILON {
            slack = 0.0;
        }
        Roster {
            slots,
            total_cost,
            slack,
        }
    }

    pub fn slots(&self) -> &[RosterSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Unspent budget.
    pub fn slack(&self) -> f64 {
        self.slack
    }

    pub fn budget(&self) -> f64 {
        self.total_cost + self.slack
    }

    pub fn captain(&self) -> Option<&RosterSlot> {
        self.slots.iter().find(|s| s.is_captain)
    }

    pub fn starters(&self) -> impl Iterator<Item = &RosterSlot> {
        self.slots.iter().filter(|s| s.role == Role::Starter)
    }

    pub fn subs(&self) -> impl Iterator<Item = &RosterSlot> {
        self.slots.iter().filter(|s| s.role == Role::Sub)
    }

    /// Number of starters at `position`.
    pub fn starters_at(&self, position: Position) -> usize {
        self.starters().filter(|s| s.position == position).count()
    }

    /// Outfield starting shape, e.g. "4-4-2".
    pub fn formation(&self) -> String {
        [Position::Defender, Position::Midfielder, Position::Forward]
            .iter()
            .map(|p| self.starters_at(*p).to_string())
            .collect::<Vec<_>>()
            .join("-")
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Turn the solver's selected ids into a roster.
///
/// The selection is checked, never repaired: an unknown id, a wrong member
/// count or any violated model constraint is a `MalformedSolution`.
pub fn decode(
    selected: &[VariantId],
    pool: &VariantPool,
    model: &LinearModel,
    budget: f64,
) -> Result<Roster, SquadError> {
    let mut slots = Vec::with_capacity(selected.len());
    for id in selected {
        let variant = pool
            .get(*id)
            .ok_or_else(|| SquadError::MalformedSolution(format!("unknown variant id {id}")))?;
        let player = pool.player(variant.player_id).ok_or_else(|| {
            SquadError::MalformedSolution(format!("variant {id} has no player record"))
        })?;
        slots.push(RosterSlot {
            first_name: player.first_name.clone(),
            last_name: player.last_name.clone(),
            club: player.club.clone(),
            position: variant.position,
            role: variant.role,
            is_captain: variant.is_captain,
            cost: variant.cost,
        });
    }

    if slots.len() != model.squad_size() {
        return Err(SquadError::MalformedSolution(format!(
            "expected {} players, solver selected {}",
            model.squad_size(),
            slots.len()
        )));
    }

    let violations = model.evaluate(selected);
    if !violations.is_empty() {
        let listed: Vec<String> = violations.iter().map(ToString::to_string).collect();
        return Err(SquadError::MalformedSolution(format!(
            "selection violates {}",
            listed.join(", ")
        )));
    }

    let roster = Roster::from_slots(slots, budget);
    debug!(
        "decoded roster: total cost {}, slack {}",
        roster.total_cost(),
        roster.slack()
    );
    Ok(roster)
}

// ---------------------------------------------------------------------------
// Report format
// ---------------------------------------------------------------------------

fn slot_cells(slot: &RosterSlot) -> [String; 7] {
    [
        slot.first_name.clone(),
        slot.last_name.clone(),
        slot.position.display_str().to_string(),
        slot.role.display_str().to_string(),
        if slot.is_captain { CAPTAIN_MARK.to_string() } else { String::new() },
        slot.club.clone(),
        slot.cost.to_string(),
    ]
}

/// The full report: the roster table, a blank line, then the cost summary.
///
/// A name or club too wide for its column is an input error rather than a
/// truncated cell.
pub fn to_report(roster: &Roster) -> Result<String, SquadError> {
    let mut lines = vec![ROSTER_SCHEMA.header(), ROSTER_SCHEMA.delimiter()];
    for slot in roster.slots() {
        lines.push(ROSTER_SCHEMA.format_row(&slot_cells(slot))?);
    }
    lines.push(String::new());
    lines.push(format!("{TOTAL_COST_LABEL} {}", roster.total_cost()));
    lines.push(format!("{UNDER_BUDGET_LABEL} {}", roster.slack()));

    let mut report = lines.join("\n");
    report.push('\n');
    Ok(report)
}

fn parse_slot(line: &str, line_no: usize) -> Result<RosterSlot, SquadError> {
    let bad = |what: String| SquadError::InputData(format!("roster line {line_no}: {what}"));
    let cells = ROSTER_SCHEMA.split_row(line);

    let position = Position::from_str_pos(&cells[2])
        .ok_or_else(|| bad(format!("unknown position '{}'", cells[2])))?;
    let role = Role::from_str_role(&cells[3])
        .ok_or_else(|| bad(format!("unknown starting value '{}'", cells[3])))?;
    let is_captain = match cells[4].as_str() {
        "" => false,
        m if m.eq_ignore_ascii_case(CAPTAIN_MARK) => true,
        other => return Err(bad(format!("unknown captain mark '{other}'"))),
    };
    let cost: f64 = cells[6]
        .parse()
        .map_err(|_| bad(format!("cannot parse salary '{}'", cells[6])))?;

    Ok(RosterSlot {
        first_name: cells[0].clone(),
        last_name: cells[1].clone(),
        club: cells[5].clone(),
        position,
        role,
        is_captain,
        cost,
    })
}

fn parse_summary(line: &str, label: &str, line_no: usize) -> Result<Option<f64>, SquadError> {
    let Some(value) = line.trim().strip_prefix(label) else {
        return Ok(None);
    };
    value.trim().parse().map(Some).map_err(|_| {
        SquadError::InputData(format!("roster line {line_no}: cannot parse '{}'", value.trim()))
    })
}

/// Read a roster report back.
///
/// The budget is restored as total cost plus slack. Squad rules are not
/// enforced here; a hand-edited report is read as written.
pub fn parse_report(text: &str) -> Result<Roster, SquadError> {
    let mut slots = Vec::new();
    let mut total: Option<f64> = None;
    let mut slack: Option<f64> = None;
    let mut in_table = true;

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        if line.trim().is_empty() {
            if !slots.is_empty() {
                in_table = false;
            }
            continue;
        }

        if let Some(v) = parse_summary(line, TOTAL_COST_LABEL, line_no)? {
            total = Some(v);
            in_table = false;
            continue;
        }
        if let Some(v) = parse_summary(line, UNDER_BUDGET_LABEL, line_no)? {
            slack = Some(v);
            in_table = false;
            continue;
        }

        if ROSTER_SCHEMA.is_header(line) || ROSTER_SCHEMA.is_delimiter(line) {
            continue;
        }
        if !in_table {
            return Err(SquadError::InputData(format!(
                "roster line {line_no}: unexpected content after the table"
            )));
        }
        slots.push(parse_slot(line, line_no)?);
    }

    if slots.is_empty() {
        return Err(SquadError::InputData("roster report lists no players".into()));
    }
    let (Some(total), Some(slack)) = (total, slack) else {
        return Err(SquadError::InputData(format!(
            "roster report is missing the '{TOTAL_COST_LABEL}' or '{UNDER_BUDGET_LABEL}' line"
        )));
    };

    let roster = Roster::from_slots(slots, total + slack);
    if (roster.total_cost() - total).abs() > 1e-6 {
        debug!(
            "reported total cost {} differs from salary sum {}",
            total,
            roster.total_cost()
        );
    }
    Ok(roster)
}

/// Write a roster report to `path`, replacing any existing file.
pub fn save_report(path: &Path, roster: &Roster) -> Result<(), SquadError> {
    let report = to_report(roster)?;
    std::fs::write(path, report).map_err(|e| SquadError::io(path, e))?;
    info!("Saved roster to {}", path.display());
    Ok(())
}

/// Load a roster report from `path`.
pub fn load_report(path: &Path) -> Result<Roster, SquadError> {
    let text = std::fs::read_to_string(path).map_err(|e| SquadError::io(path, e))?;
    parse_report(&text).map_err(|e| match e {
        SquadError::InputData(msg) => SquadError::InputData(format!("{}: {msg}", path.display())),
        other => other,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
