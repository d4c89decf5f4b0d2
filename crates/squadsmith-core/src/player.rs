// Player records and the player-pool CSV loader.
//
// The scraping collaborator hands over one CSV row per player with the
// identity columns, position and cost, plus any number of numeric stat
// columns (total_points, average_points, ownership, ...). Stats are kept by
// name so the objective and the rarity weight can be selected at runtime.

use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SquadError;
use crate::matching::NameRecord;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Playing position. Every squad member has exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Keeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    /// All positions in squad display order.
    pub const ALL: [Position; 4] = [
        Position::Keeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Parse a position string.
    ///
    /// Accepts the full names (singular or plural) and the usual short forms
    /// used by stat providers: "GK"/"GKP", "DEF", "MID", "FWD", ...
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "keeper" | "keepers" | "goalkeeper" | "goalkeepers" | "gk" | "gkp" | "g" => {
                Some(Position::Keeper)
            }
            "defender" | "defenders" | "def" | "d" => Some(Position::Defender),
            "midfielder" | "midfielders" | "mid" | "m" => Some(Position::Midfielder),
            "forward" | "forwards" | "fwd" | "f" | "striker" | "st" => Some(Position::Forward),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Keeper => "keeper",
            Position::Defender => "defender",
            Position::Midfielder => "midfielder",
            Position::Forward => "forward",
        }
    }

    /// Deterministic ordering index for roster display.
    pub fn sort_order(&self) -> u8 {
        match self {
            Position::Keeper => 0,
            Position::Defender => 1,
            Position::Midfielder => 2,
            Position::Forward => 3,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

// ---------------------------------------------------------------------------
// PlayerRecord
// ---------------------------------------------------------------------------

/// Immutable snapshot of one athlete as delivered by the stats source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub first_name: String,
    pub last_name: String,
    pub club: String,
    pub position: Position,
    /// Salary in the source's currency unit (e.g. millions of pounds).
    pub cost: f64,
    /// Fraction of expected playing time, 1.0 meaning fully available.
    pub availability: f64,
    /// Named numeric stats. A stat that is absent here is "null".
    #[serde(default)]
    pub stats: HashMap<String, f64>,
}

impl PlayerRecord {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        club: impl Into<String>,
        position: Position,
        cost: f64,
    ) -> Self {
        PlayerRecord {
            first_name: first_name.into(),
            last_name: last_name.into(),
            club: club.into(),
            position,
            cost,
            availability: 1.0,
            stats: HashMap::new(),
        }
    }

    /// Builder-style setter for a named stat.
    pub fn with_stat(mut self, name: impl Into<String>, value: f64) -> Self {
        self.stats.insert(name.into(), value);
        self
    }

    pub fn with_availability(mut self, availability: f64) -> Self {
        self.availability = availability;
        self
    }

    /// Look up a stat by name. `cost` and `availability` resolve to the
    /// record's own fields. Non-finite values count as missing.
    pub fn stat(&self, name: &str) -> Option<f64> {
        let value = match name {
            "cost" => Some(self.cost),
            "availability" => Some(self.availability),
            _ => self.stats.get(name).copied(),
        };
        value.filter(|v| v.is_finite())
    }

    /// "First Last", or whichever half is present for single-name players.
    pub fn full_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (true, _) => self.last_name.clone(),
            (_, true) => self.first_name.clone(),
            _ => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

impl NameRecord for PlayerRecord {
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
// CSV loading
// ---------------------------------------------------------------------------

const REQUIRED_COLUMNS: [&str; 5] = ["first_name", "last_name", "club", "position", "cost"];

/// Canonical column key: lower-case with spaces and dashes folded to `_`,
/// so "First Name" and "first-name" both read as `first_name`.
fn column_key(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

fn parse_row(
    record: &csv::StringRecord,
    columns: &HashMap<String, usize>,
    headers: &[String],
) -> Result<PlayerRecord, String> {
    let field = |name: &str| -> &str {
        columns
            .get(name)
            .and_then(|&i| record.get(i))
            .map(str::trim)
            .unwrap_or("")
    };

    let position_str = field("position");
    let position = Position::from_str_pos(position_str)
        .ok_or_else(|| format!("unknown position '{position_str}'"))?;

    let cost_str = field("cost");
    let cost: f64 = cost_str
        .parse()
        .map_err(|_| format!("cost '{cost_str}' is not a number"))?;
    if !cost.is_finite() || cost < 0.0 {
        return Err(format!("cost {cost} must be a non-negative number"));
    }

    let availability = match field("availability") {
        "" => 1.0,
        s => {
            let a: f64 = s
                .parse()
                .map_err(|_| format!("availability '{s}' is not a number"))?;
            if !(0.0..=1.0).contains(&a) {
                return Err(format!("availability {a} outside [0, 1]"));
            }
            a
        }
    };

    let mut stats = HashMap::new();
    for (i, key) in headers.iter().enumerate() {
        if REQUIRED_COLUMNS.contains(&key.as_str()) || key == "availability" {
            continue;
        }
        let raw = record.get(i).map(str::trim).unwrap_or("");
        if raw.is_empty() {
            continue;
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => {
                stats.insert(key.clone(), v);
            }
            _ => debug!("ignoring non-numeric value '{raw}' in column '{key}'"),
        }
    }

    Ok(PlayerRecord {
        first_name: field("first_name").to_string(),
        last_name: field("last_name").to_string(),
        club: field("club").to_string(),
        position,
        cost,
        availability,
        stats,
    })
}

fn load_players_from_reader<R: Read>(rdr: R) -> Result<Vec<PlayerRecord>, SquadError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| SquadError::InputData(format!("unreadable player CSV header: {e}")))?
        .iter()
        .map(column_key)
        .collect();

    let columns: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, k)| (k.clone(), i))
        .collect();

    for required in REQUIRED_COLUMNS {
        if !columns.contains_key(required) {
            return Err(SquadError::InputData(format!(
                "player CSV is missing required column '{required}'"
            )));
        }
    }

    let mut players = Vec::new();
    for (line, result) in reader.records().enumerate() {
        match result {
            Ok(record) => match parse_row(&record, &columns, &headers) {
                Ok(player) => players.push(player),
                Err(reason) => warn!("skipping player row {}: {}", line + 2, reason),
            },
            Err(e) => warn!("skipping malformed player row: {}", e),
        }
    }

    if players.is_empty() {
        return Err(SquadError::InputData(
            "player CSV produced zero valid rows".into(),
        ));
    }

    Ok(players)
}

/// Load the player pool from a CSV file.
pub fn load_players(path: &Path) -> Result<Vec<PlayerRecord>, SquadError> {
    let file = std::fs::File::open(path).map_err(|e| SquadError::io(path, e))?;
    load_players_from_reader(file).map_err(|e| match e {
        SquadError::InputData(msg) => SquadError::InputData(format!("{}: {msg}", path.display())),
        other => other,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
