// Variant generation: every player becomes four mutually exclusive decision
// options (starter/sub x captain/not), each with its own objective value.
//
// Expressing role and captaincy as separate 0/1 options lets a plain binary
// program choose them. The price is a uniqueness constraint per player, which
// the model builds from the player -> variants mapping kept here.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::adjustments::{self, AdjustmentEntry};
use crate::player::{PlayerRecord, Position};

/// Multiplier applied to a captain's score.
pub const CAPTAIN_MULTIPLIER: f64 = 2.0;

/// Number of variants generated per player.
pub const VARIANTS_PER_PLAYER: usize = 4;

// ---------------------------------------------------------------------------
// Identifiers and roles
// ---------------------------------------------------------------------------

/// Stable per-player id: the player's index in the input pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub usize);

/// Unique id of one variant within a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VariantId(pub usize);

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Whether a squad member starts or sits on the bench.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Starter,
    Sub,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Starter, Role::Sub];

    pub fn display_str(&self) -> &'static str {
        match self {
            Role::Starter => "starter",
            Role::Sub => "sub",
        }
    }

    pub fn from_str_role(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "starter" | "start" | "starting" => Some(Role::Starter),
            "sub" | "substitute" | "bench" => Some(Role::Sub),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Variant
// ---------------------------------------------------------------------------

/// One candidate decision unit derived from a single player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub player_id: PlayerId,
    pub role: Role,
    pub is_captain: bool,
    pub cost: f64,
    /// Objective contribution after bench, captain and availability factors.
    pub score: f64,
    pub position: Position,
}

/// Parameters of variant generation.
#[derive(Debug, Clone, Copy)]
pub struct VariantOptions<'a> {
    /// Score multiplier for substitutes.
    pub bench_fraction: f64,
    /// Name of the player stat used as the objective.
    pub score_field: &'a str,
    /// Adjustment factors at or above this value are ignored.
    pub adjustment_threshold: f64,
}

/// Objective value of one (role, captaincy) option.
pub fn variant_score(
    base: f64,
    role: Role,
    is_captain: bool,
    bench_fraction: f64,
    adj_factor: f64,
) -> f64 {
    let mut score = base;
    if role == Role::Sub {
        score *= bench_fraction;
    }
    if is_captain {
        score *= CAPTAIN_MULTIPLIER;
    }
    score * adj_factor
}

// ---------------------------------------------------------------------------
// VariantPool
// ---------------------------------------------------------------------------

/// All variants of one optimization run, plus the players they came from.
#[derive(Debug, Clone, Default)]
pub struct VariantPool {
    variants: Vec<Variant>,
    players: BTreeMap<PlayerId, PlayerRecord>,
    by_player: BTreeMap<PlayerId, Vec<VariantId>>,
}

impl VariantPool {
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn get(&self, id: VariantId) -> Option<&Variant> {
        self.variants.get(id.0)
    }

    /// The player record a variant was generated from.
    pub fn player(&self, id: PlayerId) -> Option<&PlayerRecord> {
        self.players.get(&id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Variant ids of one player (empty for unknown or skipped players).
    pub fn variants_of(&self, id: PlayerId) -> &[VariantId] {
        self.by_player.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every player with its variant ids, in player id order.
    pub fn groups(&self) -> impl Iterator<Item = (PlayerId, &[VariantId])> + '_ {
        self.by_player.iter().map(|(id, vs)| (*id, vs.as_slice()))
    }

    fn push_player(
        &mut self,
        id: PlayerId,
        player: &PlayerRecord,
        base: f64,
        options: &VariantOptions<'_>,
        adj_factor: f64,
    ) {
        let mut ids = Vec::with_capacity(VARIANTS_PER_PLAYER);
        for is_captain in [false, true] {
            for role in Role::ALL {
                let variant_id = VariantId(self.variants.len());
                self.variants.push(Variant {
                    id: variant_id,
                    player_id: id,
                    role,
                    is_captain,
                    cost: player.cost,
                    score: variant_score(
                        base,
                        role,
                        is_captain,
                        options.bench_fraction,
                        adj_factor,
                    ),
                    position: player.position,
                });
                ids.push(variant_id);
            }
        }
        self.by_player.insert(id, ids);
        self.players.insert(id, player.clone());
    }
}

/// Expand every player into its four variants.
///
/// A player without a usable value for `options.score_field` is skipped with
/// a warning; one corrupt record does not fail the pool.
pub fn generate(
    players: &[PlayerRecord],
    options: &VariantOptions<'_>,
    adjustments: &[AdjustmentEntry],
) -> VariantPool {
    let mut pool = VariantPool::default();
    let mut skipped = 0usize;

    for (index, player) in players.iter().enumerate() {
        let Some(base) = player.stat(options.score_field) else {
            warn!(
                "skipping {} ({}): no '{}' value",
                player.full_name(),
                player.club,
                options.score_field
            );
            skipped += 1;
            continue;
        };

        let adj_factor =
            adjustments::resolve_factor(player, adjustments, options.adjustment_threshold);
        pool.push_player(PlayerId(index), player, base, options, adj_factor);
    }

    info!(
        "Generated {} variants for {} players ({} skipped)",
        pool.len(),
        pool.player_count(),
        skipped
    );
    pool
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
