// Rarity-weighted roster similarity.
//
// Each roster becomes a vector over the player pool whose entries are
// ln(1/rarity) for members and 0 otherwise, so sharing a rarely picked player
// counts for more than sharing a popular one. Similarity is the cosine of the
// two vectors.

use tracing::debug;

use crate::error::SquadError;
use crate::matching;
use crate::player::PlayerRecord;
use crate::roster::Roster;

/// Information weight of a player picked by a `rarity` fraction of managers.
pub fn rarity_weight(rarity: f64) -> Option<f64> {
    (rarity > 0.0 && rarity <= 1.0).then(|| (1.0 / rarity).ln())
}

/// Cosine similarity of two rosters, weighting shared players by rarity.
///
/// Pool players in neither roster are ignored. A player in at least one
/// roster must have a `rarity_field` value in (0, 1]. A roster whose weight
/// vector is all zero (no matched player, or only universally owned ones)
/// makes the measure undefined.
pub fn similarity(
    a: &Roster,
    b: &Roster,
    pool: &[PlayerRecord],
    rarity_field: &str,
) -> Result<f64, SquadError> {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for player in pool {
        let in_a = matching::contains(a.slots(), player);
        let in_b = matching::contains(b.slots(), player);
        if !in_a && !in_b {
            continue;
        }

        let rarity = player.stat(rarity_field).ok_or_else(|| {
            SquadError::InputData(format!(
                "{} ({}) has no '{rarity_field}' value",
                player.full_name(),
                player.club
            ))
        })?;
        let weight = rarity_weight(rarity).ok_or_else(|| {
            SquadError::InputData(format!(
                "{} ({}): {rarity_field} {rarity} outside (0, 1]",
                player.full_name(),
                player.club
            ))
        })?;

        let wa = if in_a { weight } else { 0.0 };
        let wb = if in_b { weight } else { 0.0 };
        dot += wa * wb;
        norm_a += wa * wa;
        norm_b += wb * wb;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        let which = if norm_a == 0.0 { "first" } else { "second" };
        return Err(SquadError::DegenerateSimilarity(format!(
            "{which} roster has zero rarity weight against the player pool"
        )));
    }

    let cosine = (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0);
    debug!("similarity {cosine:.4} (dot {dot:.4}, norms {norm_a:.4}/{norm_b:.4})");
    Ok(cosine)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
