// Squad selection as a 0/1 linear program over variants.
//
// The model is solver-neutral data: an objective and a list of named linear
// constraints over variant indicators. Any `Solver` backend translates it;
// the decoder re-evaluates it to check what a backend returns.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use tracing::info;

use crate::player::Position;
use crate::variants::{Role, Variant, VariantId, VariantPool};

/// Absolute slack allowed when checking a selection against a constraint.
pub const FEASIBILITY_TOLERANCE: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Squad rules
// ---------------------------------------------------------------------------

/// Starter bounds and squad total for one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PositionQuota {
    pub min_starters: u32,
    pub max_starters: u32,
    pub total: u32,
}

impl PositionQuota {
    pub const fn new(min_starters: u32, max_starters: u32, total: u32) -> Self {
        PositionQuota {
            min_starters,
            max_starters,
            total,
        }
    }
}

/// Formation table and bench size of a legal squad.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SquadRules {
    pub keeper: PositionQuota,
    pub defender: PositionQuota,
    pub midfielder: PositionQuota,
    pub forward: PositionQuota,
    pub subs: u32,
}

impl Default for SquadRules {
    fn default() -> Self {
        SquadRules {
            keeper: PositionQuota::new(1, 1, 2),
            defender: PositionQuota::new(3, 5, 5),
            midfielder: PositionQuota::new(3, 5, 5),
            forward: PositionQuota::new(1, 3, 3),
            subs: 4,
        }
    }
}

impl SquadRules {
    pub fn quota(&self, position: Position) -> &PositionQuota {
        match position {
            Position::Keeper => &self.keeper,
            Position::Defender => &self.defender,
            Position::Midfielder => &self.midfielder,
            Position::Forward => &self.forward,
        }
    }

    /// Total squad size: the sum of the per-position totals.
    pub fn squad_size(&self) -> u32 {
        Position::ALL.iter().map(|p| self.quota(*p).total).sum()
    }

    pub fn starters(&self) -> u32 {
        self.squad_size().saturating_sub(self.subs)
    }

    /// Check that some squad can satisfy every rule at once. Returns a
    /// description of the first inconsistency.
    pub fn check(&self) -> Result<(), String> {
        for position in Position::ALL {
            let q = self.quota(position);
            if q.min_starters > q.max_starters {
                return Err(format!(
                    "{position}: min_starters {} exceeds max_starters {}",
                    q.min_starters, q.max_starters
                ));
            }
            if q.min_starters > q.total {
                return Err(format!(
                    "{position}: min_starters {} exceeds total {}",
                    q.min_starters, q.total
                ));
            }
        }

        let size = self.squad_size();
        if size == 0 {
            return Err("squad has no players".into());
        }
        if self.subs >= size {
            return Err(format!("{} subs leave no starters in a squad of {size}", self.subs));
        }

        let starters = self.starters();
        let min: u32 = Position::ALL.iter().map(|p| self.quota(*p).min_starters).sum();
        let max: u32 = Position::ALL
            .iter()
            .map(|p| {
                let q = self.quota(*p);
                q.max_starters.min(q.total)
            })
            .sum();
        if starters < min || starters > max {
            return Err(format!(
                "{starters} starters cannot meet per-position starter bounds [{min}, {max}]"
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Linear model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sense::Le => "<=",
            Sense::Ge => ">=",
            Sense::Eq => "==",
        })
    }
}

/// `Σ coef·x  (sense)  rhs`, with a name for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub name: String,
    pub terms: Vec<(VariantId, f64)>,
    pub sense: Sense,
    pub rhs: f64,
}

impl LinearConstraint {
    fn new(name: impl Into<String>, terms: Vec<(VariantId, f64)>, sense: Sense, rhs: f64) -> Self {
        LinearConstraint {
            name: name.into(),
            terms,
            sense,
            rhs,
        }
    }

    /// Left-hand side for a selection given as per-variant counts.
    fn lhs(&self, counts: &HashMap<VariantId, f64>) -> f64 {
        self.terms
            .iter()
            .map(|(id, coef)| coef * counts.get(id).copied().unwrap_or(0.0))
            .sum()
    }

    pub fn holds(&self, lhs: f64) -> bool {
        match self.sense {
            Sense::Le => lhs <= self.rhs + FEASIBILITY_TOLERANCE,
            Sense::Ge => lhs >= self.rhs - FEASIBILITY_TOLERANCE,
            Sense::Eq => (lhs - self.rhs).abs() <= FEASIBILITY_TOLERANCE,
        }
    }
}

/// A constraint a selection fails, with the offending left-hand side.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub name: String,
    pub lhs: f64,
    pub sense: Sense,
    pub rhs: f64,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {} {})", self.name, self.lhs, self.sense, self.rhs)
    }
}

/// Maximization problem over one binary indicator per variant.
#[derive(Debug, Clone)]
pub struct LinearModel {
    variable_count: usize,
    objective: Vec<(VariantId, f64)>,
    constraints: Vec<LinearConstraint>,
    squad_size: usize,
}

impl LinearModel {
    /// Number of indicators; variant ids run from 0 to this value.
    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    pub fn objective(&self) -> &[(VariantId, f64)] {
        &self.objective
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Number of variants a feasible selection contains.
    pub fn squad_size(&self) -> usize {
        self.squad_size
    }

    pub fn constraint(&self, name: &str) -> Option<&LinearConstraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    pub fn objective_value(&self, selection: &[VariantId]) -> f64 {
        let counts = count(selection);
        self.objective
            .iter()
            .map(|(id, coef)| coef * counts.get(id).copied().unwrap_or(0.0))
            .sum()
    }

    /// Every constraint `selection` violates. A variant listed twice counts
    /// twice, so duplicates show up as uniqueness violations.
    pub fn evaluate(&self, selection: &[VariantId]) -> Vec<Violation> {
        let counts = count(selection);
        self.constraints
            .iter()
            .filter_map(|c| {
                let lhs = c.lhs(&counts);
                (!c.holds(lhs)).then(|| Violation {
                    name: c.name.clone(),
                    lhs,
                    sense: c.sense,
                    rhs: c.rhs,
                })
            })
            .collect()
    }
}

fn count(selection: &[VariantId]) -> HashMap<VariantId, f64> {
    let mut counts = HashMap::new();
    for id in selection {
        *counts.entry(*id).or_insert(0.0) += 1.0;
    }
    counts
}

// ---------------------------------------------------------------------------
// Formulation
// ---------------------------------------------------------------------------

/// Unit-coefficient terms for every variant `keep` accepts.
fn ones(variants: &[Variant], keep: impl Fn(&Variant) -> bool) -> Vec<(VariantId, f64)> {
    variants
        .iter()
        .filter(|v| keep(v))
        .map(|v| (v.id, 1.0))
        .collect()
}

/// Build the squad selection model for `pool`.
pub fn formulate(pool: &VariantPool, rules: &SquadRules, budget: f64) -> LinearModel {
    let variants = pool.variants();

    let mut constraints = Vec::new();

    constraints.push(LinearConstraint::new(
        "budget",
        variants.iter().map(|v| (v.id, v.cost)).collect(),
        Sense::Le,
        budget,
    ));

    for position in Position::ALL {
        let quota = rules.quota(position);
        let starters = ones(variants, |v| v.position == position && v.role == Role::Starter);
        constraints.push(LinearConstraint::new(
            format!("{position}_starters_min"),
            starters.clone(),
            Sense::Ge,
            f64::from(quota.min_starters),
        ));
        constraints.push(LinearConstraint::new(
            format!("{position}_starters_max"),
            starters,
            Sense::Le,
            f64::from(quota.max_starters),
        ));
        constraints.push(LinearConstraint::new(
            format!("{position}_total"),
            ones(variants, |v| v.position == position),
            Sense::Eq,
            f64::from(quota.total),
        ));
    }

    constraints.push(LinearConstraint::new(
        "captain",
        ones(variants, |v| v.is_captain),
        Sense::Eq,
        1.0,
    ));
    constraints.push(LinearConstraint::new(
        "captain_starts",
        ones(variants, |v| v.is_captain && v.role == Role::Sub),
        Sense::Le,
        0.0,
    ));
    constraints.push(LinearConstraint::new(
        "subs",
        ones(variants, |v| v.role == Role::Sub),
        Sense::Eq,
        f64::from(rules.subs),
    ));

    for (player_id, ids) in pool.groups() {
        constraints.push(LinearConstraint::new(
            format!("unique_player_{}", player_id.0),
            ids.iter().map(|id| (*id, 1.0)).collect(),
            Sense::Le,
            1.0,
        ));
    }

    let model = LinearModel {
        variable_count: variants.len(),
        objective: variants.iter().map(|v| (v.id, v.score)).collect(),
        constraints,
        squad_size: rules.squad_size() as usize,
    };
    info!(
        "Formulated model: {} variables, {} constraints, budget {}",
        model.variable_count,
        model.constraints.len(),
        budget
    );
    model
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
