// Projection engine: overlay planned transfers onto an official squad snapshot.
//
// All functions here are pure. They never fail; unknown players simply
// contribute nothing to prices or points.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{Bootstrap, Chip, Gameweek, LiveGameweek, PlayerId, SquadSnapshot, STARTING_XI};
use crate::plan::TransferPlan;

/// Current price of a player, tenths of a million.
pub trait PriceLookup {
    fn price(&self, id: PlayerId) -> Option<i32>;
}

/// Event points scored by a player in one gameweek.
pub trait LivePoints {
    fn points(&self, id: PlayerId) -> Option<i32>;
}

impl PriceLookup for Bootstrap {
    fn price(&self, id: PlayerId) -> Option<i32> {
        self.player(id).map(|p| p.now_cost)
    }
}

impl PriceLookup for HashMap<PlayerId, i32> {
    fn price(&self, id: PlayerId) -> Option<i32> {
        self.get(&id).copied()
    }
}

impl LivePoints for LiveGameweek {
    fn points(&self, id: PlayerId) -> Option<i32> {
        self.stats_for(id).map(|s| s.total_points)
    }
}

impl LivePoints for HashMap<PlayerId, i32> {
    fn points(&self, id: PlayerId) -> Option<i32> {
        self.get(&id).copied()
    }
}

/// Bank, squad value and total budget for a projected squad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Financials {
    pub bank: i32,
    pub squad_value: i32,
    pub total_budget: i32,
}

/// Plans that apply when projecting `base` forward to `target`, in ascending
/// gameweek order. Equal gameweeks keep their input order.
fn applicable_plans<'a>(
    base: &SquadSnapshot,
    plans: &'a [TransferPlan],
    target: Gameweek,
) -> Vec<&'a TransferPlan> {
    let from = base.event();
    let mut applicable: Vec<&TransferPlan> = plans
        .iter()
        .filter(|p| p.gameweek >= from && p.gameweek <= target)
        .collect();
    applicable.sort_by_key(|p| p.gameweek);
    applicable
}

/// Project `base` forward to gameweek `target` by applying every plan whose
/// gameweek lies in `base.event()..=target`.
///
/// Each plan replaces the first pick holding `player_out` with `player_in`.
/// Slot attributes (position, multiplier, captaincy) stay with the slot. A
/// plan whose outgoing player is not in the squad is a no-op.
pub fn resolve_squad(base: &SquadSnapshot, plans: &[TransferPlan], target: Gameweek) -> SquadSnapshot {
    let mut resolved = base.clone();
    for plan in applicable_plans(base, plans, target) {
        if let Some(pick) = resolved
            .picks
            .iter_mut()
            .find(|p| p.element == plan.player_out)
        {
            pick.element = plan.player_in;
        }
    }
    resolved
}

/// Compute the projected finances of `resolved` (the output of
/// [`resolve_squad`] for the same `base`, `plans` and `target`).
///
/// Squad value is always re-priced from `prices`. The bank starts at the
/// snapshot's bank and pays the current price difference of every applicable
/// plan; plans naming an unknown player are skipped. The final bank is
/// floored at zero.
pub fn compute_financials(
    base: &SquadSnapshot,
    resolved: &SquadSnapshot,
    plans: &[TransferPlan],
    target: Gameweek,
    prices: &impl PriceLookup,
) -> Financials {
    let squad_value: i32 = resolved
        .picks
        .iter()
        .map(|p| prices.price(p.element).unwrap_or(0))
        .sum();

    let mut bank = base.entry_history.bank;
    for plan in applicable_plans(base, plans, target) {
        if let (Some(out), Some(inn)) = (prices.price(plan.player_out), prices.price(plan.player_in)) {
            bank -= inn - out;
        }
    }
    let bank = bank.max(0);

    Financials {
        bank,
        squad_value,
        total_budget: squad_value + bank,
    }
}

/// Score `squad` from per-player event points.
///
/// Counts the first 11 picks in squad order, or all 15 when bench boost is
/// active. The captain scores double. Missing stats count as zero and no
/// automatic substitutions are made.
pub fn compute_gameweek_points(
    squad: &SquadSnapshot,
    live: &impl LivePoints,
    active_chip: Option<Chip>,
) -> i32 {
    let counted = if active_chip == Some(Chip::BenchBoost) {
        squad.picks.len()
    } else {
        squad.picks.len().min(STARTING_XI)
    };

    squad.picks[..counted]
        .iter()
        .map(|pick| {
            let points = live.points(pick.element).unwrap_or(0);
            if pick.is_captain {
                points * 2
            } else {
                points
            }
        })
        .sum()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
