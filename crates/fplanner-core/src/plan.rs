// Local hypothetical plans: one transfer and one chip per gameweek.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Chip, Gameweek, PlayerId, MAX_GAMEWEEK};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("{chip} is already planned for gameweek {gameweek}")]
    ChipAlreadyPlanned { chip: Chip, gameweek: Gameweek },

    #[error("invalid transfer: {message}")]
    InvalidTransfer { message: String },
}

// ---------------------------------------------------------------------------
// Plan records
// ---------------------------------------------------------------------------

/// A hypothetical one-for-one swap planned for a future gameweek.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPlan {
    pub gameweek: Gameweek,
    pub player_out: PlayerId,
    pub player_in: PlayerId,
    /// Price delta (`in - out`) at the time the plan was made, tenths of a
    /// million. Informational only; projections recompute from live prices.
    pub cost: i32,
}

impl TransferPlan {
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.player_out == self.player_in {
            return Err(PlanError::InvalidTransfer {
                message: format!("player {} cannot replace themselves", self.player_in),
            });
        }
        if !(1..=MAX_GAMEWEEK).contains(&self.gameweek) {
            return Err(PlanError::InvalidTransfer {
                message: format!("gameweek {} is outside 1..={MAX_GAMEWEEK}", self.gameweek),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipPlan {
    pub gameweek: Gameweek,
    pub chip: Chip,
}

// ---------------------------------------------------------------------------
// PlanBook
// ---------------------------------------------------------------------------

/// The manager's planned transfers and chips.
///
/// Transfers keep insertion order (the projection engine relies on a stable
/// sort, so ties between equal gameweeks fall back to it). At most one
/// transfer and one chip exist per gameweek, and a chip is assigned to at
/// most one gameweek.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanBook {
    transfers: Vec<TransferPlan>,
    chips: Vec<ChipPlan>,
}

impl PlanBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a book from persisted rows, enforcing the per-gameweek and
    /// per-chip uniqueness rules (later rows win).
    pub fn from_parts(transfers: Vec<TransferPlan>, chips: Vec<ChipPlan>) -> Self {
        let mut book = Self::new();
        for plan in transfers {
            book.transfers.retain(|t| t.gameweek != plan.gameweek);
            book.transfers.push(plan);
        }
        for plan in chips {
            book.chips
                .retain(|c| c.gameweek != plan.gameweek && c.chip != plan.chip);
            book.chips.push(plan);
        }
        book
    }

    pub fn transfers(&self) -> &[TransferPlan] {
        &self.transfers
    }

    pub fn chips(&self) -> &[ChipPlan] {
        &self.chips
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty() && self.chips.is_empty()
    }

    /// Insert a transfer plan, replacing any existing plan for its gameweek.
    pub fn upsert_transfer(&mut self, plan: TransferPlan) -> Result<(), PlanError> {
        plan.validate()?;
        self.transfers.retain(|t| t.gameweek != plan.gameweek);
        self.transfers.push(plan);
        Ok(())
    }

    /// Remove the transfer planned for `gw`. Returns the removed plan.
    pub fn remove_transfer(&mut self, gw: Gameweek) -> Option<TransferPlan> {
        let idx = self.transfers.iter().position(|t| t.gameweek == gw)?;
        Some(self.transfers.remove(idx))
    }

    pub fn transfer_for(&self, gw: Gameweek) -> Option<&TransferPlan> {
        self.transfers.iter().find(|t| t.gameweek == gw)
    }

    /// Plan `chip` for `gw`, replacing any chip already planned for `gw`.
    ///
    /// Fails if `chip` is already planned for a different gameweek.
    pub fn assign_chip(&mut self, gw: Gameweek, chip: Chip) -> Result<(), PlanError> {
        if let Some(existing) = self
            .chips
            .iter()
            .find(|c| c.chip == chip && c.gameweek != gw)
        {
            return Err(PlanError::ChipAlreadyPlanned {
                chip,
                gameweek: existing.gameweek,
            });
        }
        self.chips.retain(|c| c.gameweek != gw);
        self.chips.push(ChipPlan { gameweek: gw, chip });
        Ok(())
    }

    /// Remove `chip` if it is planned for `gw`, otherwise assign it.
    /// Returns whether the chip is planned for `gw` afterwards.
    pub fn toggle_chip(&mut self, gw: Gameweek, chip: Chip) -> Result<bool, PlanError> {
        if self.chip_for(gw) == Some(chip) {
            self.remove_chip(gw);
            return Ok(false);
        }
        self.assign_chip(gw, chip)?;
        Ok(true)
    }

    pub fn remove_chip(&mut self, gw: Gameweek) -> Option<Chip> {
        let idx = self.chips.iter().position(|c| c.gameweek == gw)?;
        Some(self.chips.remove(idx).chip)
    }

    pub fn chip_for(&self, gw: Gameweek) -> Option<Chip> {
        self.chips.iter().find(|c| c.gameweek == gw).map(|c| c.chip)
    }

    pub fn clear(&mut self) {
        self.transfers.clear();
        self.chips.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(gw: Gameweek, out: PlayerId, inn: PlayerId) -> TransferPlan {
        TransferPlan {
            gameweek: gw,
            player_out: out,
            player_in: inn,
            cost: 0,
        }
    }

    #[test]
    fn upsert_is_last_write_wins_per_gameweek() {
        let mut book = PlanBook::new();
        book.upsert_transfer(transfer(10, 1, 2)).unwrap();
        book.upsert_transfer(transfer(11, 3, 4)).unwrap();
        book.upsert_transfer(transfer(10, 5, 6)).unwrap();

        assert_eq!(book.transfers().len(), 2);
        let gw10 = book.transfer_for(10).unwrap();
        assert_eq!((gw10.player_out, gw10.player_in), (5, 6));
    }

    #[test]
    fn upsert_rejects_self_swap_and_bad_gameweek() {
        let mut book = PlanBook::new();
        assert!(matches!(
            book.upsert_transfer(transfer(10, 7, 7)),
            Err(PlanError::InvalidTransfer { .. })
        ));
        assert!(matches!(
            book.upsert_transfer(transfer(0, 1, 2)),
            Err(PlanError::InvalidTransfer { .. })
        ));
        assert!(matches!(
            book.upsert_transfer(transfer(39, 1, 2)),
            Err(PlanError::InvalidTransfer { .. })
        ));
        assert!(book.is_empty());
    }

    #[test]
    fn remove_transfer_returns_plan() {
        let mut book = PlanBook::new();
        book.upsert_transfer(transfer(12, 1, 2)).unwrap();
        assert_eq!(book.remove_transfer(12).map(|t| t.player_in), Some(2));
        assert_eq!(book.remove_transfer(12), None);
    }

    #[test]
    fn chip_cannot_be_planned_twice() {
        let mut book = PlanBook::new();
        book.assign_chip(12, Chip::Wildcard).unwrap();
        let err = book.assign_chip(15, Chip::Wildcard).unwrap_err();
        assert_eq!(
            err,
            PlanError::ChipAlreadyPlanned {
                chip: Chip::Wildcard,
                gameweek: 12
            }
        );
        assert_eq!(err.to_string(), "Wildcard is already planned for gameweek 12");
        assert_eq!(book.chip_for(15), None);
    }

    #[test]
    fn assigning_a_new_chip_replaces_the_gameweek_chip() {
        let mut book = PlanBook::new();
        book.assign_chip(12, Chip::Wildcard).unwrap();
        book.assign_chip(12, Chip::BenchBoost).unwrap();
        assert_eq!(book.chip_for(12), Some(Chip::BenchBoost));
        assert_eq!(book.chips().len(), 1);
        // Wildcard is free again.
        book.assign_chip(14, Chip::Wildcard).unwrap();
    }

    #[test]
    fn toggle_chip_round_trip() {
        let mut book = PlanBook::new();
        assert!(book.toggle_chip(20, Chip::TripleCaptain).unwrap());
        assert_eq!(book.chip_for(20), Some(Chip::TripleCaptain));
        assert!(!book.toggle_chip(20, Chip::TripleCaptain).unwrap());
        assert_eq!(book.chip_for(20), None);
    }

    #[test]
    fn toggle_chip_surfaces_conflict() {
        let mut book = PlanBook::new();
        book.toggle_chip(20, Chip::FreeHit).unwrap();
        assert!(book.toggle_chip(21, Chip::FreeHit).is_err());
    }

    #[test]
    fn from_parts_enforces_uniqueness() {
        let book = PlanBook::from_parts(
            vec![transfer(10, 1, 2), transfer(10, 3, 4)],
            vec![
                ChipPlan { gameweek: 5, chip: Chip::Wildcard },
                ChipPlan { gameweek: 6, chip: Chip::Wildcard },
            ],
        );
        assert_eq!(book.transfers().len(), 1);
        assert_eq!(book.transfer_for(10).unwrap().player_in, 4);
        assert_eq!(book.chips().len(), 1);
        assert_eq!(book.chip_for(6), Some(Chip::Wildcard));
    }

    #[test]
    fn clear_empties_book() {
        let mut book = PlanBook::new();
        book.upsert_transfer(transfer(10, 1, 2)).unwrap();
        book.assign_chip(10, Chip::FreeHit).unwrap();
        book.clear();
        assert!(book.is_empty());
    }
}
