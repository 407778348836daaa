// Plain-text rendering of an evaluated lineup, for copy-paste sharing.

use std::fmt;

use super::bonus::BonusEffect;
use super::engine::EvaluatedLineup;
use super::player::{PlayerLookup, Position};
use super::squad::PlayerAssignment;

/// Display adapter: formats a lineup with player names taken from `players`.
pub struct LineupText<'a, L: PlayerLookup> {
    pub lineup: &'a EvaluatedLineup,
    pub players: &'a L,
}

impl<L: PlayerLookup> LineupText<'_, L> {
    fn label(&self, a: &PlayerAssignment) -> String {
        let name = self
            .players
            .player(a.player_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| format!("#{}", a.player_id));
        if a.is_captain {
            format!("{name} (C)")
        } else if a.is_vice {
            format!("{name} (VC)")
        } else {
            name
        }
    }
}

impl<L: PlayerLookup> fmt::Display for LineupText<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lineup = self.lineup;
        let squad = lineup.scoring_squad();

        writeln!(f, "{} (gameweek {})", lineup.name, lineup.gameweek_id)?;
        writeln!(f, "Formation: {}", lineup.formation)?;
        writeln!(f)?;

        for position in Position::ALL {
            let names: Vec<String> = squad
                .starting()
                .filter(|a| self.players.player(a.player_id).map(|p| p.position) == Some(position))
                .map(|a| self.label(a))
                .collect();
            if !names.is_empty() {
                writeln!(f, "{position}: {}", names.join(", "))?;
            }
        }

        let bench: Vec<String> = squad.bench().map(|a| self.label(a)).collect();
        writeln!(f)?;
        writeln!(f, "Bench: {}", bench.join(", "))?;

        match &lineup.bonus {
            Some(BonusEffect::Joker { swap_out, swap_in, .. }) => {
                writeln!(f, "Bonus: Joker (#{swap_out} -> #{swap_in})")?;
            }
            Some(effect) => writeln!(f, "Bonus: {}", effect.bonus_type().display_name())?,
            None => writeln!(f, "Bonus: none")?,
        }

        writeln!(
            f,
            "Cost: {:.2}M (remaining {:.2}M)",
            lineup.totals.total_cost, lineup.scoring_roster().remaining_budget
        )?;
        write!(f, "Projected points: {:.2}", lineup.totals.total_points)
    }
}

pub fn export_lineup<L: PlayerLookup>(lineup: &EvaluatedLineup, players: &L) -> String {
    LineupText { lineup, players }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineup::bonus::{BonusHistory, RawBonusSelection};
    use crate::lineup::engine::LineupEngine;
    use crate::lineup::player::CurrentPoints;
    use crate::lineup::test_fixtures::{command, pool};

    #[test]
    fn renders_lines_in_position_order() {
        let players = pool();
        let lineup = LineupEngine::default()
            .evaluate(&command(), &players, &BonusHistory::new(), &CurrentPoints)
            .unwrap();
        let text = export_lineup(&lineup, &players);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Gameweek 5 main (gameweek 5)");
        assert_eq!(lines[1], "Formation: 1-4-4-2");
        assert_eq!(lines[3], "GK: Player 1");
        assert_eq!(lines[4], "DEF: Player 2, Player 3, Player 4, Player 5");
        assert_eq!(lines[5], "MID: Player 6, Player 7, Player 8, Player 9 (VC)");
        assert_eq!(lines[6], "FWD: Player 10 (C), Player 11");
        assert_eq!(lines[8], "Bench: Player 12, Player 13, Player 14, Player 15");
        assert_eq!(lines[9], "Bonus: none");
        assert_eq!(lines[10], "Cost: 30.00M (remaining 0.00M)");
        assert_eq!(lines[11], "Projected points: 76.00");
    }

    #[test]
    fn joker_export_shows_the_swapped_squad() {
        let players = pool();
        let mut cmd = command();
        cmd.bonus = Some(RawBonusSelection {
            bonus_type: "joker".into(),
            swap_out: Some(6),
            swap_in: Some(16),
            ..Default::default()
        });
        let lineup = LineupEngine::default()
            .evaluate(&cmd, &players, &BonusHistory::new(), &CurrentPoints)
            .unwrap();
        let text = export_lineup(&lineup, &players);
        assert!(text.contains("MID: Player 16, Player 7"));
        assert!(text.contains("Bonus: Joker (#6 -> #16)"));
        assert!(text.contains("Cost: 29.50M (remaining 0.50M)"));
    }
}
