//! Attrition combat between an attacking fleet and a defended planet.
//!
//! Both sides are flattened into [`Combatant`] rows (one per ship kind or
//! defensive building). Each round every row loses
//!
//! ```text
//! floor((ratio + (u − 0.5) / 10) · count) + [u' < ratio]
//! ```
//!
//! units, clamped to `[0, count]`, where `ratio` is the opposing side's damage
//! over this side's total hp and `u`, `u'` are uniform draws from the
//! simulation RNG. For buildings `count` is the building level.
//!
//! A missing defending fleet is simply an empty list of rows.

use rand::Rng;
use serde::Serialize;

use crate::config::CombatRules;

/// One row of a side: a ship kind or a defensive building.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Combatant {
    /// Hull points of one unit.
    pub hp: f64,
    /// Damage of one unit per round.
    pub damage: f64,
    /// Units left (ships, or building levels).
    pub count: u32,
}

/// Result of [`resolve`]; surviving counts are in input row order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombatOutcome {
    /// Attacker has ships left and the defender has nothing left.
    pub attacker_victory: bool,
    /// Rounds fought.
    pub rounds: u32,
    /// Surviving attacker counts.
    pub attackers: Vec<u32>,
    /// Surviving defender ship counts.
    pub defender_ships: Vec<u32>,
    /// Surviving defender building levels.
    pub defender_buildings: Vec<u32>,
}

fn total(rows: &[Combatant]) -> u64 {
    rows.iter().map(|r| u64::from(r.count)).sum()
}

fn sum(rows: &[Combatant], per_unit: impl Fn(&Combatant) -> f64) -> f64 {
    rows.iter().map(|r| per_unit(r) * f64::from(r.count)).sum()
}

fn ratio(damage: f64, hp: f64) -> f64 {
    if hp > 0.0 {
        damage / hp
    } else {
        1.0
    }
}

/// Units of a row destroyed in one round.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn losses<R: Rng>(ratio: f64, count: u32, rng: &mut R) -> u32 {
    let spread: f64 = rng.gen();
    let bonus: f64 = rng.gen();
    let count_f = f64::from(count);
    let mut lost = ((ratio + (spread - 0.5) / 10.0) * count_f).floor();
    if bonus < ratio {
        lost += 1.0;
    }
    lost.clamp(0.0, count_f) as u32
}

fn apply<R: Rng>(rows: &mut [Combatant], ratio: f64, rng: &mut R) {
    for row in rows.iter_mut().filter(|r| r.count > 0) {
        row.count -= losses(ratio, row.count, rng);
    }
}

/// Fights rounds until one side is empty or `rules.max_rounds` is reached.
pub fn resolve<R: Rng>(
    defender_ships: &[Combatant],
    defender_buildings: &[Combatant],
    attackers: &[Combatant],
    rules: &CombatRules,
    rng: &mut R,
) -> CombatOutcome {
    let mut ships = defender_ships.to_vec();
    let mut buildings = defender_buildings.to_vec();
    let mut attack = attackers.to_vec();
    let mut rounds = 0;

    while rounds < rules.max_rounds && total(&attack) > 0 && total(&ships) + total(&buildings) > 0 {
        rounds += 1;

        let attacker_damage = sum(&attack, |r| r.damage);
        let defender_hp = sum(&ships, |r| r.hp) + sum(&buildings, |r| r.hp);
        let attack_ratio = ratio(attacker_damage, defender_hp);

        let building_damage = if rules.building_damage_uses_hp {
            sum(&buildings, |r| r.hp)
        } else {
            sum(&buildings, |r| r.damage)
        };
        let defender_damage = sum(&ships, |r| r.damage) + building_damage;
        let attacker_hp = sum(&attack, |r| r.hp);
        let defense_ratio = ratio(defender_damage, attacker_hp);

        apply(&mut ships, attack_ratio, rng);
        apply(&mut buildings, attack_ratio, rng);
        apply(&mut attack, defense_ratio, rng);
    }

    let attacker_victory = total(&attack) > 0 && total(&ships) + total(&buildings) == 0;
    let counts = |rows: &[Combatant]| rows.iter().map(|r| r.count).collect::<Vec<_>>();
    CombatOutcome {
        attacker_victory,
        rounds,
        attackers: counts(&attack),
        defender_ships: counts(&ships),
        defender_buildings: counts(&buildings),
    }
}
