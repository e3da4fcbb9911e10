//! Status-effect engine: timed modifiers with stacking and turn ticking.
//!
//! Effects fall into five categories: damage-over-time, heal-over-time,
//! attribute buffs/debuffs, and control (stun or root). Ticking runs
//! exactly once per owner turn-start, before action points are granted.

use serde::{Deserialize, Serialize};

use crate::combatant::Attribute;
use crate::math::{fixed_serde, Fixed};

/// Well-known id of the stun effect.
pub const STUN_EFFECT_ID: &str = "atordoado";

/// Well-known id of the root effect.
pub const ROOT_EFFECT_ID: &str = "enraizado";

/// How a control effect restricts its victim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlKind {
    /// Zero action points for the victim's turn.
    Stun,
    /// Blocks movement only; other actions remain legal.
    Root,
}

/// Value of an attribute modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierValue {
    /// Multiplies the attribute's then-current value by `1 + fraction`.
    Percent(#[serde(with = "fixed_serde")] Fixed),
    /// Adds a flat amount to the attribute.
    Flat(i32),
}

/// A single attribute modifier carried by a buff or debuff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeModifier {
    /// Which attribute is modified.
    pub attribute: Attribute,
    /// How it is modified.
    pub value: ModifierValue,
}

/// Category of a status effect, carrying only the data that category needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    /// Damage per turn at the owner's turn start, multiplied by stacks.
    DamageOverTime {
        /// HP lost per stack per turn.
        damage_per_turn: u32,
    },
    /// Healing per turn at the owner's turn start, multiplied by stacks.
    HealOverTime {
        /// HP restored per stack per turn.
        heal_per_turn: u32,
    },
    /// Positive attribute modifier.
    Buff(AttributeModifier),
    /// Negative attribute modifier.
    Debuff(AttributeModifier),
    /// Stun or root.
    Control(ControlKind),
}

/// An active timed modifier on a combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    /// Stable identifier; one entry per id per combatant.
    pub id: String,
    /// Display name.
    pub name: String,
    /// What the effect does.
    pub kind: StatusKind,
    /// Turns remaining. `-1` means permanent.
    pub duration: i32,
    /// Whether reapplication accumulates stacks instead of refreshing only.
    pub stackable: bool,
    /// Current stack count, at least 1 while active.
    pub current_stacks: u32,
    /// Upper bound on stacks.
    pub max_stacks: u32,
}

impl StatusEffect {
    /// Build a non-stacking effect with a single stack.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: StatusKind, duration: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            duration,
            stackable: false,
            current_stacks: 1,
            max_stacks: 1,
        }
    }

    /// Builder method to allow stacking up to `max_stacks`.
    #[must_use]
    pub fn with_stacking(mut self, max_stacks: u32) -> Self {
        self.stackable = true;
        self.max_stacks = max_stacks.max(1);
        self
    }

    /// The control restriction this effect imposes, if any.
    #[must_use]
    pub fn control_kind(&self) -> Option<ControlKind> {
        match self.kind {
            StatusKind::Control(kind) => Some(kind),
            _ => None,
        }
    }
}

/// Result of one effect ticking at turn start, for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTick {
    /// Id of the effect that ticked.
    pub effect_id: String,
    /// Display name of the effect.
    pub effect_name: String,
    /// Damage dealt by the tick (already applied).
    pub damage: u32,
    /// Healing applied by the tick (already applied).
    pub healing: u32,
}

/// Apply a status effect template to an active-effects list.
///
/// Same-id handling: a stackable effect gains a stack (capped at
/// `max_stacks`) and refreshes its duration; a non-stackable one only
/// refreshes; an absent effect is added as a fresh copy.
pub fn apply_status(effects: &mut Vec<StatusEffect>, template: &StatusEffect) {
    if let Some(existing) = effects.iter_mut().find(|e| e.id == template.id) {
        if existing.stackable {
            existing.current_stacks = (existing.current_stacks + 1).min(existing.max_stacks);
        }
        existing.duration = template.duration;
        return;
    }
    let mut fresh = template.clone();
    fresh.current_stacks = fresh.current_stacks.max(1);
    effects.push(fresh);
}

/// Run start-of-turn processing for one combatant's effect list.
///
/// Applies DoT/HoT ticks to `hp` (clamped to `[0, max_hp]`), then
/// decrements every finite duration and drops effects that reach 0.
/// Runs before the owner's action points are granted.
pub fn tick_turn_start(effects: &mut Vec<StatusEffect>, hp: &mut u32, max_hp: u32) -> Vec<StatusTick> {
    let mut ticks = Vec::new();

    for effect in effects.iter() {
        match &effect.kind {
            StatusKind::DamageOverTime { damage_per_turn } => {
                let amount = damage_per_turn * effect.current_stacks;
                *hp = hp.saturating_sub(amount);
                ticks.push(StatusTick {
                    effect_id: effect.id.clone(),
                    effect_name: effect.name.clone(),
                    damage: amount,
                    healing: 0,
                });
            }
            StatusKind::HealOverTime { heal_per_turn } => {
                let amount = heal_per_turn * effect.current_stacks;
                *hp = (*hp + amount).min(max_hp);
                ticks.push(StatusTick {
                    effect_id: effect.id.clone(),
                    effect_name: effect.name.clone(),
                    damage: 0,
                    healing: amount,
                });
            }
            _ => {}
        }
    }

    for effect in effects.iter_mut() {
        if effect.duration > 0 {
            effect.duration -= 1;
        }
    }
    effects.retain(|e| e.duration != 0);

    ticks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poison() -> StatusEffect {
        StatusEffect::new(
            "veneno",
            "Veneno",
            StatusKind::DamageOverTime { damage_per_turn: 3 },
            2,
        )
        .with_stacking(3)
    }

    fn regen() -> StatusEffect {
        StatusEffect::new(
            "regeneracao",
            "Regeneração",
            StatusKind::HealOverTime { heal_per_turn: 4 },
            3,
        )
    }

    #[test]
    fn test_apply_fresh_effect() {
        let mut effects = Vec::new();
        apply_status(&mut effects, &poison());
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].current_stacks, 1);
    }

    #[test]
    fn test_stacking_caps_and_refreshes() {
        let mut effects = Vec::new();
        for _ in 0..5 {
            apply_status(&mut effects, &poison());
            // Simulate time passing so refresh is observable
            effects[0].duration = 1;
        }
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].current_stacks, 3); // capped at max_stacks

        apply_status(&mut effects, &poison());
        assert_eq!(effects[0].duration, 2); // refreshed to template duration
    }

    #[test]
    fn test_non_stackable_only_refreshes() {
        let mut effects = Vec::new();
        apply_status(&mut effects, &regen());
        apply_status(&mut effects, &regen());
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].current_stacks, 1);
    }

    #[test]
    fn test_tick_applies_dot_scaled_by_stacks() {
        let mut effects = vec![{
            let mut p = poison();
            p.current_stacks = 2;
            p
        }];
        let mut hp = 20;
        let ticks = tick_turn_start(&mut effects, &mut hp, 20);
        assert_eq!(hp, 14); // 3 damage x 2 stacks
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].damage, 6);
    }

    #[test]
    fn test_tick_clamps_hp() {
        let mut effects = vec![poison()];
        let mut hp = 2;
        tick_turn_start(&mut effects, &mut hp, 20);
        assert_eq!(hp, 0);

        let mut effects = vec![regen()];
        let mut hp = 19;
        tick_turn_start(&mut effects, &mut hp, 20);
        assert_eq!(hp, 20);
    }

    #[test]
    fn test_tick_expires_effects() {
        let mut effects = vec![poison()]; // duration 2
        let mut hp = 20;
        tick_turn_start(&mut effects, &mut hp, 20);
        assert_eq!(effects.len(), 1);
        tick_turn_start(&mut effects, &mut hp, 20);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_permanent_effects_never_expire() {
        let mut effects = vec![StatusEffect::new(
            "marca",
            "Marca",
            StatusKind::Control(ControlKind::Root),
            -1,
        )];
        let mut hp = 10;
        for _ in 0..10 {
            tick_turn_start(&mut effects, &mut hp, 10);
        }
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].duration, -1);
    }
}
