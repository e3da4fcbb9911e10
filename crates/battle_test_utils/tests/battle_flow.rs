//! Full battle-flow integration tests: scripted fights from creation to
//! a terminal phase, persistence round trips, and progression export.

use battle_core::action::BattleAction;
use battle_core::battle::{BattlePhase, BattleState};
use battle_core::dice::DicePurpose;
use battle_core::prelude::*;
use battle_core::skill::sync_battle_skills_to_character;
use battle_test_utils::fixtures::{autoplay, demo_battle, hero, goblin, ScriptedDice};

#[test]
fn scripted_duel_runs_to_victory() {
    let mut state = battle_core::battle::create_battle(
        "mundo",
        "arena",
        &[hero("ana", "Ana")],
        &[goblin("goblin", "Goblin", AiPattern::Aggressive)],
    );
    state.begin().unwrap();
    let mut dice = ScriptedDice::new(); // d6 always 3

    // Ana is faster and acts first. Walk to the goblin's corner over a
    // few rounds, ending turns explicitly, and let the goblin close in.
    let mut rounds = 0;
    while state.phase == BattlePhase::PlayerTurn || state.phase == BattlePhase::EnemyTurn {
        rounds += 1;
        assert!(rounds < 200, "fight should resolve quickly");

        let actor = state.current_combatant_id().unwrap().to_string();
        let plan = battle_core::ai::enemy_turn_actions(&state, &actor).unwrap();
        for action in &plan {
            if state.phase.is_terminal() {
                break;
            }
            let _ = state.execute(action, &mut dice);
        }
        if state.phase.is_terminal() {
            break;
        }
        state.advance_turn(&mut dice).unwrap();
    }

    // Ana out-damages the goblin decisively with these stats.
    assert_eq!(state.phase, BattlePhase::Victory);
    let rewards = state.rewards.as_ref().expect("victory computes rewards");
    assert!(rewards.xp > 0);
    assert!(rewards.gold > 0);
    assert!(state.log.iter().any(|e| e.is_kill));
}

#[test]
fn battle_state_resumes_from_persisted_bytes() {
    let mut state = demo_battle();
    let mut dice = ScriptedDice::new();

    // Play a couple of turns, persist, resume, and keep playing.
    let actor = state.current_combatant_id().unwrap().to_string();
    let plan = battle_core::ai::enemy_turn_actions(&state, &actor).unwrap();
    for action in &plan {
        let _ = state.execute(action, &mut dice);
    }
    state.advance_turn(&mut dice).unwrap();

    let bytes = state.to_bytes().unwrap();
    let mut resumed = BattleState::from_bytes(&bytes).unwrap();
    assert_eq!(state, resumed);
    assert_ne!(resumed.phase, BattlePhase::Intro);

    // The resumed battle accepts actions exactly like the original.
    let actor = resumed.current_combatant_id().unwrap().to_string();
    resumed
        .execute(&BattleAction::EndTurn { actor }, &mut dice)
        .unwrap();
}

#[test]
fn dice_roll_boosts_a_scripted_attack() {
    let mut state = battle_core::battle::create_battle(
        "mundo",
        "arena",
        &[hero("ana", "Ana")],
        &[goblin("goblin", "Goblin", AiPattern::Aggressive)],
    );
    state.begin().unwrap();
    state.combatant_mut("ana").unwrap().position = GridPosition::new(0, 1);

    let mut dice = ScriptedDice::new().with_d20(&[20]).with_d6(&[3]);
    let outcome = state
        .perform_dice_roll("ana", DicePurpose::Attack, &mut dice)
        .unwrap();
    assert!(outcome.is_crit);

    state
        .execute(
            &BattleAction::Attack {
                actor: "ana".into(),
                target: "goblin-1".into(),
            },
            &mut dice,
        )
        .unwrap();
    // 10 - 2 + 3 = 11 before the boost
    assert_eq!(state.combatant("goblin-1").unwrap().hp, 7);

    state
        .apply_dice_roll_to_action("ana", &outcome, &mut dice)
        .unwrap();
    assert_eq!(state.log.last().unwrap().damage, Some(22));
    assert!(state.log.last().unwrap().is_crit);
    assert_eq!(state.phase, BattlePhase::Victory);
}

#[test]
fn skill_usage_exports_to_character_progression() {
    let mut state = battle_core::battle::create_battle(
        "mundo",
        "arena",
        &[hero("ana", "Ana")],
        &[goblin("goblin", "Goblin", AiPattern::Aggressive)],
    );
    state.begin().unwrap();
    let mut dice = ScriptedDice::new();

    // Pretend Ana already had 4 lifetime uses recorded before this fight.
    state
        .combatant_mut("ana")
        .unwrap()
        .skill_mut("golpe-arcano")
        .unwrap()
        .usage_count = 4;

    state.combatant_mut("ana").unwrap().position = GridPosition::new(0, 3);
    state
        .execute(
            &BattleAction::Skill {
                actor: "ana".into(),
                skill_id: "golpe-arcano".into(),
                target: Some("goblin-1".into()),
                target_position: None,
            },
            &mut dice,
        )
        .unwrap();

    let existing = vec![CharacterSkill {
        id: "golpe-arcano".into(),
        name: "Golpe Arcano".into(),
        usage_count: 4,
        level: 1,
    }];
    let synced =
        sync_battle_skills_to_character(state.combatant("ana").unwrap(), &existing);

    let entry = synced.iter().find(|s| s.id == "golpe-arcano").unwrap();
    assert_eq!(entry.usage_count, 5);
    assert_eq!(entry.level, 2); // crossed the first threshold
    // Skills the record did not know yet are appended
    assert!(synced.iter().any(|s| s.id == "cura-leve"));
}

#[test]
fn autoplayed_battles_respect_hp_and_ap_bounds() {
    for seed in [1u64, 2, 3, 4, 5] {
        let mut state = demo_battle();
        let mut dice = SeededDice::from_seed(seed);
        autoplay(&mut state, &mut dice, 40).unwrap();

        for combatant in &state.combatants {
            assert!(combatant.hp <= combatant.max_hp);
            assert!(combatant.action_points <= combatant.max_action_points);
        }
    }
}
