mod support;

use aerial_tactics_core::{
    Command, DisplayCommand, Event, FrameInput, LevelState, TeamId, UnitState,
};
use aerial_tactics_world::query;
use glam::Vec3;
use support::{hover, Skirmish, BLUE, RED};

#[test]
fn teams_alternate_and_turns_wrap() {
    let mut skirmish = Skirmish::new(7);
    skirmish.until_team_turn(BLUE, RED);
    assert_eq!(query::level_state(&skirmish.world), Some(LevelState::TeamAction));
    assert_eq!(query::current_turn(&skirmish.world), 1);
    assert!(skirmish.events.contains(&Event::TurnStarted {
        turn: 1,
        team: TeamId::new(1)
    }));

    skirmish.open_move_menu(BLUE);
    assert_eq!(query::active_unit(&skirmish.world), Some(BLUE));
    skirmish.commit_move(BLUE, 0.0, 12.5);
    assert!(skirmish
        .events
        .iter()
        .any(|event| matches!(event, Event::MoveCommitted { unit, .. } if *unit == BLUE)));
    let blue = query::unit_view(&skirmish.world, BLUE).expect("blue registered");
    assert!((blue.post.position - Vec3::new(0.0, 0.0, 12.5)).length() < 1e-3);
    assert!((blue.transform.position - blue.post.position).length() < 1e-6);

    skirmish.tick(hover(RED, false));
    assert_eq!(query::target_unit(&skirmish.world), Some(RED));
    skirmish.tick(hover(RED, true));
    let (attacker, target, probability, rolls) = skirmish
        .events
        .iter()
        .find_map(|event| match event {
            Event::AttackResolved {
                attacker,
                target,
                probability,
                hits,
            } => Some((*attacker, *target, *probability, hits.len())),
            _ => None,
        })
        .expect("attack resolved");
    assert_eq!((attacker, target, rolls), (BLUE, RED, 10));
    assert!(probability > 0.1 && probability < 0.2);

    skirmish.tick_until("blue done and red recovered", |world| {
        query::unit_state(world, BLUE) == Some(UnitState::Done)
            && query::unit_state(world, RED) == Some(UnitState::Wait)
    });
    assert!(skirmish
        .events
        .iter()
        .any(|event| matches!(event, Event::DamageApplied { unit, .. } if *unit == RED)));
    assert_eq!(query::active_unit(&skirmish.world), None);

    skirmish.apply(Command::ProgressTurn);
    assert!(skirmish.events.contains(&Event::TurnProgressed {
        turn: 1,
        team_index: 1
    }));

    skirmish.until_team_turn(RED, BLUE);
    assert_eq!(
        query::active_team(&skirmish.world).map(|team| team.id),
        Some(TeamId::new(2))
    );
    skirmish.open_move_menu(RED);
    skirmish.commit_move(RED, 0.0, 27.5);
    skirmish.apply(Command::SkipAttack { unit: RED });
    assert_eq!(query::active_unit(&skirmish.world), None);
    skirmish.tick_until("red done", |world| {
        query::unit_state(world, RED) == Some(UnitState::Done)
    });

    skirmish.apply(Command::ProgressTurn);
    assert!(skirmish.events.contains(&Event::TurnProgressed {
        turn: 2,
        team_index: 0
    }));
    skirmish.until_team_turn(BLUE, RED);
    assert_eq!(query::current_turn(&skirmish.world), 2);
    assert!(skirmish.display.contains(&DisplayCommand::TurnAnnouncement {
        team: TeamId::new(1),
        previous_turn: 1,
        turn: 2
    }));
}

#[test]
fn progress_is_refused_while_a_unit_is_acting() {
    let mut skirmish = Skirmish::new(1);
    skirmish.until_team_turn(BLUE, RED);
    skirmish.open_move_menu(BLUE);

    skirmish.apply(Command::ProgressTurn);
    assert_eq!(query::active_team_index(&skirmish.world), 0);
    assert!(!skirmish
        .events
        .iter()
        .any(|event| matches!(event, Event::TurnProgressed { .. })));
}

#[test]
fn cancel_move_only_applies_to_the_active_unit() {
    let mut skirmish = Skirmish::new(1);
    skirmish.until_team_turn(BLUE, RED);
    skirmish.open_move_menu(BLUE);

    skirmish.apply(Command::CancelMove { unit: RED });
    assert_eq!(query::active_unit(&skirmish.world), Some(BLUE));

    skirmish.apply(Command::CancelMove { unit: BLUE });
    assert_eq!(query::active_unit(&skirmish.world), None);
    skirmish.idle();
    skirmish.idle();
    assert_eq!(skirmish.state(BLUE), Some(UnitState::Idle));
}

#[test]
fn altitude_change_carries_into_the_committed_move() {
    let mut skirmish = Skirmish::new(1);
    skirmish.until_team_turn(BLUE, RED);
    skirmish.open_move_menu(BLUE);

    skirmish.apply(Command::ChangeAltitude { unit: RED, delta: 1 });
    skirmish.apply(Command::ChangeAltitude { unit: BLUE, delta: 1 });
    let blue = query::unit_view(&skirmish.world, BLUE).expect("blue registered");
    assert_eq!(blue.selected_altitude, 3);
    assert!(skirmish.display.contains(&DisplayCommand::Altitude {
        unit: BLUE,
        altitude: 3
    }));

    skirmish.commit_move(BLUE, 0.0, 12.5);
    let blue = query::unit_view(&skirmish.world, BLUE).expect("blue registered");
    assert_eq!(blue.post.altitude, 3);
    assert!((blue.transform.height - 30.0).abs() < 1e-4);
}

#[test]
fn undo_returns_to_move_selection() {
    let mut skirmish = Skirmish::new(1);
    skirmish.until_team_turn(BLUE, RED);
    skirmish.open_move_menu(BLUE);
    skirmish.commit_move(BLUE, 0.0, 12.5);

    skirmish.apply(Command::UndoMove { unit: BLUE });
    skirmish.tick_until("move menu", |world| {
        query::unit_state(world, BLUE) == Some(UnitState::MoveMenu)
    });
    let blue = query::unit_view(&skirmish.world, BLUE).expect("blue registered");
    assert_eq!(blue.transform.position, Vec3::ZERO);
    assert_eq!(query::active_unit(&skirmish.world), Some(BLUE));
}

#[test]
fn advance_request_picks_the_next_idle_unit() {
    let mut skirmish = Skirmish::new(1);
    skirmish.until_team_turn(BLUE, RED);

    skirmish.tick(FrameInput {
        advance: true,
        ..FrameInput::default()
    });
    assert_eq!(query::active_unit(&skirmish.world), Some(BLUE));
    assert!(skirmish
        .display
        .iter()
        .any(|command| matches!(command, DisplayCommand::FocusCamera { .. })));
    assert_eq!(query::active_team_index(&skirmish.world), 0);
}

#[test]
fn waiting_units_can_preview_out_of_turn() {
    let mut skirmish = Skirmish::new(1);
    skirmish.until_team_turn(BLUE, RED);

    skirmish.tick(FrameInput {
        selected: Some(RED),
        ..FrameInput::default()
    });
    skirmish.idle();
    assert_eq!(skirmish.state(RED), Some(UnitState::AttackPrediction));
    assert_eq!(query::active_unit(&skirmish.world), Some(RED));

    skirmish.tick(support::aim(0.0, 27.5, true));
    assert_eq!(query::active_unit(&skirmish.world), None);
    skirmish.idle();
    assert_eq!(skirmish.state(RED), Some(UnitState::Wait));
}

#[test]
fn skip_after_undo_keeps_the_unit_selecting() {
    let mut skirmish = Skirmish::new(1);
    skirmish.until_team_turn(BLUE, RED);
    skirmish.open_move_menu(BLUE);
    skirmish.commit_move(BLUE, 0.0, 12.5);

    skirmish.apply(Command::UndoMove { unit: BLUE });
    skirmish.apply(Command::SkipAttack { unit: BLUE });
    assert_eq!(query::active_unit(&skirmish.world), Some(BLUE));
    skirmish.tick_until("move menu", |world| {
        query::unit_state(world, BLUE) == Some(UnitState::MoveMenu)
    });
    assert_eq!(query::active_unit(&skirmish.world), Some(BLUE));
}
