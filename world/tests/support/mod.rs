use std::time::Duration;

use aerial_tactics_core::{
    Command, DisplayCommand, Event, FrameInput, LevelSettings, Ray, TeamId, TeamInfo, UnitId,
    UnitSpawn, UnitState, UnitStats,
};
use aerial_tactics_world::{self as world, query, World};
use glam::Vec3;

pub const STEP: Duration = Duration::from_millis(100);
pub const BLUE: UnitId = UnitId::new(1);
pub const RED: UnitId = UnitId::new(2);

/// Two single-unit teams facing each other 40 units apart.
pub struct Skirmish {
    pub world: World,
    pub events: Vec<Event>,
    pub display: Vec<DisplayCommand>,
}

impl Skirmish {
    pub fn new(seed: u64) -> Self {
        let mut skirmish = Self {
            world: World::new(LevelSettings::default(), seed),
            events: Vec::new(),
            display: Vec::new(),
        };
        skirmish.apply(Command::RegisterUnit {
            team: team(1, "Blue", 0),
            stats: UnitStats::default(),
            spawn: UnitSpawn::default(),
        });
        skirmish.apply(Command::RegisterUnit {
            team: team(2, "Red", 1),
            stats: UnitStats::default(),
            spawn: UnitSpawn {
                position: [0.0, 40.0],
                heading: 180.0,
                ..UnitSpawn::default()
            },
        });
        skirmish
    }

    pub fn apply(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.events, &mut self.display);
    }

    pub fn tick(&mut self, input: FrameInput) {
        self.apply(Command::Tick { dt: STEP, input });
    }

    pub fn idle(&mut self) {
        self.tick(FrameInput::default());
    }

    pub fn state(&self, unit: UnitId) -> Option<UnitState> {
        query::unit_state(&self.world, unit)
    }

    pub fn tick_until(&mut self, what: &str, done: impl Fn(&World) -> bool) {
        for _ in 0..200 {
            if done(&self.world) {
                return;
            }
            self.idle();
        }
        panic!("timed out waiting for {what}");
    }

    /// Runs until `acting` may pick a move and `waiting` stands by.
    pub fn until_team_turn(&mut self, acting: UnitId, waiting: UnitId) {
        self.tick_until("team turn", |world| {
            query::unit_state(world, acting) == Some(UnitState::Idle)
                && query::unit_state(world, waiting) == Some(UnitState::Wait)
        });
    }

    /// Selects `unit` and opens its move menu.
    pub fn open_move_menu(&mut self, unit: UnitId) {
        self.tick(FrameInput {
            selected: Some(unit),
            ..FrameInput::default()
        });
        self.idle();
        assert_eq!(self.state(unit), Some(UnitState::MoveMenu));
    }

    /// Commits a move ending at the ground point `(x, z)`.
    pub fn commit_move(&mut self, unit: UnitId, x: f32, z: f32) {
        self.tick(aim(x, z, true));
        self.tick_until("attack menu", |world| {
            query::unit_state(world, unit) == Some(UnitState::AttackMenu)
        });
    }
}

pub fn team(id: u32, name: &str, priority: i32) -> TeamInfo {
    TeamInfo {
        id: TeamId::new(id),
        name: name.to_owned(),
        priority,
        color: [255, 255, 255],
        insignia: None,
    }
}

/// Pointer straight above the ground point `(x, z)`.
pub fn aim(x: f32, z: f32, pressed: bool) -> FrameInput {
    FrameInput {
        pointer: Some(Ray::new(Vec3::new(x, 100.0, z), Vec3::NEG_Y)),
        pressed,
        ..FrameInput::default()
    }
}

pub fn hover(unit: UnitId, pressed: bool) -> FrameInput {
    FrameInput {
        hovered: Some(unit),
        pressed,
        ..FrameInput::default()
    }
}
