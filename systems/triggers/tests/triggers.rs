use heist_core::{
    CellCoord, Command, Event, GameConfig, HeroColor, HeroId, Item, ItemFlag, ItemKind,
    LocalCell, Orientation, Phase, RoleSet, TileId, TileTemplate,
};
use heist_system_triggers::Triggers;
use heist_world::{self as world, query, HeroSetup, World, WorldSetup};

fn item_world(
    config: GameConfig,
    heroes: &[(u8, CellCoord)],
    items: &[((u8, u8), ItemKind, Option<HeroColor>)],
) -> World {
    let mut template = TileTemplate::open(TileId::new(1));
    for &((x, y), kind, color) in items {
        let at = LocalCell::new(x, y).expect("in range");
        if let Some(cell) = template.cell_mut(at) {
            cell.item = Some(Item::new(kind, color));
        }
    }
    let mut world = World::new(WorldSetup {
        config,
        heroes: heroes
            .iter()
            .map(|&(id, cell)| HeroSetup {
                id: HeroId::new(id),
                color: None,
                cell,
            })
            .collect(),
        players: vec![RoleSet::all(), RoleSet::empty()],
    })
    .expect("valid setup");
    let _ = apply_all(
        &mut world,
        vec![Command::PlaceTile {
            tile: template,
            origin: CellCoord::new(0, 0),
            orientation: Orientation::default(),
            source: None,
        }],
    );
    world
}

fn apply_all(world: &mut World, commands: Vec<Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

/// Moves and settles a hero, returning the trigger commands and the events they produced.
fn land(world: &mut World, hero: u8, to: CellCoord) -> (Vec<Command>, Vec<Event>) {
    let hero = HeroId::new(hero);
    let events = apply_all(
        world,
        vec![Command::MoveHero { hero, to }, Command::SettleHero { hero }],
    );
    assert!(
        events.contains(&Event::HeroLanded { hero, cell: to }),
        "hero {hero} did not land: {events:?}"
    );

    let heroes = query::hero_view(world);
    let mut commands = Vec::new();
    Triggers::default().handle(
        &events,
        query::board(world),
        &heroes,
        query::phase(world),
        query::config(world),
        &mut commands,
    );
    let produced = apply_all(world, commands.clone());
    (commands, produced)
}

#[test]
fn hourglass_inverts_the_clock_once() {
    let config = GameConfig {
        scenario: 3,
        players: 2,
        pause_on_invert_clock: true,
        ..GameConfig::default()
    };
    let mut world = item_world(
        config,
        &[(0, CellCoord::new(0, 0))],
        &[((1, 0), ItemKind::Time, None)],
    );

    let (commands, events) = land(&mut world, 0, CellCoord::new(1, 0));
    assert_eq!(
        commands,
        vec![
            Command::InvertClock,
            Command::SetPaused { paused: true },
            Command::SwapRoles,
            Command::SetCellFlag {
                cell: CellCoord::new(1, 0),
                flag: ItemFlag::Used,
            },
        ]
    );
    assert!(events.contains(&Event::RolesSwapped));
    assert!(query::roles(&world, 0).is_empty());
    assert_eq!(query::clock_flips(&world), 1);

    let _ = land(&mut world, 0, CellCoord::new(2, 0));
    let (commands, _) = land(&mut world, 0, CellCoord::new(1, 0));
    assert!(commands.is_empty());
}

#[test]
fn hourglass_keeps_roles_in_early_scenarios() {
    let mut world = item_world(
        GameConfig {
            scenario: 2,
            players: 2,
            ..GameConfig::default()
        },
        &[(0, CellCoord::new(0, 0))],
        &[((1, 0), ItemKind::Time, None)],
    );
    let (commands, _) = land(&mut world, 0, CellCoord::new(1, 0));
    assert_eq!(
        commands,
        vec![
            Command::InvertClock,
            Command::SetCellFlag {
                cell: CellCoord::new(1, 0),
                flag: ItemFlag::Used,
            },
        ]
    );
}

#[test]
fn articles_are_stolen_when_every_hero_holds_its_own() {
    let mut world = item_world(
        GameConfig::default(),
        &[(0, CellCoord::new(0, 0)), (1, CellCoord::new(3, 0))],
        &[
            ((0, 1), ItemKind::Article, Some(HeroColor::Purple)),
            ((3, 1), ItemKind::Article, Some(HeroColor::Orange)),
        ],
    );

    let (commands, _) = land(&mut world, 0, CellCoord::new(0, 1));
    assert!(commands.is_empty());
    assert!(query::phase(&world).is(1));

    let (commands, events) = land(&mut world, 1, CellCoord::new(3, 1));
    assert_eq!(
        commands,
        vec![
            Command::SetCellFlag {
                cell: CellCoord::new(0, 1),
                flag: ItemFlag::Stolen,
            },
            Command::SetCellFlag {
                cell: CellCoord::new(3, 1),
                flag: ItemFlag::Stolen,
            },
            Command::SetPhase {
                phase: Phase::SECOND
            },
        ]
    );
    assert!(events.contains(&Event::PhaseChanged {
        phase: Phase::SECOND
    }));
    assert!(query::cell(&world, CellCoord::new(3, 1)).flag(ItemFlag::Stolen));
}

#[test]
fn exits_open_for_matching_colors_in_the_escape() {
    let mut world = item_world(
        GameConfig {
            scenario: 2,
            ..GameConfig::default()
        },
        &[(0, CellCoord::new(0, 0)), (1, CellCoord::new(3, 0))],
        &[
            ((0, 2), ItemKind::Exit, Some(HeroColor::Purple)),
            ((3, 2), ItemKind::Exit, Some(HeroColor::Purple)),
        ],
    );

    let (commands, _) = land(&mut world, 0, CellCoord::new(0, 2));
    assert!(commands.is_empty(), "exits stay shut in the first phase");

    let _ = apply_all(
        &mut world,
        vec![Command::SetPhase {
            phase: Phase::SECOND,
        }],
    );
    let (commands, _) = land(&mut world, 1, CellCoord::new(3, 2));
    assert!(commands.is_empty(), "orange hero cannot use a purple exit");

    let (commands, events) = land(&mut world, 0, CellCoord::new(0, 3));
    assert!(commands.is_empty());
    assert!(events.is_empty());
    let (commands, events) = land(&mut world, 0, CellCoord::new(0, 2));
    assert_eq!(commands, vec![Command::ExitHero { hero: HeroId::new(0) }]);
    assert_eq!(
        events,
        vec![Event::HeroExited {
            hero: HeroId::new(0),
            cell: CellCoord::new(0, 2),
        }]
    );
}

#[test]
fn first_scenario_exit_serves_every_hero_and_wins() {
    let mut world = item_world(
        GameConfig::default(),
        &[(0, CellCoord::new(0, 0)), (1, CellCoord::new(3, 0))],
        &[
            ((1, 2), ItemKind::Exit, Some(HeroColor::Purple)),
            ((2, 2), ItemKind::Exit, Some(HeroColor::Purple)),
        ],
    );
    let _ = apply_all(
        &mut world,
        vec![Command::SetPhase {
            phase: Phase::SECOND,
        }],
    );

    let _ = land(&mut world, 0, CellCoord::new(1, 2));
    let (commands, events) = land(&mut world, 1, CellCoord::new(2, 2));
    assert_eq!(commands, vec![Command::ExitHero { hero: HeroId::new(1) }]);
    assert_eq!(events.last(), Some(&Event::GameWon));
    assert!(query::is_ended(&world));
}

#[test]
fn cameras_switch_off_for_their_own_hero_only() {
    let mut world = item_world(
        GameConfig::default(),
        &[(0, CellCoord::new(0, 0)), (2, CellCoord::new(3, 3))],
        &[
            ((1, 1), ItemKind::Camera, Some(HeroColor::Yellow)),
            ((2, 2), ItemKind::Camera, Some(HeroColor::Yellow)),
        ],
    );

    let (commands, _) = land(&mut world, 0, CellCoord::new(1, 0));
    assert!(commands.is_empty());
    let (commands, _) = land(&mut world, 0, CellCoord::new(1, 1));
    assert!(commands.is_empty(), "purple hero ignores yellow cameras");

    let (commands, events) = land(&mut world, 2, CellCoord::new(2, 2));
    assert_eq!(
        commands,
        vec![Command::SetCellFlag {
            cell: CellCoord::new(2, 2),
            flag: ItemFlag::Used,
        }]
    );
    assert_eq!(
        events,
        vec![Event::CellFlagSet {
            cell: CellCoord::new(2, 2),
            flag: ItemFlag::Used,
        }]
    );
}
