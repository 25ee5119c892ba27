use delve_core::{AgentId, Command, Event, Role, SimulationConfig, Vec2};
use delve_world::{self as world, layout::LevelLayout, query, World};

const ARENA: &str = "\
############
#P.........#
#..##......#
#..##...#..#
#.......#..#
#.....H....#
#....###...#
#H.........#
############
";

#[test]
fn replaying_identical_commands_is_deterministic() {
    let first = replay(&SimulationConfig::default());
    let second = replay(&SimulationConfig::default());

    assert_eq!(first, second, "replay diverged between runs");
    assert!(first.events.iter().any(|event| matches!(event, Event::ProjectileImpacted { .. })));
    assert!(first.events.iter().any(|event| matches!(event, Event::PathPlanned { .. })));
}

#[test]
fn long_replan_interval_replays_deterministically() {
    let mut config = SimulationConfig::default();
    config.pathing.replan_interval = 3000;

    let first = replay(&config);
    let second = replay(&config);
    assert_eq!(first, second);
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    events: Vec<Event>,
    agents: Vec<AgentState>,
}

#[derive(Debug, PartialEq)]
struct AgentState {
    id: AgentId,
    role: Role,
    position: Vec2,
    velocity: Vec2,
}

fn replay(config: &SimulationConfig) -> ReplayOutcome {
    let layout = LevelLayout::parse(ARENA).expect("arena parses");
    let mut world = World::new(&layout, *config).expect("config validates");
    let mut events = Vec::new();

    for marker in layout.spawns() {
        let position = query::spawn_position(&world, marker.cell);
        world::apply(
            &mut world,
            Command::SpawnAgent {
                role: marker.role,
                position,
            },
            &mut events,
        );
    }

    for command in scripted_commands(&world) {
        world::apply(&mut world, command, &mut events);
    }

    let agents = query::agent_view(&world)
        .into_vec()
        .into_iter()
        .map(|snapshot| AgentState {
            id: snapshot.id,
            role: snapshot.role,
            position: snapshot.bounds.position(),
            velocity: snapshot.velocity,
        })
        .collect();

    ReplayOutcome { events, agents }
}

fn scripted_commands(world: &World) -> Vec<Command> {
    let player = query::first_with_role(world, Role::Player).expect("player spawned");
    let headings = [
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
        Vec2::new(-1.0, 0.5),
        Vec2::ZERO,
    ];

    let mut commands = Vec::new();
    for (leg, heading) in headings.iter().enumerate() {
        commands.push(Command::Steer {
            agent: player,
            direction: *heading,
        });
        for tick in 0..40 {
            if tick % 15 == leg {
                commands.push(Command::Fire { agent: player });
            }
            commands.push(Command::Tick);
        }
    }
    commands
}
