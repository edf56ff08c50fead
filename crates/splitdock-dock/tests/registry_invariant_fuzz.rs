//! Property/fuzz-style invariants for docking operations.
//!
//! Random streams of show, close, float, dock, tab, drop, resize and
//! save/restore calls run against one registry. Calls may be refused
//! (`Err` or `Ok(false)`); either way the registry must pass its sanity
//! check after every step, and a save/restore round trip must reproduce
//! what is on screen.

use proptest::prelude::*;
use splitdock_dock::{
    AddingOption, DockRegistry, DockWidgetId, DropLocation, FrameId, LayoutSaver, Location,
    MainWindowOptions, Rect, SeparatorMove, Size, WindowId,
};

#[derive(Debug, Clone)]
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn next_i32_range(&mut self, min: i32, max: i32) -> i32 {
        debug_assert!(min <= max);
        if min == max {
            return min;
        }
        let span = (i64::from(max) - i64::from(min) + 1) as u64;
        min + (self.next_u64() % span) as i32
    }

    fn choose_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.next_u64() % len as u64) as usize
    }

    fn choose_bool(&mut self) -> bool {
        (self.next_u64() & 1) == 0
    }

    fn location(&mut self) -> Location {
        Location::ALL[self.choose_index(Location::ALL.len())]
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> Option<T> {
        if items.is_empty() {
            None
        } else {
            Some(items[self.choose_index(items.len())])
        }
    }
}

const MAX_DOCK_WIDGETS: usize = 10;

struct World {
    registry: DockRegistry,
    main: WindowId,
    created: usize,
}

impl World {
    fn new(rng: &mut Lcg) -> Self {
        let mut registry = DockRegistry::new();
        let options = if rng.choose_bool() {
            MainWindowOptions::HAS_CENTRAL_FRAME
        } else {
            MainWindowOptions::empty()
        };
        let size = Size::new(rng.next_i32_range(400, 1600), rng.next_i32_range(300, 1000));
        let main = registry
            .create_main_window("main", size, options)
            .expect("create main window");
        Self {
            registry,
            main,
            created: 0,
        }
    }

    fn dock_widgets(&self) -> Vec<DockWidgetId> {
        self.registry.dock_widgets().map(|widget| widget.id()).collect()
    }

    fn frames_in(&self, window: WindowId) -> Vec<FrameId> {
        self.registry.frames_in(window)
    }
}

/// What a user can see: per dock widget, where it is shown and at what size.
fn visible_state(registry: &DockRegistry) -> Vec<(String, Option<bool>, Option<Rect>)> {
    registry
        .dock_widgets()
        .map(|widget| {
            let in_main = widget.frame().map(|_| registry.is_in_main_window(widget.id()));
            (
                widget.name().to_owned(),
                in_main,
                registry.dock_widget_geometry(widget.id()),
            )
        })
        .collect()
}

fn assert_registry_invariants(world: &World, context: &str) {
    if let Err(err) = world.registry.check_sanity() {
        panic!("registry sanity failed ({context}): {err}");
    }
    for window in world.registry.windows() {
        let layout = window.layout();
        assert!(
            layout.size().covers(layout.min_size()),
            "window {} below its minimum ({context})",
            window.id()
        );
        assert_eq!(window.geometry().size(), layout.size(), "({context})");
        if !window.is_main() {
            assert!(layout.visible_count() > 0, "empty floating window ({context})");
            assert_eq!(layout.placeholder_count(), 0, "({context})");
        }
    }
}

fn apply_random_step(world: &mut World, rng: &mut Lcg) -> String {
    let main = world.main;
    let dock_widgets = world.dock_widgets();
    match rng.choose_index(14) {
        0 => {
            if world.created >= MAX_DOCK_WIDGETS {
                return "noop".to_owned();
            }
            let name = format!("dw{}", world.created);
            world.created += 1;
            let id = world
                .registry
                .create_dock_widget(&name)
                .expect("create dock widget");
            if rng.choose_bool() {
                world.registry.show(id).expect("show new dock widget");
            }
            format!("create {name}")
        }
        1 | 2 => {
            let Some(dw) = rng.pick(&dock_widgets) else {
                return "noop".to_owned();
            };
            let relative = if rng.choose_bool() {
                rng.pick(&dock_widgets)
            } else {
                None
            };
            let location = rng.location();
            let option = if rng.next_u64() % 4 == 0 {
                AddingOption::StartHidden
            } else {
                AddingOption::None
            };
            let result = world
                .registry
                .add_dock_widget(main, dw, location, relative, option);
            if result == Ok(true) && option == AddingOption::None {
                assert!(world.registry.is_in_main_window(dw));
            }
            format!("add {dw} {location:?} {relative:?} {option:?} -> {result:?}")
        }
        3 => {
            let Some(dw) = rng.pick(&dock_widgets) else {
                return "noop".to_owned();
            };
            world.registry.close(dw).expect("close");
            assert!(world.registry.dock_widget(dw).is_some_and(|w| !w.is_open()));
            format!("close {dw}")
        }
        4 => {
            let Some(dw) = rng.pick(&dock_widgets) else {
                return "noop".to_owned();
            };
            world.registry.show(dw).expect("show");
            assert!(world.registry.dock_widget(dw).is_some_and(|w| w.is_open()));
            format!("show {dw}")
        }
        5 => {
            let Some(dw) = rng.pick(&dock_widgets) else {
                return "noop".to_owned();
            };
            let floats = rng.choose_bool();
            let result = world.registry.set_floating(dw, floats);
            format!("float {dw} {floats} -> {result:?}")
        }
        6 => {
            let (Some(target), Some(dw)) = (rng.pick(&dock_widgets), rng.pick(&dock_widgets))
            else {
                return "noop".to_owned();
            };
            let result = world.registry.add_dock_widget_as_tab(target, dw);
            if result == Ok(true) {
                assert!(world.registry.is_current_tab(dw));
            }
            format!("tab {dw} onto {target} -> {result:?}")
        }
        7 => {
            let Some(dw) = rng.pick(&dock_widgets) else {
                return "noop".to_owned();
            };
            world.registry.delete_dock_widget(dw).expect("delete");
            assert!(world.registry.dock_widget(dw).is_none());
            format!("delete {dw}")
        }
        8 => {
            let Some(dragged) = rng.pick(&world.registry.floating_windows()) else {
                return "noop".to_owned();
            };
            let mut targets = world.registry.floating_windows();
            targets.retain(|window| *window != dragged);
            targets.push(main);
            let Some(target) = rng.pick(&targets) else {
                return "noop".to_owned();
            };
            let frame = if rng.choose_bool() {
                rng.pick(&world.frames_in(target))
            } else {
                None
            };
            let location = DropLocation::ALL[rng.choose_index(DropLocation::ALL.len())];
            let result = world.registry.drop(target, dragged, frame, location);
            if result == Ok(true) {
                assert!(world.registry.window(dragged).is_none());
            }
            format!("drop {dragged} on {target} {frame:?} {location:?} -> {result:?}")
        }
        9 => {
            let (Some(anchor), Some(dw)) = (rng.pick(&dock_widgets), rng.pick(&dock_widgets))
            else {
                return "noop".to_owned();
            };
            let location = rng.location();
            let result = world
                .registry
                .add_dock_widget_to_containing_window(anchor, dw, location);
            format!("contain {dw} by {anchor} {location:?} -> {result:?}")
        }
        10 => {
            let mut windows = world.registry.floating_windows();
            windows.push(main);
            let Some(window) = rng.pick(&windows) else {
                return "noop".to_owned();
            };
            if rng.choose_bool() {
                let requested =
                    Size::new(rng.next_i32_range(0, 2000), rng.next_i32_range(0, 1400));
                let applied = world
                    .registry
                    .resize_window(window, requested)
                    .expect("resize");
                let min = world.registry.layout(window).expect("layout").min_size();
                assert_eq!(applied, requested.expanded_to(min));
                format!("resize {window} {requested:?}")
            } else {
                let separators: Vec<_> = world
                    .registry
                    .layout(window)
                    .expect("layout")
                    .separators()
                    .iter()
                    .map(|separator| separator.id())
                    .collect();
                let Some(separator) = rng.pick(&separators) else {
                    return "noop".to_owned();
                };
                let position = rng.next_i32_range(0, 2000);
                world
                    .registry
                    .move_separator(window, separator, position, SeparatorMove::Clamp)
                    .expect("clamped separator move");
                format!("drag {separator} in {window} to {position}")
            }
        }
        11 => {
            let mut windows = world.registry.floating_windows();
            windows.push(main);
            let (Some(window), Some(dw)) = (rng.pick(&windows), rng.pick(&dock_widgets)) else {
                return "noop".to_owned();
            };
            let frame = if rng.choose_bool() {
                rng.pick(&world.frames_in(window))
            } else {
                None
            };
            let location = rng.location();
            let result = world.registry.nest_dock_widget(window, dw, frame, location);
            format!("nest {dw} in {window} {frame:?} {location:?} -> {result:?}")
        }
        12 => {
            let Some(dw) = rng.pick(&dock_widgets) else {
                return "noop".to_owned();
            };
            let min = if rng.choose_bool() {
                Some(Size::new(
                    rng.next_i32_range(20, 300),
                    rng.next_i32_range(20, 300),
                ))
            } else {
                None
            };
            world
                .registry
                .set_dock_widget_min_size(dw, min)
                .expect("set min size");
            format!("min {dw} {min:?}")
        }
        _ => {
            let before = visible_state(&world.registry);
            let counts = world
                .registry
                .layout(main)
                .map(|layout| (layout.count(), layout.placeholder_count()))
                .expect("main layout");
            let floating = world.registry.floating_windows().len();
            let saver = LayoutSaver::new();
            let json = saver.serialize_layout(&world.registry).expect("serialize");
            saver
                .restore_layout(&mut world.registry, &json)
                .expect("restore");
            assert_eq!(visible_state(&world.registry), before);
            assert_eq!(
                world
                    .registry
                    .layout(main)
                    .map(|layout| (layout.count(), layout.placeholder_count()))
                    .expect("main layout"),
                counts
            );
            assert_eq!(world.registry.floating_windows().len(), floating);
            "save/restore".to_owned()
        }
    }
}

fn run_sequence(seed: u64, steps: usize) -> World {
    let mut rng = Lcg::new(seed);
    let mut world = World::new(&mut rng);
    for step in 0..steps {
        let description = apply_random_step(&mut world, &mut rng);
        assert_registry_invariants(&world, &format!("seed={seed} step={step} {description}"));
    }
    world
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn random_docking_sequences_stay_consistent(
        seed in any::<u64>(),
        steps in 20usize..120,
    ) {
        let world = run_sequence(seed, steps);
        prop_assert!(world.registry.check_sanity().is_ok());
    }

    #[test]
    fn closing_everything_leaves_only_placeholders(
        seed in any::<u64>(),
        steps in 10usize..80,
    ) {
        let mut world = run_sequence(seed, steps);
        for dw in world.dock_widgets() {
            world.registry.close(dw).expect("close");
        }
        prop_assert!(world.registry.floating_windows().is_empty());
        prop_assert!(world.registry.check_sanity().is_ok());
        let central = world
            .registry
            .window(world.main)
            .and_then(|window| window.central_frame())
            .is_some();
        let layout = world.registry.layout(world.main).expect("main layout");
        prop_assert_eq!(layout.visible_count(), usize::from(central));

        for dw in world.dock_widgets() {
            world.registry.delete_dock_widget(dw).expect("delete");
        }
        prop_assert!(world.registry.check_sanity().is_ok());
        let layout = world.registry.layout(world.main).expect("main layout");
        prop_assert_eq!(layout.placeholder_count(), 0);
    }
}

#[test]
fn docking_fuzz_seed_corpus_stays_consistent() {
    let seeds = [
        0_u64,
        1,
        2,
        3,
        5,
        8,
        13,
        21,
        34,
        55,
        89,
        144,
        u32::MAX as u64,
        u64::MAX,
    ];

    for seed in seeds {
        let world = run_sequence(seed, 150);
        assert!(world.registry.check_sanity().is_ok(), "seed {seed}");
    }
}
