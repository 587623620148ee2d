use quadrant_core::gesture::{DragOutcome, DragTracker, DropLayout, Rect, SwipeTracker, Zone};
use quadrant_core::kv::{save_slot, slots};
use quadrant_core::{Category, Habit, MemoryKvStore, NewTask, Task, TaskId, TaskStore};

const ROW_HEIGHT: f64 = 40.0;

/// Inbox strip on top, 2x2 quadrant grid below.
struct MatrixLayout {
    zones: Vec<(Zone, Rect, Vec<Rect>)>,
}

impl MatrixLayout {
    fn from_store(store: &TaskStore<MemoryKvStore>) -> Self {
        let cells = [
            (Zone::Inbox, Rect::new(0.0, 0.0, 400.0, 100.0)),
            (Zone::Q1, Rect::new(0.0, 100.0, 200.0, 200.0)),
            (Zone::Q2, Rect::new(200.0, 100.0, 200.0, 200.0)),
            (Zone::Q3, Rect::new(0.0, 300.0, 200.0, 200.0)),
            (Zone::Q4, Rect::new(200.0, 300.0, 200.0, 200.0)),
        ];
        let zones = cells
            .into_iter()
            .map(|(zone, bounds)| {
                let rows = (0..store.tasks_by_category(zone.category()).len())
                    .map(|i| {
                        let y = bounds.y + i as f64 * ROW_HEIGHT;
                        Rect::new(bounds.x, y, bounds.width, ROW_HEIGHT)
                    })
                    .collect();
                (zone, bounds, rows)
            })
            .collect();
        Self { zones }
    }

    fn row(&self, zone: Zone, index: usize) -> Rect {
        self.child_rects(zone)[index]
    }
}

impl DropLayout for MatrixLayout {
    fn zone_at(&self, x: f64, y: f64) -> Option<Zone> {
        self.zones
            .iter()
            .find(|(_, bounds, _)| bounds.contains(x, y))
            .map(|(zone, _, _)| *zone)
    }

    fn child_rects(&self, zone: Zone) -> &[Rect] {
        self.zones
            .iter()
            .find(|(candidate, _, _)| *candidate == zone)
            .map(|(_, _, rows)| rows.as_slice())
            .unwrap_or(&[])
    }
}

fn empty_store() -> TaskStore<MemoryKvStore> {
    let mut kv = MemoryKvStore::new();
    save_slot(&mut kv, slots::TASKS, &Vec::<Task>::new());
    save_slot(&mut kv, slots::HABITS, &Vec::<Habit>::new());
    TaskStore::open(kv)
}

fn ids(store: &TaskStore<MemoryKvStore>, category: Category) -> Vec<TaskId> {
    store
        .tasks_by_category(category)
        .iter()
        .map(|task| task.id)
        .collect()
}

#[test]
fn dragging_from_inbox_between_quadrant_rows_reorders_task() {
    let mut store = empty_store();
    let second = store
        .add_task(NewTask::new("second").in_category(Category::Q2))
        .unwrap();
    let first = store
        .add_task(NewTask::new("first").in_category(Category::Q2))
        .unwrap();
    let inbox = store.add_task(NewTask::new("triage me")).unwrap();

    let layout = MatrixLayout::from_store(&store);
    let origin = layout.row(Zone::Inbox, 0);
    let mut drag = DragTracker::new();
    drag.start_drag(inbox, Zone::Inbox, origin.x + 10.0, origin.mid_y(), origin);
    // Lower half of the first Q2 row: lands before the second row.
    let target_row = layout.row(Zone::Q2, 0);
    drag.move_to(target_row.x + 50.0, target_row.mid_y() + 5.0, &layout);

    let outcome = drag.release();
    assert!(outcome.apply_to(&mut store));
    assert_eq!(ids(&store, Category::Q2), vec![first, inbox, second]);
    assert!(ids(&store, Category::Inbox).is_empty());
}

#[test]
fn tap_and_missed_drop_leave_store_alone() {
    let mut store = empty_store();
    let id = store.add_task(NewTask::new("stay")).unwrap();
    let layout = MatrixLayout::from_store(&store);
    let origin = layout.row(Zone::Inbox, 0);

    let mut drag = DragTracker::new();
    drag.start_drag(id, Zone::Inbox, 20.0, 20.0, origin);
    drag.move_to(22.0, 21.0, &layout);
    let tap = drag.release();
    assert_eq!(tap, DragOutcome::Tap { entity: id });
    assert!(!tap.apply_to(&mut store));

    drag.start_drag(id, Zone::Inbox, 20.0, 20.0, origin);
    drag.move_to(900.0, 900.0, &layout);
    let missed = drag.release();
    assert!(missed.should_reopen_inbox());
    assert!(!missed.apply_to(&mut store));
    assert_eq!(ids(&store, Category::Inbox), vec![id]);
}

#[test]
fn swipe_reveal_snaps_with_row_width() {
    let mut swipe = SwipeTracker::new(80.0);
    swipe.press(100.0, 10.0);
    swipe.move_to(148.0, 12.0);
    assert_eq!(swipe.release(), 80.0);

    swipe.press(100.0, 10.0);
    swipe.move_to(60.0, 10.0);
    assert_eq!(swipe.release(), 0.0);
}
