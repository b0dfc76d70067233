// Cached, incrementally loaded list views over the store

use crate::error::Result;
use crate::events::TaskEvent;
use crate::models::{Partition, Task};
use crate::store::TaskStore;
use tracing::debug;
use uuid::Uuid;

/// One partition's cached slice of the store: the tasks materialized so
/// far, ascending by due date, plus the paging cursor.
#[derive(Debug, Default)]
struct PartitionState {
    items: Vec<Task>,
    loaded_offset: usize,
}

impl PartitionState {
    /// Insert preserving due-date order; ties go after existing equals,
    /// so repeated inserts stay stable.
    fn insert_sorted(&mut self, task: Task) {
        let at = self.items.partition_point(|t| t.due_date <= task.due_date);
        self.items.insert(at, task);
    }

    fn invalidate(&mut self) {
        self.items.clear();
        self.loaded_offset = 0;
    }
}

/// In-memory mirror of the store, split into complete and incomplete
/// lists that grow page by page as the UI asks for more.
///
/// The cached copies are not authoritative: this type reacts to the
/// store's [`TaskEvent`]s via [`apply`](Self::apply), and a `Cleared` or
/// `Imported` notification drops both caches entirely; repopulate with
/// [`reset`](Self::reset) and [`load_more`](Self::load_more).
#[derive(Debug, Default)]
pub struct TaskViewState {
    complete: PartitionState,
    incomplete: PartitionState,
}

impl TaskViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached tasks of one partition, ascending by due date.
    pub fn items(&self, partition: Partition) -> &[Task] {
        &self.state(partition).items
    }

    /// How many tasks have been fetched via paging for this partition.
    pub fn loaded_offset(&self, partition: Partition) -> usize {
        self.state(partition).loaded_offset
    }

    /// Drop both caches and rewind both paging cursors.
    pub fn reset(&mut self) {
        self.complete.invalidate();
        self.incomplete.invalidate();
    }

    /// Fetch the next page of one partition from the store and append it.
    /// Returns the number of tasks fetched; zero means the partition is
    /// fully loaded.
    pub fn load_more(
        &mut self,
        store: &TaskStore,
        partition: Partition,
        page_size: usize,
    ) -> Result<usize> {
        let offset = self.state(partition).loaded_offset;
        let page = store.page(partition.filter(), offset as u64, page_size as u64)?;

        let fetched = page.len();
        let state = self.state_mut(partition);
        state.loaded_offset += fetched;
        state.items.extend(page);

        debug!(?partition, fetched, offset = state.loaded_offset, "loaded page");
        Ok(fetched)
    }

    /// Fold one store notification into the cached lists.
    pub fn apply(&mut self, event: &TaskEvent) {
        match event {
            TaskEvent::Added(task) => self.on_added(task),
            TaskEvent::Edited(task) => self.on_edited(task),
            TaskEvent::Deleted(id) => self.on_deleted(*id),
            TaskEvent::Cleared | TaskEvent::Imported(_) => {
                debug!("store rewritten, invalidating both partitions");
                self.reset();
            }
        }
    }

    /// A newly created task becomes known without paging, so the paging
    /// cursor stays put; only the cached list grows.
    fn on_added(&mut self, task: &Task) {
        self.state_mut(task.partition()).insert_sorted(task.clone());
    }

    fn on_edited(&mut self, task: &Task) {
        let Some((held_in, at)) = self.locate(task.id) else {
            // beyond the loaded window, nothing cached to update
            return;
        };

        let target = task.partition();
        let in_place = held_in == target && self.state(held_in).items[at].due_date == task.due_date;
        if in_place {
            self.state_mut(held_in).items[at] = task.clone();
        } else {
            // completion flipped or the due date moved: re-home at the
            // sorted position in the right partition
            self.state_mut(held_in).items.remove(at);
            self.state_mut(target).insert_sorted(task.clone());
        }
    }

    fn on_deleted(&mut self, id: Uuid) {
        if let Some((partition, at)) = self.locate(id) {
            self.state_mut(partition).items.remove(at);
        }
    }

    fn locate(&self, id: Uuid) -> Option<(Partition, usize)> {
        for partition in [Partition::Incomplete, Partition::Complete] {
            if let Some(at) = self.state(partition).items.iter().position(|t| t.id == id) {
                return Some((partition, at));
            }
        }
        None
    }

    fn state(&self, partition: Partition) -> &PartitionState {
        match partition {
            Partition::Complete => &self.complete,
            Partition::Incomplete => &self.incomplete,
        }
    }

    fn state_mut(&mut self, partition: Partition) -> &mut PartitionState {
        match partition {
            Partition::Complete => &mut self.complete,
            Partition::Incomplete => &mut self.incomplete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewTask;
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn seed(store: &mut TaskStore, description: &str, due: &str, complete: bool) -> Task {
        store
            .create(NewTask {
                description: description.to_string(),
                due_date: Some(date(due)),
                complete,
                ..NewTask::default()
            })
            .unwrap()
    }

    fn descriptions(view: &TaskViewState, partition: Partition) -> Vec<String> {
        view.items(partition).iter().map(|t| t.description.clone()).collect()
    }

    #[test]
    fn test_load_more_pages_until_exhausted() {
        let mut store = TaskStore::open_in_memory().unwrap();
        for i in 0..7 {
            seed(&mut store, &format!("t{i}"), "2024-01-01", false);
        }

        let mut view = TaskViewState::new();
        assert_eq!(view.load_more(&store, Partition::Incomplete, 3).unwrap(), 3);
        assert_eq!(view.load_more(&store, Partition::Incomplete, 3).unwrap(), 3);
        assert_eq!(view.load_more(&store, Partition::Incomplete, 3).unwrap(), 1);
        assert_eq!(view.load_more(&store, Partition::Incomplete, 3).unwrap(), 0);

        assert_eq!(view.items(Partition::Incomplete).len(), 7);
        assert_eq!(view.loaded_offset(Partition::Incomplete), 7);
        assert!(view.items(Partition::Complete).is_empty());
    }

    #[test]
    fn test_load_more_keeps_ascending_order_across_pages() {
        let mut store = TaskStore::open_in_memory().unwrap();
        seed(&mut store, "march", "2024-03-01", false);
        seed(&mut store, "january", "2024-01-01", false);
        seed(&mut store, "february", "2024-02-01", false);

        let mut view = TaskViewState::new();
        view.load_more(&store, Partition::Incomplete, 2).unwrap();
        view.load_more(&store, Partition::Incomplete, 2).unwrap();

        assert_eq!(
            descriptions(&view, Partition::Incomplete),
            ["january", "february", "march"]
        );
    }

    #[test]
    fn test_reset_clears_items_and_offsets() {
        let mut store = TaskStore::open_in_memory().unwrap();
        seed(&mut store, "a", "2024-01-01", false);

        let mut view = TaskViewState::new();
        view.load_more(&store, Partition::Incomplete, 10).unwrap();
        view.reset();

        assert!(view.items(Partition::Incomplete).is_empty());
        assert_eq!(view.loaded_offset(Partition::Incomplete), 0);
    }

    #[test]
    fn test_added_inserts_at_sorted_position_without_moving_cursor() {
        let mut store = TaskStore::open_in_memory().unwrap();
        seed(&mut store, "early", "2024-01-01", false);
        seed(&mut store, "late", "2024-03-01", false);

        let mut view = TaskViewState::new();
        view.load_more(&store, Partition::Incomplete, 10).unwrap();
        let offset_before = view.loaded_offset(Partition::Incomplete);

        let added = seed(&mut store, "middle", "2024-02-01", false);
        view.apply(&TaskEvent::Added(added));

        assert_eq!(descriptions(&view, Partition::Incomplete), ["early", "middle", "late"]);
        assert_eq!(view.loaded_offset(Partition::Incomplete), offset_before);
    }

    #[test]
    fn test_added_tie_goes_after_existing_equal_dates() {
        let mut store = TaskStore::open_in_memory().unwrap();
        let first = seed(&mut store, "first", "2024-01-01", false);

        let mut view = TaskViewState::new();
        view.apply(&TaskEvent::Added(first));
        let second = seed(&mut store, "second", "2024-01-01", false);
        view.apply(&TaskEvent::Added(second));

        assert_eq!(descriptions(&view, Partition::Incomplete), ["first", "second"]);
    }

    #[test]
    fn test_edited_updates_in_place() {
        let mut store = TaskStore::open_in_memory().unwrap();
        let mut task = seed(&mut store, "before", "2024-01-01", false);

        let mut view = TaskViewState::new();
        view.load_more(&store, Partition::Incomplete, 10).unwrap();

        task.description = "after".to_string();
        view.apply(&TaskEvent::Edited(task));

        assert_eq!(descriptions(&view, Partition::Incomplete), ["after"]);
    }

    #[test]
    fn test_edited_completion_flip_moves_between_partitions() {
        let mut store = TaskStore::open_in_memory().unwrap();
        let mut task = seed(&mut store, "task", "2024-01-01", false);
        seed(&mut store, "done early", "2023-12-01", true);
        seed(&mut store, "done late", "2024-02-01", true);

        let mut view = TaskViewState::new();
        view.load_more(&store, Partition::Incomplete, 10).unwrap();
        view.load_more(&store, Partition::Complete, 10).unwrap();

        task.complete = true;
        view.apply(&TaskEvent::Edited(task));

        assert!(view.items(Partition::Incomplete).is_empty());
        assert_eq!(
            descriptions(&view, Partition::Complete),
            ["done early", "task", "done late"]
        );
    }

    #[test]
    fn test_edited_due_date_change_repositions() {
        let mut store = TaskStore::open_in_memory().unwrap();
        let mut task = seed(&mut store, "moving", "2024-01-01", false);
        seed(&mut store, "anchor", "2024-02-01", false);

        let mut view = TaskViewState::new();
        view.load_more(&store, Partition::Incomplete, 10).unwrap();
        assert_eq!(descriptions(&view, Partition::Incomplete), ["moving", "anchor"]);

        task.due_date = date("2024-03-01");
        view.apply(&TaskEvent::Edited(task));

        assert_eq!(descriptions(&view, Partition::Incomplete), ["anchor", "moving"]);
    }

    #[test]
    fn test_edited_unloaded_task_is_noop() {
        let mut store = TaskStore::open_in_memory().unwrap();
        let task = seed(&mut store, "never loaded", "2024-01-01", false);

        let mut view = TaskViewState::new();
        view.apply(&TaskEvent::Edited(task));

        assert!(view.items(Partition::Incomplete).is_empty());
    }

    #[test]
    fn test_deleted_removes_from_holding_partition() {
        let mut store = TaskStore::open_in_memory().unwrap();
        let doomed = seed(&mut store, "doomed", "2024-01-01", false);
        seed(&mut store, "kept", "2024-01-02", false);

        let mut view = TaskViewState::new();
        view.load_more(&store, Partition::Incomplete, 10).unwrap();
        view.apply(&TaskEvent::Deleted(doomed.id));

        assert_eq!(descriptions(&view, Partition::Incomplete), ["kept"]);
    }

    #[test]
    fn test_cleared_and_imported_invalidate_both_partitions() {
        let mut store = TaskStore::open_in_memory().unwrap();
        seed(&mut store, "a", "2024-01-01", false);
        seed(&mut store, "b", "2024-01-01", true);

        let mut view = TaskViewState::new();
        view.load_more(&store, Partition::Incomplete, 10).unwrap();
        view.load_more(&store, Partition::Complete, 10).unwrap();

        view.apply(&TaskEvent::Imported(3));
        assert!(view.items(Partition::Incomplete).is_empty());
        assert!(view.items(Partition::Complete).is_empty());
        assert_eq!(view.loaded_offset(Partition::Incomplete), 0);

        view.load_more(&store, Partition::Incomplete, 10).unwrap();
        view.apply(&TaskEvent::Cleared);
        assert!(view.items(Partition::Incomplete).is_empty());
    }

    #[test]
    fn test_view_subscribed_to_store_tracks_mutations() {
        let mut store = TaskStore::open_in_memory().unwrap();
        let view = Rc::new(RefCell::new(TaskViewState::new()));

        let sink = Rc::clone(&view);
        store.events().subscribe(move |ev| sink.borrow_mut().apply(ev));

        let mut task = store
            .create(NewTask {
                description: "wired".to_string(),
                due_date: Some(date("2024-01-01")),
                ..NewTask::default()
            })
            .unwrap();
        assert_eq!(descriptions(&view.borrow(), Partition::Incomplete), ["wired"]);

        task.complete = true;
        store.update(&task).unwrap();
        assert!(view.borrow().items(Partition::Incomplete).is_empty());
        assert_eq!(descriptions(&view.borrow(), Partition::Complete), ["wired"]);

        store.delete(task.id).unwrap();
        assert!(view.borrow().items(Partition::Complete).is_empty());

        store.clear().unwrap();
        assert_eq!(view.borrow().loaded_offset(Partition::Complete), 0);
    }
}
