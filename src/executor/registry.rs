use crate::{config::Config, event::TaskKind, task::Task, types::{IndexMap, TaskId}};
use core::fmt;

/// Live tasks in creation order.
pub(super) struct Registry<C: Config> {
    tasks: IndexMap<TaskId, Slot<C>>,
}

pub(super) struct Slot<C: Config> {
    pub(super) kind: TaskKind,
    /// `None` while the task is inside its own `advance`.
    pub(super) task: Option<Box<dyn Task<C>>>,
}

impl<C: Config> Registry<C> {
    pub(super) fn new() -> Self {
        Self {
            tasks: IndexMap::default(),
        }
    }

    pub(super) fn len(&self) -> usize {
        self.tasks.len()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub(super) fn insert(&mut self, id: TaskId, kind: TaskKind, task: Box<dyn Task<C>>) {
        let previous = self.tasks.insert(
            id,
            Slot {
                kind,
                task: Some(task),
            },
        );
        assert!(previous.is_none(), "Registry::insert: task #{id} registered twice");
    }

    pub(super) fn get(&self, id: TaskId) -> Option<&Slot<C>> {
        self.tasks.get(&id)
    }

    pub(super) fn get_mut(&mut self, id: TaskId) -> Option<&mut Slot<C>> {
        self.tasks.get_mut(&id)
    }

    /// Take the task at `index` out for polling. Its slot stays registered,
    /// so the task remains live for lookups made meanwhile.
    pub(super) fn take(&mut self, index: usize) -> Option<(TaskId, Box<dyn Task<C>>)> {
        let (&id, slot) = self.tasks.get_index_mut(index)?;
        let task = slot.task.take().expect("Registry::take: [1]");
        Some((id, task))
    }

    /// Put a polled task back into its slot.
    pub(super) fn restore(&mut self, index: usize, task: Box<dyn Task<C>>) {
        let (_, slot) = self.tasks.get_index_mut(index).expect("Registry::restore: [1]");
        assert!(slot.task.is_none(), "Registry::restore: [2]");
        slot.task = Some(task);
    }

    /// Unregister the slot at `index`, keeping the order of the rest.
    pub(super) fn remove(&mut self, index: usize) -> (TaskId, TaskKind) {
        let (id, slot) = self
            .tasks
            .shift_remove_index(index)
            .expect("Registry::remove: [1]");
        (id, slot.kind)
    }

    pub(super) fn iter(&self) -> impl Iterator<Item = (TaskId, &Slot<C>)> {
        self.tasks.iter().map(|(&id, slot)| (id, slot))
    }
}

impl<C: Config> Slot<C> {
    pub(super) fn describe(&self) -> String {
        self.task
            .as_ref()
            .map_or_else(|| format!("{} (being polled)", self.kind), |task| task.describe())
    }
}

impl<C: Config> fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.tasks.iter().map(|(id, slot)| (id, slot.describe())))
            .finish()
    }
}
