use crate::{event::EventHandle, types::{HashMap, TaskId}};
use derive_more::Debug;

type OneShot = Box<dyn FnOnce(EventHandle)>;
type Listener = Box<dyn FnMut(EventHandle)>;

/// Callbacks run in the publish step of a tick, right after a finished task
/// has been unregistered.
#[derive(Debug, Default)]
pub(super) struct Observers {
    #[debug("{} task(s) watched", one_shot.len())]
    one_shot: HashMap<TaskId, Vec<OneShot>>,
    #[debug("{} listener(s)", listeners.len())]
    listeners: Vec<Listener>,
}

impl Observers {
    pub(super) fn watch(&mut self, id: TaskId, callback: OneShot) {
        self.one_shot.entry(id).or_default().push(callback);
    }

    pub(super) fn listen(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub(super) fn publish(&mut self, finished: EventHandle) {
        if let Some(id) = finished.task_id() {
            for callback in self.one_shot.remove(&id).into_iter().flatten() {
                callback(finished);
            }
        }
        for listener in &mut self.listeners {
            listener(finished);
        }
    }
}
