use crate::{
    config::Config,
    event::{EventHandle, TaskKind},
    executor::Scheduler,
    task::{Dependencies, Task},
};

/// Finishes once every joined event is satisfied.
///
/// Usually created through [`Scheduler::join`].
#[derive(Debug)]
pub struct JoinTask {
    dependencies: Dependencies,
}

impl JoinTask {
    /// Join of `handles`.
    pub fn new(handles: impl IntoIterator<Item = EventHandle>) -> Self {
        Self {
            dependencies: Dependencies::on(handles),
        }
    }
}

impl<C: Config> Task<C> for JoinTask {
    fn kind(&self) -> TaskKind {
        TaskKind::LogicalAnd
    }

    fn advance(&mut self, scheduler: &mut Scheduler<C>) -> bool {
        self.dependencies.is_satisfied(scheduler)
    }

    fn describe(&self) -> String {
        let pending: Vec<_> = self
            .dependencies
            .pending()
            .iter()
            .map(ToString::to_string)
            .collect();
        format!("join of [{}]", pending.join(", "))
    }
}
