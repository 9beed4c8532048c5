use core::fmt::Display;

/// Terminates the run after an unrecoverable device or network failure.
///
/// A failed operation leaves its dependents stalled forever, so there is no
/// state worth continuing from.
#[cold]
#[track_caller]
pub(crate) fn fatal(origin: &str, err: impl Display) -> ! {
    tracing::error!(origin, error = %err, "unrecoverable failure, aborting run");
    panic!("{origin}: {err}");
}
