use std::option::IntoIter as OptionIter;

use super::{Completed, Task};

/// An executor flavor which carries out every task on the
/// current thread in sequential order.
pub struct Current;

impl Current {
    #[inline]
    pub(super) fn new() -> Self {
        Self
    }

    #[must_use]
    pub(super) fn dispatch(&self, task: Task) -> OptionIter<Completed> {
        Some(task.process()).into_iter()
    }
}
