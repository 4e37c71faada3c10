//! Setup actions produced by scenario parsing.

use std::collections::VecDeque;

/// A single parsed setup instruction (create a network, a node, ...).
///
/// Actions are executed exactly once during bootstrapping, in the order
/// they were parsed, and consumed by the call. The scheduler never inspects
/// what an action did.
pub trait Action<Ctx: ?Sized> {
    /// Executes the action against the setup context.
    fn run(self: Box<Self>, ctx: &mut Ctx);

    /// Short name used in log messages.
    fn name(&self) -> &'static str;
}

/// Ordered (FIFO) queue of setup actions.
pub struct ActionQueue<Ctx: ?Sized> {
    actions: VecDeque<Box<dyn Action<Ctx>>>,
}

impl<Ctx: ?Sized> ActionQueue<Ctx> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            actions: VecDeque::new(),
        }
    }

    /// Appends an action at the back of the queue.
    pub fn push(&mut self, action: Box<dyn Action<Ctx>>) {
        self.actions.push_back(action);
    }

    /// Appends every action from `other`, preserving order.
    pub fn append(&mut self, other: &mut ActionQueue<Ctx>) {
        self.actions.append(&mut other.actions);
    }

    /// Removes the oldest action.
    pub fn pop(&mut self) -> Option<Box<dyn Action<Ctx>>> {
        self.actions.pop_front()
    }

    /// Returns the number of queued actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns true if no actions are queued.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Runs every queued action first to last, leaving the queue empty.
    ///
    /// Returns the number of actions executed.
    pub fn run_all(&mut self, ctx: &mut Ctx) -> usize {
        let mut executed = 0;
        while let Some(action) = self.pop() {
            action.run(ctx);
            executed += 1;
        }
        executed
    }
}

impl<Ctx: ?Sized> Default for ActionQueue<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx: ?Sized> std::fmt::Debug for ActionQueue<Ctx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.actions.iter().map(|a| a.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Record(&'static str);

    impl Action<Vec<&'static str>> for Record {
        fn run(self: Box<Self>, log: &mut Vec<&'static str>) {
            log.push(self.0);
        }

        fn name(&self) -> &'static str {
            "record"
        }
    }

    #[test]
    fn test_actions_run_in_parse_order() {
        let mut queue = ActionQueue::new();
        queue.push(Box::new(Record("network")));
        queue.push(Box::new(Record("node")));
        queue.push(Box::new(Record("application")));

        let mut log = Vec::new();
        let executed = queue.run_all(&mut log);

        assert_eq!(executed, 3);
        assert_eq!(log, vec!["network", "node", "application"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_append_preserves_order() {
        let mut first = ActionQueue::new();
        first.push(Box::new(Record("a")));
        let mut second = ActionQueue::new();
        second.push(Box::new(Record("b")));

        first.append(&mut second);
        assert_eq!(first.len(), 2);
        assert!(second.is_empty());

        let mut log = Vec::new();
        first.run_all(&mut log);
        assert_eq!(log, vec!["a", "b"]);
    }
}
