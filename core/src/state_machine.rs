//! Finite-state executor shared by the level and unit controllers.

use std::{collections::HashMap, fmt, hash::Hash};

/// Closed set of states a [`StateMachine`] moves between.
pub trait MachineState: Copy + Eq + Hash + fmt::Debug {
    /// Rank used to arbitrate competing transition proposals; lower wins.
    fn priority(self) -> u32;
}

/// Callback bundle attached to a single state.
///
/// Every hook is optional. A transition hook returning `None` declines to
/// leave the state.
pub struct StateInfo<S, C> {
    /// Invoked once when the state becomes current.
    pub entry: Option<fn(&mut C)>,
    /// Invoked on every run while the state is current.
    pub body: Option<fn(&mut C)>,
    /// Proposes the next state, if any.
    pub transition: Option<fn(&mut C) -> Option<S>>,
    /// Invoked on the run that decides to leave the state.
    pub exit: Option<fn(&mut C)>,
}

impl<S, C> StateInfo<S, C> {
    /// Bundle without any hooks.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entry: None,
            body: None,
            transition: None,
            exit: None,
        }
    }

    /// Attaches an entry hook.
    #[must_use]
    pub fn entry(mut self, hook: fn(&mut C)) -> Self {
        self.entry = Some(hook);
        self
    }

    /// Attaches a body hook.
    #[must_use]
    pub fn body(mut self, hook: fn(&mut C)) -> Self {
        self.body = Some(hook);
        self
    }

    /// Attaches a transition hook.
    #[must_use]
    pub fn transition(mut self, hook: fn(&mut C) -> Option<S>) -> Self {
        self.transition = Some(hook);
        self
    }

    /// Attaches an exit hook.
    #[must_use]
    pub fn exit(mut self, hook: fn(&mut C)) -> Self {
        self.exit = Some(hook);
        self
    }
}

impl<S, C> Default for StateInfo<S, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, C> Clone for StateInfo<S, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, C> Copy for StateInfo<S, C> {}

impl<S, C> fmt::Debug for StateInfo<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateInfo")
            .field("entry", &self.entry.is_some())
            .field("body", &self.body.is_some())
            .field("transition", &self.transition.is_some())
            .field("exit", &self.exit.is_some())
            .finish()
    }
}

/// Runs registered callback bundles against a context `C` once per step.
///
/// A run first enters the pending state if it differs from the current one,
/// then invokes bodies, gathers transition proposals and, when leaving,
/// invokes exits. The new state becomes current on the following run.
pub struct StateMachine<S, C> {
    current: Option<S>,
    next: Option<S>,
    states: HashMap<S, Vec<StateInfo<S, C>>>,
}

impl<S: MachineState, C> StateMachine<S, C> {
    /// Creates a machine without states.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: None,
            next: None,
            states: HashMap::new(),
        }
    }

    /// Registers another bundle for `state`, after any existing ones.
    pub fn add_state(&mut self, state: S, info: StateInfo<S, C>) {
        self.states.entry(state).or_default().push(info);
    }

    /// Seeds the state entered on the next run.
    pub fn set_initial_state(&mut self, state: S) {
        self.next = Some(state);
    }

    /// State whose bodies ran last, if any run happened.
    #[must_use]
    pub fn current(&self) -> Option<S> {
        self.current
    }

    /// State that becomes current on the next run.
    #[must_use]
    pub fn pending(&self) -> Option<S> {
        self.next
    }

    /// Executes one step against `context`.
    pub fn run(&mut self, context: &mut C) {
        if self.current != self.next {
            self.current = self.next;
            if let Some(infos) = self.current.and_then(|state| self.states.get(&state)) {
                for entry in infos.iter().filter_map(|info| info.entry) {
                    entry(context);
                }
            }
        }

        let Some(current) = self.current else {
            return;
        };
        let Some(infos) = self.states.get(&current) else {
            return;
        };

        for body in infos.iter().filter_map(|info| info.body) {
            body(context);
        }

        let mut chosen: Option<S> = None;
        for transition in infos.iter().filter_map(|info| info.transition) {
            if let Some(proposal) = transition(context) {
                chosen = match chosen {
                    Some(best) if best.priority() <= proposal.priority() => Some(best),
                    _ => Some(proposal),
                };
            }
        }

        match chosen {
            Some(next) if next != current => {
                for exit in infos.iter().filter_map(|info| info.exit) {
                    exit(context);
                }
                self.next = Some(next);
            }
            _ => self.next = Some(current),
        }
    }
}

impl<S: MachineState, C> Default for StateMachine<S, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: MachineState, C> fmt::Debug for StateMachine<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current)
            .field("next", &self.next)
            .field("states", &self.states.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Phase {
        Start,
        Left,
        Right,
    }

    impl MachineState for Phase {
        fn priority(self) -> u32 {
            match self {
                Phase::Start => 0,
                Phase::Right => 1,
                Phase::Left => 2,
            }
        }
    }

    #[derive(Debug, Default)]
    struct Journal {
        calls: Vec<&'static str>,
        propose: bool,
    }

    #[test]
    fn lower_priority_value_wins_between_bundles() {
        let mut machine = StateMachine::new();
        machine.add_state(Phase::Start, StateInfo::new().transition(propose_left));
        machine.add_state(Phase::Start, StateInfo::new().transition(propose_right));
        machine.set_initial_state(Phase::Start);

        let mut journal = Journal {
            propose: true,
            ..Journal::default()
        };
        machine.run(&mut journal);
        assert_eq!(machine.current(), Some(Phase::Start));
        assert_eq!(machine.pending(), Some(Phase::Right));

        machine.run(&mut journal);
        assert_eq!(machine.current(), Some(Phase::Right));
    }

    #[test]
    fn declining_bundles_keep_the_current_state() {
        let mut machine = StateMachine::new();
        machine.add_state(Phase::Start, StateInfo::new().transition(propose_left));
        machine.set_initial_state(Phase::Start);

        let mut journal = Journal::default();
        for _ in 0..3 {
            machine.run(&mut journal);
            assert_eq!(machine.current(), Some(Phase::Start));
        }
    }

    #[test]
    fn hooks_run_in_step_order() {
        let mut machine = StateMachine::new();
        machine.add_state(
            Phase::Start,
            StateInfo::new()
                .entry(|journal: &mut Journal| journal.calls.push("start.entry"))
                .body(|journal: &mut Journal| journal.calls.push("start.body"))
                .transition(propose_left)
                .exit(|journal: &mut Journal| journal.calls.push("start.exit")),
        );
        machine.add_state(
            Phase::Start,
            StateInfo::new().entry(|journal: &mut Journal| journal.calls.push("start.entry2")),
        );
        machine.add_state(
            Phase::Left,
            StateInfo::new()
                .entry(|journal: &mut Journal| journal.calls.push("left.entry"))
                .body(|journal: &mut Journal| journal.calls.push("left.body")),
        );
        machine.set_initial_state(Phase::Start);

        let mut journal = Journal {
            propose: true,
            ..Journal::default()
        };
        machine.run(&mut journal);
        machine.run(&mut journal);
        machine.run(&mut journal);

        assert_eq!(
            journal.calls,
            vec![
                "start.entry",
                "start.entry2",
                "start.body",
                "start.exit",
                "left.entry",
                "left.body",
                "left.body",
            ]
        );
    }

    #[test]
    fn unseeded_machine_is_inert() {
        let mut machine: StateMachine<Phase, Journal> = StateMachine::new();
        machine.add_state(
            Phase::Start,
            StateInfo::new().body(|journal: &mut Journal| journal.calls.push("body")),
        );
        let mut journal = Journal::default();
        machine.run(&mut journal);
        assert_eq!(machine.current(), None);
        assert!(journal.calls.is_empty());
    }

    fn propose_left(journal: &mut Journal) -> Option<Phase> {
        journal.propose.then_some(Phase::Left)
    }

    fn propose_right(journal: &mut Journal) -> Option<Phase> {
        journal.propose.then_some(Phase::Right)
    }
}
