use serde::Serialize;

/// Where the batch processor stands. Indices point into the instruction list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "index", rename_all = "snake_case")]
pub enum BatchState {
    Idle,
    Loading(usize),
    Building(usize),
    Submitting(usize),
    Succeeded(usize),
    Failed(usize),
    Done,
}

/// What the last step produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchEvent {
    Start,
    Loaded,
    Built,
    Accepted,
    Errored,
    Advance,
}

impl BatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchState::Done)
    }
}

/// Pure transition function for a batch of `total` payments.
///
/// Any error while loading, building or submitting moves to `Failed`, and
/// `Failed` only ever advances to `Done`. Pairs that cannot happen also end
/// in `Done` so a driver can never spin.
pub fn transition(state: BatchState, event: BatchEvent, total: usize) -> BatchState {
    use self::BatchEvent as E;
    use self::BatchState as S;

    match (state, event) {
        (S::Idle, E::Start) if total == 0 => S::Done,
        (S::Idle, E::Start) => S::Loading(0),
        (S::Loading(i), E::Loaded) => S::Building(i),
        (S::Building(i), E::Built) => S::Submitting(i),
        (S::Submitting(i), E::Accepted) => S::Succeeded(i),
        (S::Loading(i) | S::Building(i) | S::Submitting(i), E::Errored) => S::Failed(i),
        (S::Succeeded(i), E::Advance) if i + 1 < total => S::Loading(i + 1),
        (S::Succeeded(_), E::Advance) => S::Done,
        (S::Failed(_), E::Advance) => S::Done,
        _ => S::Done,
    }
}
