use tracing::{debug, warn};

/// Proof that a fetch was started by a particular [`FormSession::begin_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

/// What a fetch produced.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome<F> {
    Loaded(F),
    NotFound,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<F> {
    Idle,
    Loading,
    Loaded(F),
    NotFound,
    Failed(String),
}

/// Holds whatever a form is currently showing and guards it against
/// responses that arrive out of order.
///
/// Every [`begin_load`](Self::begin_load) invalidates the tickets handed out
/// before it, and so does [`close`](Self::close). A late response presented
/// with an old ticket is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSession<F> {
    generation: u64,
    open: bool,
    state: LoadState<F>,
}

impl<F> Default for FormSession<F> {
    fn default() -> Self {
        Self {
            generation: 0,
            open: true,
            state: LoadState::Idle,
        }
    }
}

impl<F> FormSession<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.open = true;
        self.state = LoadState::Loading;
        debug!(generation = self.generation, "load started");
        LoadTicket {
            generation: self.generation,
        }
    }

    pub fn is_current(
        &self,
        ticket: LoadTicket,
    ) -> bool {
        self.open && ticket.generation == self.generation
    }

    /// Applies `outcome` if `ticket` is still current. Returns whether it was
    /// applied.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        outcome: LoadOutcome<F>,
    ) -> bool {
        if !self.is_current(ticket) {
            warn!(
                ticket = ticket.generation,
                current = self.generation,
                open = self.open,
                "discarding stale load result"
            );
            return false;
        }
        self.state = match outcome {
            LoadOutcome::Loaded(form) => LoadState::Loaded(form),
            LoadOutcome::NotFound => LoadState::NotFound,
            LoadOutcome::Failed(message) => LoadState::Failed(message),
        };
        true
    }

    pub fn close(&mut self) {
        self.generation += 1;
        self.open = false;
        self.state = LoadState::Idle;
    }

    pub fn state(&self) -> &LoadState<F> {
        &self.state
    }

    pub fn form(&self) -> Option<&F> {
        match &self.state {
            LoadState::Loaded(form) => Some(form),
            _ => None,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut F> {
        match &mut self.state {
            LoadState::Loaded(form) => Some(form),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn current_ticket_is_applied() {
        let mut session = FormSession::new();
        let ticket = session.begin_load();

        assert_eq!(session.state(), &LoadState::Loading);
        assert!(session.finish_load(ticket, LoadOutcome::Loaded("a")));
        assert_eq!(session.form(), Some(&"a"));
    }

    #[test]
    fn earlier_response_cannot_overwrite_later_one() {
        let mut session = FormSession::new();
        let first = session.begin_load();
        let second = session.begin_load();

        assert!(session.finish_load(second, LoadOutcome::Loaded("second")));
        assert!(!session.finish_load(first, LoadOutcome::Loaded("first")));

        assert_eq!(session.form(), Some(&"second"));
    }

    #[test]
    fn stale_failure_is_ignored_while_newer_load_pending() {
        let mut session: FormSession<&str> = FormSession::new();
        let first = session.begin_load();
        let _second = session.begin_load();

        assert!(!session.finish_load(first, LoadOutcome::Failed("boom".to_string())));
        assert_eq!(session.state(), &LoadState::Loading);
    }

    #[test]
    fn response_after_close_is_dropped() {
        let mut session = FormSession::new();
        let ticket = session.begin_load();
        session.close();

        assert!(!session.finish_load(ticket, LoadOutcome::Loaded(1)));
        assert_eq!(session.state(), &LoadState::Idle);
        assert_eq!(session.form(), None);
    }

    #[test]
    fn not_found_and_failure_are_recorded() {
        let mut session: FormSession<u8> = FormSession::new();
        let ticket = session.begin_load();
        session.finish_load(ticket, LoadOutcome::NotFound);
        assert_eq!(session.state(), &LoadState::NotFound);

        let ticket = session.begin_load();
        session.finish_load(ticket, LoadOutcome::Failed("offline".to_string()));
        assert_eq!(session.state(), &LoadState::Failed("offline".to_string()));
    }

    #[test]
    fn reopening_after_close_issues_fresh_tickets() {
        let mut session = FormSession::new();
        let old = session.begin_load();
        session.close();
        let fresh = session.begin_load();

        assert!(!session.is_current(old));
        assert!(session.finish_load(fresh, LoadOutcome::Loaded(5)));
        if let Some(value) = session.form_mut() {
            *value += 1;
        }
        assert_eq!(session.form(), Some(&6));
    }
}
