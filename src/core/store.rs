//! Client-side cache of the user's task collection.
//!
//! Every mutation is confirmed by the server before it touches the local
//! collection; a failed request leaves the collection exactly as it was.
//! The store is split into `begin_*` (decide what to send), [`execute`]
//! (send it) and [`TaskStore::settle`] (reconcile the answer) so that a UI
//! event loop can run the request in the background. The one-shot async
//! methods (`refresh`, `add`, `toggle`, `remove`) chain the three steps.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use chrono::{DateTime, Local};

use super::projection::ViewState;
use super::task::{Task, TaskId, TaskTitle};
use crate::error::TaskError;
use crate::remote::TaskRemote;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePhase {
    /// No list has succeeded yet.
    Empty,
    Loaded,
    Pending { in_flight: usize },
}

/// A remote call the store wants made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    List,
    Create(TaskTitle),
    SetCompleted { id: TaskId, completed: bool },
    Delete(TaskId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Listed(Vec<Task>),
    Created(Task),
    Updated(Task),
    Deleted,
}

/// A request tagged with the store generation that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
    seq: u64,
    request: Request,
}

impl Ticket {
    pub fn request(&self) -> &Request {
        &self.request
    }
}

/// A ticket together with what the server said about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub ticket: Ticket,
    pub outcome: Result<Response, TaskError>,
}

/// What happened when a completion was reconciled.
#[derive(Debug, Default, PartialEq)]
pub struct Settled {
    /// Failures to show the user. Empty on success.
    pub errors: Vec<TaskError>,
    /// Queued requests released by this completion; the caller must execute them.
    pub follow_up: Vec<Ticket>,
    /// The result belonged to a detached generation or an outdated list and was dropped.
    pub discarded: bool,
}

impl Settled {
    fn discarded() -> Self {
        Self {
            discarded: true,
            ..Self::default()
        }
    }

    pub fn first_error(&self) -> Option<&TaskError> {
        self.errors.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Toggle,
    Remove,
}

/// A mutation the server has accepted, kept so an older list can't undo it.
#[derive(Debug, Clone)]
enum Confirmed {
    Created(Task),
    Updated(Task),
    Deleted(TaskId),
}

/// Send a ticket's request to the backend.
pub async fn execute<R: TaskRemote>(remote: &R, ticket: Ticket) -> Completion {
    let outcome = match &ticket.request {
        Request::List => remote.list_tasks().await.map(Response::Listed),
        Request::Create(title) => remote.create_task(title).await.map(Response::Created),
        Request::SetCompleted { id, completed } => remote
            .set_completed(id, *completed)
            .await
            .map(Response::Updated),
        Request::Delete(id) => remote.delete_task(id).await.map(|_| Response::Deleted),
    };
    Completion { ticket, outcome }
}

#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    loaded: bool,
    epoch: u64,
    next_seq: u64,
    /// Sequence number of the newest list that has been applied.
    applied_list_seq: Option<u64>,
    in_flight: usize,
    /// Ids with a toggle/remove in flight, each with the intents queued behind it.
    busy: HashMap<TaskId, VecDeque<Intent>>,
    /// Unsettled lists by seq, each with the confirmation mark current when it was issued.
    pending_lists: BTreeMap<u64, u64>,
    /// Mutations confirmed while a list was outstanding, tagged with their mark.
    confirmed: VecDeque<(u64, Confirmed)>,
    next_mark: u64,
    needs_refresh: bool,
    last_synced: Option<DateTime<Local>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn view(&self, view: &ViewState) -> Vec<&Task> {
        view.apply(&self.tasks)
    }

    pub fn phase(&self) -> StorePhase {
        if !self.loaded {
            StorePhase::Empty
        } else if self.in_flight > 0 {
            StorePhase::Pending {
                in_flight: self.in_flight,
            }
        } else {
            StorePhase::Loaded
        }
    }

    /// A toggle or remove for `id` has not settled yet.
    pub fn is_busy(&self, id: &TaskId) -> bool {
        self.busy.contains_key(id)
    }

    /// The server reported an id this store still shows.
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    pub fn last_synced(&self) -> Option<DateTime<Local>> {
        self.last_synced
    }

    /// Stop accepting results for requests issued so far. The collection is kept.
    pub fn detach(&mut self) {
        self.epoch += 1;
        self.in_flight = 0;
        self.busy.clear();
        self.pending_lists.clear();
        self.confirmed.clear();
        log::debug!("Task store detached, now at epoch {}", self.epoch);
    }

    /// Detach and forget the collection (logout).
    pub fn reset(&mut self) {
        self.detach();
        self.tasks.clear();
        self.loaded = false;
        self.applied_list_seq = None;
        self.needs_refresh = false;
        self.last_synced = None;
    }

    fn ticket(&mut self, request: Request) -> Ticket {
        let seq = self.next_seq;
        self.next_seq += 1;
        Ticket {
            epoch: self.epoch,
            seq,
            request,
        }
    }

    pub fn begin_refresh(&mut self) -> Ticket {
        let ticket = self.ticket(Request::List);
        self.pending_lists.insert(ticket.seq, self.next_mark);
        ticket
    }

    /// Blank titles fail here and never reach the server.
    pub fn begin_add(&mut self, title: &str) -> Result<Ticket, TaskError> {
        let title = TaskTitle::parse(title)?;
        self.in_flight += 1;
        Ok(self.ticket(Request::Create(title)))
    }

    /// `Ok(None)` means the toggle was queued behind a request already in
    /// flight for the same task.
    pub fn begin_toggle(&mut self, id: &TaskId) -> Result<Option<Ticket>, TaskError> {
        self.begin_intent(id, Intent::Toggle)
    }

    /// `Ok(None)` means the removal was queued behind a request already in
    /// flight for the same task.
    pub fn begin_remove(&mut self, id: &TaskId) -> Result<Option<Ticket>, TaskError> {
        self.begin_intent(id, Intent::Remove)
    }

    fn begin_intent(&mut self, id: &TaskId, intent: Intent) -> Result<Option<Ticket>, TaskError> {
        if self.get(id).is_none() {
            return Err(TaskError::NotFound(id.clone()));
        }
        if let Some(queue) = self.busy.get_mut(id) {
            queue.push_back(intent);
            log::debug!("Queued {:?} for task {} ({} waiting)", intent, id, queue.len());
            return Ok(None);
        }
        self.busy.insert(id.clone(), VecDeque::new());
        self.issue(id, intent).map(Some)
    }

    /// Build the request for `intent` from the task's current state.
    fn issue(&mut self, id: &TaskId, intent: Intent) -> Result<Ticket, TaskError> {
        let request = match (intent, self.get(id)) {
            (_, None) => return Err(TaskError::NotFound(id.clone())),
            (Intent::Toggle, Some(task)) => Request::SetCompleted {
                id: id.clone(),
                completed: !task.completed,
            },
            (Intent::Remove, Some(_)) => Request::Delete(id.clone()),
        };
        self.in_flight += 1;
        Ok(self.ticket(request))
    }

    /// Apply a completed request to the collection.
    pub fn settle(&mut self, completion: Completion) -> Settled {
        let Completion { ticket, outcome } = completion;

        if ticket.epoch != self.epoch {
            log::debug!("Dropping result of {:?} from epoch {}", ticket.request, ticket.epoch);
            return Settled::discarded();
        }

        let mut settled = Settled::default();

        match ticket.request {
            Request::List => {
                let mark = self.pending_lists.remove(&ticket.seq).unwrap_or(self.next_mark);
                if self.applied_list_seq.is_some_and(|applied| applied > ticket.seq) {
                    log::debug!("Dropping list #{} older than applied list", ticket.seq);
                    self.prune_confirmed();
                    return Settled::discarded();
                }
                match outcome {
                    Ok(Response::Listed(tasks)) => {
                        self.replace_all(tasks);
                        self.applied_list_seq = Some(ticket.seq);
                        self.replay_confirmed(mark);
                    }
                    Ok(other) => settled.errors.push(mismatch(&other)),
                    Err(e) => settled.errors.push(e),
                }
                self.prune_confirmed();
            }
            Request::Create(_) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                match outcome {
                    Ok(Response::Created(task)) => {
                        log::info!("Created task {}", task.id);
                        self.confirm(Confirmed::Created(task));
                    }
                    Ok(other) => settled.errors.push(mismatch(&other)),
                    Err(e) => settled.errors.push(e),
                }
            }
            Request::SetCompleted { id, .. } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                match outcome {
                    Ok(Response::Updated(task)) => self.confirm(Confirmed::Updated(task)),
                    Ok(other) => settled.errors.push(mismatch(&other)),
                    Err(e) => settled.errors.push(e),
                }
                self.release(&id, &mut settled);
            }
            Request::Delete(id) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                match outcome {
                    Ok(Response::Deleted) => {
                        log::info!("Removed task {}", id);
                        self.confirm(Confirmed::Deleted(id.clone()));
                    }
                    Ok(other) => settled.errors.push(mismatch(&other)),
                    Err(e) => settled.errors.push(e),
                }
                self.release(&id, &mut settled);
            }
        }

        if settled.errors.iter().any(TaskError::suggests_refresh) {
            self.needs_refresh = true;
        }
        for e in &settled.errors {
            log::warn!("Task operation failed: {}", e);
        }

        settled
    }

    /// Hand out the next queued intent for `id`, or mark it idle.
    fn release(&mut self, id: &TaskId, settled: &mut Settled) {
        loop {
            let next = self.busy.get_mut(id).and_then(|q| q.pop_front());
            let Some(intent) = next else {
                self.busy.remove(id);
                return;
            };
            match self.issue(id, intent) {
                Ok(ticket) => {
                    settled.follow_up.push(ticket);
                    return;
                }
                Err(e) => settled.errors.push(e),
            }
        }
    }

    /// Apply a server-accepted mutation, remembering it while a list is outstanding.
    fn confirm(&mut self, change: Confirmed) {
        self.apply(&change);
        if !self.pending_lists.is_empty() {
            self.confirmed.push_back((self.next_mark, change));
        }
        self.next_mark += 1;
    }

    fn apply(&mut self, change: &Confirmed) {
        match change {
            Confirmed::Created(task) => self.prepend(task.clone()),
            Confirmed::Updated(task) => self.replace(task.clone()),
            Confirmed::Deleted(id) => self.tasks.retain(|t| &t.id != id),
        }
    }

    /// Reapply mutations confirmed after the list now being applied was issued.
    fn replay_confirmed(&mut self, since: u64) {
        let replay: Vec<Confirmed> = self
            .confirmed
            .iter()
            .filter(|(mark, _)| *mark >= since)
            .map(|(_, change)| change.clone())
            .collect();
        if !replay.is_empty() {
            log::debug!("Reapplying {} confirmed changes over list", replay.len());
        }
        for change in &replay {
            self.apply(change);
        }
    }

    /// Forget confirmations no outstanding list could predate.
    fn prune_confirmed(&mut self) {
        match self.pending_lists.values().min().copied() {
            Some(floor) => self.confirmed.retain(|(mark, _)| *mark >= floor),
            None => self.confirmed.clear(),
        }
    }

    /// Server is authoritative: drop everything and take its list. Later
    /// duplicates of an id are ignored.
    fn replace_all(&mut self, tasks: Vec<Task>) {
        let mut seen = HashSet::new();
        let before = tasks.len();
        self.tasks = tasks
            .into_iter()
            .filter(|t| seen.insert(t.id.clone()))
            .collect();
        if self.tasks.len() != before {
            log::warn!("Server list had {} duplicate ids", before - self.tasks.len());
        }
        self.loaded = true;
        self.needs_refresh = false;
        self.last_synced = Some(Local::now());
        log::info!("Loaded {} tasks", self.tasks.len());
    }

    fn prepend(&mut self, task: Task) {
        self.tasks.retain(|t| t.id != task.id);
        self.tasks.insert(0, task);
    }

    /// Match by id, not position; the collection may have shifted meanwhile.
    fn replace(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => *slot = task,
            None => log::debug!("Updated task {} is no longer listed, ignoring", task.id),
        }
    }

    pub async fn refresh<R: TaskRemote>(&mut self, remote: &R) -> Result<(), TaskError> {
        let ticket = self.begin_refresh();
        self.drive(remote, ticket).await
    }

    pub async fn add<R: TaskRemote>(&mut self, remote: &R, title: &str) -> Result<(), TaskError> {
        let ticket = self.begin_add(title)?;
        self.drive(remote, ticket).await
    }

    pub async fn toggle<R: TaskRemote>(&mut self, remote: &R, id: &TaskId) -> Result<(), TaskError> {
        match self.begin_toggle(id)? {
            Some(ticket) => self.drive(remote, ticket).await,
            None => Ok(()),
        }
    }

    pub async fn remove<R: TaskRemote>(&mut self, remote: &R, id: &TaskId) -> Result<(), TaskError> {
        match self.begin_remove(id)? {
            Some(ticket) => self.drive(remote, ticket).await,
            None => Ok(()),
        }
    }

    /// Execute a ticket and any follow-ups it releases, in order. Reports the
    /// first error encountered.
    async fn drive<R: TaskRemote>(&mut self, remote: &R, ticket: Ticket) -> Result<(), TaskError> {
        let mut queue = VecDeque::from([ticket]);
        let mut first_error = None;
        while let Some(ticket) = queue.pop_front() {
            let completion = execute(remote, ticket).await;
            let settled = self.settle(completion);
            if first_error.is_none() {
                first_error = settled.errors.into_iter().next();
            }
            queue.extend(settled.follow_up);
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn mismatch(response: &Response) -> TaskError {
    TaskError::Malformed(format!("unexpected response {:?}", response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::projection::{FilterMode, project};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory backend with call counting and one-shot failure injection.
    #[derive(Default)]
    struct FakeRemote {
        tasks: Mutex<Vec<Task>>,
        next_id: AtomicUsize,
        calls: AtomicUsize,
        fail_next: Mutex<Option<TaskError>>,
    }

    impl FakeRemote {
        fn with(tasks: Vec<Task>) -> Self {
            Self {
                next_id: AtomicUsize::new(100),
                tasks: Mutex::new(tasks),
                ..Self::default()
            }
        }

        fn fail_next(&self, e: TaskError) {
            *self.fail_next.lock().unwrap() = Some(e);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn begin_call(&self) -> Result<(), TaskError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_next.lock().unwrap().take() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }
    }

    impl TaskRemote for FakeRemote {
        async fn list_tasks(&self) -> Result<Vec<Task>, TaskError> {
            self.begin_call()?;
            Ok(self.tasks.lock().unwrap().clone())
        }

        async fn create_task(&self, title: &TaskTitle) -> Result<Task, TaskError> {
            self.begin_call()?;
            let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
            let task = Task::new(id, title.as_str(), false);
            self.tasks.lock().unwrap().insert(0, task.clone());
            Ok(task)
        }

        async fn set_completed(&self, id: &TaskId, completed: bool) -> Result<Task, TaskError> {
            self.begin_call()?;
            let mut tasks = self.tasks.lock().unwrap();
            let task = tasks
                .iter_mut()
                .find(|t| &t.id == id)
                .ok_or_else(|| TaskError::NotFound(id.clone()))?;
            task.completed = completed;
            Ok(task.clone())
        }

        async fn delete_task(&self, id: &TaskId) -> Result<(), TaskError> {
            self.begin_call()?;
            let mut tasks = self.tasks.lock().unwrap();
            let before = tasks.len();
            tasks.retain(|t| &t.id != id);
            if tasks.len() == before {
                return Err(TaskError::NotFound(id.clone()));
            }
            Ok(())
        }
    }

    fn milk_and_rent() -> Vec<Task> {
        vec![
            Task::new("1", "Buy milk", false),
            Task::new("2", "Pay rent", true),
        ]
    }

    async fn loaded(tasks: Vec<Task>) -> (TaskStore, FakeRemote) {
        let remote = FakeRemote::with(tasks);
        let mut store = TaskStore::new();
        store.refresh(&remote).await.unwrap();
        (store, remote)
    }

    fn id(s: &str) -> TaskId {
        TaskId::new(s)
    }

    #[tokio::test]
    async fn refresh_replaces_collection() {
        let remote = FakeRemote::with(milk_and_rent());
        let mut store = TaskStore::new();
        assert_eq!(store.phase(), StorePhase::Empty);
        store.refresh(&remote).await.unwrap();
        assert_eq!(store.tasks(), milk_and_rent().as_slice());
        assert_eq!(store.phase(), StorePhase::Loaded);
        assert!(store.last_synced().is_some());

        remote.tasks.lock().unwrap().retain(|t| t.id == id("2"));
        store.refresh(&remote).await.unwrap();
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.tasks()[0].id, id("2"));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_prior_collection() {
        let (mut store, remote) = loaded(milk_and_rent()).await;
        remote.fail_next(TaskError::Network("connection refused".into()));
        let err = store.refresh(&remote).await.unwrap_err();
        assert_eq!(err, TaskError::Network("connection refused".into()));
        assert_eq!(store.tasks(), milk_and_rent().as_slice());
    }

    #[tokio::test]
    async fn failed_first_refresh_stays_empty() {
        let remote = FakeRemote::with(milk_and_rent());
        remote.fail_next(TaskError::Unauthorized);
        let mut store = TaskStore::new();
        assert_eq!(store.refresh(&remote).await, Err(TaskError::Unauthorized));
        assert_eq!(store.phase(), StorePhase::Empty);
        assert!(store.tasks().is_empty());
    }

    #[tokio::test]
    async fn duplicate_ids_keep_first() {
        let (store, _) = loaded(vec![
            Task::new("1", "first", false),
            Task::new("1", "second", true),
            Task::new("2", "other", false),
        ])
        .await;
        assert_eq!(store.tasks().len(), 2);
        assert_eq!(store.tasks()[0].title, "first");
    }

    #[tokio::test]
    async fn blank_add_makes_no_call() {
        let (mut store, remote) = loaded(milk_and_rent()).await;
        let calls = remote.calls();
        for title in ["", "   "] {
            let err = store.add(&remote, title).await.unwrap_err();
            assert!(matches!(err, TaskError::Validation(_)));
        }
        assert_eq!(remote.calls(), calls);
        assert_eq!(store.tasks(), milk_and_rent().as_slice());
    }

    #[tokio::test]
    async fn add_prepends_server_task() {
        let (mut store, remote) = loaded(milk_and_rent()).await;
        store.add(&remote, "  Call mom ").await.unwrap();
        let first = &store.tasks()[0];
        assert_eq!(first.title, "Call mom");
        assert_eq!(first.id, id("100"));
        assert!(!first.completed);
        assert_eq!(store.tasks().len(), 3);
        assert_eq!(store.phase(), StorePhase::Loaded);
    }

    #[tokio::test]
    async fn failed_add_leaves_collection() {
        let (mut store, remote) = loaded(milk_and_rent()).await;
        remote.fail_next(TaskError::Validation("Title too long".into()));
        let err = store.add(&remote, "Buy milk").await.unwrap_err();
        assert_eq!(err, TaskError::Validation("Title too long".into()));
        assert_eq!(store.tasks(), milk_and_rent().as_slice());
    }

    #[tokio::test]
    async fn toggle_reconciles_from_server() {
        let (mut store, remote) = loaded(vec![Task::new("1", "Write report", false)]).await;
        store.toggle(&remote, &id("1")).await.unwrap();
        assert_eq!(store.tasks(), &[Task::new("1", "Write report", true)]);
        assert!(project(store.tasks(), FilterMode::Incomplete, "").is_empty());
    }

    #[tokio::test]
    async fn failed_toggle_leaves_state() {
        let (mut store, remote) = loaded(vec![Task::new("1", "Write report", false)]).await;
        remote.fail_next(TaskError::Network("timeout".into()));
        assert!(store.toggle(&remote, &id("1")).await.is_err());
        assert!(!store.tasks()[0].completed);
        assert!(!store.is_busy(&id("1")));
    }

    #[tokio::test]
    async fn toggle_onto_already_completed_task_is_idempotent() {
        let (mut store, remote) = loaded(vec![Task::new("1", "Write report", false)]).await;
        // Completed elsewhere; this store still shows it open.
        remote.set_completed(&id("1"), true).await.unwrap();

        let ticket = store.begin_toggle(&id("1")).unwrap().unwrap();
        assert_eq!(
            ticket.request(),
            &Request::SetCompleted { id: id("1"), completed: true }
        );
        let settled = store.settle(execute(&remote, ticket).await);
        assert!(settled.errors.is_empty());
        assert_eq!(store.tasks(), &[Task::new("1", "Write report", true)]);
        assert!(remote.tasks.lock().unwrap()[0].completed);

        store.refresh(&remote).await.unwrap();
        assert_eq!(store.tasks(), &[Task::new("1", "Write report", true)]);
    }

    #[tokio::test]
    async fn remove_then_remove_again() {
        let (mut store, remote) = loaded(milk_and_rent()).await;
        store.remove(&remote, &id("2")).await.unwrap();
        assert_eq!(store.tasks(), &[Task::new("1", "Buy milk", false)]);

        let calls = remote.calls();
        assert_eq!(
            store.remove(&remote, &id("2")).await,
            Err(TaskError::NotFound(id("2")))
        );
        assert_eq!(remote.calls(), calls);
        assert_eq!(store.tasks(), &[Task::new("1", "Buy milk", false)]);
    }

    #[tokio::test]
    async fn failed_remove_keeps_entry() {
        let (mut store, remote) = loaded(milk_and_rent()).await;
        remote.fail_next(TaskError::Server { status: 500, message: "db down".into() });
        assert!(store.remove(&remote, &id("1")).await.is_err());
        assert_eq!(store.tasks(), milk_and_rent().as_slice());
    }

    #[tokio::test]
    async fn server_not_found_flags_refresh() {
        let (mut store, remote) = loaded(milk_and_rent()).await;
        remote.tasks.lock().unwrap().retain(|t| t.id != id("1"));
        assert_eq!(
            store.toggle(&remote, &id("1")).await,
            Err(TaskError::NotFound(id("1")))
        );
        assert!(store.needs_refresh());
        assert_eq!(store.tasks(), milk_and_rent().as_slice());

        store.refresh(&remote).await.unwrap();
        assert!(!store.needs_refresh());
        assert_eq!(store.tasks().len(), 1);
    }

    #[tokio::test]
    async fn rapid_toggles_apply_in_request_order() {
        let (mut store, remote) = loaded(vec![Task::new("1", "Write report", false)]).await;

        let first = store.begin_toggle(&id("1")).unwrap().unwrap();
        assert_eq!(
            first.request(),
            &Request::SetCompleted { id: id("1"), completed: true }
        );
        assert!(store.begin_toggle(&id("1")).unwrap().is_none());
        assert_eq!(store.phase(), StorePhase::Pending { in_flight: 1 });
        assert!(store.is_busy(&id("1")));

        let settled = store.settle(execute(&remote, first).await);
        assert!(settled.errors.is_empty());
        assert!(store.tasks()[0].completed);
        assert_eq!(settled.follow_up.len(), 1);

        let second = settled.follow_up.into_iter().next().unwrap();
        assert_eq!(
            second.request(),
            &Request::SetCompleted { id: id("1"), completed: false }
        );
        let settled = store.settle(execute(&remote, second).await);
        assert!(settled.follow_up.is_empty());
        assert!(!store.tasks()[0].completed);
        assert!(!store.is_busy(&id("1")));
        assert_eq!(store.phase(), StorePhase::Loaded);
    }

    #[tokio::test]
    async fn toggle_queued_behind_remove_reports_not_found() {
        let (mut store, remote) = loaded(milk_and_rent()).await;
        let remove = store.begin_remove(&id("1")).unwrap().unwrap();
        assert!(store.begin_toggle(&id("1")).unwrap().is_none());

        let settled = store.settle(execute(&remote, remove).await);
        assert_eq!(settled.errors, vec![TaskError::NotFound(id("1"))]);
        assert!(settled.follow_up.is_empty());
        assert!(!store.is_busy(&id("1")));
        assert_eq!(store.tasks().len(), 1);
    }

    #[tokio::test]
    async fn results_after_detach_are_dropped() {
        let (mut store, remote) = loaded(vec![Task::new("1", "Write report", false)]).await;
        let ticket = store.begin_toggle(&id("1")).unwrap().unwrap();
        let completion = execute(&remote, ticket).await;

        store.detach();
        let settled = store.settle(completion);
        assert!(settled.discarded);
        assert!(!store.tasks()[0].completed);
        assert_eq!(store.phase(), StorePhase::Loaded);
    }

    #[tokio::test]
    async fn older_list_does_not_overwrite_newer() {
        let (mut store, remote) = loaded(milk_and_rent()).await;
        let old = store.begin_refresh();
        let new = store.begin_refresh();

        let stale = Completion {
            ticket: old,
            outcome: Ok(Response::Listed(vec![Task::new("9", "gone", false)])),
        };
        assert!(!store.settle(execute(&remote, new).await).discarded);
        assert!(store.settle(stale).discarded);
        assert_eq!(store.tasks(), milk_and_rent().as_slice());
    }

    fn titles(store: &TaskStore) -> Vec<&str> {
        store.tasks().iter().map(|t| t.title.as_str()).collect()
    }

    #[tokio::test]
    async fn late_list_keeps_create_confirmed_after_it_was_issued() {
        let (mut store, remote) = loaded(milk_and_rent()).await;
        let list = store.begin_refresh();
        let listed = Completion {
            ticket: list,
            outcome: Ok(Response::Listed(milk_and_rent())),
        };

        let add = store.begin_add("Call mom").unwrap();
        let settled = store.settle(execute(&remote, add).await);
        assert!(settled.errors.is_empty());
        assert_eq!(titles(&store), ["Call mom", "Buy milk", "Pay rent"]);

        assert!(!store.settle(listed).discarded);
        assert_eq!(titles(&store), ["Call mom", "Buy milk", "Pay rent"]);
    }

    #[tokio::test]
    async fn late_list_keeps_toggle_and_remove() {
        let (mut store, remote) = loaded(milk_and_rent()).await;
        let list = store.begin_refresh();
        let listed = Completion {
            ticket: list,
            outcome: Ok(Response::Listed(milk_and_rent())),
        };

        let toggle = store.begin_toggle(&id("1")).unwrap().unwrap();
        store.settle(execute(&remote, toggle).await);
        let remove = store.begin_remove(&id("2")).unwrap().unwrap();
        store.settle(execute(&remote, remove).await);

        store.settle(listed);
        assert_eq!(store.tasks(), &[Task::new("1", "Buy milk", true)]);
    }

    #[tokio::test]
    async fn list_issued_after_mutation_is_taken_as_is() {
        let (mut store, remote) = loaded(milk_and_rent()).await;
        let add = store.begin_add("Call mom").unwrap();
        store.settle(execute(&remote, add).await);

        // Server dropped the new task before this list was requested.
        remote.tasks.lock().unwrap().retain(|t| t.title != "Call mom");
        store.refresh(&remote).await.unwrap();
        assert_eq!(titles(&store), ["Buy milk", "Pay rent"]);
    }

    #[tokio::test]
    async fn failed_mutation_is_not_replayed() {
        let (mut store, remote) = loaded(milk_and_rent()).await;
        let list = store.begin_refresh();
        let listed = Completion {
            ticket: list,
            outcome: Ok(Response::Listed(milk_and_rent())),
        };

        remote.fail_next(TaskError::Network("timeout".into()));
        let add = store.begin_add("Call mom").unwrap();
        assert!(!store.settle(execute(&remote, add).await).errors.is_empty());

        store.settle(listed);
        assert_eq!(store.tasks(), milk_and_rent().as_slice());
    }

    #[tokio::test]
    async fn reset_forgets_everything() {
        let (mut store, _) = loaded(milk_and_rent()).await;
        store.reset();
        assert!(store.tasks().is_empty());
        assert_eq!(store.phase(), StorePhase::Empty);
        assert!(store.last_synced().is_none());
    }

    #[tokio::test]
    async fn view_applies_filter_and_search() {
        let (store, _) = loaded(milk_and_rent()).await;
        let mut view = ViewState::new(FilterMode::All);
        view.search = "milk".into();
        let shown = store.view(&view);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].id, id("1"));
    }
}
