use log::debug;
use lru::LruCache;
use mongodb::bson::oid::ObjectId;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::engine::facade::ViewQuery;
use crate::models::{Role, ViewModel};

pub const DEFAULT_CAPACITY: usize = 10_000;

/// Handed out when a fetch starts; redeemed when its result is ready.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    pub request_id: Uuid,
    pub user_id: ObjectId,
    pub role: Role,
    pub generation: u64,
    pub query: ViewQuery,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Commit {
    Applied(Arc<ViewModel>),
    /// A newer fetch for the same user started after this one.
    Superseded { latest: Option<Arc<ViewModel>> },
}

#[derive(Default)]
struct SessionState {
    generation: u64,
    current: Option<ViewQuery>,
    applied: Option<Arc<ViewModel>>,
}

/// Per-user record of the latest requested parameters and applied view.
///
/// Results are applied only when they belong to the newest fetch, so a slow
/// response for an old time range can never overwrite a newer one. The least
/// recently used sessions are evicted once `capacity` is reached; a result
/// arriving for an evicted session is treated as superseded.
pub struct SessionRegistry {
    sessions: Mutex<LruCache<(ObjectId, Role), SessionState>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        SessionRegistry {
            sessions: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn begin(&self, user_id: ObjectId, role: Role, query: ViewQuery) -> FetchTicket {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let state = sessions.get_or_insert_mut((user_id, role), SessionState::default);

        let query = match &state.current {
            Some(previous) => {
                let section = query.section;
                ViewQuery { section: previous.section, ..query }.with_section(section)
            }
            None => query,
        };

        state.generation += 1;
        state.current = Some(query.clone());

        FetchTicket {
            request_id: Uuid::new_v4(),
            user_id,
            role,
            generation: state.generation,
            query,
        }
    }

    pub fn commit(&self, ticket: &FetchTicket, view: ViewModel) -> Commit {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let Some(state) = sessions.get_mut(&(ticket.user_id, ticket.role)) else {
            debug!("Dropping dashboard result {} for an evicted session", ticket.request_id);
            return Commit::Superseded { latest: None };
        };

        let is_current = state.generation == ticket.generation
            && state.current.as_ref() == Some(&ticket.query);
        if !is_current {
            debug!(
                "Dropping stale dashboard result {} (generation {} < {})",
                ticket.request_id, ticket.generation, state.generation
            );
            return Commit::Superseded {
                latest: state.applied.clone(),
            };
        }

        let view = Arc::new(view);
        state.applied = Some(view.clone());
        Commit::Applied(view)
    }

    pub fn current(&self, user_id: ObjectId, role: Role) -> Option<Arc<ViewModel>> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions
            .peek(&(user_id, role))
            .and_then(|state| state.applied.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChartSet, MetricSummary, Section, SectionCounts, TimeRange};

    fn query(time_range: TimeRange, section: Section, page: u32) -> ViewQuery {
        ViewQuery::new(time_range, None, Some(page), None, section, 10, 100)
    }

    fn view(user: ObjectId, time_range: TimeRange) -> ViewModel {
        ViewModel {
            user_id: user.to_hex(),
            role: Role::Client,
            section: Section::Pending,
            search_term: None,
            metrics: MetricSummary::default(),
            charts: ChartSet {
                time_range,
                ..ChartSet::default()
            },
            paged_reviews: Vec::new(),
            page: 1,
            page_size: 10,
            total_items: 0,
            total_pages: 0,
            counts: SectionCounts::default(),
            wallet: None,
            degraded_sources: Vec::new(),
        }
    }

    #[test]
    fn slower_stale_result_is_not_applied() {
        let registry = SessionRegistry::new();
        let user = ObjectId::new();

        let year = registry.begin(user, Role::Client, query(TimeRange::Year, Section::Pending, 1));
        let month = registry.begin(user, Role::Client, query(TimeRange::Month, Section::Pending, 1));

        let applied = registry.commit(&month, view(user, TimeRange::Month));
        assert!(matches!(applied, Commit::Applied(_)));

        match registry.commit(&year, view(user, TimeRange::Year)) {
            Commit::Superseded { latest: Some(latest) } => {
                assert_eq!(latest.charts.time_range, TimeRange::Month)
            }
            other => panic!("expected superseded, got {:?}", other),
        }
        let current = registry.current(user, Role::Client).unwrap();
        assert_eq!(current.charts.time_range, TimeRange::Month);
    }

    #[test]
    fn stale_result_before_newer_lands_is_still_dropped() {
        let registry = SessionRegistry::new();
        let user = ObjectId::new();

        let old = registry.begin(user, Role::Client, query(TimeRange::Year, Section::Pending, 1));
        let _new = registry.begin(user, Role::Client, query(TimeRange::Week, Section::Pending, 1));

        assert_eq!(
            registry.commit(&old, view(user, TimeRange::Year)),
            Commit::Superseded { latest: None }
        );
        assert!(registry.current(user, Role::Client).is_none());
    }

    #[test]
    fn sessions_are_isolated_per_user() {
        let registry = SessionRegistry::new();
        let a = ObjectId::new();
        let b = ObjectId::new();

        let ticket_a = registry.begin(a, Role::Client, query(TimeRange::Year, Section::Pending, 1));
        let _ticket_b = registry.begin(b, Role::Client, query(TimeRange::Month, Section::Pending, 1));

        assert!(matches!(registry.commit(&ticket_a, view(a, TimeRange::Year)), Commit::Applied(_)));
    }

    #[test]
    fn least_recent_sessions_are_evicted() {
        let registry = SessionRegistry::with_capacity(2);
        let (a, b, c) = (ObjectId::new(), ObjectId::new(), ObjectId::new());

        let ticket_a = registry.begin(a, Role::Client, query(TimeRange::Year, Section::Pending, 1));
        let ticket_b = registry.begin(b, Role::Client, query(TimeRange::Year, Section::Pending, 1));
        assert!(matches!(registry.commit(&ticket_b, view(b, TimeRange::Year)), Commit::Applied(_)));
        let _ticket_c = registry.begin(c, Role::Client, query(TimeRange::Year, Section::Pending, 1));

        assert_eq!(
            registry.commit(&ticket_a, view(a, TimeRange::Year)),
            Commit::Superseded { latest: None }
        );
        assert!(registry.current(a, Role::Client).is_none());
        assert!(registry.current(b, Role::Client).is_some());
    }

    #[test]
    fn switching_section_resets_page() {
        let registry = SessionRegistry::new();
        let user = ObjectId::new();

        let first = registry.begin(user, Role::Freelancer, query(TimeRange::Year, Section::Pending, 3));
        assert_eq!(first.query.page, 3);

        let same = registry.begin(user, Role::Freelancer, query(TimeRange::Year, Section::Pending, 2));
        assert_eq!(same.query.page, 2);

        let switched = registry.begin(user, Role::Freelancer, query(TimeRange::Year, Section::Given, 4));
        assert_eq!(switched.query.page, 1);
        assert_eq!(switched.query.section, Section::Given);
    }
}
