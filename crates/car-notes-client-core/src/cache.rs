//! Client side cache of query results with tag based invalidation
//!
//! Each query result is stored under its [`QueryKey`] along with the
//! [`CacheTag`]s it provides. Mutations invalidate tags which marks every
//! query that provided one of them as stale, the next read of a stale query
//! starts exactly one new request. Queries that have not been read for
//! [`KEEP_UNUSED_FOR`] are dropped.

use std::{
    any::Any,
    collections::{BTreeSet, HashMap},
    fmt::Debug,
    sync::Arc,
    time::Duration,
};

use car_notes_shared::id::DbId;
use tracing::{debug, warn};
use web_time::Instant;

/// How long a query that is no longer read keeps its data
pub const KEEP_UNUSED_FOR: Duration = Duration::from_secs(60);

/// Uniquely identifies a query, usually the path plus the query string
pub type QueryKey = String;

type CachedData = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagType {
    Cars,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagId {
    Id(DbId),
    /// Any list of the type
    List,
    /// The distinct values offered for filtering
    Filters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheTag {
    pub tag_type: TagType,
    pub id: TagId,
}

impl CacheTag {
    pub const CARS_LIST: Self = Self::cars(TagId::List);
    pub const CARS_FILTERS: Self = Self::cars(TagId::Filters);

    pub const fn cars(id: TagId) -> Self {
        Self {
            tag_type: TagType::Cars,
            id,
        }
    }

    pub const fn car(id: DbId) -> Self {
        Self::cars(TagId::Id(id))
    }
}

/// What a query currently has to show
#[derive(Debug)]
pub enum QueryState<T> {
    /// No data yet and a request is in flight
    Loading,
    Ready(Arc<T>),
    /// Data from an earlier request is available while a newer one is in
    /// flight
    Refreshing(Arc<T>),
    Failed(String),
}

impl<T> QueryState<T> {
    pub fn data(&self) -> Option<&Arc<T>> {
        match self {
            QueryState::Ready(data) | QueryState::Refreshing(data) => Some(data),
            QueryState::Loading | QueryState::Failed(_) => None,
        }
    }

    /// Returns `true` if a request for the query is in flight
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        matches!(self, Self::Loading | Self::Refreshing(..))
    }

    /// Returns `true` if the query state is [`Failed`].
    ///
    /// [`Failed`]: QueryState::Failed
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(..))
    }
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Loading => Self::Loading,
            Self::Ready(data) => Self::Ready(Arc::clone(data)),
            Self::Refreshing(data) => Self::Refreshing(Arc::clone(data)),
            Self::Failed(msg) => Self::Failed(msg.clone()),
        }
    }
}

/// Issued when a read needs a request to be sent, must be handed back to
/// [`QueryCache::complete`] with the response
#[derive(Debug)]
pub(crate) struct RequestTicket {
    key: QueryKey,
    seq: u64,
    epoch: u64,
}

/// Outcome of a request as stored in the cache
pub(crate) type QueryOutcome = Result<CachedData, String>;

struct CacheEntry {
    outcome: Option<QueryOutcome>,
    tags: BTreeSet<CacheTag>,
    is_stale: bool,
    /// Sequence number of the newest request still expected for this entry
    in_flight: Option<u64>,
    last_read: Instant,
}

impl CacheEntry {
    fn new(now: Instant) -> Self {
        Self {
            outcome: None,
            tags: Default::default(),
            is_stale: true,
            in_flight: None,
            last_read: now,
        }
    }

    fn is_unused(&self, now: Instant) -> bool {
        self.in_flight.is_none() && now.duration_since(self.last_read) > KEEP_UNUSED_FOR
    }
}

impl Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("has_data", &matches!(self.outcome, Some(Ok(_))))
            .field("tags", &self.tags)
            .field("is_stale", &self.is_stale)
            .field("in_flight", &self.in_flight)
            .field("last_read", &self.last_read)
            .finish()
    }
}

#[derive(Debug, Default)]
pub(crate) struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
    next_seq: u64,
    /// Incremented on purge so responses to requests sent before are dropped
    epoch: u64,
}

impl QueryCache {
    /// Returns the state to show for the query and a ticket if a request
    /// needs to be sent
    ///
    /// A request is needed if the query has never been read or has been
    /// invalidated, and no request for it is already in flight
    pub(crate) fn read<T: Any + Send + Sync>(
        &mut self,
        key: &str,
    ) -> (QueryState<T>, Option<RequestTicket>) {
        self.read_at(key, Instant::now())
    }

    fn read_at<T: Any + Send + Sync>(
        &mut self,
        key: &str,
        now: Instant,
    ) -> (QueryState<T>, Option<RequestTicket>) {
        self.evict_unused(key, now);
        let seq = self.next_seq;
        let epoch = self.epoch;
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| CacheEntry::new(now));
        entry.last_read = now;

        let ticket = if entry.is_stale && entry.in_flight.is_none() {
            entry.in_flight = Some(seq);
            self.next_seq += 1;
            debug!(key, seq, "starting request for query");
            Some(RequestTicket {
                key: key.to_string(),
                seq,
                epoch,
            })
        } else {
            None
        };

        let state = match (&entry.outcome, entry.in_flight.is_some()) {
            (Some(Ok(data)), is_fetching) => match Arc::clone(data).downcast::<T>() {
                Ok(data) if is_fetching => QueryState::Refreshing(data),
                Ok(data) => QueryState::Ready(data),
                Err(_) => {
                    warn!(key, "cached data is not of the type requested");
                    QueryState::Failed(format!("cached data for {key:?} has an unexpected type"))
                }
            },
            (Some(Err(_)), true) | (None, _) => QueryState::Loading,
            (Some(Err(msg)), false) => QueryState::Failed(msg.clone()),
        };
        (state, ticket)
    }

    /// Stores the outcome of a request
    ///
    /// Returns `false` if the outcome was discarded, either because the cache
    /// was purged after the request was sent or because a newer request for
    /// the same query has been issued since
    pub(crate) fn complete(
        &mut self,
        ticket: RequestTicket,
        outcome: QueryOutcome,
        tags: Vec<CacheTag>,
    ) -> bool {
        if ticket.epoch != self.epoch {
            debug!(key = ticket.key, "dropping response received after purge");
            return false;
        }
        let Some(entry) = self.entries.get_mut(&ticket.key) else {
            debug!(key = ticket.key, "dropping response for removed query");
            return false;
        };
        if entry.in_flight != Some(ticket.seq) {
            debug!(
                key = ticket.key,
                seq = ticket.seq,
                "dropping response superseded by newer request"
            );
            return false;
        }
        entry.outcome = Some(outcome);
        entry.tags = tags.into_iter().collect();
        entry.is_stale = false;
        entry.in_flight = None;
        true
    }

    /// Marks every query that provided any of the tags as stale
    ///
    /// Requests already in flight for those queries are superseded so their
    /// (possibly outdated) responses are not stored. Returns the number of
    /// queries invalidated.
    pub(crate) fn invalidate(&mut self, tags: &[CacheTag]) -> usize {
        let mut count = 0;
        for (key, entry) in self.entries.iter_mut() {
            if tags.iter().any(|tag| entry.tags.contains(tag)) {
                debug!(key, "query invalidated");
                entry.is_stale = true;
                entry.in_flight = None;
                count += 1;
            }
        }
        count
    }

    /// Drops the queries other than `key` that have not been read for
    /// [`KEEP_UNUSED_FOR`] and have no request in flight
    fn evict_unused(&mut self, key: &str, now: Instant) {
        self.entries.retain(|entry_key, entry| {
            let is_kept = entry_key == key || !entry.is_unused(now);
            if !is_kept {
                debug!(key = entry_key, "dropping unused query");
            }
            is_kept
        });
    }

    /// Removes all cached data
    pub(crate) fn purge(&mut self) {
        debug!(entries = self.entries.len(), "purging query cache");
        self.entries.clear();
        self.epoch += 1;
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    const KEY_LIST: &str = "/cars/?page=1";
    const KEY_DETAIL: &str = "/cars/1/";

    #[fixture]
    fn cache() -> QueryCache {
        QueryCache::default()
    }

    fn data(value: u32) -> QueryOutcome {
        Ok(Arc::new(value))
    }

    fn list_tags(ids: &[u64]) -> Vec<CacheTag> {
        ids.iter()
            .map(|id| CacheTag::car((*id).into()))
            .chain([CacheTag::CARS_LIST])
            .collect()
    }

    /// Reads and completes the query with `value`
    fn load(cache: &mut QueryCache, key: &str, value: u32, tags: Vec<CacheTag>) {
        let (_, ticket) = cache.read::<u32>(key);
        assert!(cache.complete(ticket.expect("ticket expected"), data(value), tags));
    }

    fn ready_value(state: QueryState<u32>) -> u32 {
        match state {
            QueryState::Ready(x) => *x,
            other => panic!("expected ready but got {other:?}"),
        }
    }

    #[rstest]
    fn first_read_starts_request(mut cache: QueryCache) {
        let (state, ticket) = cache.read::<u32>(KEY_LIST);
        assert!(matches!(state, QueryState::Loading));
        assert!(ticket.is_some());
    }

    #[rstest]
    fn concurrent_reads_are_deduplicated(mut cache: QueryCache) {
        let (_, first) = cache.read::<u32>(KEY_LIST);
        let (state, second) = cache.read::<u32>(KEY_LIST);
        assert!(first.is_some());
        assert!(second.is_none());
        assert!(matches!(state, QueryState::Loading));
    }

    #[rstest]
    fn completed_query_is_served_from_cache(mut cache: QueryCache) {
        load(&mut cache, KEY_LIST, 7, list_tags(&[1]));
        let (state, ticket) = cache.read::<u32>(KEY_LIST);
        assert_eq!(ready_value(state), 7);
        assert!(ticket.is_none());
    }

    #[rstest]
    #[case::by_list(CacheTag::CARS_LIST, true, false)]
    #[case::by_item(CacheTag::car(1.into()), true, true)]
    #[case::by_other_item(CacheTag::car(2.into()), false, false)]
    #[case::by_filters(CacheTag::CARS_FILTERS, false, false)]
    fn invalidation_only_affects_providers(
        mut cache: QueryCache,
        #[case] tag: CacheTag,
        #[case] list_refetches: bool,
        #[case] detail_refetches: bool,
    ) {
        load(&mut cache, KEY_LIST, 1, list_tags(&[1, 3]));
        load(&mut cache, KEY_DETAIL, 2, vec![CacheTag::car(1.into())]);

        cache.invalidate(&[tag]);

        assert_eq!(cache.read::<u32>(KEY_LIST).1.is_some(), list_refetches);
        assert_eq!(cache.read::<u32>(KEY_DETAIL).1.is_some(), detail_refetches);
    }

    #[rstest]
    fn invalidated_query_refetches_exactly_once(mut cache: QueryCache) {
        load(&mut cache, KEY_LIST, 1, list_tags(&[1]));
        cache.invalidate(&[CacheTag::CARS_LIST]);

        let tickets: Vec<_> = (0..5)
            .filter_map(|_| cache.read::<u32>(KEY_LIST).1)
            .collect();

        assert_eq!(tickets.len(), 1);
    }

    #[rstest]
    fn stale_data_shown_while_refreshing(mut cache: QueryCache) {
        load(&mut cache, KEY_LIST, 1, list_tags(&[1]));
        cache.invalidate(&[CacheTag::CARS_LIST]);

        let (state, ticket) = cache.read::<u32>(KEY_LIST);
        assert!(matches!(state, QueryState::Refreshing(ref x) if **x == 1));
        assert!(cache.complete(ticket.unwrap(), data(2), list_tags(&[1])));

        assert_eq!(ready_value(cache.read::<u32>(KEY_LIST).0), 2);
    }

    #[rstest]
    fn response_of_superseded_request_dropped(mut cache: QueryCache) {
        load(&mut cache, KEY_LIST, 1, list_tags(&[1]));
        cache.invalidate(&[CacheTag::CARS_LIST]);
        let (_, older) = cache.read::<u32>(KEY_LIST);

        // A mutation lands while the refetch is in flight
        cache.invalidate(&[CacheTag::CARS_LIST]);
        let (_, newer) = cache.read::<u32>(KEY_LIST);

        assert!(cache.complete(newer.unwrap(), data(3), list_tags(&[1])));
        assert!(!cache.complete(older.unwrap(), data(2), list_tags(&[1])));
        assert_eq!(ready_value(cache.read::<u32>(KEY_LIST).0), 3);
    }

    #[rstest]
    fn response_after_purge_dropped(mut cache: QueryCache) {
        let (_, ticket) = cache.read::<u32>(KEY_LIST);
        cache.purge();
        assert!(!cache.complete(ticket.unwrap(), data(1), list_tags(&[1])));
        assert!(cache.is_empty());
    }

    #[rstest]
    fn response_after_purge_dropped_even_if_read_again(mut cache: QueryCache) {
        let (_, old_ticket) = cache.read::<u32>(KEY_LIST);
        cache.purge();
        let (_, new_ticket) = cache.read::<u32>(KEY_LIST);

        assert!(!cache.complete(old_ticket.unwrap(), data(1), list_tags(&[1])));
        assert!(cache.complete(new_ticket.unwrap(), data(2), list_tags(&[1])));
        assert_eq!(ready_value(cache.read::<u32>(KEY_LIST).0), 2);
    }

    #[rstest]
    fn failure_is_not_retried_until_invalidated(mut cache: QueryCache) {
        let (_, ticket) = cache.read::<u32>(KEY_LIST);
        cache.complete(
            ticket.unwrap(),
            Err("boom".to_string()),
            vec![CacheTag::CARS_LIST],
        );

        let (state, ticket) = cache.read::<u32>(KEY_LIST);
        assert!(matches!(state, QueryState::Failed(ref msg) if msg == "boom"));
        assert!(ticket.is_none());

        // Failed lists still provide the list tag
        cache.invalidate(&[CacheTag::CARS_LIST]);
        let (state, ticket) = cache.read::<u32>(KEY_LIST);
        assert!(matches!(state, QueryState::Loading));
        assert!(ticket.is_some());
    }

    #[rstest]
    fn wrong_type_reported_as_failure(mut cache: QueryCache) {
        load(&mut cache, KEY_LIST, 1, vec![]);
        let (state, _) = cache.read::<String>(KEY_LIST);
        assert!(state.is_failed());
    }

    #[rstest]
    fn purge_removes_everything(mut cache: QueryCache) {
        load(&mut cache, KEY_LIST, 1, list_tags(&[1]));
        load(&mut cache, KEY_DETAIL, 2, vec![CacheTag::car(1.into())]);
        cache.purge();
        assert!(cache.is_empty());
    }

    #[rstest]
    fn unused_query_dropped_on_later_read(mut cache: QueryCache) {
        let start = Instant::now();
        let (_, ticket) = cache.read_at::<u32>(KEY_DETAIL, start);
        assert!(cache.complete(ticket.unwrap(), data(1), vec![CacheTag::car(1.into())]));
        let (_, ticket) = cache.read_at::<u32>(KEY_LIST, start);
        assert!(cache.complete(ticket.unwrap(), data(2), list_tags(&[1])));

        // Only the list keeps being read
        let later = start + KEEP_UNUSED_FOR + Duration::from_secs(1);
        assert_eq!(ready_value(cache.read_at::<u32>(KEY_LIST, later).0), 2);

        let (state, ticket) = cache.read_at::<u32>(KEY_DETAIL, later);
        assert!(matches!(state, QueryState::Loading));
        assert!(ticket.is_some());
    }

    #[rstest]
    fn recently_read_query_kept(mut cache: QueryCache) {
        let start = Instant::now();
        let (_, ticket) = cache.read_at::<u32>(KEY_DETAIL, start);
        assert!(cache.complete(ticket.unwrap(), data(1), vec![]));

        let (_, ticket) = cache.read_at::<u32>(KEY_LIST, start + KEEP_UNUSED_FOR);

        assert!(ticket.is_some());
        assert_eq!(
            ready_value(cache.read_at::<u32>(KEY_DETAIL, start + KEEP_UNUSED_FOR).0),
            1
        );
    }

    #[rstest]
    fn query_in_flight_not_dropped(mut cache: QueryCache) {
        let start = Instant::now();
        let (_, ticket) = cache.read_at::<u32>(KEY_DETAIL, start);

        cache.read_at::<u32>(KEY_LIST, start + KEEP_UNUSED_FOR * 2);

        assert!(cache.complete(ticket.unwrap(), data(1), vec![]));
    }
}
