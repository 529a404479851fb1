//! Scripted sources for pipeline tests

use crate::model::{DetailRecord, Entity, EntityId, FetchOutcome, NamedRef, TagRef};
use crate::source::{CatalogSource, DetailSource, SourceError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Instant;

/// One scripted response of the detail capability
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Details(DetailRecord),
    NoData,
    Transient,
    Malformed,
}

/// A `DetailSource` replaying scripted steps per entity
///
/// Each entity's steps are consumed in order; the last step repeats forever.
/// Unscripted entities fail transiently.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    steps: Mutex<HashMap<EntityId, VecDeque<Step>>>,
    tags: HashMap<EntityId, Vec<TagRef>>,
    detail_calls: Mutex<Vec<EntityId>>,
    tag_calls: Mutex<Vec<EntityId>>,
    call_times: Mutex<Vec<Instant>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, id: EntityId, steps: Vec<Step>) -> Self {
        self.steps.lock().unwrap().insert(id, steps.into());
        self
    }

    pub fn details(self, id: EntityId, record: DetailRecord) -> Self {
        self.script(id, vec![Step::Details(record)])
    }

    pub fn no_data(self, id: EntityId) -> Self {
        self.script(id, vec![Step::NoData])
    }

    pub fn tags(mut self, id: EntityId, tags: Vec<TagRef>) -> Self {
        self.tags.insert(id, tags);
        self
    }

    pub fn detail_calls(&self) -> Vec<EntityId> {
        self.detail_calls.lock().unwrap().clone()
    }

    pub fn tag_calls(&self) -> Vec<EntityId> {
        self.tag_calls.lock().unwrap().clone()
    }

    /// Start time of every detail and tag request, in call order
    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }

    fn next_step(&self, id: EntityId) -> Option<Step> {
        let mut steps = self.steps.lock().unwrap();
        let queue = steps.get_mut(&id)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl DetailSource for ScriptedSource {
    async fn fetch_detail(&self, id: EntityId) -> Result<FetchOutcome, SourceError> {
        self.detail_calls.lock().unwrap().push(id);
        self.call_times.lock().unwrap().push(Instant::now());
        match self.next_step(id) {
            Some(Step::Details(record)) => Ok(FetchOutcome::Details(record)),
            Some(Step::NoData) => Ok(FetchOutcome::NoData),
            Some(Step::Malformed) => Err(SourceError::malformed("scripted", "bad payload")),
            Some(Step::Transient) | None => {
                Err(SourceError::transient("scripted", "connection reset"))
            }
        }
    }

    async fn fetch_tags(&self, id: EntityId) -> Result<Vec<TagRef>, SourceError> {
        self.tag_calls.lock().unwrap().push(id);
        self.call_times.lock().unwrap().push(Instant::now());
        Ok(self.tags.get(&id).cloned().unwrap_or_default())
    }
}

/// A `CatalogSource` returning a fixed list after some transient failures
pub(crate) struct ScriptedCatalog {
    pub entities: Vec<Entity>,
    pub failures: Mutex<u32>,
}

impl ScriptedCatalog {
    pub fn new(entities: Vec<Entity>, failures: u32) -> Self {
        Self {
            entities,
            failures: Mutex::new(failures),
        }
    }
}

#[async_trait]
impl CatalogSource for ScriptedCatalog {
    async fn fetch_catalog(&self) -> Result<Vec<Entity>, SourceError> {
        let mut failures = self.failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(SourceError::transient("scripted", "HTTP 503"));
        }
        Ok(self.entities.clone())
    }
}

/// A record with one genre and a price
pub(crate) fn record_with_genre(genre_id: i64, genre: &str, price: i64) -> DetailRecord {
    DetailRecord {
        genres: vec![NamedRef::new(genre_id, genre)],
        price: Some(price),
        ..Default::default()
    }
}
