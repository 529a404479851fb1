//! Batch accumulation
//!
//! Turns the fetch outcomes of one batch into the rows the writer commits.
//! No I/O happens here; the only side effect is admitting reference ids into
//! the registry.

use crate::ingest::registry::ReferenceRegistry;
use crate::model::{DetailRecord, EntityId, FetchOutcome, NamedRef, ReferenceKind};
use crate::storage::{BatchRows, LinkRow, PriceRow, TagLinkRow};
use std::collections::HashSet;

/// Builds the rows for one batch of fetch outcomes
///
/// Within a batch the first occurrence of a reference id supplies its name;
/// later occurrences only add links. Ids already in the registry produce no
/// reference row at all.
pub fn accumulate(
    registry: &mut ReferenceRegistry,
    outcomes: &[(EntityId, FetchOutcome)],
) -> BatchRows {
    let mut rows = BatchRows {
        entity_count: outcomes.len(),
        ..Default::default()
    };

    for (entity_id, outcome) in outcomes {
        match outcome {
            FetchOutcome::NoData => rows.no_data.push(*entity_id),
            FetchOutcome::Details(record) => add_record(&mut rows, registry, *entity_id, record),
        }
    }

    rows
}

fn add_record(
    rows: &mut BatchRows,
    registry: &mut ReferenceRegistry,
    entity_id: EntityId,
    record: &DetailRecord,
) {
    let genres = admit_named(registry, ReferenceKind::Genre, &record.genres, &mut rows.new_genres);
    rows.genre_links.extend(genres.into_iter().map(|reference_id| LinkRow {
        entity_id,
        reference_id,
    }));

    let categories = admit_named(
        registry,
        ReferenceKind::Category,
        &record.categories,
        &mut rows.new_categories,
    );
    rows.category_links
        .extend(categories.into_iter().map(|reference_id| LinkRow {
            entity_id,
            reference_id,
        }));

    let mut linked = HashSet::new();
    for tag in record.tags.iter().flatten() {
        if !linked.insert(tag.id) {
            continue;
        }
        if registry.admit(ReferenceKind::Tag, tag.id) {
            rows.new_tags.push(NamedRef::new(tag.id, tag.name.clone()));
        }
        rows.tag_links.push(TagLinkRow {
            entity_id,
            tag_id: tag.id,
            order: tag.order,
        });
    }
    // Only a queried page without tags marks the entity
    if record.tags.as_ref().is_some_and(Vec::is_empty) {
        rows.no_tags.push(entity_id);
    }

    if let Some(price) = record.price {
        rows.prices.push(PriceRow { entity_id, price });
    }
}

/// Admits each reference and returns the distinct ids to link, in record order
fn admit_named(
    registry: &mut ReferenceRegistry,
    kind: ReferenceKind,
    references: &[NamedRef],
    new_rows: &mut Vec<NamedRef>,
) -> Vec<i64> {
    let mut linked = Vec::with_capacity(references.len());
    for reference in references {
        if linked.contains(&reference.id) {
            continue;
        }
        if registry.admit(kind, reference.id) {
            new_rows.push(reference.clone());
        }
        linked.push(reference.id);
    }
    linked
}
