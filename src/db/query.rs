use std::cmp::Ordering;

use serde::Serialize;
use serde_json::Value;

use crate::db::types::{Page, QueryOptions, SortDirection, DEFAULT_PAGE_SIZE};

/// Sorts then paginates `items` per `options`. Both backends funnel their
/// results through here so sort and page semantics cannot drift apart.
pub fn sort_and_paginate<T: Serialize>(items: Vec<T>, options: &QueryOptions) -> Page<T> {
    let items = match options.sort_by.as_deref() {
        Some(field) => sort_by_field(items, field, options.sort_direction),
        None => items,
    };
    paginate(items, options)
}

/// Stable sort on a top-level serialized field. A field no record carries
/// leaves insertion order untouched; otherwise values order as
/// bool < number < string, with missing/null keys after all of them.
pub fn sort_by_field<T: Serialize>(items: Vec<T>, field: &str, direction: SortDirection) -> Vec<T> {
    let mut keyed: Vec<(Option<Value>, T)> = items
        .into_iter()
        .map(|item| {
            let key = serde_json::to_value(&item)
                .ok()
                .and_then(|value| value.get(field).cloned());
            (key, item)
        })
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        let ordering = compare_keys(a.as_ref(), b.as_ref());
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    keyed.into_iter().map(|(_, item)| item).collect()
}

fn compare_keys(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => compare_text(a, b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        Some(Value::Bool(_)) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Array(_)) | Some(Value::Object(_)) => 3,
        Some(Value::Null) | None => 4,
    }
}

/// Case-insensitive first; on a case-only difference lowercase sorts first.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Whether the serialized top-level `field` of `item` is the string `value`.
pub fn field_equals<T: Serialize>(item: &T, field: &str, value: &str) -> bool {
    serde_json::to_value(item)
        .ok()
        .and_then(|v| v.get(field).and_then(Value::as_str).map(|s| s == value))
        .unwrap_or(false)
}

pub fn paginate<T>(items: Vec<T>, options: &QueryOptions) -> Page<T> {
    let total_count = items.len();

    if !options.is_paginated() {
        return Page {
            items,
            total_count,
            page_number: 1,
            page_size: total_count,
            total_pages: if total_count == 0 { 0 } else { 1 },
        };
    }

    let page_number = options.page_number.unwrap_or(1).max(1);
    let page_size = match options.page_size {
        Some(0) | None => DEFAULT_PAGE_SIZE,
        Some(size) => size,
    };
    let offset = (page_number - 1).saturating_mul(page_size);

    Page {
        items: items.into_iter().skip(offset).take(page_size).collect(),
        total_count,
        page_number,
        page_size,
        total_pages: total_count.div_ceil(page_size),
    }
}
