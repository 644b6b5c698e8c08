use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use serde_json::Value as JsonValue;

use crate::{
    DripflowError, Result, ShareLock,
    store::{DbCollection, PageData, query::Query},
};

use super::DbDocument;

/// One in-memory collection keyed by row id.
#[derive(Debug)]
pub struct Collect<T> {
    name: String,
    rows: ShareLock<HashMap<String, T>>,
}

impl<T> Collect<T> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rows: Arc::new(std::sync::RwLock::new(HashMap::new())),
        }
    }
}

fn cmp_value(
    a: &JsonValue,
    b: &JsonValue,
) -> Ordering {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal),
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

impl<T> DbCollection for Collect<T>
where
    T: DbDocument + Clone + Send + Sync,
{
    type Item = T;

    fn exists(
        &self,
        id: &str,
    ) -> Result<bool> {
        let rows = self.rows.read().unwrap();
        Ok(rows.contains_key(id))
    }

    fn find(
        &self,
        id: &str,
    ) -> Result<Self::Item> {
        let rows = self.rows.read().unwrap();
        rows.get(id).cloned().ok_or(DripflowError::Store(format!("record {} not found in {}", id, self.name)))
    }

    fn query(
        &self,
        q: &Query,
    ) -> Result<PageData<Self::Item>> {
        let rows = self.rows.read().unwrap();

        let mut matched = Vec::new();
        for row in rows.values() {
            let doc = row.doc()?;
            let hit = q.filters().iter().all(|(column, expected)| doc.get(column).map(|v| v == expected).unwrap_or(false));
            if hit {
                matched.push((row.clone(), doc));
            }
        }

        for (column, rev) in q.order_by().iter().rev() {
            matched.sort_by(|(_, a), (_, b)| {
                let ord = cmp_value(a.get(column).unwrap_or(&JsonValue::Null), b.get(column).unwrap_or(&JsonValue::Null));
                if *rev { ord.reverse() } else { ord }
            });
        }

        let count = matched.len();
        let page_count = count.div_ceil(q.get_limit());
        let page_num = q.get_offset() / q.get_limit() + 1;
        let data = PageData {
            count,
            page_size: q.get_limit(),
            page_num,
            page_count,
            rows: matched.into_iter().skip(q.get_offset()).take(q.get_limit()).map(|(row, _)| row).collect(),
        };
        Ok(data)
    }

    fn create(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        let mut rows = self.rows.write().unwrap();
        if rows.contains_key(data.id()) {
            return Err(DripflowError::Store(format!("record {} already exists in {}", data.id(), self.name)));
        }
        rows.insert(data.id().to_string(), data.clone());
        Ok(true)
    }

    fn update(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        let mut rows = self.rows.write().unwrap();
        if !rows.contains_key(data.id()) {
            return Err(DripflowError::Store(format!("record {} not found in {}", data.id(), self.name)));
        }
        rows.insert(data.id().to_string(), data.clone());
        Ok(true)
    }

    fn delete(
        &self,
        id: &str,
    ) -> Result<bool> {
        let mut rows = self.rows.write().unwrap();
        Ok(rows.remove(id).is_some())
    }
}
