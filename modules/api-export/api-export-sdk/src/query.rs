//! The query object built by a repository and finalized by the export pipeline.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::context::SecurityContext;
use crate::models::{QueryMethod, QueryRequest, SortEntry};

/// Filter on a named resource property.
///
/// Property names are authorization/ORM concepts (`owner_tenant_id`, `id`,
/// ...); mapping to columns is the query provider's job.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    /// `property = value`
    Eq { property: String, value: Value },
    /// `property IN (values)`
    In { property: String, values: Vec<Value> },
}

impl QueryFilter {
    #[must_use]
    pub fn eq(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            property: property.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn in_values<V: Into<Value>>(
        property: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::In {
            property: property.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn property(&self) -> &str {
        match self {
            Self::Eq { property, .. } | Self::In { property, .. } => property,
        }
    }
}

/// Offset/limit window of a query. Both `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultWindow {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl ResultWindow {
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.offset.is_none() && self.limit.is_none()
    }
}

/// A query for one resource type.
///
/// Created by a [`QueryProvider`](crate::QueryProvider), mutated in place by
/// pre-paginate transformers, then moved into the
/// [`ExportEngine`](crate::ExportEngine). The export pipeline clears the
/// result window right before handing it over.
#[derive(Debug, Clone)]
pub struct ResourceQuery {
    resource_type: String,
    alias: String,
    index_by: Option<String>,
    method: QueryMethod,
    context: SecurityContext,
    filters: Vec<QueryFilter>,
    sort: Vec<SortEntry>,
    hints: BTreeMap<String, Value>,
    window: ResultWindow,
}

impl ResourceQuery {
    /// Start a query for the given request on behalf of `context`.
    #[must_use]
    pub fn new(request: &QueryRequest, context: SecurityContext) -> Self {
        Self {
            resource_type: request.resource_type.clone(),
            alias: request.alias.clone(),
            index_by: request.index_by.clone(),
            method: request.method.clone(),
            context,
            filters: Vec::new(),
            sort: Vec::new(),
            hints: BTreeMap::new(),
            window: ResultWindow::default(),
        }
    }

    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    #[must_use]
    pub fn index_by(&self) -> Option<&str> {
        self.index_by.as_deref()
    }

    #[must_use]
    pub fn method(&self) -> &QueryMethod {
        &self.method
    }

    /// Caller the query runs for.
    #[must_use]
    pub fn security_context(&self) -> &SecurityContext {
        &self.context
    }

    #[must_use]
    pub fn filters(&self) -> &[QueryFilter] {
        &self.filters
    }

    pub fn add_filter(&mut self, filter: QueryFilter) {
        self.filters.push(filter);
    }

    #[must_use]
    pub fn sort(&self) -> &[SortEntry] {
        &self.sort
    }

    pub fn set_sort(&mut self, sort: Vec<SortEntry>) {
        self.sort = sort;
    }

    /// Free-form values transformers attach for the engine or later transformers.
    #[must_use]
    pub fn hint(&self, key: &str) -> Option<&Value> {
        self.hints.get(key)
    }

    pub fn set_hint(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.hints.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn hints(&self) -> &BTreeMap<String, Value> {
        &self.hints
    }

    #[must_use]
    pub fn result_window(&self) -> ResultWindow {
        self.window
    }

    pub fn set_result_window(&mut self, offset: Option<u64>, limit: Option<u64>) {
        self.window = ResultWindow { offset, limit };
    }

    /// Drop offset and limit so the whole matching set is returned.
    pub fn clear_result_window(&mut self) {
        self.window = ResultWindow::default();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn request() -> QueryRequest {
        QueryRequest {
            resource_type: "order".to_owned(),
            method: QueryMethod::Standard,
            alias: "o".to_owned(),
            index_by: Some("id".to_owned()),
        }
    }

    #[test]
    fn new_query_is_unbounded_and_unfiltered() {
        let q = ResourceQuery::new(&request(), SecurityContext::anonymous());

        assert_eq!(q.resource_type(), "order");
        assert_eq!(q.alias(), "o");
        assert_eq!(q.index_by(), Some("id"));
        assert!(q.result_window().is_unbounded());
        assert!(q.filters().is_empty());
    }

    #[test]
    fn clear_result_window_removes_offset_and_limit() {
        let mut q = ResourceQuery::new(&request(), SecurityContext::anonymous());
        q.set_result_window(Some(20), Some(10));
        assert!(!q.result_window().is_unbounded());

        q.clear_result_window();
        assert_eq!(q.result_window(), ResultWindow::default());
    }

    #[test]
    fn filters_keep_insertion_order() {
        let mut q = ResourceQuery::new(&request(), SecurityContext::anonymous());
        q.add_filter(QueryFilter::eq("status", "paid"));
        q.add_filter(QueryFilter::in_values("owner_tenant_id", ["t1", "t2"]));

        let props: Vec<&str> = q.filters().iter().map(QueryFilter::property).collect();
        assert_eq!(props, ["status", "owner_tenant_id"]);
    }
}
