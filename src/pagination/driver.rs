//! Pagination driver
//!
//! Runs one pagination request against a query source:
//! validate → count → shape and fetch → finalize.

use super::strategies::{CursorStrategy, OffsetStrategy, Strategy};
use super::types::{
    CountSource, CursorRow, InvalidCursorPolicy, Page, QuerySource, QueryTrace, Stage,
};
use crate::error::{Error, Result};
use crate::metadata::Metadata;
use crate::optimizer::QueryOptimizer;
use crate::sql::check_identifier;
use crate::types::PaginationMode;
use std::time::Instant;
use tracing::{debug, info};

/// Step-wise pagination over one query source
///
/// Steps must be called in order: [`validate`](Self::validate),
/// [`count`](Self::count) or [`count_with`](Self::count_with),
/// [`fetch`](Self::fetch), [`finalize`](Self::finalize). A failing step moves
/// the paginator to [`Stage::Failed`], after which every step errors.
pub struct Paginator<'a, Q: QuerySource + ?Sized> {
    source: &'a mut Q,
    metadata: &'a mut Metadata,
    stage: Stage,
    on_invalid_cursor: InvalidCursorPolicy,
    rows: Vec<Q::Row>,
    trace: Option<QueryTrace>,
}

impl<'a, Q: QuerySource + ?Sized> Paginator<'a, Q> {
    pub fn new(source: &'a mut Q, metadata: &'a mut Metadata) -> Self {
        Self {
            source,
            metadata,
            stage: Stage::Start,
            on_invalid_cursor: InvalidCursorPolicy::default(),
            rows: Vec::new(),
            trace: None,
        }
    }

    /// Set what happens when the cursor cannot be decoded
    #[must_use]
    pub fn on_invalid_cursor(mut self, policy: InvalidCursorPolicy) -> Self {
        self.on_invalid_cursor = policy;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn metadata(&self) -> &Metadata {
        &*self.metadata
    }

    /// Start → Validated
    pub fn validate(&mut self) -> Result<()> {
        self.require(Stage::Start, "validate")?;

        let validation = self.metadata.validate();
        if !validation.is_valid {
            return Err(self.fail(Error::invalid_metadata(validation.errors)));
        }

        self.advance(Stage::Validated);
        Ok(())
    }

    /// Validated → Counted, counting through the paginated source itself
    pub fn count(&mut self) -> Result<i64> {
        self.require(Stage::Validated, "count")?;
        let counted = self.source.count();
        self.record_count(counted)
    }

    /// Validated → Counted, counting through a separate source
    pub fn count_with<C: CountSource + ?Sized>(&mut self, counter: &C) -> Result<i64> {
        self.require(Stage::Validated, "count")?;
        let counted = counter.count();
        self.record_count(counted)
    }

    fn record_count(&mut self, counted: Result<i64>) -> Result<i64> {
        let total = counted.map_err(|e| self.fail(e))?;
        self.metadata.total_rows = total;
        debug!(total_rows = total, "counted rows");
        self.advance(Stage::Counted);
        Ok(total)
    }

    /// Counted → Paginated: shape the query for the current page and fetch it
    pub fn fetch(&mut self) -> Result<usize> {
        self.require(Stage::Counted, "fetch")?;
        self.metadata.normalize();

        if let Err(e) = self.shape() {
            return Err(self.fail(e));
        }

        let started = Instant::now();
        let fetched = self.source.fetch();
        let elapsed = started.elapsed();
        let rows = fetched.map_err(|e| self.fail(e))?;
        self.rows = rows;

        if self.metadata.debug {
            let sql = self.source.to_sql();
            info!(
                sql = %sql,
                elapsed = ?elapsed,
                rows = self.rows.len(),
                "paginated query finished"
            );
            self.trace = Some(QueryTrace { sql, elapsed });
        }

        self.advance(Stage::Paginated);
        Ok(self.rows.len())
    }

    fn shape(&mut self) -> Result<()> {
        if self.metadata.has_projection() {
            for field in &self.metadata.selected_fields {
                check_identifier(field)?;
            }
            self.source.select(&self.metadata.selected_fields);
        }

        match self.metadata.mode() {
            PaginationMode::Offset => OffsetStrategy.apply(&mut *self.source, &*self.metadata),
            PaginationMode::Cursor => CursorStrategy::new(self.on_invalid_cursor)
                .apply(&mut *self.source, &*self.metadata),
        }
    }

    fn require(&self, expected: Stage, step: &'static str) -> Result<()> {
        if self.stage == expected {
            return Ok(());
        }
        Err(Error::Stage {
            step,
            stage: self.stage.to_string(),
        })
    }

    fn advance(&mut self, next: Stage) {
        debug!(from = %self.stage, to = %next, "pagination stage");
        self.stage = next;
    }

    fn fail(&mut self, error: Error) -> Error {
        debug!(stage = %self.stage, error = %error, "pagination failed");
        self.stage = Stage::Failed;
        error
    }
}

impl<'a, Q> Paginator<'a, Q>
where
    Q: QuerySource + ?Sized,
    Q::Row: CursorRow,
{
    /// Paginated → Finalized: recompute derived fields and the next cursor
    pub fn finalize(&mut self) -> Result<Page<Q::Row>> {
        self.require(Stage::Paginated, "finalize")?;
        self.metadata.normalize();

        let mut next_cursor = None;
        if self.metadata.is_cursor_based() && self.metadata.has_next {
            if let Some(last) = self.rows.last() {
                next_cursor = CursorStrategy::new(self.on_invalid_cursor)
                    .next_cursor(last, &*self.metadata);
            }
        }
        if let Some(token) = &next_cursor {
            self.metadata.cursor = token.clone();
        }

        self.advance(Stage::Finalized);
        Ok(Page {
            rows: std::mem::take(&mut self.rows),
            next_cursor,
            has_more: self.metadata.has_next,
            trace: self.trace.take(),
        })
    }

    /// Run every remaining step, counting through the paginated source
    pub fn run(mut self) -> Result<Page<Q::Row>> {
        self.validate()?;
        self.count()?;
        self.fetch()?;
        self.finalize()
    }
}

/// Paginate `source` according to `metadata`, updating it in place
pub fn paginate<Q>(source: &mut Q, metadata: &mut Metadata) -> Result<Page<Q::Row>>
where
    Q: QuerySource + ?Sized,
    Q::Row: CursorRow,
{
    Paginator::new(source, metadata).run()
}

/// Like [`paginate`], but establishes `total_rows` through `counter`
pub fn paginate_with_count<Q, C>(
    source: &mut Q,
    counter: &C,
    metadata: &mut Metadata,
) -> Result<Page<Q::Row>>
where
    Q: QuerySource + ?Sized,
    Q::Row: CursorRow,
    C: CountSource + ?Sized,
{
    let mut paginator = Paginator::new(source, metadata);
    paginator.validate()?;
    paginator.count_with(counter)?;
    paginator.fetch()?;
    paginator.finalize()
}

/// Hand the optimizer's advisory settings to `source`, then [`paginate`]
pub fn optimized_paginate<Q>(
    source: &mut Q,
    metadata: &mut Metadata,
    optimizer: &QueryOptimizer,
) -> Result<Page<Q::Row>>
where
    Q: QuerySource + ?Sized,
    Q::Row: CursorRow,
{
    optimizer.apply_to(source);
    paginate(source, metadata)
}
