//! Datastore fan-out worker.
//!
//! Runs a callback across every entity of a kind by splitting the collection
//! into bounded windows and dispatching one delayed task per window. The
//! datastore itself is an external collaborator; this module only needs to
//! count a kind and fetch a window of it.

use crate::core::{ArgValue, ParamType, Signature};
use crate::executor::{BoxError, TaskContext, TaskFuture};
use crate::registry::{Function, Registry, TaskError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

/// A single stored entity: its key plus a structured value.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub key: String,
    pub value: Value,
}

/// The datastore collaborator consumed by the fan-out worker.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Total number of entities of `kind`.
    async fn count(&self, kind: &str) -> std::result::Result<usize, BoxError>;

    /// Entities of `kind` in the window `[offset, offset + limit)`.
    async fn fetch(
        &self,
        kind: &str,
        offset: usize,
        limit: usize,
    ) -> std::result::Result<Vec<Entity>, BoxError>;
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParallelError {
    #[error("datastore error")]
    Datastore(#[source] BoxError),

    #[error(transparent)]
    Task(#[from] TaskError),
}

/// Per-entity callback type: receives the execution context, the entity key
/// and its value.
pub type EntityFn = Arc<dyn Fn(TaskContext, String, Value) -> TaskFuture + Send + Sync>;

/// A worker that applies a callback to every entity of a kind, one bounded
/// window of entities per dispatched task.
///
/// Construction registers the window worker as a delayed function, so each
/// window follows the normal dispatcher retry policy as a whole. Inside a
/// window, a failing entity is logged and the remaining entities still run.
pub struct ParallelFn {
    name: String,
    kind: String,
    datastore: Arc<dyn Datastore>,
    worker: Function,
}

impl ParallelFn {
    /// Registers the window worker under `"parallel-fn-{name}"` in
    /// `registry`. Call at program initialization.
    pub fn new<F>(
        registry: &Registry,
        name: &str,
        kind: &str,
        datastore: Arc<dyn Datastore>,
        per_entity: F,
    ) -> Self
    where
        F: Fn(TaskContext, String, Value) -> TaskFuture + Send + Sync + 'static,
    {
        let per_entity: EntityFn = Arc::new(per_entity);
        let db = Arc::clone(&datastore);
        let worker_kind = kind.to_string();

        let worker = registry.func(
            &format!("parallel-fn-{name}"),
            Signature::new([ParamType::Context, ParamType::UInt, ParamType::UInt]),
            move |ctx, args| {
                let db = Arc::clone(&db);
                let per_entity = Arc::clone(&per_entity);
                let kind = worker_kind.clone();
                Box::pin(async move {
                    let offset = args.first().ok_or("missing offset argument")?.as_u64()? as usize;
                    let limit = args.get(1).ok_or("missing limit argument")?.as_u64()? as usize;

                    let entities = db.fetch(&kind, offset, limit).await?;
                    for entity in entities {
                        let key = entity.key;
                        if let Err(err) = per_entity(ctx.clone(), key.clone(), entity.value).await {
                            error!("parallel: worker failed for {kind} entity {key}: {err}");
                        }
                    }
                    Ok(())
                })
            },
        );

        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            datastore,
            worker,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Counts the collection and dispatches one window task per
    /// `[offset, offset + page_size)` slice.
    ///
    /// Returns the number of dispatched windows: `ceil(count / page_size)`.
    /// Each window re-queries the datastore when it runs, so entities added
    /// after the count may be missed and entities removed may shift windows.
    pub async fn run(&self, ctx: &TaskContext, page_size: usize) -> Result<usize, ParallelError> {
        let page_size = page_size.max(1);
        let total = self
            .datastore
            .count(&self.kind)
            .await
            .map_err(ParallelError::Datastore)?;

        let mut windows = 0;
        let mut offset = 0;
        while offset < total {
            self.worker
                .call(ctx, vec![ArgValue::from(offset), ArgValue::from(page_size)])?;
            windows += 1;
            offset += page_size;
        }

        Ok(windows)
    }
}
