use std::{
    any::Any,
    collections::HashMap,
    sync::{Arc, RwLock},
};

use tracing::trace;

use crate::{DripflowError, Result, ShareLock, graph::FlowGraph, model::FlowModel, utils};

use super::{DbCollection, DbCollectionIden, StoreIden, StoreSession, data::*};

#[derive(Clone)]
pub struct DynDbSetRef<T>(Arc<dyn DbCollection<Item = T>>);

/// Registry of typed collections backed by one storage backend.
pub struct Store {
    collections: ShareLock<HashMap<StoreIden, Arc<dyn Any + Send + Sync + 'static>>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Acquire a scoped session for one unit of work.
    ///
    /// The session must be released before any durable suspension
    /// point and re-acquired after resume; it is never held across a
    /// wait node.
    pub fn acquire(self: &Arc<Self>) -> StoreSession {
        StoreSession::new(self.clone())
    }

    pub fn collection<DATA>(&self) -> Arc<dyn DbCollection<Item = DATA>>
    where
        DATA: DbCollectionIden + Send + Sync + 'static,
    {
        let collections = self.collections.read().unwrap();

        #[allow(clippy::expect_fun_call)]
        let collection = collections.get(&DATA::iden()).expect(&format!("fail to get collection: {}", DATA::iden().as_ref()));

        #[allow(clippy::expect_fun_call)]
        collection.downcast_ref::<DynDbSetRef<DATA>>().map(|v| v.0.clone()).expect(&format!("fail to get collection: {}", DATA::iden().as_ref()))
    }

    pub fn register<DATA>(
        &self,
        collection: Arc<dyn DbCollection<Item = DATA> + Send + Sync + 'static>,
    ) where
        DATA: DbCollectionIden + 'static,
    {
        let mut collections = self.collections.write().unwrap();
        collections.insert(DATA::iden(), Arc::new(DynDbSetRef::<DATA>(collection)));
    }

    pub fn flows(&self) -> Arc<dyn DbCollection<Item = Flow>> {
        self.collection()
    }

    pub fn triggers(&self) -> Arc<dyn DbCollection<Item = Trigger>> {
        self.collection()
    }

    pub fn runs(&self) -> Arc<dyn DbCollection<Item = Run>> {
        self.collection()
    }

    pub fn run_steps(&self) -> Arc<dyn DbCollection<Item = RunStep>> {
        self.collection()
    }

    pub fn contacts(&self) -> Arc<dyn DbCollection<Item = Contact>> {
        self.collection()
    }

    pub fn orders(&self) -> Arc<dyn DbCollection<Item = Order>> {
        self.collection()
    }

    pub fn deliveries(&self) -> Arc<dyn DbCollection<Item = Delivery>> {
        self.collection()
    }

    pub fn templates(&self) -> Arc<dyn DbCollection<Item = Template>> {
        self.collection()
    }

    pub fn workspaces(&self) -> Arc<dyn DbCollection<Item = Workspace>> {
        self.collection()
    }

    /// Upsert a flow definition. Used by embedders and tests; the
    /// production editor writes the same rows directly.
    pub fn deploy(
        &self,
        model: &FlowModel,
    ) -> Result<bool> {
        trace!("store::deploy({})", model.id);
        if model.id.is_empty() {
            return Err(DripflowError::Validation("missing id in flow".into()));
        }
        // edge-shape invariants are enforced at save time, not per hop
        FlowGraph::build(model)?;
        let data = model.to_json()?;
        let flows = self.flows();
        match flows.find(&model.id) {
            Ok(existing) => {
                let row = Flow {
                    id: model.id.clone(),
                    workspace_id: model.workspace_id.clone(),
                    name: model.name.clone(),
                    enabled: model.enabled,
                    paused: model.paused,
                    data,
                    create_time: existing.create_time,
                    update_time: utils::time::time_millis(),
                };
                flows.update(&row)
            }
            Err(_) => {
                let row = Flow {
                    id: model.id.clone(),
                    workspace_id: model.workspace_id.clone(),
                    name: model.name.clone(),
                    enabled: model.enabled,
                    paused: model.paused,
                    data,
                    create_time: utils::time::time_millis(),
                    update_time: 0,
                };
                flows.create(&row)
            }
        }
    }
}
