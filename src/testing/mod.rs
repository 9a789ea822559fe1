//! In-memory stand-ins for the page and the catalog API.

use crate::api::{ApiError, ApiResult, PlantApi};
use crate::dom::{ClickHandler, DomSurface};
use crate::models::{PlantId, RawPlantRecord};
use futures::channel::oneshot;
use futures::future::{join_all, LocalBoxFuture};
use futures::FutureExt;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};

/// Page model: a results list of HTML fragments, a set of visible ids, and
/// click bindings per id. Every id starts hidden, like the rendered
/// controls.
#[derive(Default)]
pub(crate) struct MemoryDom {
    pub fragments: RefCell<Vec<String>>,
    pub clear_count: Cell<usize>,
    pub search_error: RefCell<Option<String>>,
    visible: RefCell<HashSet<String>>,
    bindings: RefCell<HashMap<String, Vec<ClickHandler>>>,
}

impl MemoryDom {
    pub fn binding_count(&self, element_id: &str) -> usize {
        self.bindings
            .borrow()
            .get(element_id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Fires every handler bound to `element_id`.
    pub fn click(&self, element_id: &str) -> LocalBoxFuture<'static, ()> {
        let handlers = self
            .bindings
            .borrow()
            .get(element_id)
            .cloned()
            .unwrap_or_default();
        let futs: Vec<_> = handlers.iter().map(|h| h()).collect();
        join_all(futs).map(|_| ()).boxed_local()
    }

    pub fn html(&self) -> String {
        self.fragments.borrow().concat()
    }
}

impl DomSurface for MemoryDom {
    fn clear_results(&self) {
        self.fragments.borrow_mut().clear();
        self.clear_count.set(self.clear_count.get() + 1);
    }

    fn append_result(&self, html: &str) {
        self.fragments.borrow_mut().push(html.to_string());
    }

    fn set_visible(&self, element_id: &str, visible: bool) {
        let mut set = self.visible.borrow_mut();
        if visible {
            set.insert(element_id.to_string());
        } else {
            set.remove(element_id);
        }
    }

    fn is_visible(&self, element_id: &str) -> bool {
        self.visible.borrow().contains(element_id)
    }

    fn bind_click(&self, element_id: &str, handler: ClickHandler) {
        self.bindings
            .borrow_mut()
            .insert(element_id.to_string(), vec![handler]);
    }

    fn show_search_error(&self, message: &str) {
        *self.search_error.borrow_mut() = Some(message.to_string());
    }

    fn clear_search_error(&self) {
        *self.search_error.borrow_mut() = None;
    }
}

type SearchReply = ApiResult<Vec<RawPlantRecord>>;

/// Scripted catalog API that records every call as `"<endpoint> <arg>"`.
#[derive(Default)]
pub(crate) struct FakeApi {
    calls: RefCell<Vec<String>>,
    search_replies: RefCell<VecDeque<SearchReply>>,
    pending_searches: RefCell<VecDeque<oneshot::Receiver<SearchReply>>>,
    like_status: RefCell<HashMap<PlantId, ApiResult<bool>>>,
    pending_likes: RefCell<HashMap<PlantId, oneshot::Receiver<ApiResult<bool>>>>,
    mutation_error: RefCell<Option<ApiError>>,
    pending_mutations: RefCell<VecDeque<oneshot::Receiver<ApiResult<()>>>>,
}

impl FakeApi {
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> usize {
        let prefix = format!("{endpoint} ");
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }

    pub fn reply_to_search(&self, reply: SearchReply) {
        self.search_replies.borrow_mut().push_back(reply);
    }

    /// Queues a search that stays in flight until the returned sender fires.
    pub fn defer_search(&self) -> oneshot::Sender<SearchReply> {
        let (tx, rx) = oneshot::channel();
        self.pending_searches.borrow_mut().push_back(rx);
        tx
    }

    pub fn set_likes(&self, plant_id: PlantId, status: ApiResult<bool>) {
        self.like_status.borrow_mut().insert(plant_id, status);
    }

    /// The next status query for `plant_id` waits for the returned sender.
    pub fn defer_likes(&self, plant_id: PlantId) -> oneshot::Sender<ApiResult<bool>> {
        let (tx, rx) = oneshot::channel();
        self.pending_likes.borrow_mut().insert(plant_id, rx);
        tx
    }

    /// The next like or unlike waits for the returned sender.
    pub fn defer_mutation(&self) -> oneshot::Sender<ApiResult<()>> {
        let (tx, rx) = oneshot::channel();
        self.pending_mutations.borrow_mut().push_back(rx);
        tx
    }

    pub fn fail_mutations_with(&self, error: ApiError) {
        *self.mutation_error.borrow_mut() = Some(error);
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    async fn mutation_result(&self) -> ApiResult<()> {
        let pending = self.pending_mutations.borrow_mut().pop_front();
        if let Some(rx) = pending {
            return rx
                .await
                .unwrap_or_else(|_| Err(ApiError::parse("mutation reply dropped")));
        }

        match self.mutation_error.borrow().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl PlantApi for FakeApi {
    async fn search_plants(&self, term: &str) -> ApiResult<Vec<RawPlantRecord>> {
        self.record(format!("search {term}"));

        let pending = self.pending_searches.borrow_mut().pop_front();
        if let Some(rx) = pending {
            return rx
                .await
                .unwrap_or_else(|_| Err(ApiError::parse("search reply dropped")));
        }

        let reply = self.search_replies.borrow_mut().pop_front();
        reply.unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn like(&self, plant_id: PlantId) -> ApiResult<()> {
        self.record(format!("like {plant_id}"));
        self.mutation_result().await
    }

    async fn unlike(&self, plant_id: PlantId) -> ApiResult<()> {
        self.record(format!("unlike {plant_id}"));
        self.mutation_result().await
    }

    async fn likes(&self, plant_id: PlantId) -> ApiResult<bool> {
        self.record(format!("likes {plant_id}"));

        let pending = self.pending_likes.borrow_mut().remove(&plant_id);
        if let Some(rx) = pending {
            return rx
                .await
                .unwrap_or_else(|_| Err(ApiError::parse("likes reply dropped")));
        }

        self.like_status
            .borrow()
            .get(&plant_id)
            .cloned()
            .unwrap_or(Ok(false))
    }
}
