use crate::api::{ApiError, ApiErrorKind, PlantApi};
use crate::dom::{ClickHandler, DomSurface};
use crate::models::PlantId;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Client-side projection of the server's like record for one plant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LikeState {
    Liked,
    NotLiked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Transition {
    Like,
    Unlike,
}

impl LikeState {
    pub fn from_likes(likes: bool) -> Self {
        if likes {
            Self::Liked
        } else {
            Self::NotLiked
        }
    }

    /// The state after `transition`, or `None` when it is not available
    /// from the current state.
    pub fn apply(self, transition: Transition) -> Option<Self> {
        match (self, transition) {
            (Self::NotLiked, Transition::Like) => Some(Self::Liked),
            (Self::Liked, Transition::Unlike) => Some(Self::NotLiked),
            _ => None,
        }
    }
}

pub(crate) const PAGE_LIKE_ID: &str = "like";
pub(crate) const PAGE_UNLIKE_ID: &str = "unlike";

/// How a page names its like/unlike controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Addressing {
    /// Result list: `like-<id>` / `unlike-<id>`.
    PerPlant,
    /// Detail page with a single plant: `like` / `unlike`.
    SinglePage,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PlantControls {
    pub plant_id: PlantId,
    pub addressing: Addressing,
}

impl PlantControls {
    pub fn per_plant(plant_id: PlantId) -> Self {
        Self {
            plant_id,
            addressing: Addressing::PerPlant,
        }
    }

    pub fn single_page(plant_id: PlantId) -> Self {
        Self {
            plant_id,
            addressing: Addressing::SinglePage,
        }
    }

    pub fn like_id(&self) -> String {
        match self.addressing {
            Addressing::PerPlant => format!("like-{}", self.plant_id),
            Addressing::SinglePage => PAGE_LIKE_ID.to_string(),
        }
    }

    pub fn unlike_id(&self) -> String {
        match self.addressing {
            Addressing::PerPlant => format!("unlike-{}", self.plant_id),
            Addressing::SinglePage => PAGE_UNLIKE_ID.to_string(),
        }
    }
}

/// Per control pair, keyed by the like control id: the hydration that
/// currently owns the pair, and the hydration with a request in flight.
#[derive(Default)]
struct Bindings {
    next_generation: Cell<u64>,
    current: RefCell<HashMap<String, u64>>,
    in_flight: RefCell<HashMap<String, u64>>,
}

impl Bindings {
    fn begin(&self, key: &str) -> u64 {
        let generation = self.next_generation.get() + 1;
        self.next_generation.set(generation);
        self.current.borrow_mut().insert(key.to_string(), generation);
        generation
    }

    fn current(&self, key: &str) -> Option<u64> {
        self.current.borrow().get(key).copied()
    }

    fn is_current(&self, key: &str, generation: u64) -> bool {
        self.current(key) == Some(generation)
    }

    /// Returns false when this hydration already has a request in flight.
    fn try_start(&self, key: &str, generation: u64) -> bool {
        let mut in_flight = self.in_flight.borrow_mut();
        if in_flight.get(key) == Some(&generation) {
            return false;
        }
        in_flight.insert(key.to_string(), generation);
        true
    }

    fn finish(&self, key: &str, generation: u64) {
        let mut in_flight = self.in_flight.borrow_mut();
        if in_flight.get(key) == Some(&generation) {
            in_flight.remove(key);
        }
    }
}

/// Drives the like/unlike controls of one plant at a time.
///
/// The like state lives in the page: whichever control is visible is the
/// current state. Clones share the binding table, so one controller can
/// serve every card on a page.
pub(crate) struct LikeController<A, D> {
    api: Rc<A>,
    dom: Rc<D>,
    bindings: Rc<Bindings>,
}

impl<A, D> Clone for LikeController<A, D> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            dom: self.dom.clone(),
            bindings: self.bindings.clone(),
        }
    }
}

impl<A, D> LikeController<A, D>
where
    A: PlantApi + 'static,
    D: DomSurface + 'static,
{
    pub fn new(api: Rc<A>, dom: Rc<D>) -> Self {
        Self {
            api,
            dom,
            bindings: Rc::default(),
        }
    }

    /// Binds both click handlers, replacing earlier bindings, then returns
    /// the status query that sets the initial visibility.
    ///
    /// Binding happens before this returns; the query runs when the future
    /// is polled. A reply arriving after the pair was hydrated again is
    /// dropped.
    pub fn hydrate(&self, controls: PlantControls) -> LocalBoxFuture<'static, ()> {
        let key = controls.like_id();
        let generation = self.bindings.begin(&key);

        // Unknown until the query answers; a reused detail page may still
        // show the previous plant's state.
        self.dom.set_visible(&controls.like_id(), false);
        self.dom.set_visible(&controls.unlike_id(), false);

        self.dom
            .bind_click(&controls.like_id(), self.click_handler(controls, Transition::Like));
        self.dom.bind_click(
            &controls.unlike_id(),
            self.click_handler(controls, Transition::Unlike),
        );

        let this = self.clone();
        async move {
            let status = this.api.likes(controls.plant_id).await;
            if !this.bindings.is_current(&key, generation) {
                log::debug!(
                    "dropping like status for plant {}: controls rebound",
                    controls.plant_id
                );
                return;
            }
            match status {
                Ok(likes) => this.show_state(&controls, LikeState::from_likes(likes)),
                Err(e) => log_failure("like status", controls.plant_id, &e),
            }
        }
        .boxed_local()
    }

    pub async fn like(&self, controls: PlantControls) -> bool {
        self.toggle(controls, Transition::Like).await
    }

    pub async fn unlike(&self, controls: PlantControls) -> bool {
        self.toggle(controls, Transition::Unlike).await
    }

    /// Reads the state from control visibility. `None` until hydration has
    /// shown exactly one control.
    pub fn current_state(&self, controls: &PlantControls) -> Option<LikeState> {
        let like_visible = self.dom.is_visible(&controls.like_id());
        let unlike_visible = self.dom.is_visible(&controls.unlike_id());
        match (like_visible, unlike_visible) {
            (false, true) => Some(LikeState::Liked),
            (true, false) => Some(LikeState::NotLiked),
            _ => None,
        }
    }

    fn show_state(&self, controls: &PlantControls, state: LikeState) {
        let liked = state == LikeState::Liked;
        self.dom.set_visible(&controls.like_id(), !liked);
        self.dom.set_visible(&controls.unlike_id(), liked);
    }

    /// Returns whether the transition was applied.
    async fn toggle(&self, controls: PlantControls, transition: Transition) -> bool {
        let key = controls.like_id();
        let Some(generation) = self.bindings.current(&key) else {
            log::debug!(
                "ignoring {transition:?} for plant {}: controls not hydrated",
                controls.plant_id
            );
            return false;
        };

        let Some(current) = self.current_state(&controls) else {
            log::debug!(
                "ignoring {transition:?} for plant {}: status not loaded",
                controls.plant_id
            );
            return false;
        };

        // A repeated click is dropped here instead of being re-sent.
        let Some(next) = current.apply(transition) else {
            log::debug!(
                "ignoring {transition:?} for plant {}: already {current:?}",
                controls.plant_id
            );
            return false;
        };

        // The controls keep showing the old state until the reply arrives.
        if !self.bindings.try_start(&key, generation) {
            log::debug!(
                "ignoring {transition:?} for plant {}: request in flight",
                controls.plant_id
            );
            return false;
        }

        let result = match transition {
            Transition::Like => self.api.like(controls.plant_id).await,
            Transition::Unlike => self.api.unlike(controls.plant_id).await,
        };
        self.bindings.finish(&key, generation);

        if !self.bindings.is_current(&key, generation) {
            log::debug!(
                "dropping {transition:?} reply for plant {}: controls rebound",
                controls.plant_id
            );
            return false;
        }

        match result {
            Ok(()) => {
                self.show_state(&controls, next);
                true
            }
            Err(e) => {
                log_failure(&format!("{transition:?}"), controls.plant_id, &e);
                false
            }
        }
    }

    fn click_handler(&self, controls: PlantControls, transition: Transition) -> ClickHandler {
        // Handlers are owned by the page; a weak page handle keeps them from
        // holding the page alive.
        let api = self.api.clone();
        let bindings = self.bindings.clone();
        let dom: Weak<D> = Rc::downgrade(&self.dom);

        Rc::new(move || {
            let api = api.clone();
            let bindings = bindings.clone();
            let dom = dom.clone();
            async move {
                let Some(dom) = dom.upgrade() else {
                    return;
                };
                LikeController { api, dom, bindings }
                    .toggle(controls, transition)
                    .await;
            }
            .boxed_local()
        })
    }
}

fn log_failure(action: &str, plant_id: PlantId, e: &ApiError) {
    match e.kind {
        ApiErrorKind::Application => log::warn!("{action} for plant {plant_id} refused: {e}"),
        _ => log::error!("{action} for plant {plant_id} failed: {e}"),
    }
}
