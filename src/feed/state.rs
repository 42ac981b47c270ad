//! Feed state, updates, and the page persistence hook.

use crate::source::{PageRequest, PageResult};

/// Loading state of the current logical fetch.
///
/// ```text
/// Idle → Loading → Succeeded | Failed
///          ↑_________________|   (any new request)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn from_result(result: &PageResult) -> Self {
        if result.succeeded {
            LoadState::Succeeded
        } else {
            LoadState::Failed
        }
    }
}

/// A result delivered for the current generation.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedUpdate {
    pub generation: u64,
    pub request: PageRequest,
    pub result: PageResult,
}

/// Receives the page index after a page is shown, e.g. to write it into
/// the address bar. Only called for endpoints with `persist_page`.
pub trait PageHook: Send + Sync {
    fn page_committed(&self, endpoint: &str, page_index: u32);
}

impl<F> PageHook for F
where
    F: Fn(&str, u32) + Send + Sync,
{
    fn page_committed(&self, endpoint: &str, page_index: u32) {
        self(endpoint, page_index)
    }
}
