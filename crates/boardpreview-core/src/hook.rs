#![forbid(unsafe_code)]

//! The navigation hook: how intercepted clicks reach the coordinator.
//!
//! The coordinator owns a [`NavigationChannel`]. Hosts hand out
//! [`NavigationSender`]s to whatever receives in-frame clicks (a window
//! `message` listener, a synthetic frame). Senders hold only a weak
//! reference, so once the coordinator is dropped every post is a no-op and
//! nothing keeps the torn-down coordinator alive.
//!
//! Everything runs on one event loop; requests are queued and applied when
//! the coordinator drains the channel.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

/// A request to show `path` in the preview frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub path: String,
}

type Queue = RefCell<VecDeque<NavigationRequest>>;

/// Receiving end, owned by the coordinator.
#[derive(Debug, Default)]
pub struct NavigationChannel {
    queue: Rc<Queue>,
}

impl NavigationChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sender(&self) -> NavigationSender {
        NavigationSender {
            queue: Rc::downgrade(&self.queue),
        }
    }

    /// Pop the oldest pending request.
    pub fn try_recv(&self) -> Option<NavigationRequest> {
        self.queue.borrow_mut().pop_front()
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

/// Posting end of the navigation hook.
#[derive(Debug, Clone)]
pub struct NavigationSender {
    queue: Weak<Queue>,
}

impl NavigationSender {
    /// Queue a navigation. Returns `false` if the channel is gone.
    pub fn post(&self, path: impl Into<String>) -> bool {
        match self.queue.upgrade() {
            Some(queue) => {
                queue.borrow_mut().push_back(NavigationRequest { path: path.into() });
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.queue.strong_count() > 0
    }
}
