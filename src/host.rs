//! Frame scheduling and resize notification
//!
//! A host runs callbacks "right before the next repaint" and tells the
//! renderer when its surface changed size. The browser host wraps
//! `requestAnimationFrame`; `ManualHost` is driven by hand from tests, the
//! CLI tick loop and the native viewer.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::trace;

use crate::core::Size;

/// Handle of a scheduled frame callback
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameId(pub u64);

/// Handle of a registered resize listener
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

pub type FrameCallback = Box<dyn FnOnce()>;
pub type ResizeListener = Box<dyn FnMut(Size)>;

pub trait FrameHost {
    /// Run `callback` once before the next repaint
    fn request_frame(&self, callback: FrameCallback) -> FrameId;

    /// Drop a scheduled callback that has not run yet. Unknown ids are ignored.
    fn cancel_frame(&self, id: FrameId);

    fn add_resize_listener(&self, listener: ResizeListener) -> ListenerId;

    /// Unknown ids are ignored
    fn remove_resize_listener(&self, id: ListenerId);
}

#[derive(Default)]
struct ManualInner {
    next_id: u64,
    frames: VecDeque<(FrameId, FrameCallback)>,
    listeners: Vec<(ListenerId, ResizeListener)>,
    /// Set while `resize` holds the listeners detached
    dispatching: bool,
    /// Removed during dispatch, dropped when the listeners are put back
    removed: Vec<ListenerId>,
}

impl ManualInner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Host whose frames run only when asked to. Clones share state.
#[derive(Clone, Default)]
pub struct ManualHost {
    inner: Rc<RefCell<ManualInner>>,
}

impl ManualHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the callbacks scheduled before this call; callbacks they schedule
    /// wait for the next call. Returns how many ran.
    pub fn run_frame(&self) -> usize {
        let due: Vec<_> = self.inner.borrow_mut().frames.drain(..).collect();
        let ran = due.len();
        for (id, callback) in due {
            trace!(id = id.0, "Running frame callback");
            callback();
        }
        ran
    }

    /// Notify every resize listener
    pub fn resize(&self, size: Size) {
        // Listeners may (de)register while running, so they are called detached
        let mut listeners = {
            let mut inner = self.inner.borrow_mut();
            if inner.dispatching {
                return;
            }
            inner.dispatching = true;
            std::mem::take(&mut inner.listeners)
        };
        for (id, listener) in listeners.iter_mut() {
            if self.inner.borrow().removed.contains(id) {
                continue;
            }
            listener(size);
        }
        let mut inner = self.inner.borrow_mut();
        let removed = std::mem::take(&mut inner.removed);
        let added = std::mem::take(&mut inner.listeners);
        listeners.extend(added);
        listeners.retain(|(id, _)| !removed.contains(id));
        inner.listeners = listeners;
        inner.dispatching = false;
    }

    pub fn pending_frames(&self) -> usize {
        self.inner.borrow().frames.len()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

impl FrameHost for ManualHost {
    fn request_frame(&self, callback: FrameCallback) -> FrameId {
        let mut inner = self.inner.borrow_mut();
        let id = FrameId(inner.next_id());
        inner.frames.push_back((id, callback));
        id
    }

    fn cancel_frame(&self, id: FrameId) {
        self.inner.borrow_mut().frames.retain(|(f, _)| *f != id);
    }

    fn add_resize_listener(&self, listener: ResizeListener) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_id());
        inner.listeners.push((id, listener));
        id
    }

    fn remove_resize_listener(&self, id: ListenerId) {
        let mut inner = self.inner.borrow_mut();
        inner.listeners.retain(|(l, _)| *l != id);
        if inner.dispatching {
            inner.removed.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_frames_run_once_in_order() {
        let host = ManualHost::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for n in 0..3 {
            let log = log.clone();
            host.request_frame(Box::new(move || log.borrow_mut().push(n)));
        }
        assert_eq!(host.run_frame(), 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert_eq!(host.run_frame(), 0);
    }

    #[test]
    fn test_cancel_frame() {
        let host = ManualHost::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let id = host.request_frame(Box::new(move || h.set(h.get() + 1)));
        host.cancel_frame(id);
        host.cancel_frame(id);
        assert_eq!(host.run_frame(), 0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_rescheduling_waits_for_next_run() {
        let host = ManualHost::new();
        let inner_host = host.clone();
        host.request_frame(Box::new(move || {
            inner_host.request_frame(Box::new(|| {}));
        }));
        assert_eq!(host.run_frame(), 1);
        assert_eq!(host.pending_frames(), 1);
    }

    #[test]
    fn test_resize_listeners() {
        let host = ManualHost::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let id = host.add_resize_listener(Box::new(move |size| s.borrow_mut().push(size)));
        assert_eq!(host.listener_count(), 1);

        host.resize(Size::new(400.0, 300.0));
        assert_eq!(*seen.borrow(), vec![Size::new(400.0, 300.0)]);
        assert_eq!(host.listener_count(), 1);

        host.remove_resize_listener(id);
        assert_eq!(host.listener_count(), 0);
        host.resize(Size::new(1.0, 1.0));
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_remove_listener_during_resize() {
        let host = ManualHost::new();
        let hits = Rc::new(RefCell::new(Vec::new()));
        let victim = Rc::new(Cell::new(None));

        let (h, v, remover_host) = (hits.clone(), victim.clone(), host.clone());
        let remover = host.add_resize_listener(Box::new(move |_| {
            h.borrow_mut().push("remover");
            if let Some(id) = v.take() {
                remover_host.remove_resize_listener(id);
            }
        }));
        let h = hits.clone();
        victim.set(Some(host.add_resize_listener(Box::new(move |_| h.borrow_mut().push("victim")))));

        // Removed before its turn, so it is skipped in the same dispatch
        host.resize(Size::new(400.0, 300.0));
        assert_eq!(*hits.borrow(), vec!["remover"]);
        assert_eq!(host.listener_count(), 1);

        host.resize(Size::new(200.0, 100.0));
        assert_eq!(*hits.borrow(), vec!["remover", "remover"]);

        // Self-removal sticks too
        let self_host = host.clone();
        let own = Rc::new(Cell::new(None));
        let o = own.clone();
        let h = hits.clone();
        own.set(Some(host.add_resize_listener(Box::new(move |_| {
            h.borrow_mut().push("once");
            if let Some(id) = o.take() {
                self_host.remove_resize_listener(id);
            }
        }))));
        host.remove_resize_listener(remover);
        host.resize(Size::new(50.0, 50.0));
        host.resize(Size::new(60.0, 60.0));
        assert_eq!(*hits.borrow(), vec!["remover", "remover", "once"]);
        assert_eq!(host.listener_count(), 0);
    }
}
