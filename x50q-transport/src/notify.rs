//! Notification callbacks
//!
//! The keyboard reports profile switches (Fn + numpad) and volume key
//! movement on the same input interface as command acknowledgements. They
//! can arrive while any command is in flight, so the exchange loop hands them
//! to these callbacks before it keeps waiting for its ack.

use tracing::trace;

use crate::types::Notification;

type ProfileCallback = Box<dyn FnMut(u8)>;
type VolumeCallback = Box<dyn FnMut(bool)>;

/// Two optional single-slot handlers, invoked synchronously
#[derive(Default)]
pub struct NotificationRouter {
    on_profile_change: Option<ProfileCallback>,
    on_volume_key: Option<VolumeCallback>,
}

impl NotificationRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the profile-changed handler (receives the profile, 1-6)
    pub fn set_profile_callback(&mut self, callback: impl FnMut(u8) + 'static) {
        self.on_profile_change = Some(Box::new(callback));
    }

    /// Replace the volume-key handler (receives `true` when pressed)
    pub fn set_volume_callback(&mut self, callback: impl FnMut(bool) + 'static) {
        self.on_volume_key = Some(Box::new(callback));
    }

    pub fn clear_profile_callback(&mut self) {
        self.on_profile_change = None;
    }

    pub fn clear_volume_callback(&mut self) {
        self.on_volume_key = None;
    }

    /// Run the handler for `notification`; unset slots drop it
    pub fn dispatch(&mut self, notification: Notification) {
        trace!("Notification: {:?}", notification);
        match notification {
            Notification::ProfileChanged { profile } => {
                if let Some(cb) = self.on_profile_change.as_mut() {
                    cb(profile);
                }
            }
            Notification::VolumeKey { pressed } => {
                if let Some(cb) = self.on_volume_key.as_mut() {
                    cb(pressed);
                }
            }
        }
    }
}

impl std::fmt::Debug for NotificationRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationRouter")
            .field("on_profile_change", &self.on_profile_change.is_some())
            .field("on_volume_key", &self.on_volume_key.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_unset_slots_discard() {
        let mut router = NotificationRouter::new();
        router.dispatch(Notification::ProfileChanged { profile: 2 });
        router.dispatch(Notification::VolumeKey { pressed: true });
    }

    #[test]
    fn test_dispatch_routes_by_kind() {
        let profiles = Rc::new(RefCell::new(Vec::new()));
        let volume = Rc::new(RefCell::new(Vec::new()));

        let mut router = NotificationRouter::new();
        let p = Rc::clone(&profiles);
        router.set_profile_callback(move |profile| p.borrow_mut().push(profile));
        let v = Rc::clone(&volume);
        router.set_volume_callback(move |pressed| v.borrow_mut().push(pressed));

        router.dispatch(Notification::ProfileChanged { profile: 4 });
        router.dispatch(Notification::VolumeKey { pressed: false });
        router.dispatch(Notification::VolumeKey { pressed: true });

        assert_eq!(*profiles.borrow(), vec![4]);
        assert_eq!(*volume.borrow(), vec![false, true]);
    }

    #[test]
    fn test_clear_callback() {
        let count = Rc::new(RefCell::new(0));
        let mut router = NotificationRouter::new();
        let c = Rc::clone(&count);
        router.set_profile_callback(move |_| *c.borrow_mut() += 1);
        router.dispatch(Notification::ProfileChanged { profile: 1 });
        router.clear_profile_callback();
        router.dispatch(Notification::ProfileChanged { profile: 2 });
        assert_eq!(*count.borrow(), 1);
    }
}
