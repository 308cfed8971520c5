//! Wiring host-rendered controls to a shared controller.
//!
//! The host owns the actual button widgets. It hands each one to
//! [`bind_start_trigger`] or [`bind_close_trigger`], which injects an
//! activation handler instead of requiring a particular widget type.

use std::{cell::RefCell, rc::Rc};

use crate::{
    error::{Result, VerisyncError},
    redirect::is_completion_redirect,
    session::{Callbacks, Verisync},
};

/// Activation handler injected into a host control.
pub type PressHandler = Box<dyn FnMut() -> Result<()> + 'static>;

/// Controller shared between the host view and its bound controls.
pub type SharedVerisync = Rc<RefCell<Verisync>>;

/// A clickable host element that accepts an activation handler.
pub trait Pressable {
    fn on_press(&mut self, handler: PressHandler);
}

/// Make `trigger` start verification when activated.
///
/// The handler returns the configuration error to the host when a required
/// field is empty. Once the controller is dropped the handler does nothing.
pub fn bind_start_trigger<P: Pressable + ?Sized>(verisync: &SharedVerisync, trigger: &mut P) {
    let verisync = Rc::downgrade(verisync);
    trigger.on_press(Box::new(move || {
        let Some(verisync) = verisync.upgrade() else {
            return Ok(());
        };
        let mut verisync = verisync.try_borrow_mut().map_err(|_| VerisyncError::Busy)?;
        verisync.start().map(|_| ())
    }));
}

/// Make `trigger` close the modal, firing `on_close`, when activated.
///
/// The modal is hidden and the borrow released before `on_close` runs, so
/// the callback may read or drive the shared controller.
pub fn bind_close_trigger<P: Pressable + ?Sized>(verisync: &SharedVerisync, trigger: &mut P) {
    let verisync = Rc::downgrade(verisync);
    trigger.on_press(Box::new(move || {
        let Some(verisync) = verisync.upgrade() else {
            return Ok(());
        };
        hide_then_notify(&verisync, Callbacks::closed).map(|_| ())
    }));
}

/// Shared-controller form of [`Verisync::handle_navigation`].
///
/// Like the bound controls, `on_completed` runs after the modal is hidden
/// and the borrow released.
pub fn handle_shared_navigation(verisync: &SharedVerisync, url: &str) -> Result<bool> {
    if !is_completion_redirect(url) {
        return Ok(false);
    }
    hide_then_notify(verisync, Callbacks::completed)
}

fn hide_then_notify(
    verisync: &RefCell<Verisync>,
    notify: impl FnOnce(&mut Callbacks),
) -> Result<bool> {
    let Some(mut callbacks) = verisync
        .try_borrow_mut()
        .map_err(|_| VerisyncError::Busy)?
        .hide_detached()
    else {
        return Ok(false);
    };
    notify(&mut callbacks);
    verisync
        .try_borrow_mut()
        .map_err(|_| VerisyncError::Busy)?
        .reattach(callbacks);
    Ok(true)
}
