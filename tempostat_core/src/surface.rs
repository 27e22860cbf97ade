// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface reconciler contract.
//!
//! Tempostat splits each observable surface into *reconciler*
//! implementations that live in backend crates. A reconciler keeps one
//! surface's presentation consistent with the authoritative rate; surfaces
//! that can also *originate* changes (the injected slider, the native menu)
//! do so by feeding candidates back into the engine as
//! [`EngineEvent::Surface`](crate::event::EngineEvent::Surface) — the
//! origination direction is an event, not a trait method, so repaint-only
//! surfaces carry no unused capability.
//!
//! # Variants
//!
//! - **Injected slider** — repaint sets the slider position and numeric
//!   label; originates from input/change/drag-move; shows a disabled
//!   presentation (and snaps to neutral) while the mode gate is off.
//! - **Native menu** — repaint is passive (the host page owns the menu's
//!   active-item highlighting); originates from item clicks and from the
//!   class mutation marking an item active.
//! - **Transient label** — repaint-only: shows the formatted rate briefly,
//!   then fades.
//!
//! Feedback loops are prevented upstream: applying an unchanged rate
//! repaints but produces no second persistence write or publish cycle, so a
//! surface echoing its own repaint back as an origination converges
//! immediately.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::rate::Rate;

/// Keeps one observable surface consistent with the authoritative rate.
pub trait Reconciler {
    /// Updates the surface's presentation to show `rate`.
    fn repaint(&mut self, rate: Rate);

    /// Switches the surface between its enabled and disabled presentations.
    ///
    /// The default does nothing; surfaces without a disabled presentation
    /// (the native menu, the transient label) need not override it.
    fn set_enabled(&mut self, enabled: bool) {
        _ = enabled;
    }
}

/// An owned, growable set of reconcilers fanned out to as one.
///
/// Surfaces come and go with the DOM (menu instances are recreated on every
/// open), so the set supports clearing slots wholesale; callers track which
/// index belongs to which surface kind if they need to replace one.
#[derive(Default)]
pub struct SurfaceSet {
    surfaces: Vec<Box<dyn Reconciler>>,
}

impl core::fmt::Debug for SurfaceSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SurfaceSet")
            .field("len", &self.surfaces.len())
            .finish()
    }
}

impl SurfaceSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            surfaces: Vec::new(),
        }
    }

    /// Adds a reconciler to the set.
    pub fn register(&mut self, surface: Box<dyn Reconciler>) {
        self.surfaces.push(surface);
    }

    /// Drops every registered reconciler.
    pub fn clear(&mut self) {
        self.surfaces.clear();
    }

    /// Returns the number of registered reconcilers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Repaints every registered surface.
    pub fn repaint_all(&mut self, rate: Rate) {
        for surface in &mut self.surfaces {
            surface.repaint(rate);
        }
    }

    /// Propagates an enabled/disabled switch to every registered surface.
    pub fn set_enabled_all(&mut self, enabled: bool) {
        for surface in &mut self.surfaces {
            surface.set_enabled(enabled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use core::cell::RefCell;

    struct Recording {
        painted: Rc<RefCell<Vec<f64>>>,
        enabled: Rc<RefCell<Vec<bool>>>,
    }

    impl Reconciler for Recording {
        fn repaint(&mut self, rate: Rate) {
            self.painted.borrow_mut().push(rate.value());
        }

        fn set_enabled(&mut self, enabled: bool) {
            self.enabled.borrow_mut().push(enabled);
        }
    }

    #[test]
    fn fan_out_reaches_every_surface() {
        let painted = Rc::new(RefCell::new(Vec::new()));
        let enabled = Rc::new(RefCell::new(Vec::new()));
        let mut set = SurfaceSet::new();
        for _ in 0..2 {
            set.register(Box::new(Recording {
                painted: Rc::clone(&painted),
                enabled: Rc::clone(&enabled),
            }));
        }

        set.repaint_all(Rate::from_candidate(1.5).unwrap());
        set.set_enabled_all(false);

        assert_eq!(*painted.borrow(), &[1.5, 1.5]);
        assert_eq!(*enabled.borrow(), &[false, false]);
    }

    #[test]
    fn clear_empties_the_set() {
        let mut set = SurfaceSet::new();
        set.register(Box::new(Recording {
            painted: Rc::new(RefCell::new(Vec::new())),
            enabled: Rc::new(RefCell::new(Vec::new())),
        }));
        assert_eq!(set.len(), 1);
        set.clear();
        assert!(set.is_empty());
    }
}
