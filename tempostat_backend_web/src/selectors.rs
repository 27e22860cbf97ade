// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-page DOM hooks.
//!
//! Everything the backend knows about the host player's markup lives here,
//! so a selector change on the host page is a one-struct fix.

use alloc::vec::Vec;

/// CSS selectors and attribute names identifying the host player's parts.
#[derive(Clone, Debug)]
pub struct HostSelectors {
    /// Selector for the media element.
    pub media: &'static str,
    /// Selector for the native rate-menu container.
    pub menu: &'static str,
    /// Selector for one rate item inside the menu.
    pub menu_item: &'static str,
    /// Class the host page puts on the active menu item.
    pub active_class: &'static str,
    /// Selector for the control-bar button that opens the rate menu.
    pub rate_button: &'static str,
    /// Attributes whose mutation signals that the media source changed.
    pub source_attributes: Vec<&'static str>,
}

impl Default for HostSelectors {
    fn default() -> Self {
        Self {
            media: "video",
            menu: ".bpx-player-ctrl-playbackrate-menu",
            menu_item: ".bpx-player-ctrl-playbackrate-menu-item",
            active_class: "bpx-state-active",
            rate_button: ".bpx-player-ctrl-playbackrate",
            source_attributes: alloc::vec!["src", "data-src", "currentSrc"],
        }
    }
}
