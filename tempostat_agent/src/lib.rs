// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content-script agent: wires the engine to the host page.
//!
//! This crate is the composition root. It builds the engine, installs the
//! browser-side collaborators (keyboard capture, DOM observers, the menu
//! poller, extension storage and messaging), and routes every callback
//! through one dispatch function that applies the engine's effects in
//! order. The object graph lives for the lifetime of the page; listeners
//! and observers are intentionally forgotten rather than torn down, since
//! tab navigation ends everything at once.
//!
//! Build with: `wasm-pack build --target web tempostat_agent`

#![no_std]
#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

extern crate alloc;

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;

use tempostat_backend_web::{
    ConsoleSink, DomWatch, HostSelectors, KeyCapture, MediaBinding, MenuPoller, MenuSurface,
    SliderSurface, TimerBank, TransientLabel, messaging, now, storage, styles,
    unbound_media_present,
};
use tempostat_core::engine::{Engine, EngineConfig};
use tempostat_core::event::{DomObservation, Effect, EngineEvent, IntentSource, PanelCommand};
use tempostat_core::rate::Rate;
use tempostat_core::store::PreferenceRecord;
use tempostat_core::surface::SurfaceSet;
use tempostat_core::trace::{CollaboratorFailure, FailureEvent, TraceSink as _, Tracer};
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event};

const SLIDER_PRESENCE_SELECTOR: &str = ".tempostat-slider-container";

struct Agent {
    document: Document,
    selectors: HostSelectors,
    engine: RefCell<Engine>,
    timers: TimerBank,
    poller: MenuPoller,
    label: RefCell<Option<TransientLabel>>,
    media: RefCell<Option<MediaBinding>>,
    /// The slider and native-menu reconcilers for the *current* menu
    /// instance; cleared and rebuilt whenever the menu is recreated.
    menu_surfaces: RefCell<SurfaceSet>,
}

/// Entry point for the content script.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() -> Result<(), JsValue> {
    let document = web_sys::window()
        .expect("window")
        .document()
        .expect("document");

    styles::inject(&document)?;

    let config = EngineConfig::host_page();
    let label = TransientLabel::install(&document, config.label_hold)?;

    let agent = Rc::new(Agent {
        document: document.clone(),
        selectors: HostSelectors::default(),
        engine: RefCell::new(Engine::new(config)),
        timers: TimerBank::new(),
        poller: MenuPoller::new(),
        label: RefCell::new(Some(label)),
        media: RefCell::new(None),
        menu_surfaces: RefCell::new(SurfaceSet::new()),
    });

    load_preferences(&agent);
    install_keyboard(&agent, &document)?;
    install_dom_watch(&agent, &document)?;
    install_menu_click_poller(&agent, &document)?;
    install_messaging(&agent);

    Ok(())
}

/// Requests the startup record, degrading to defaults without the runtime.
fn load_preferences(agent: &Rc<Agent>) {
    let startup_agent = Rc::clone(agent);
    let requested = storage::load(move |record| {
        dispatch(&startup_agent, EngineEvent::Startup(record));
    });
    if !requested {
        ConsoleSink.on_failure(&FailureEvent {
            failure: CollaboratorFailure::MissingRuntime,
        });
        dispatch(agent, EngineEvent::Startup(PreferenceRecord::default()));
    }
}

fn install_keyboard(agent: &Rc<Agent>, document: &Document) -> Result<(), JsValue> {
    let key_agent = Rc::clone(agent);
    let capture = KeyCapture::install(document, move |input| {
        dispatch(&key_agent, EngineEvent::Key(input, now()))
    })?;
    core::mem::forget(capture);
    Ok(())
}

fn install_dom_watch(agent: &Rc<Agent>, document: &Document) -> Result<(), JsValue> {
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("document has no body"))?;
    let scan_agent = Rc::clone(agent);
    let watch = DomWatch::child_list(body.as_ref(), move || scan(&scan_agent))?;
    core::mem::forget(watch);
    // The media element may already be in the document when the script runs.
    scan(agent);
    Ok(())
}

/// The body-observer callback: presence-checked sightings only.
fn scan(agent: &Rc<Agent>) {
    if unbound_media_present(&agent.document, &agent.selectors) {
        dispatch(agent, EngineEvent::Dom(DomObservation::MediaSighted));
    }
    if let Ok(Some(menu)) = agent.document.query_selector(agent.selectors.menu) {
        let has_slider = menu
            .query_selector(SLIDER_PRESENCE_SELECTOR)
            .ok()
            .flatten()
            .is_some();
        if !has_slider {
            dispatch(
                agent,
                EngineEvent::Dom(DomObservation::MenuSighted { has_slider: false }),
            );
        }
    }
}

/// Rate-button clicks start the bounded menu poll: the menu node appears a
/// beat after the click, and a missed menu is abandoned silently.
fn install_menu_click_poller(agent: &Rc<Agent>, document: &Document) -> Result<(), JsValue> {
    let click_agent = Rc::clone(agent);
    let click = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let Some(target) = event
            .target()
            .and_then(|target| target.dyn_into::<Element>().ok())
        else {
            return;
        };
        if target
            .closest(click_agent.selectors.rate_button)
            .ok()
            .flatten()
            .is_none()
        {
            return;
        }
        let (interval, attempts) = {
            let engine = click_agent.engine.borrow();
            (
                engine.config().menu_poll_interval,
                engine.config().menu_poll_attempts,
            )
        };
        let check_agent = Rc::clone(&click_agent);
        click_agent
            .poller
            .start(interval, attempts, move || menu_ready(&check_agent));
    });
    document.add_event_listener_with_callback_and_bool(
        "click",
        click.as_ref().unchecked_ref(),
        true,
    )?;
    core::mem::forget(click);
    Ok(())
}

/// One poll tick: reports whether the menu was found and handled.
fn menu_ready(agent: &Rc<Agent>) -> bool {
    let Ok(Some(menu)) = agent.document.query_selector(agent.selectors.menu) else {
        return false;
    };
    let has_slider = menu
        .query_selector(SLIDER_PRESENCE_SELECTOR)
        .ok()
        .flatten()
        .is_some();
    if !has_slider {
        dispatch(
            agent,
            EngineEvent::Dom(DomObservation::MenuSighted { has_slider: false }),
        );
    }
    true
}

fn install_messaging(agent: &Rc<Agent>) {
    let message_agent = Rc::clone(agent);
    match messaging::install(move |command: PanelCommand| {
        dispatch(&message_agent, EngineEvent::Panel(command));
    }) {
        Some(listener) => core::mem::forget(listener),
        None => ConsoleSink.on_failure(&FailureEvent {
            failure: CollaboratorFailure::MissingRuntime,
        }),
    }
}

/// Routes one event through the engine and applies its effects in order.
///
/// Returns whether the triggering input event's default handling must be
/// suppressed, so key callbacks can `preventDefault` before returning.
fn dispatch(agent: &Rc<Agent>, event: EngineEvent) -> bool {
    let effects = {
        let mut sink = ConsoleSink;
        let mut tracer = Tracer::new(&mut sink);
        agent.engine.borrow_mut().handle(event, &mut tracer)
    };
    let mut suppress = false;
    for effect in effects {
        apply_effect(agent, effect, &mut suppress);
    }
    suppress
}

fn apply_effect(agent: &Rc<Agent>, effect: Effect, suppress: &mut bool) {
    match effect {
        Effect::SuppressDefault => *suppress = true,
        Effect::BindMedia => bind_media(agent),
        Effect::WriteMediaRate(rate) => {
            if let Some(media) = &*agent.media.borrow() {
                media.write(rate);
            }
        }
        Effect::ReassertMediaRate(rate) => {
            if let Some(media) = &*agent.media.borrow() {
                media.reassert(rate);
            }
        }
        Effect::Repaint(rate) => agent.menu_surfaces.borrow_mut().repaint_all(rate),
        Effect::ShowLabel(rate) => {
            if let Some(label) = &*agent.label.borrow() {
                label.show(rate);
            }
        }
        Effect::SetSurfacesEnabled(enabled) => {
            agent.menu_surfaces.borrow_mut().set_enabled_all(enabled);
        }
        Effect::AttachMenuSlider => attach_menu_surfaces(agent),
        Effect::Persist(delta) => {
            if !storage::persist(&delta) {
                ConsoleSink.on_failure(&FailureEvent {
                    failure: CollaboratorFailure::PersistWrite,
                });
            }
        }
        Effect::StartTimer(kind, span) => {
            let timer_agent = Rc::clone(agent);
            agent.timers.start(kind, span, move || {
                dispatch(&timer_agent, EngineEvent::TimerFired(kind));
            });
        }
        Effect::CancelTimer(kind) => agent.timers.cancel(kind),
    }
}

/// Acquires the sighted media element and wires its observers.
fn bind_media(agent: &Rc<Agent>) {
    let source_agent = Rc::clone(agent);
    let rate_agent = Rc::clone(agent);
    let acquired = MediaBinding::acquire(
        &agent.document,
        &agent.selectors,
        move || {
            dispatch(
                &source_agent,
                EngineEvent::Dom(DomObservation::MediaSourceChanged),
            );
        },
        move |observed| host_rate_changed(&rate_agent, observed),
    );
    if let Ok(Some(binding)) = acquired {
        // Replacing the slot drops the previous element's observers.
        *agent.media.borrow_mut() = Some(binding);
    }
}

/// The host page (or another extension) changed the element's rate: mirror
/// it on the menu surfaces without treating it as an origination.
fn host_rate_changed(agent: &Rc<Agent>, observed: f64) {
    if !agent.engine.borrow().is_enabled() {
        return;
    }
    if let Some(rate) = Rate::from_candidate(observed) {
        agent.menu_surfaces.borrow_mut().repaint_all(rate);
    }
}

/// Builds fresh surfaces for the current menu instance.
fn attach_menu_surfaces(agent: &Rc<Agent>) {
    let Ok(Some(menu)) = agent.document.query_selector(agent.selectors.menu) else {
        return;
    };

    let slider_agent = Rc::clone(agent);
    let slider_intent: Rc<dyn Fn(f64)> = Rc::new(move |candidate| {
        dispatch(
            &slider_agent,
            EngineEvent::Surface {
                source: IntentSource::Slider,
                candidate,
            },
        );
    });
    let menu_agent = Rc::clone(agent);
    let menu_intent: Rc<dyn Fn(f64)> = Rc::new(move |candidate| {
        dispatch(
            &menu_agent,
            EngineEvent::Surface {
                source: IntentSource::NativeMenu,
                candidate,
            },
        );
    });

    let (rate, enabled) = {
        let engine = agent.engine.borrow();
        (engine.rate(), engine.is_enabled())
    };

    let mut surfaces = agent.menu_surfaces.borrow_mut();
    // The previous instance's surfaces died with the previous menu DOM.
    surfaces.clear();
    if let Ok(Some(slider)) = SliderSurface::install(
        &agent.document,
        &menu,
        &agent.selectors,
        rate,
        enabled,
        slider_intent,
    ) {
        surfaces.register(Box::new(slider));
    }
    if let Ok(menu_surface) = MenuSurface::install(&menu, &agent.selectors, menu_intent) {
        surfaces.register(Box::new(menu_surface));
    }
}
