//! Interactive sketch window, enabled by the `gui` feature.
//!
//! Left mouse drags paint through the drawing surface; the window can be
//! resized freely, which stretches the displayed canvas without touching the
//! backing bitmap; pointer mapping absorbs the difference.
//!
//! Keys: `1`-`4` pick the palette color, `C` clears, `G` submits the sketch,
//! `S` saves the last creature to disk, `ESC` quits.

use crate::Studio;
use crate::generation::{GeneratedImage, GenerationError};
use crate::surface::BrushColor;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, ScaleMode, Window, WindowOptions};
use std::fmt;
use std::sync::mpsc::{self, Receiver, TryRecvError};

const TITLE_IDLE: &str = "Chimera — draw, G: spawn creature, C: clear, 1-4: color, S: save";
const TITLE_GENERATING: &str = "Chimera — spawning creature…";

type PendingOutcome = Receiver<Result<Option<GeneratedImage>, GenerationError>>;

#[derive(Debug)]
pub enum UiError {
    Window(String),
}

impl std::error::Error for UiError {}

impl fmt::Display for UiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiError::Window(e) => write!(f, "Window error: {}", e),
        }
    }
}

/// Run the window loop until the user closes it. Generation requests are
/// spawned onto `runtime` and polled once per frame, so drawing never blocks
/// on the network round trip.
pub fn run(
    mut studio: Studio,
    runtime: tokio::runtime::Handle,
    traits: Option<String>,
) -> Result<(), UiError> {
    let (width, height) = {
        let bitmap = studio.surface().bitmap();
        (bitmap.width, bitmap.height)
    };

    let mut window = Window::new(
        TITLE_IDLE,
        width,
        height,
        WindowOptions {
            resize: true,
            scale_mode: ScaleMode::Stretch,
            ..WindowOptions::default()
        },
    )
    .map_err(|e| UiError::Window(e.to_string()))?;
    window.set_target_fps(60);

    let mut drawing = false;
    let mut pending: Option<PendingOutcome> = None;

    while window.is_open() && !window.is_key_down(Key::Escape) {
        // The displayed size tracks the live window; the bitmap does not.
        let (view_w, view_h) = window.get_size();
        studio
            .surface_mut()
            .set_view_size(view_w as f32, view_h as f32);

        handle_brush_keys(&mut studio, &window);
        handle_action_keys(&mut studio, &window, &runtime, traits.as_deref(), &mut pending);
        handle_pointer(&mut studio, &window, &mut drawing);

        if poll_pending(&mut studio, &mut pending) {
            window.set_title(TITLE_IDLE);
        } else if pending.is_some() {
            window.set_title(TITLE_GENERATING);
        }

        let bitmap = studio.surface().bitmap();
        window
            .update_with_buffer(&bitmap.pixels, bitmap.width, bitmap.height)
            .map_err(|e| UiError::Window(e.to_string()))?;
    }

    Ok(())
}

fn handle_brush_keys(studio: &mut Studio, window: &Window) {
    let keys = [
        (Key::Key1, BrushColor::Slate),
        (Key::Key2, BrushColor::Red),
        (Key::Key3, BrushColor::Blue),
        (Key::Key4, BrushColor::Green),
    ];
    for (key, color) in keys {
        if window.is_key_pressed(key, KeyRepeat::No) {
            let width = studio.surface().brush().width;
            studio.surface_mut().set_brush(color, width);
            log::info!(target: "ui", "Brush color: {}", color.label());
        }
    }
}

fn handle_action_keys(
    studio: &mut Studio,
    window: &Window,
    runtime: &tokio::runtime::Handle,
    traits: Option<&str>,
    pending: &mut Option<PendingOutcome>,
) {
    if window.is_key_pressed(Key::C, KeyRepeat::No) {
        match studio.clear() {
            Ok(()) => log::info!(target: "ui", "Canvas cleared"),
            Err(e) => log::warn!(target: "ui", "{}", e),
        }
    }

    if window.is_key_pressed(Key::G, KeyRepeat::No) {
        match studio.begin_generation() {
            Ok((client, sketch)) => {
                let prompt = traits.map(str::to_string);
                let (tx, rx) = mpsc::channel();
                runtime.spawn(async move {
                    let outcome = client.generate(&sketch, prompt.as_deref()).await;
                    let _ = tx.send(outcome);
                });
                *pending = Some(rx);
            }
            Err(e) => log::warn!(target: "ui", "{}", e),
        }
    }

    if window.is_key_pressed(Key::S, KeyRepeat::No) {
        save_result(studio);
    }
}

fn handle_pointer(studio: &mut Studio, window: &Window, drawing: &mut bool) {
    if window.get_mouse_down(MouseButton::Left) {
        if let Some(pos) = window.get_mouse_pos(MouseMode::Clamp) {
            if *drawing {
                studio.surface_mut().extend_stroke(pos);
            } else {
                studio.surface_mut().begin_stroke(pos);
                *drawing = true;
            }
        }
    } else if *drawing {
        studio.surface_mut().end_stroke();
        *drawing = false;
    }
}

/// Drain a settled generation, if any. Returns true when one settled this
/// frame (successful or not), so the caller can reset the window title.
fn poll_pending(studio: &mut Studio, pending: &mut Option<PendingOutcome>) -> bool {
    let Some(rx) = pending.as_ref() else {
        return false;
    };

    let outcome = match rx.try_recv() {
        Ok(outcome) => outcome,
        Err(TryRecvError::Empty) => return false,
        Err(TryRecvError::Disconnected) => Err(GenerationError::Interrupted),
    };
    *pending = None;

    match studio.settle_generation(outcome) {
        Ok(Some(image)) => {
            log::info!(target: "ui", "Creature ready ({}), press S to save", image.mime_type)
        }
        Ok(None) => log::info!(target: "ui", "The service returned no image this time"),
        Err(e) => log::warn!(target: "ui", "{}", e),
    }
    true
}

fn save_result(studio: &Studio) {
    let Some(image) = studio.last_result() else {
        log::info!(target: "ui", "Nothing to save yet");
        return;
    };
    let bytes = match image.bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!(target: "ui", "Result payload is not valid base64: {}", e);
            return;
        }
    };
    match std::fs::write("creature.png", &bytes) {
        Ok(()) => log::info!(target: "ui", "Saved creature.png ({} bytes)", bytes.len()),
        Err(e) => log::warn!(target: "ui", "Failed to save creature.png: {}", e),
    }
}
