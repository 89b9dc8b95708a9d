pub mod generation;
pub mod logger;
mod networking;
pub mod surface;
#[cfg(feature = "gui")]
pub mod ui;

use generation::{GeneratedImage, GenerationClient, GenerationConfig, GenerationError};
use log::{info, warn};
use std::fmt;
use surface::DrawingSurface;

/// The caller-visible lifecycle: `Idle -> Generating -> Idle`, transitioned
/// only when a request starts and when it settles. There is no error state;
/// a failed generation is just `Idle` with no result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Idle,
    Generating,
}

#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub logical_width: u32,
    pub logical_height: u32,
    pub device_pixel_ratio: f32,
    pub generation: GenerationConfig,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            logical_width: 512,
            logical_height: 512,
            device_pixel_ratio: 1.0,
            generation: GenerationConfig::default(),
        }
    }
}

#[derive(Debug)]
pub enum StudioError {
    /// A generation is already in flight; the request was rejected, not
    /// queued. Retry once the studio is idle again.
    Busy,
    Generation(GenerationError),
}

impl std::error::Error for StudioError {}

impl fmt::Display for StudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudioError::Busy => write!(f, "A generation is already in flight"),
            StudioError::Generation(e) => write!(f, "{}", e),
        }
    }
}

impl From<GenerationError> for StudioError {
    fn from(e: GenerationError) -> Self {
        StudioError::Generation(e)
    }
}

/// The studio ties the drawing surface to the generation client behind the
/// two-state machine. At most one generation is in flight; a second
/// `reimagine` or a `clear` during that window is rejected with `Busy`.
pub struct Studio {
    surface: DrawingSurface,
    client: GenerationClient,
    state: AppState,
    result: Option<GeneratedImage>,
}

impl Studio {
    pub fn new(config: StudioConfig) -> Self {
        info!(
            target: "studio",
            "Studio initialized: {}x{} canvas, model {}",
            config.logical_width, config.logical_height, config.generation.model
        );
        Self {
            surface: DrawingSurface::new(
                config.logical_width,
                config.logical_height,
                config.device_pixel_ratio,
            ),
            client: GenerationClient::new(config.generation),
            state: AppState::Idle,
            result: None,
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    /// The imperative drawing handle: begin/extend/end strokes, set the
    /// brush, export. Drawing stays available while a generation runs.
    pub fn surface(&self) -> &DrawingSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut DrawingSurface {
        &mut self.surface
    }

    /// The image produced by the most recent successful generation, if any.
    pub fn last_result(&self) -> Option<&GeneratedImage> {
        self.result.as_ref()
    }

    /// Wipe the canvas and drop the current result. Rejected while a
    /// generation is in flight.
    pub fn clear(&mut self) -> Result<(), StudioError> {
        if self.state == AppState::Generating {
            warn!(target: "studio", "Clear rejected: generation in flight");
            return Err(StudioError::Busy);
        }
        self.surface.clear();
        self.result = None;
        Ok(())
    }

    /// Enter `Generating`: snapshot the sketch and hand back a client clone
    /// for the actual call. Pairs with `settle_generation`; these two are
    /// the only places the state transitions.
    pub fn begin_generation(&mut self) -> Result<(GenerationClient, String), StudioError> {
        if self.state == AppState::Generating {
            warn!(target: "studio", "Generate rejected: generation already in flight");
            return Err(StudioError::Busy);
        }
        let sketch = self.surface.export_base64();
        self.state = AppState::Generating;
        self.result = None;
        Ok((self.client.clone(), sketch))
    }

    /// Return to `Idle` whatever the outcome, storing a successful image as
    /// the current result.
    pub fn settle_generation(
        &mut self,
        outcome: Result<Option<GeneratedImage>, GenerationError>,
    ) -> Result<Option<GeneratedImage>, StudioError> {
        self.state = AppState::Idle;
        match outcome {
            Ok(Some(image)) => {
                self.result = Some(image.clone());
                Ok(Some(image))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(StudioError::Generation(e)),
        }
    }

    /// Submit the current sketch with an optional trait prompt and wait for
    /// the outcome. The surface is untouched; the state machine always lands
    /// back on `Idle`.
    pub async fn reimagine(
        &mut self,
        prompt: Option<&str>,
    ) -> Result<Option<GeneratedImage>, StudioError> {
        let (client, sketch) = self.begin_generation()?;
        let outcome = client.generate(&sketch, prompt).await;
        self.settle_generation(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_studio() -> Studio {
        Studio::new(StudioConfig {
            logical_width: 16,
            logical_height: 16,
            device_pixel_ratio: 1.0,
            generation: GenerationConfig {
                // Port 1 on loopback refuses immediately; no external I/O.
                endpoint: "http://127.0.0.1:1".to_string(),
                api_key: "test-key".to_string(),
                model: "test-model".to_string(),
            },
        })
    }

    #[test]
    fn second_generation_and_clear_are_rejected_while_busy() {
        let mut studio = unreachable_studio();
        assert_eq!(studio.state(), AppState::Idle);

        let (_client, _sketch) = studio.begin_generation().expect("idle studio accepts");
        assert_eq!(studio.state(), AppState::Generating);

        assert!(matches!(studio.begin_generation(), Err(StudioError::Busy)));
        assert!(matches!(studio.clear(), Err(StudioError::Busy)));

        // Settling returns the studio to Idle regardless of outcome.
        let settled = studio.settle_generation(Ok(None)).expect("no-image outcome");
        assert!(settled.is_none());
        assert_eq!(studio.state(), AppState::Idle);
        assert!(studio.clear().is_ok());
    }

    #[test]
    fn successful_outcome_is_retained_until_clear() {
        let mut studio = unreachable_studio();
        let image = GeneratedImage {
            mime_type: "image/png".to_string(),
            data: "Zm9v".to_string(),
        };

        studio.begin_generation().expect("idle studio accepts");
        studio
            .settle_generation(Ok(Some(image.clone())))
            .expect("image outcome");
        assert_eq!(studio.last_result(), Some(&image));

        studio.clear().expect("idle clear");
        assert!(studio.last_result().is_none());
    }

    #[tokio::test]
    async fn failed_generation_returns_to_idle_and_recovers() {
        let mut studio = unreachable_studio();
        studio.surface_mut().begin_stroke((2.0, 2.0));
        studio.surface_mut().extend_stroke((10.0, 10.0));
        studio.surface_mut().end_stroke();

        let first = studio.reimagine(Some("grumpy")).await;
        assert!(matches!(first, Err(StudioError::Generation(_))));
        assert_eq!(studio.state(), AppState::Idle);

        // No stuck state: the next attempt runs (and fails the same way).
        let second = studio.reimagine(None).await;
        assert!(matches!(second, Err(StudioError::Generation(_))));
        assert_eq!(studio.state(), AppState::Idle);

        // The sketch survives failed generations.
        assert!(
            studio
                .surface()
                .bitmap()
                .pixels
                .iter()
                .any(|&px| px != 0x00FFFFFF)
        );
    }
}
