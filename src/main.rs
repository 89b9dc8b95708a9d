use chimera::generation::GenerationConfig;
use chimera::{Studio, StudioConfig};
use log::info;

#[cfg(not(feature = "gui"))]
use std::error::Error;
#[cfg(not(feature = "gui"))]
use std::io::{self, Write};

fn studio_config_from_env() -> StudioConfig {
    let mut generation = GenerationConfig::default();
    if let Ok(key) = std::env::var("GEMINI_API_KEY").or_else(|_| std::env::var("API_KEY")) {
        generation.api_key = key;
    }
    if let Ok(model) = std::env::var("CHIMERA_MODEL") {
        generation.model = model;
    }
    if let Ok(endpoint) = std::env::var("CHIMERA_ENDPOINT") {
        generation.endpoint = endpoint;
    }
    if generation.api_key.is_empty() {
        log::warn!(target: "studio", "No GEMINI_API_KEY set; generation requests will be rejected");
    }

    let device_pixel_ratio = std::env::var("CHIMERA_DPR")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(1.0);

    StudioConfig {
        device_pixel_ratio,
        generation,
        ..StudioConfig::default()
    }
}

#[cfg(feature = "gui")]
fn main() {
    // Install rustls crypto provider before any TLS operations
    if let Err(e) = rustls::crypto::ring::default_provider().install_default() {
        eprintln!("Failed to install rustls crypto provider: {:?}", e);
        return;
    }

    if let Err(e) = chimera::logger::init(log::LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
        return;
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start async runtime: {}", e);
            return;
        }
    };

    let studio = Studio::new(studio_config_from_env());
    let traits = std::env::var("CHIMERA_TRAITS").ok();

    println!("Chimera Creature Studio");
    info!(target: "studio", "Studio initialized with GUI");

    if let Err(e) = chimera::ui::run(studio, runtime.handle().clone(), traits) {
        eprintln!("UI error: {}", e);
    }
}

#[cfg(not(feature = "gui"))]
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Install rustls crypto provider before any TLS operations
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "Failed to install rustls crypto provider")?;

    chimera::logger::init(log::LevelFilter::Info)
        .map_err(|e| format!("Failed to initialize logger: {}", e))?;

    let mut studio = Studio::new(studio_config_from_env());

    println!("Chimera Creature Studio");
    info!(target: "studio", "Studio initialized headless");

    scribble_sample_creature(&mut studio);
    std::fs::write("sketch.png", studio.surface().export_png())?;
    println!("[+] Sample sketch written to sketch.png");

    print!("Creature traits (optional): ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let traits = input.trim();
    let prompt = if traits.is_empty() { None } else { Some(traits) };

    let start = std::time::Instant::now();
    match studio.reimagine(prompt).await {
        Ok(Some(image)) => {
            println!(
                "[+] Creature spawned in {:.2?} ({})",
                start.elapsed(),
                image.mime_type
            );
            std::fs::write("creature.png", image.bytes()?)?;
            println!("[+] Saved to creature.png");
        }
        Ok(None) => {
            println!("[-] The call succeeded but returned no image. Try again.");
        }
        Err(e) => {
            eprintln!("Something went wrong with the creative process. Please try again.");
            return Err(e.into());
        }
    }

    Ok(())
}

/// A scripted stand-in for freehand input: a wobbly body, two eyes and a
/// mouth, enough structure for the service to riff on.
#[cfg(not(feature = "gui"))]
fn scribble_sample_creature(studio: &mut Studio) {
    use chimera::surface::BrushColor;
    use std::f32::consts::TAU;

    let surface = studio.surface_mut();

    // Body outline.
    surface.begin_stroke((256.0, 156.0));
    for i in 1..=48 {
        let t = i as f32 / 48.0 * TAU;
        surface.extend_stroke((256.0 + 110.0 * t.sin(), 256.0 - 100.0 * t.cos()));
    }
    surface.end_stroke();

    // Eyes.
    surface.set_brush(BrushColor::Blue, 7.0);
    for x in [216.0, 296.0] {
        surface.begin_stroke((x, 216.0));
        surface.extend_stroke((x + 2.0, 218.0));
        surface.end_stroke();
    }

    // Mouth.
    surface.set_brush(BrushColor::Red, 5.0);
    surface.begin_stroke((216.0, 296.0));
    for i in 1..=16 {
        let t = i as f32 / 16.0;
        surface.extend_stroke((216.0 + 80.0 * t, 296.0 + 20.0 * (t * TAU / 2.0).sin()));
    }
    surface.end_stroke();

    surface.set_brush(BrushColor::Slate, 5.0);
}
