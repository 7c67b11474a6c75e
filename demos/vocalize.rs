use std::path::Path;
use std::time::{Duration, Instant};

use vocalize_rs::{
    asset::MemoryAssetStore, playback::HeadlessPlayer, providers::gemini::GeminiProvider,
    GenerationOutcome, Session, SessionConfig,
};

/// Roughly one display refresh.
const FRAME: Duration = Duration::from_millis(16);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let text = std::env::args().nth(1).unwrap_or_else(|| {
        "Once upon a time, in a digital realm far away, a little code snippet \
         dreamed of becoming a full-fledged application."
            .to_string()
    });

    let config = match std::env::var("VOCALIZE_CONFIG") {
        Ok(path) => SessionConfig::load(Path::new(&path))?,
        Err(_) => SessionConfig::default(),
    };

    let mut session = Session::new(
        GeminiProvider::from_env()?,
        HeadlessPlayer::new(),
        MemoryAssetStore::new(),
        config,
    )?;

    let gen_start = Instant::now();
    let outcome = session.generate(&text)?;
    println!("Generated in {:.2?} ({outcome:?})", gen_start.elapsed());

    for token in session.tokens().iter().filter(|t| t.is_word) {
        println!(
            "{:>7.3}s - {:>7.3}s  {}",
            token.start.unwrap_or_default(),
            token.end.unwrap_or_default(),
            token.text
        );
    }

    if outcome == GenerationOutcome::Ready {
        session.replay()?;
    }

    while let Some(report) = session.frame() {
        if report.active_changed {
            let peak = session.spectrum().iter().copied().max().unwrap_or(0);
            let word = session.active_token().map(|t| t.text.as_str()).unwrap_or("-");
            println!("[{:>6.3}s] {word:<20} peak {peak:>3}", report.current_time);
        }
        std::thread::sleep(FRAME);
    }

    let path = session.export(Path::new("."))?;
    println!("Saved to {}", path.display());
    Ok(())
}
