use anyhow::{Context, Result, bail};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use trail_common::{PlaybackState, Step, StepErrorKind, Trail};
use trail_core::{Document, RepairEngine, SelectorGenerator, find_element, validate_trail};
use trail_engine::{
    AnalyticsDispatcher, ConfigLoader, FileProgressStore, Key, PageEvent, ProgressStore,
    TourEngine, TourObserver, run_playback,
};

pub fn validate(trail: &Path, page: &Path, json: bool) -> Result<ExitCode> {
    let trail = Trail::load(trail).context("Failed to load trail")?;
    let document = Document::load(page).context("Failed to load page snapshot")?;
    let result = validate_trail(&document, &trail);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for error in &result.errors {
            println!("error: {}", error.message);
        }
        for warning in &result.warnings {
            println!("warning: {}", warning.message);
        }
        println!(
            "{}: {} error(s), {} warning(s)",
            if result.valid { "valid" } else { "invalid" },
            result.errors.len(),
            result.warnings.len()
        );
    }

    Ok(if result.valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub fn generate(page: &Path, select: &str) -> Result<ExitCode> {
    let document = Document::load(page).context("Failed to load page snapshot")?;
    let Some(node) = find_element(&document, select) else {
        bail!("No element matches '{}'", select);
    };
    let Some(generated) = SelectorGenerator::generate(&document, node) else {
        bail!("Element matched by '{}' is not attached", select);
    };
    println!("{}", generated.selector);
    info!("Strategy: {:?}", generated.strategy);
    Ok(ExitCode::SUCCESS)
}

pub async fn repair(page: &Path, selector: &str, text: Option<&str>) -> Result<ExitCode> {
    let config = ConfigLoader::load_default().await?;
    let document = Document::load(page).context("Failed to load page snapshot")?;

    if find_element(&document, selector).is_some() {
        println!("'{}' still resolves, nothing to repair", selector);
        return Ok(ExitCode::SUCCESS);
    }

    let suggestions = RepairEngine::suggest(&document, selector, text, &config.similarity);
    if suggestions.is_empty() {
        println!("No candidates found for '{}'", selector);
        return Ok(ExitCode::FAILURE);
    }
    for suggestion in suggestions {
        println!(
            "{:.2}  {}  ({})",
            suggestion.confidence, suggestion.selector, suggestion.reason
        );
    }
    Ok(ExitCode::SUCCESS)
}

/// Prints lifecycle callbacks and remembers the last displayed step.
struct PrintObserver {
    total: usize,
    last_shown: Rc<Cell<Option<usize>>>,
}

impl TourObserver for PrintObserver {
    fn on_step_change(&mut self, step: &Step, index: usize) {
        self.last_shown.set(Some(index));
        let title = if step.title.is_empty() {
            &step.id
        } else {
            &step.title
        };
        println!("[{}/{}] {}", index + 1, self.total, title);
    }

    fn on_complete(&mut self) {
        println!("Trail completed");
    }

    fn on_skip(&mut self) {
        println!("Trail skipped");
    }

    fn on_abandoned(&mut self) {
        println!("Trail abandoned");
    }

    fn on_error(&mut self, step: &Step, kind: StepErrorKind) {
        println!("Step '{}' failed: {}", step.id, kind.describe());
    }
}

pub async fn play(
    trail: &Path,
    page: &Path,
    keys: &[String],
    resume: bool,
    progress: Option<PathBuf>,
) -> Result<ExitCode> {
    let config = ConfigLoader::load_default().await?;
    let trail = Trail::load(trail).context("Failed to load trail")?;
    let document = Document::load(page).context("Failed to load page snapshot")?;

    let store = match progress {
        Some(path) => FileProgressStore::new(path),
        None => FileProgressStore::default_location()
            .context("Could not determine home directory for progress")?,
    };

    let mut start_index = 0;
    if resume {
        if store.is_completed(&trail.id).await? {
            println!("Trail '{}' was already completed", trail.id);
            return Ok(ExitCode::SUCCESS);
        }
        start_index = store.last_step(&trail.id).await?.unwrap_or(0);
    }

    let last_shown = Rc::new(Cell::new(None));
    let observer = PrintObserver {
        total: trail.len(),
        last_shown: Rc::clone(&last_shown),
    };

    let mut engine = TourEngine::with_config(document, &config).with_observer(Box::new(observer));
    if let Some(dispatcher) = AnalyticsDispatcher::from_config(&config.analytics) {
        info!("Analytics session {}", dispatcher.session_id());
        engine = engine.with_analytics(Box::new(dispatcher));
    }

    let (tx, rx) = mpsc::unbounded_channel();
    for key in keys {
        let key: Key = match key.parse() {
            Ok(key) => key,
            Err(never) => match never {},
        };
        // Receiver outlives the loop, so send cannot fail here
        let _ = tx.send(PageEvent::Key(key));
    }
    drop(tx);

    let trail_id = trail.id.clone();
    engine.start_at(trail, start_index);
    let tick = Duration::from_millis(config.playback.tick_ms);
    let state = run_playback(&mut engine, rx, tick).await;

    match state {
        PlaybackState::Completed => store.mark_completed(&trail_id).await?,
        _ => {
            if state.is_running() {
                warn!("Out of input with the trail still running, stopping");
                engine.stop();
            }
            if let Some(index) = last_shown.get() {
                store.save_step(&trail_id, index).await?;
            }
        }
    }

    info!("Final state: {:?}", engine.state());
    Ok(ExitCode::SUCCESS)
}
