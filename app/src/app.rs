use crate::classifier::{ClassifyError, SpamDetector};
use crate::config::AppConfig;
use crate::loader::{self, ModelPaths};
use crate::particles::{ParticleField, Ticker};
use crate::ui;

use eframe::egui;
use eframe::{App, Frame};
use spamdet::ClassificationResult;
use tracing::{info, warn};

pub const WINDOW_TITLE: &str = "Spam Detector";

/// How a dialog should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

impl NoticeKind {
    pub fn title(self) -> &'static str {
        match self {
            NoticeKind::Info => "Info",
            NoticeKind::Warning => "Warning",
            NoticeKind::Error => "Error",
        }
    }
}

/// A message the user has to acknowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// The main application struct.
/// It holds the high-level state and delegates drawing to the `ui` module.
pub struct SpamDetectorApp {
    // --- Core State ---
    /// The loaded models; `None` when loading failed.
    pub detector: Option<SpamDetector>,
    /// Where the models were looked for.
    pub model_paths: ModelPaths,

    // --- UI State ---
    /// Contents of the message input.
    pub input: String,
    /// The outcome of the last successful classification.
    pub result: Option<ClassificationResult>,
    /// The status line under the result.
    pub status: String,
    /// The dialog currently shown, if any.
    pub notice: Option<Notice>,

    // --- Background animation ---
    pub particles: ParticleField,
    pub ticker: Ticker,
}

impl SpamDetectorApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>, config: &AppConfig) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        Self::from_config(config)
    }

    /// Builds the application state and loads the models.
    pub fn from_config(config: &AppConfig) -> Self {
        let model_paths = config.model_paths();
        let (detector, status) = loader::load_with_status(&model_paths);
        Self::with_detector(
            config,
            model_paths,
            detector,
            status,
            ParticleField::from_entropy(config.particle_count()),
        )
    }

    pub fn with_detector(
        config: &AppConfig,
        model_paths: ModelPaths,
        detector: Option<SpamDetector>,
        status: String,
        particles: ParticleField,
    ) -> Self {
        Self {
            detector,
            model_paths,
            input: String::new(),
            result: None,
            status,
            notice: None,
            particles,
            ticker: Ticker::new(config.tick_interval()),
        }
    }

    /// Whether the CHECK control is enabled.
    pub fn can_classify(&self) -> bool {
        self.detector.is_some()
    }

    /// Classifies the current input and reflects the outcome in the UI state.
    pub fn check_message(&mut self) {
        let outcome = match &self.detector {
            Some(detector) => detector.classify(&self.input),
            None => Err(ClassifyError::ModelUnavailable {
                dir: self.model_paths.dir.display().to_string(),
                classifier: self.model_paths.classifier_name(),
                vectorizer: self.model_paths.vectorizer_name(),
            }),
        };

        match outcome {
            Ok(result) => {
                info!(%result, "message checked");
                self.result = Some(result);
            }
            Err(error @ ClassifyError::EmptyInput) => {
                self.show_notice(NoticeKind::Info, error.to_string());
            }
            Err(error @ ClassifyError::ModelUnavailable { .. }) => {
                warn!("classification requested without a loaded model");
                self.show_notice(NoticeKind::Warning, error.to_string());
            }
            Err(ClassifyError::Inference(reason)) => {
                warn!(%reason, "prediction failed");
                self.show_notice(
                    NoticeKind::Error,
                    format!("An error occurred during prediction: {}", reason),
                );
                self.status = format!("Error: {}", reason);
            }
        }
    }

    pub fn show_notice(&mut self, kind: NoticeKind, message: String) {
        self.notice = Some(Notice { kind, message });
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Runs the animation ticks that are due at time `now` (seconds).
    pub fn animate(&mut self, viewport: egui::Vec2, now: f64) {
        if self.particles.viewport() != viewport {
            self.particles.set_viewport(viewport);
        }
        for _ in 0..self.ticker.advance(now) {
            self.particles.tick();
        }
    }
}

impl App for SpamDetectorApp {
    /// The main update loop, called by eframe on every frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        let viewport = ctx.screen_rect().size();
        let now = ctx.input(|i| i.time);
        self.animate(viewport, now);

        ui::draw_background(self, ctx);
        ui::draw_input_area(self, ctx);
        ui::draw_result_area(self, ctx);
        ui::draw_notice(self, ctx);

        ctx.request_repaint_after(self.ticker.interval());
    }
}
