//! Main build pipeline.
//!
//! The build is a fixed, ordered list of [`StageDescriptor`]s executed one at
//! a time by [`run_on`]:
//!
//! ```text
//! clean ─▶ markup ─▶ styles ─▶ scripts ─▶ assets ─▶ templates ─▶ sitemap
//! ```
//!
//! Every stage reads the source tree through the shared `&BuildConfig` and
//! writes into the output root. The first failing stage aborts the run: later
//! stages are recorded as skipped and whatever earlier stages wrote stays on
//! disk. There are no retries.

use crate::assets::{self, AssetError};
use crate::bundle::{self, BundleError};
use crate::config::BuildConfig;
use crate::markup::{self, MarkupError};
use crate::sitemap::{self, SitemapError};
use crate::types::GeneratedArtifact;
use chrono::NaiveDate;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Identity of a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Clean,
    Markup,
    Styles,
    Scripts,
    Assets,
    Templates,
    Sitemap,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Clean => "clean",
            Self::Markup => "markup",
            Self::Styles => "styles",
            Self::Scripts => "scripts",
            Self::Assets => "assets",
            Self::Templates => "templates",
            Self::Sitemap => "sitemap",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum StageError {
    #[error("cannot reset output directory {}: {source}", path.display())]
    Clean {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Markup(#[from] MarkupError),
    #[error(transparent)]
    Bundle(#[from] BundleError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Sitemap(#[from] SitemapError),
}

/// A fatal stage failure, tagged with the stage that raised it.
#[derive(Error, Debug)]
#[error("{stage} stage failed: {source}")]
pub struct BuildError {
    pub stage: Stage,
    pub source: StageError,
}

pub type StageResult = Result<Vec<GeneratedArtifact>, StageError>;

/// Signature shared by every stage.
pub type StageFn = fn(&BuildConfig, NaiveDate) -> StageResult;

/// A stage tag paired with the function that runs it.
#[derive(Clone, Copy)]
pub struct StageDescriptor {
    pub stage: Stage,
    pub run: StageFn,
}

/// The build, in execution order.
pub const STAGES: [StageDescriptor; 7] = [
    StageDescriptor {
        stage: Stage::Clean,
        run: clean_stage,
    },
    StageDescriptor {
        stage: Stage::Markup,
        run: markup_stage,
    },
    StageDescriptor {
        stage: Stage::Styles,
        run: styles_stage,
    },
    StageDescriptor {
        stage: Stage::Scripts,
        run: scripts_stage,
    },
    StageDescriptor {
        stage: Stage::Assets,
        run: assets_stage,
    },
    StageDescriptor {
        stage: Stage::Templates,
        run: templates_stage,
    },
    StageDescriptor {
        stage: Stage::Sitemap,
        run: sitemap_stage,
    },
];

/// Empty `output`, creating it if absent. Running twice is the same as once.
pub fn clean_output(output: &Path) -> std::io::Result<()> {
    if output.exists() {
        fs::remove_dir_all(output)?;
    }
    fs::create_dir_all(output)
}

fn clean_stage(config: &BuildConfig, _today: NaiveDate) -> StageResult {
    clean_output(&config.output).map_err(|e| StageError::Clean {
        path: config.output.clone(),
        source: e,
    })?;
    Ok(Vec::new())
}

fn markup_stage(config: &BuildConfig, _today: NaiveDate) -> StageResult {
    Ok(markup::process_markup(config)?)
}

fn styles_stage(config: &BuildConfig, _today: NaiveDate) -> StageResult {
    Ok(vec![bundle::bundle_styles(config)?])
}

fn scripts_stage(config: &BuildConfig, _today: NaiveDate) -> StageResult {
    Ok(vec![bundle::bundle_scripts(config)?])
}

fn assets_stage(config: &BuildConfig, _today: NaiveDate) -> StageResult {
    Ok(assets::copy_assets(config)?)
}

fn templates_stage(config: &BuildConfig, _today: NaiveDate) -> StageResult {
    Ok(assets::copy_templates(config)?)
}

fn sitemap_stage(config: &BuildConfig, today: NaiveDate) -> StageResult {
    Ok(vec![sitemap::generate_sitemap(config, today)?])
}

/// How a stage ended.
#[derive(Debug)]
pub enum StageOutcome {
    Completed(Vec<GeneratedArtifact>),
    Failed(StageError),
    /// Not run because an earlier stage failed.
    Skipped,
}

#[derive(Debug)]
pub struct StageReport {
    pub stage: Stage,
    pub outcome: StageOutcome,
    pub elapsed: Duration,
}

/// Per-stage outcomes of one build, in execution order.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub stages: Vec<StageReport>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failure().is_none()
    }

    /// The stage that aborted the build, if any.
    pub fn failure(&self) -> Option<(Stage, &StageError)> {
        self.stages.iter().find_map(|report| match &report.outcome {
            StageOutcome::Failed(e) => Some((report.stage, e)),
            _ => None,
        })
    }

    /// Every artifact written by completed stages.
    pub fn artifacts(&self) -> impl Iterator<Item = &GeneratedArtifact> {
        self.stages.iter().flat_map(|report| match &report.outcome {
            StageOutcome::Completed(artifacts) => artifacts.as_slice(),
            _ => &[][..],
        })
    }

    /// All artifacts on success, the aborting stage's error otherwise.
    pub fn into_result(self) -> Result<Vec<GeneratedArtifact>, BuildError> {
        let mut all = Vec::new();
        for report in self.stages {
            match report.outcome {
                StageOutcome::Completed(artifacts) => all.extend(artifacts),
                StageOutcome::Failed(source) => {
                    return Err(BuildError {
                        stage: report.stage,
                        source,
                    });
                }
                StageOutcome::Skipped => {}
            }
        }
        Ok(all)
    }
}

/// Progress events sent while the pipeline runs.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    StageStarted(Stage),
    StageFinished {
        stage: Stage,
        artifacts: usize,
        bytes: u64,
        elapsed: Duration,
    },
    StageFailed {
        stage: Stage,
        error: String,
    },
}

/// Build the site dated today (UTC), without progress events.
pub fn run(config: &BuildConfig) -> BuildReport {
    run_on(config, chrono::Utc::now().date_naive(), None)
}

/// Build the site with an explicit generation date.
pub fn run_on(
    config: &BuildConfig,
    today: NaiveDate,
    events: Option<Sender<PipelineEvent>>,
) -> BuildReport {
    let emit = |event| {
        if let Some(tx) = &events {
            let _ = tx.send(event);
        }
    };

    let mut report = BuildReport::default();
    let mut aborted = false;

    for descriptor in &STAGES {
        if aborted {
            report.stages.push(StageReport {
                stage: descriptor.stage,
                outcome: StageOutcome::Skipped,
                elapsed: Duration::ZERO,
            });
            continue;
        }

        emit(PipelineEvent::StageStarted(descriptor.stage));
        let started = Instant::now();
        let result = (descriptor.run)(config, today);
        let elapsed = started.elapsed();

        let outcome = match result {
            Ok(artifacts) => {
                emit(PipelineEvent::StageFinished {
                    stage: descriptor.stage,
                    artifacts: artifacts.len(),
                    bytes: artifacts.iter().map(|a| a.bytes).sum(),
                    elapsed,
                });
                StageOutcome::Completed(artifacts)
            }
            Err(e) => {
                emit(PipelineEvent::StageFailed {
                    stage: descriptor.stage,
                    error: e.to_string(),
                });
                aborted = true;
                StageOutcome::Failed(e)
            }
        };
        report.stages.push(StageReport {
            stage: descriptor.stage,
            outcome,
            elapsed,
        });
    }

    report
}
