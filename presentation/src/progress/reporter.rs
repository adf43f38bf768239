//! Progress reporting for agent activity

use colored::Colorize;
use docuforge_application::{ActivityObserver, ObserverError};
use docuforge_domain::{ActivityRecord, ActivityStatus};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Shows one spinner per running activity, finished with a check or a cross.
pub struct ProgressReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<u64, ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    pub fn with_draw_target(target: ProgressDrawTarget) -> Self {
        Self {
            multi: MultiProgress::with_draw_target(target),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn bars(&self) -> MutexGuard<'_, HashMap<u64, ProgressBar>> {
        match self.bars.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn running(&self) -> usize {
        self.bars().len()
    }

    /// Stop every spinner still running, e.g. after a cancelled request.
    pub fn clear(&self) {
        for (_, bar) in self.bars().drain() {
            bar.finish_and_clear();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityObserver for ProgressReporter {
    fn on_activity(&self, record: &ActivityRecord) -> Result<(), ObserverError> {
        let mut bars = self.bars();
        match record.status {
            ActivityStatus::InProgress => {
                let bar = self.multi.add(ProgressBar::new_spinner());
                bar.set_style(Self::spinner_style());
                bar.set_prefix(record.agent.clone());
                bar.set_message(record.action.clone());
                bar.enable_steady_tick(Duration::from_millis(100));
                bars.insert(record.id, bar);
            }
            ActivityStatus::Completed | ActivityStatus::Error => {
                let line = SimpleProgress::line(record);
                match bars.remove(&record.id) {
                    Some(bar) => bar.finish_with_message(line),
                    // Handoffs arrive already finished
                    None => {
                        let _ = self.multi.println(line);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Simple text-based progress (no fancy UI), written to stderr
pub struct SimpleProgress;

impl SimpleProgress {
    pub fn line(record: &ActivityRecord) -> String {
        match record.status {
            ActivityStatus::InProgress => {
                format!("{} {}: {}", "->".cyan(), record.agent.bold(), record.action)
            }
            ActivityStatus::Completed => {
                format!("{} {}: {}", "v".green(), record.agent.bold(), record.action)
            }
            ActivityStatus::Error => format!(
                "{} {}: {} ({})",
                "x".red(),
                record.agent.bold(),
                record.action,
                record.error.as_deref().unwrap_or("failed")
            ),
        }
    }
}

impl ActivityObserver for SimpleProgress {
    fn on_activity(&self, record: &ActivityRecord) -> Result<(), ObserverError> {
        eprintln!("{}", Self::line(record));
        Ok(())
    }
}
