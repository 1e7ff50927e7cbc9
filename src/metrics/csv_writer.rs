//! Scalar log in a Tensorboard-like CSV layout.
//!
//! Rows are `step,tag,value,wall_time`, written to `<log_dir>/<run_id>/scalars.csv`, where
//! `step` is the episode number and `wall_time` counts seconds since the writer opened.

use std::fs::{File, create_dir_all};
use std::io::{Write, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::{EpisodeSummary, MetricsSink};
use crate::error::Result;

pub struct CsvMetricsWriter {
    log_dir: PathBuf,
    step: usize,
    started: Instant,
    writer: BufWriter<File>,
}

impl CsvMetricsWriter {
    /// Create `<log_dir>/<run_id>/scalars.csv` and write its header.
    pub fn new<P: AsRef<Path>>(log_dir: P, run_id: &str) -> Result<Self> {
        let log_path = log_dir.as_ref().join(run_id);
        create_dir_all(&log_path)?;

        let mut writer = BufWriter::new(File::create(log_path.join("scalars.csv"))?);
        writeln!(writer, "step,tag,value,wall_time")?;

        Ok(CsvMetricsWriter {
            log_dir: log_path,
            step: 0,
            started: Instant::now(),
            writer,
        })
    }

    /// Directory holding this run's files
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn set_step(&mut self, step: usize) {
        self.step = step;
    }

    pub fn add_scalar(&mut self, tag: &str, value: f32) -> Result<()> {
        let wall_time = self.started.elapsed().as_secs_f64();
        writeln!(self.writer, "{},{},{},{:.3}", self.step, tag, value, wall_time)?;
        Ok(())
    }
}

impl MetricsSink for CsvMetricsWriter {
    fn record(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.set_step(summary.episode);
        self.add_scalar("epsilon", summary.epsilon)?;
        self.add_scalar("loss", summary.loss)?;
        self.add_scalar("steps", summary.steps as f32)?;
        for (seat, reward) in summary.rewards.iter().enumerate() {
            self.add_scalar(&format!("reward/player_{}", seat), *reward)?;
        }
        for (seat, average) in summary.reward_averages.iter().enumerate() {
            self.add_scalar(&format!("reward_avg/player_{}", seat), *average)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
