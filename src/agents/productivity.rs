//! Productivity bottlenecks from time and task logs

use super::frame::{require_columns, round_to, strings, timestamps};
use super::Agent;
use crate::error::Result;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Upper bounds in hours of the open-task age buckets; the last is open-ended
const AGING_BUCKETS: [(&str, f64); 5] = [
    ("<1d", 24.0),
    ("1-2d", 48.0),
    ("2-3d", 72.0),
    ("3-7d", 168.0),
    (">7d", f64::INFINITY),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductivityConfig {
    pub working_hours_per_week: f64,
    /// Open tasks older than this are overdue
    pub sla_hours: f64,
    pub top_bottlenecks: usize,
}

impl Default for ProductivityConfig {
    fn default() -> Self {
        Self {
            working_hours_per_week: 40.0,
            sla_hours: 48.0,
            top_bottlenecks: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProductivityRequest {
    /// `task_id`, `user_id`, `start_time`, `end_time`
    pub time_logs: DataFrame,
    /// `task_id`, `task_type`, `created_at`, `completed_at`
    pub task_logs: DataFrame,
    /// Reference time for task ages; the current UTC time when absent
    pub now: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    pub task_type: String,
    pub avg_cycle_time_h: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgingBucket {
    pub bucket: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductivityReport {
    pub average_completion_time_h: Option<f64>,
    pub avg_cycle_time_by_type_h: BTreeMap<String, f64>,
    /// Distinct completed tasks per week, keyed by the week's closing Sunday
    pub throughput_per_week: BTreeMap<NaiveDate, usize>,
    /// Logged hours over weekly working hours
    pub user_utilization: BTreeMap<String, f64>,
    /// Slowest task types first
    pub top_bottleneck_types: Vec<Bottleneck>,
    pub overdue_tasks: Vec<String>,
    pub open_task_aging: Vec<AgingBucket>,
}

/// Cycle times, throughput, utilisation and open-task aging
pub fn analyze_productivity(
    time_logs: &DataFrame,
    task_logs: &DataFrame,
    now: NaiveDateTime,
    config: &ProductivityConfig,
) -> Result<ProductivityReport> {
    let mut report = ProductivityReport {
        open_task_aging: AGING_BUCKETS
            .iter()
            .map(|(bucket, _)| AgingBucket {
                bucket: bucket.to_string(),
                count: 0,
            })
            .collect(),
        ..Default::default()
    };

    let task_types: HashMap<String, String> = if task_logs.height() > 0 {
        require_columns(task_logs, &["task_id", "created_at", "completed_at"])?;
        let ids = strings(task_logs, "task_id")?.unwrap_or_default();
        let types = strings(task_logs, "task_type")?.unwrap_or_else(|| vec![None; ids.len()]);
        ids.into_iter()
            .zip(types)
            .filter_map(|(id, t)| Some((id?, t?)))
            .collect()
    } else {
        HashMap::new()
    };

    if time_logs.height() > 0 {
        require_columns(time_logs, &["task_id", "user_id", "start_time", "end_time"])?;
        cycle_times(time_logs, &task_types, config, &mut report)?;
    }
    if task_logs.height() > 0 {
        task_flow(task_logs, now, config, &mut report)?;
    }
    Ok(report)
}

fn cycle_times(
    time_logs: &DataFrame,
    task_types: &HashMap<String, String>,
    config: &ProductivityConfig,
    report: &mut ProductivityReport,
) -> Result<()> {
    let task_ids = strings(time_logs, "task_id")?.unwrap_or_default();
    let users = strings(time_logs, "user_id")?.unwrap_or_default();
    let starts = timestamps(time_logs, "start_time")?.unwrap_or_default();
    let ends = timestamps(time_logs, "end_time")?.unwrap_or_default();

    let mut all = Vec::new();
    let mut by_type: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut by_user: BTreeMap<String, f64> = BTreeMap::new();
    for i in 0..time_logs.height() {
        let (Some(start), Some(end)) = (starts[i], ends[i]) else {
            continue;
        };
        let hours = (end - start).num_milliseconds() as f64 / 3_600_000.0;
        all.push(hours);
        if let Some(kind) = task_ids[i].as_ref().and_then(|id| task_types.get(id)) {
            by_type.entry(kind.clone()).or_default().push(hours);
        }
        if let Some(user) = &users[i] {
            *by_user.entry(user.clone()).or_default() += hours;
        }
    }

    report.average_completion_time_h = mean(&all);
    report.avg_cycle_time_by_type_h = by_type
        .into_iter()
        .filter_map(|(kind, hours)| mean(&hours).map(|m| (kind, m)))
        .collect();
    report.user_utilization = by_user
        .into_iter()
        .map(|(user, hours)| (user, round_to(hours / config.working_hours_per_week, 2)))
        .collect();

    let mut ranked: Vec<Bottleneck> = report
        .avg_cycle_time_by_type_h
        .iter()
        .map(|(task_type, &avg_cycle_time_h)| Bottleneck {
            task_type: task_type.clone(),
            avg_cycle_time_h,
        })
        .collect();
    ranked.sort_by(|a, b| b.avg_cycle_time_h.total_cmp(&a.avg_cycle_time_h));
    ranked.truncate(config.top_bottlenecks);
    report.top_bottleneck_types = ranked;
    Ok(())
}

fn task_flow(
    task_logs: &DataFrame,
    now: NaiveDateTime,
    config: &ProductivityConfig,
    report: &mut ProductivityReport,
) -> Result<()> {
    let ids = strings(task_logs, "task_id")?.unwrap_or_default();
    let created = timestamps(task_logs, "created_at")?.unwrap_or_default();
    let completed = timestamps(task_logs, "completed_at")?.unwrap_or_default();

    let mut weeks: BTreeMap<NaiveDate, BTreeSet<&str>> = BTreeMap::new();
    for (id, done) in ids.iter().zip(&completed) {
        if let (Some(id), Some(done)) = (id, done) {
            weeks.entry(week_ending(done.date())).or_default().insert(id.as_str());
        }
    }
    // weeks without completions still appear, with zero
    if let (Some(&first), Some(&last)) = (weeks.keys().next(), weeks.keys().next_back()) {
        let mut week = first;
        while week <= last {
            report
                .throughput_per_week
                .insert(week, weeks.get(&week).map_or(0, BTreeSet::len));
            week += Duration::days(7);
        }
    }

    for ((id, created), done) in ids.iter().zip(&created).zip(&completed) {
        if done.is_some() {
            continue;
        }
        let Some(created) = created else {
            continue;
        };
        let age_h = (now - *created).num_milliseconds() as f64 / 3_600_000.0;
        if age_h > config.sla_hours {
            if let Some(id) = id {
                report.overdue_tasks.push(id.clone());
            }
        }
        if age_h > 0.0 {
            if let Some(slot) = AGING_BUCKETS.iter().position(|(_, upper)| age_h <= *upper) {
                report.open_task_aging[slot].count += 1;
            }
        }
    }
    Ok(())
}

/// The Sunday closing the week that contains `date`
fn week_ending(date: NaiveDate) -> NaiveDate {
    let days_to_sunday = 6 - date.weekday().num_days_from_monday();
    date + Duration::days(i64::from(days_to_sunday))
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

#[derive(Debug, Clone, Default)]
pub struct ProductivityAgent {
    config: ProductivityConfig,
}

impl ProductivityAgent {
    pub fn new(config: ProductivityConfig) -> Self {
        Self { config }
    }
}

impl Agent for ProductivityAgent {
    type Request = ProductivityRequest;
    type Report = ProductivityReport;

    fn name(&self) -> &'static str {
        "productivity"
    }

    fn description(&self) -> &'static str {
        "Cycle times, throughput, utilisation and overdue work"
    }

    fn run(&self, request: &ProductivityRequest) -> Result<ProductivityReport> {
        let now = request.now.unwrap_or_else(|| Utc::now().naive_utc());
        analyze_productivity(&request.time_logs, &request.task_logs, now, &self.config)
    }
}
