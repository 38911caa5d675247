//! Workforce CLI
//!
//! One subcommand per agent plus data utilities. Every agent command reads its
//! tables from CSV, prints a short summary and stores the full JSON report in
//! the results directory.

use clap::{Parser, Subcommand};
use colored::*;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::agents::{
    intervention_catalog, Agent, AttritionAgent, DiversityAgent, Intervention, PlanningAgent, PlanningRequest,
    ProductivityAgent, ProductivityRequest, ResultStore, SimulationAgent, SimulationRequest, SkillGapAgent,
    SkillGapRequest,
};
use crate::config::AppConfig;
use crate::synthetic::HrDataGenerator;
use crate::utils::{save_csv, DataLoader};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn warn(s: &str) -> ColoredString   { s.truecolor(230, 180, 80) }
fn bad(s: &str) -> ColoredString    { s.truecolor(230, 100, 100) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn row(key: &str, val: impl std::fmt::Display) {
    println!("  {:<24} {}", muted(key), val.to_string().white());
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn pct(v: f64) -> String {
    format!("{:.1}%", v * 100.0)
}

fn opt(v: Option<f64>, places: usize) -> String {
    v.map(|x| format!("{:.*}", places, x)).unwrap_or_else(|| "n/a".to_string())
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "workforce")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Workforce analytics agents: attrition, diversity, skills, planning, simulation, productivity")]
#[command(long_about = None)]
pub struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true, env = "WORKFORCE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score attrition risk for every employee
    Attrition {
        /// HR table (CSV)
        #[arg(short, long)]
        data: PathBuf,

        /// Retrain on this table before scoring, replacing the stored model
        #[arg(long)]
        retrain: bool,
    },

    /// Train the attrition model and store it
    Train {
        /// HR table (CSV)
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Gender and ethnicity representation, leadership and pay equity
    Diversity {
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Missing skills per employee and training recommendations
    SkillGap {
        /// HR table (CSV) with EmployeeNumber and JobRole
        #[arg(short, long)]
        data: PathBuf,

        /// JSON object mapping employee id to resume text
        #[arg(long)]
        resumes: Option<PathBuf>,

        /// JSON object mapping employee id to completed trainings
        #[arg(long)]
        transcripts: Option<PathBuf>,

        /// JSON object mapping skill to course
        #[arg(long)]
        courses: Option<PathBuf>,
    },

    /// Next-quarter hires and budget impact
    Plan {
        /// Headcount plan (CSV: role, planned_hires, avg_salary)
        #[arg(long)]
        plan: PathBuf,

        /// Hiring pipeline (CSV: role, conversion_rate)
        #[arg(long)]
        pipeline: Option<PathBuf>,
    },

    /// Project attrition under a retention intervention
    Simulate {
        /// HR table (CSV) with an attrition label
        #[arg(short, long)]
        data: PathBuf,

        /// Intervention type (see --list)
        #[arg(short, long, default_value = "Mentorship Program")]
        intervention: String,

        /// Retained share of participating leavers, in percent; catalog typical when omitted
        #[arg(long)]
        effect: Option<f64>,

        /// Cost per participating employee
        #[arg(long, default_value = "0")]
        cost: f64,

        /// Share of employees enrolled, 0 to 1
        #[arg(long, default_value = "1.0")]
        participation: f64,

        /// List the intervention catalog and exit
        #[arg(long)]
        list: bool,
    },

    /// Cycle times, throughput, utilisation and task aging
    Productivity {
        /// Time logs (CSV: task_id, user_id, start_time, end_time)
        #[arg(long)]
        time_logs: PathBuf,

        /// Task logs (CSV: task_id, task_type, created_at, completed_at)
        #[arg(long)]
        task_logs: PathBuf,
    },

    /// Check an HR table against the schema
    Validate {
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Write a synthetic HR table
    Generate {
        /// Number of employees
        #[arg(short = 'n', long, default_value = "1000")]
        rows: usize,

        #[arg(long, default_value = "42")]
        seed: u64,

        #[arg(short, long, default_value = "data/hr_data.csv")]
        output: PathBuf,
    },

    /// Configuration utilities
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Start the REST server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "API_PORT", default_value = "8000")]
        port: u16,

        /// Host to bind to
        #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
        host: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write the default configuration
    Init {
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

// ─── Commands ──────────────────────────────────────────────────────────────────

/// Dispatch a parsed command
pub async fn run(command: Commands, config: AppConfig) -> anyhow::Result<()> {
    match command {
        Commands::Attrition { data, retrain } => cmd_attrition(&data, retrain, &config),
        Commands::Train { data } => cmd_train(&data, &config),
        Commands::Diversity { data } => cmd_diversity(&data, &config),
        Commands::SkillGap { data, resumes, transcripts, courses } => {
            cmd_skill_gap(&data, resumes.as_deref(), transcripts.as_deref(), courses.as_deref(), &config)
        }
        Commands::Plan { plan, pipeline } => cmd_plan(&plan, pipeline.as_deref(), &config),
        Commands::Simulate { data, intervention, effect, cost, participation, list } => {
            if list {
                cmd_interventions();
                Ok(())
            } else {
                cmd_simulate(&data, &intervention, effect, cost, participation, &config)
            }
        }
        Commands::Productivity { time_logs, task_logs } => cmd_productivity(&time_logs, &task_logs, &config),
        Commands::Validate { data } => cmd_validate(&data, &config),
        Commands::Generate { rows, seed, output } => cmd_generate(rows, seed, &output),
        Commands::Config { action } => match action {
            ConfigAction::Init { output, force } => cmd_config_init(&output, force),
            ConfigAction::Show => cmd_config_show(&config),
        },
        Commands::Serve { port, host } => cmd_serve(&host, port, config).await,
    }
}

fn read_table(loader: &DataLoader, path: &Path) -> anyhow::Result<polars::prelude::DataFrame> {
    step_run(&format!("Loading {}", path.display()));
    let start = Instant::now();
    let df = loader.read_csv(path)?;
    step_done(&format!("{} rows × {} cols in {:?}", df.height(), df.width(), start.elapsed()));
    Ok(df)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn saved(store: &ResultStore, name: &str) {
    step_ok(&format!("Report saved to {}", store.path_for(name).display()));
    println!();
}

pub fn cmd_attrition(data: &Path, retrain: bool, config: &AppConfig) -> anyhow::Result<()> {
    section("Attrition Risk");
    let loader = DataLoader::new(config.data.clone());
    let df = read_table(&loader, data)?;
    loader.validate(&df)?;

    let agent = AttritionAgent::from_config(config)?;
    if retrain {
        step_run("Training attrition model");
        let start = Instant::now();
        agent.train(&df)?;
        step_done(&format!("{:?}", start.elapsed()));
    }

    step_run("Scoring employees");
    let start = Instant::now();
    let store = ResultStore::new(&config.paths.results_dir);
    let report = agent.run_and_save(&df, &store)?;
    step_done(&format!("{:?}", start.elapsed()));

    let m = &report.metrics;
    println!();
    row("Employees", report.risk_scores.len());
    row(&format!("High risk (> {})", m.threshold), m.high_risk_count);
    row("Average risk", format!("{:.3}", m.avg_risk));
    row("Holdout accuracy", opt(m.model.accuracy, 4));
    row("Holdout AUC", opt(m.model.auc_roc, 4));

    if !report.high_risk_employees.is_empty() {
        section("Highest Risk");
        let mut top = report.high_risk_employees.clone();
        top.sort_by(|a, b| b.attrition_risk.total_cmp(&a.attrition_risk));
        for score in top.iter().take(10) {
            println!("  {:<16} {}", score.employee_id, bad(&format!("{:.3}", score.attrition_risk)));
        }
    }

    section("Top Drivers");
    for f in report.feature_importance.iter().take(10) {
        println!("  {:<32} {}", f.feature, format!("{:.4}", f.importance).white());
    }
    println!();
    saved(&store, agent.name());
    Ok(())
}

pub fn cmd_train(data: &Path, config: &AppConfig) -> anyhow::Result<()> {
    section("Train");
    let loader = DataLoader::new(config.data.clone());
    let df = read_table(&loader, data)?;
    loader.validate(&df)?;

    step_run(&format!("Training random forest ({} trees)", config.model.n_estimators.to_string().cyan()));
    let start = Instant::now();
    let agent = AttritionAgent::from_config(config)?;
    let metrics = agent.train(&df)?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    row("Accuracy", opt(metrics.accuracy, 4));
    row("Precision", opt(metrics.precision, 4));
    row("Recall", opt(metrics.recall, 4));
    row("AUC", opt(metrics.auc_roc, 4));
    row("Features", metrics.n_features);
    row("Train / holdout rows", format!("{} / {}", metrics.n_train, metrics.n_holdout));
    row("Time", format!("{:.3}s", metrics.training_time_secs));
    if config.model.persist {
        println!();
        step_ok(&format!("Model stored in {}", config.paths.model_dir.display()));
    }
    println!();
    Ok(())
}

pub fn cmd_diversity(data: &Path, config: &AppConfig) -> anyhow::Result<()> {
    section("Diversity");
    let df = read_table(&DataLoader::new(config.data.clone()), data)?;
    let agent = DiversityAgent::new(config.diversity.clone());
    let store = ResultStore::new(&config.paths.results_dir);
    let report = agent.run_and_save(&df, &store)?;

    println!();
    row("Female share", report.gender_ratio.map(pct).unwrap_or_else(|| "n/a".into()));
    for (group, share) in &report.ethnicity_distribution {
        row(&format!("Ethnicity: {}", group), pct(*share));
    }
    row("Female leadership", report.female_leadership_ratio.map(pct).unwrap_or_else(|| "n/a".into()));
    for (gender, rate) in &report.turnover_by_gender {
        row(&format!("Leavers: {}", gender), pct(*rate));
    }
    for (gender, salary) in &report.median_salary_by_gender {
        row(&format!("Median salary: {}", gender), format!("{:.0}", salary));
    }
    row("Pay equity (F/M median)", opt(report.pay_equity_ratio, 3));
    println!();
    saved(&store, agent.name());
    Ok(())
}

pub fn cmd_skill_gap(
    data: &Path,
    resumes: Option<&Path>,
    transcripts: Option<&Path>,
    courses: Option<&Path>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    section("Skill Gap");
    let df = read_table(&DataLoader::new(config.data.clone()), data)?;
    let mut request = SkillGapRequest::new(df);
    if let Some(path) = resumes {
        request.resume_texts = read_json::<HashMap<String, String>>(path)?;
    }
    if let Some(path) = transcripts {
        request.transcripts = read_json::<HashMap<String, Vec<String>>>(path)?;
    }
    if let Some(path) = courses {
        request.skill_course_map = Some(read_json::<BTreeMap<String, String>>(path)?);
    }

    let agent = SkillGapAgent::new(config.skills.clone());
    let store = ResultStore::new(&config.paths.results_dir);
    let report = agent.run_and_save(&request, &store)?;

    let with_gaps = report.recommendations.iter().filter(|r| !r.missing_skills.is_empty()).count();
    println!();
    row("Employees", report.recommendations.len());
    row("With missing skills", with_gaps);
    section("Most Missing Skills");
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for skill in report.missing_skills.values().flatten() {
        *counts.entry(skill.as_str()).or_default() += 1;
    }
    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    for (skill, count) in ranked.iter().take(10) {
        println!("  {:<28} {}", skill, warn(&count.to_string()));
    }
    println!();
    saved(&store, agent.name());
    Ok(())
}

pub fn cmd_plan(plan: &Path, pipeline: Option<&Path>, config: &AppConfig) -> anyhow::Result<()> {
    section("Workforce Plan");
    let loader = DataLoader::new(config.data.clone());
    let request = PlanningRequest {
        headcount_plan: read_table(&loader, plan)?,
        hiring_pipeline: match pipeline {
            Some(path) => read_table(&loader, path)?,
            None => polars::prelude::DataFrame::empty(),
        },
    };

    let agent = PlanningAgent::new(config.planning.clone());
    let store = ResultStore::new(&config.paths.results_dir);
    let report = agent.run_and_save(&request, &store)?;

    println!();
    row("Next quarter hires", report.next_quarter_hires.to_string().bold());
    row("Budget impact", format!("{:.2}", report.budget_impact));
    if !report.by_role.is_empty() {
        section("By Role");
        for r in &report.by_role {
            println!("  {:<28} {:>8.1} {:>14.2}", r.role, r.expected_hires, r.total_cost);
        }
    }
    println!();
    saved(&store, agent.name());
    Ok(())
}

fn cmd_interventions() {
    section("Interventions");
    println!("  {:<24} {:>8} {:>8} {:>8}", muted("Type"), muted("Min"), muted("Typical"), muted("Max"));
    for (kind, range) in intervention_catalog() {
        println!(
            "  {:<24} {:>8} {:>8} {:>8}",
            kind,
            pct(range.min_impact),
            pct(range.typical_impact).white(),
            pct(range.max_impact)
        );
    }
    println!();
}

pub fn cmd_simulate(
    data: &Path,
    kind: &str,
    effect: Option<f64>,
    cost: f64,
    participation: f64,
    config: &AppConfig,
) -> anyhow::Result<()> {
    section("Intervention Simulation");
    let intervention = match effect {
        Some(effect_size_pct) => Intervention {
            kind: kind.to_string(),
            effect_size_pct,
            cost_per_employee: cost,
        },
        None => match Intervention::typical(kind, cost) {
            Some(i) => i,
            None => anyhow::bail!("Unknown intervention '{}'; pass --effect or pick one from --list", kind),
        },
    };

    let request = SimulationRequest {
        employees: read_table(&DataLoader::new(config.data.clone()), data)?,
        intervention,
        participation_rate: participation,
    };
    let agent = SimulationAgent::new(config.simulation.clone());
    let store = ResultStore::new(&config.paths.results_dir);
    let report = agent.run_and_save(&request, &store)?;

    println!();
    row("Intervention", &report.intervention_type);
    row("Participants", report.employees_participating);
    row("Baseline attrition", pct(report.baseline_attrition_rate));
    row("Projected attrition", ok(&pct(report.projected_attrition_rate)));
    row("Attritions prevented", report.attritions_rescued);
    row("Cost", format!("{:.2}", report.intervention_cost));
    println!();
    saved(&store, agent.name());
    Ok(())
}

pub fn cmd_productivity(time_logs: &Path, task_logs: &Path, config: &AppConfig) -> anyhow::Result<()> {
    section("Productivity");
    let loader = DataLoader::new(config.data.clone());
    let request = ProductivityRequest {
        time_logs: read_table(&loader, time_logs)?,
        task_logs: read_table(&loader, task_logs)?,
        now: None,
    };
    let agent = ProductivityAgent::new(config.productivity.clone());
    let store = ResultStore::new(&config.paths.results_dir);
    let report = agent.run_and_save(&request, &store)?;

    println!();
    row("Avg completion (h)", opt(report.average_completion_time_h, 2));
    row("Overdue open tasks", report.overdue_tasks.len());
    section("Bottlenecks");
    for b in &report.top_bottleneck_types {
        println!("  {:<28} {}", b.task_type, warn(&format!("{:.1}h", b.avg_cycle_time_h)));
    }
    section("Open Task Aging");
    for bucket in &report.open_task_aging {
        println!("  {:<28} {}", bucket.bucket, bucket.count);
    }
    println!();
    saved(&store, agent.name());
    Ok(())
}

pub fn cmd_validate(data: &Path, config: &AppConfig) -> anyhow::Result<()> {
    section("Validate");
    let loader = DataLoader::new(config.data.clone());
    let df = read_table(&loader, data)?;
    let report = config.data.schema.report(&df)?;

    println!();
    for column in &report.missing_columns {
        println!("  {} missing column {}", bad("✗"), column.bold());
    }
    for m in &report.mismatched_columns {
        println!("  {} {} expected {}, got {}", bad("✗"), m.column.bold(), m.expected, m.actual);
    }
    for v in &report.violations {
        println!("  {} {}", bad("✗"), v);
    }

    if !report.is_empty() {
        println!();
        return Err(crate::error::WorkforceError::Validation(report).into());
    }
    loader.check_missing(&df)?;
    step_ok(&format!("{} rows conform to the HR schema", df.height()));
    println!();
    Ok(())
}

pub fn cmd_generate(rows: usize, seed: u64, output: &Path) -> anyhow::Result<()> {
    section("Generate");
    step_run(&format!("Generating {} employees (seed {})", rows, seed));
    let start = Instant::now();
    let mut df = HrDataGenerator::new(seed).generate(rows)?;
    step_done(&format!("{:?}", start.elapsed()));
    save_csv(&mut df, output)?;
    step_ok(&format!("Wrote {}", output.display()));
    println!();
    Ok(())
}

pub fn cmd_config_init(output: &Path, force: bool) -> anyhow::Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists; pass --force to overwrite", output.display());
    }
    AppConfig::default().to_yaml(output)?;
    step_ok(&format!("Default configuration written to {}", output.display()));
    Ok(())
}

pub fn cmd_config_show(config: &AppConfig) -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}

pub async fn cmd_serve(host: &str, port: u16, config: AppConfig) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Workforce Analytics".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Index  ", &format!("http://{}:{}/", host, port)));
    line_box(&kv("API    ", &format!("http://{}:{}/api", host, port)));
    line_box(&kv("Health ", &format!("http://{}:{}/api/health", host, port)));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    let server = ServerConfig {
        host: host.to_string(),
        port,
    };
    run_server(server, config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_simulate() {
        let cli = Cli::try_parse_from([
            "workforce", "simulate", "--data", "hr.csv", "--intervention", "Flexible Work Arrangements", "--participation", "0.5",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate { intervention, participation, effect, .. } => {
                assert_eq!(intervention, "Flexible Work Arrangements");
                assert_eq!(participation, 0.5);
                assert!(effect.is_none());
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[1mbold\x1b[0m"), "bold");
    }

    #[test]
    fn test_config_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        cmd_config_init(&path, false).unwrap();
        assert!(cmd_config_init(&path, false).is_err());
        cmd_config_init(&path, true).unwrap();
        assert!(AppConfig::from_yaml(&path).is_ok());
    }
}
