//! Integration test: every agent through the `Agent` trait, with stored reports

use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeMap;
use workforce_analytics::agents::*;
use workforce_analytics::config::AppConfig;
use workforce_analytics::synthetic::HrDataGenerator;
use workforce_analytics::WorkforceError;

fn employees() -> DataFrame {
    df!(
        "EmployeeNumber" => &[1i64, 2, 3, 4, 5, 6],
        "JobRole" => &["Developer", "Recruiter", "Developer", "Accountant", "Sales Manager", "Unknown Role"],
        "gender" => &["Female", "Male", "Female", "Male", "Female", "Male"],
        "ethnicity" => &["A", "B", "A", "C", "B", "A"],
        "is_leader" => &[true, false, false, true, true, false],
        "status" => &["Active", "Left", "Left", "Active", "Active", "Left"],
        "salary" => &[90_000.0, 60_000.0, 70_000.0, 80_000.0, 100_000.0, 50_000.0],
        "attrited" => &[0i64, 1, 1, 0, 0, 1]
    )
    .unwrap()
}

#[test]
fn test_reports_round_trip_through_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path());

    let agent = DiversityAgent::default();
    let report = agent.run_and_save(&employees(), &store).unwrap();
    let loaded: DiversityReport = store.load(agent.name()).unwrap().unwrap();
    assert_eq!(report, loaded);

    assert!(store.load::<PlanningReport>("planning").unwrap().is_none());
}

#[test]
fn test_diversity_kpis() {
    let report = DiversityAgent::default().run(&employees()).unwrap();
    assert_eq!(report.gender_ratio, Some(0.5));
    // Leaders: employees 1 (F), 4 (M), 5 (F)
    let leadership = report.female_leadership_ratio.unwrap();
    assert!((leadership - 2.0 / 3.0).abs() < 1e-3);
    // Leavers: 2 (M), 3 (F), 6 (M)
    let male_leavers = report.turnover_by_gender["Male"];
    assert!((male_leavers - 2.0 / 3.0).abs() < 1e-3);
    // Medians: F 90k, M 60k
    assert!((report.pay_equity_ratio.unwrap() - 1.5).abs() < 1e-3);
}

#[test]
fn test_skill_gap_with_resume_and_transcript() {
    let mut request = SkillGapRequest::new(employees());
    request.resume_texts.insert(
        "1".to_string(),
        "Shipped Python services backed by SQL, all tracked in Git.".to_string(),
    );
    request
        .transcripts
        .insert("1".to_string(), vec!["Agile".to_string()]);
    request.skill_course_map = Some(BTreeMap::from([
        ("Python".to_string(), "Python Basics".to_string()),
        ("SQL".to_string(), "SQL Fundamentals".to_string()),
        ("Git".to_string(), "Version Control".to_string()),
        ("Testing".to_string(), "Test Automation".to_string()),
    ]));

    let report = SkillGapAgent::default().run(&request).unwrap();
    assert_eq!(report.missing_skills["1"], vec!["testing".to_string()]);
    assert_eq!(report.training_recommendations["1"], vec!["Test Automation".to_string()]);

    // Developer without any evidence misses every required skill
    assert_eq!(report.missing_skills["3"].len(), 5);
    // Roles outside the catalog have nothing to miss
    assert!(report.missing_skills["6"].is_empty());
}

#[test]
fn test_planning_forecast() {
    let request = PlanningRequest {
        headcount_plan: df!(
            "role" => &["Engineer", "Recruiter"],
            "planned_hires" => &[10.0, 4.0],
            "avg_salary" => &[100_000.0, 50_000.0]
        )
        .unwrap(),
        hiring_pipeline: df!(
            "role" => &["Engineer", "Engineer"],
            "conversion_rate" => &[0.4, 0.6]
        )
        .unwrap(),
    };
    let report = PlanningAgent::default().run(&request).unwrap();
    // Engineer 10 * 0.5 = 5, Recruiter falls back to full conversion = 4
    assert_eq!(report.next_quarter_hires, 9);
    let expected = 5.0 * 130_000.0 + 4.0 * 65_000.0;
    assert!((report.budget_impact - expected).abs() < 1e-6);
}

#[test]
fn test_planning_zero_hires_costs_nothing() {
    let request = PlanningRequest {
        headcount_plan: df!(
            "role" => &["Engineer"],
            "planned_hires" => &[0.0],
            "avg_salary" => &[120_000.0]
        )
        .unwrap(),
        hiring_pipeline: DataFrame::empty(),
    };
    let report = PlanningAgent::default().run(&request).unwrap();
    assert_eq!(report.next_quarter_hires, 0);
    assert_eq!(report.budget_impact, 0.0);
}

#[test]
fn test_simulation_bounds() {
    let intervention = Intervention::typical("Compensation Adjustment", 1_000.0).unwrap();
    let agent = SimulationAgent::default();

    let none = agent
        .run(&SimulationRequest {
            employees: employees(),
            intervention: intervention.clone(),
            participation_rate: 0.0,
        })
        .unwrap();
    assert_eq!(none.projected_attrition_rate, none.baseline_attrition_rate);
    assert_eq!(none.intervention_cost, 0.0);

    let full = agent
        .run(&SimulationRequest {
            employees: employees(),
            intervention: Intervention {
                effect_size_pct: 100.0,
                ..intervention.clone()
            },
            participation_rate: 1.0,
        })
        .unwrap();
    assert_eq!(full.baseline_attrition_rate, 0.5);
    assert_eq!(full.projected_attrition_rate, 0.0);
    assert_eq!(full.attritions_rescued, 3);
    assert_eq!(full.intervention_cost, 6_000.0);

    let err = agent
        .run(&SimulationRequest {
            employees: employees(),
            intervention,
            participation_rate: 1.5,
        })
        .unwrap_err();
    assert!(matches!(err, WorkforceError::InvalidParameter { .. }));
}

#[test]
fn test_simulation_on_generated_hr_data() {
    let mut config = AppConfig::default();
    config.simulation.attrited_column = "Attrition".to_string();
    let agent = SimulationAgent::new(config.simulation);
    let report = agent
        .run(&SimulationRequest {
            employees: HrDataGenerator::new(4).generate(200).unwrap(),
            intervention: Intervention::typical("Mentorship Program", 250.0).unwrap(),
            participation_rate: 0.5,
        })
        .unwrap();
    assert_eq!(report.employees_participating, 100);
    assert!(report.projected_attrition_rate <= report.baseline_attrition_rate);
}

#[test]
fn test_productivity_summary() {
    let time_logs = df!(
        "task_id" => &["t1", "t2"],
        "user_id" => &["u1", "u1"],
        "start_time" => &["2024-03-04 09:00:00", "2024-03-05 09:00:00"],
        "end_time" => &["2024-03-04 17:00:00", "2024-03-05 21:00:00"]
    )
    .unwrap();
    let task_logs = df!(
        "task_id" => &["t1", "t2", "t3"],
        "task_type" => &["review", "build", "build"],
        "created_at" => &["2024-03-04 08:00:00", "2024-03-05 08:00:00", "2024-03-01 08:00:00"],
        "completed_at" => &[Some("2024-03-04 18:00:00"), Some("2024-03-06 08:00:00"), None]
    )
    .unwrap();
    let now = NaiveDate::from_ymd_opt(2024, 3, 10)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();

    let report = ProductivityAgent::default()
        .run(&ProductivityRequest {
            time_logs,
            task_logs,
            now: Some(now),
        })
        .unwrap();

    // 8h + 12h logged against a 40h week
    assert!((report.user_utilization["u1"] - 0.5).abs() < 1e-9);
    assert_eq!(report.top_bottleneck_types[0].task_type, "build");
    assert_eq!(report.overdue_tasks, vec!["t3".to_string()]);
    let aged: usize = report.open_task_aging.iter().map(|b| b.count).sum();
    assert_eq!(aged, 1);
}

#[test]
fn test_registry_lists_all_agents() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.paths.model_dir = dir.path().to_path_buf();

    let attrition = AttritionAgent::from_config(&config).unwrap();
    let mut registry = AgentRegistry::new();
    registry
        .register(&attrition, "/api/attrition/analyze")
        .register(&DiversityAgent::default(), "/api/diversity/analyze")
        .register(&SkillGapAgent::default(), "/api/skill-gap/analyze")
        .register(&PlanningAgent::default(), "/api/planning/forecast")
        .register(&SimulationAgent::default(), "/api/simulation/attrition")
        .register(&ProductivityAgent::default(), "/api/productivity/analyze");
    assert_eq!(registry.len(), 6);
    assert!(!attrition.model().is_trained());
    assert!(matches!(
        attrition.feature_importance(),
        Err(WorkforceError::ModelNotFitted)
    ));
}
