//! Skill gap analysis and training recommendations

use super::frame::{require_columns, strings};
use super::Agent;
use crate::error::{Result, WorkforceError};
use polars::prelude::DataFrame;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

const ROLE_SKILLS: [(&str, &[&str]); 30] = [
    ("Developer", &["Python", "SQL", "Git", "Agile", "Testing"]),
    ("Engineer", &["Python", "SQL", "System Design", "Problem Solving"]),
    ("System Administrator", &["Linux", "Networking", "Security", "Cloud"]),
    ("IT Manager", &["Project Management", "Leadership", "IT Strategy", "Budgeting"]),
    ("Technical Specialist", &["Technical Writing", "Problem Solving", "Documentation"]),
    ("HR Manager", &["Recruitment", "Employee Relations", "HR Policies", "Leadership"]),
    ("HR Specialist", &["Recruitment", "Employee Relations", "HR Policies"]),
    ("Recruiter", &["Talent Acquisition", "Interviewing", "ATS", "Communication"]),
    ("HR Director", &["Strategic Planning", "Leadership", "HR Strategy", "Change Management"]),
    ("Financial Analyst", &["Financial Modeling", "Excel", "Analysis", "Reporting"]),
    ("Accountant", &["Accounting", "Tax", "Financial Reporting", "Excel"]),
    ("Finance Manager", &["Financial Planning", "Leadership", "Budgeting", "Analysis"]),
    ("Controller", &["Accounting", "Financial Controls", "Compliance", "Leadership"]),
    ("Marketing Specialist", &["Digital Marketing", "Content Creation", "Analytics"]),
    ("Marketing Manager", &["Strategy", "Leadership", "Campaign Management"]),
    ("Brand Manager", &["Brand Strategy", "Marketing", "Communication"]),
    ("Marketing Director", &["Strategic Planning", "Leadership", "Brand Management"]),
    ("Operations Manager", &["Process Improvement", "Leadership", "Supply Chain"]),
    ("Operations Specialist", &["Process Improvement", "Data Analysis", "Documentation"]),
    ("Supply Chain Manager", &["Supply Chain", "Logistics", "Inventory Management"]),
    ("Sales Representative", &["Sales", "CRM", "Communication", "Negotiation"]),
    ("Sales Manager", &["Sales Strategy", "Leadership", "CRM", "Team Management"]),
    ("Account Executive", &["Sales", "Account Management", "Communication"]),
    ("Sales Director", &["Strategic Planning", "Leadership", "Sales Strategy"]),
    ("Research Scientist", &["Research", "Data Analysis", "Scientific Writing"]),
    ("Research Analyst", &["Research", "Data Analysis", "Reporting"]),
    ("Research Director", &["Research Strategy", "Leadership", "Project Management"]),
    ("Senior Engineer", &["System Design", "Leadership", "Technical Architecture"]),
    ("Engineering Manager", &["Technical Leadership", "Project Management", "Team Management"]),
    ("Technical Director", &["Technical Strategy", "Leadership", "Architecture"]),
];

pub fn default_role_skills() -> BTreeMap<String, Vec<String>> {
    ROLE_SKILLS
        .iter()
        .map(|(role, skills)| (role.to_string(), skills.iter().map(|s| s.to_string()).collect()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillsConfig {
    /// Required skills per job role
    pub role_skills: BTreeMap<String, Vec<String>>,
    /// Skill to recommended course; used when a request brings no map
    pub course_map: BTreeMap<String, String>,
    /// Recommendation given when no missing skill maps to a course
    pub fallback_recommendation: String,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            role_skills: default_role_skills(),
            course_map: BTreeMap::new(),
            fallback_recommendation: "No mapped course; consider custom training".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkillGapRequest {
    /// Needs `EmployeeNumber` and `JobRole`
    pub employees: DataFrame,
    /// Resume text per employee id
    pub resume_texts: HashMap<String, String>,
    /// Completed trainings or skill tokens per employee id
    pub transcripts: HashMap<String, Vec<String>>,
    /// Overrides the configured course map
    pub skill_course_map: Option<BTreeMap<String, String>>,
}

impl SkillGapRequest {
    pub fn new(employees: DataFrame) -> Self {
        Self {
            employees,
            resume_texts: HashMap::new(),
            transcripts: HashMap::new(),
            skill_course_map: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSkillGap {
    pub employee_id: String,
    pub job_role: String,
    /// Lower-cased, sorted
    pub missing_skills: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillGapReport {
    pub recommendations: Vec<EmployeeSkillGap>,
    pub missing_skills: BTreeMap<String, Vec<String>>,
    pub training_recommendations: BTreeMap<String, Vec<String>>,
}

/// Compare each employee's known skills against their role's requirements.
///
/// Known skills are the course-map skills that appear as whole words in the
/// resume, plus every transcript token. Matching ignores case throughout.
pub fn analyze_skill_gap(
    employees: &DataFrame,
    resume_texts: &HashMap<String, String>,
    transcripts: &HashMap<String, Vec<String>>,
    skill_course_map: &BTreeMap<String, String>,
    config: &SkillsConfig,
) -> Result<SkillGapReport> {
    require_columns(employees, &["EmployeeNumber", "JobRole"])?;
    let ids = strings(employees, "EmployeeNumber")?.unwrap_or_default();
    let roles = strings(employees, "JobRole")?.unwrap_or_default();

    let courses: BTreeMap<String, &String> = skill_course_map
        .iter()
        .map(|(skill, course)| (skill.to_lowercase(), course))
        .collect();
    let patterns = courses
        .keys()
        .map(|skill| {
            Regex::new(&format!(r"\b{}\b", regex::escape(skill)))
                .map(|re| (skill.as_str(), re))
                .map_err(|e| WorkforceError::InvalidInput(format!("skill pattern {skill}: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;
    let required_by_role: HashMap<&str, BTreeSet<String>> = config
        .role_skills
        .iter()
        .map(|(role, skills)| (role.as_str(), skills.iter().map(|s| s.to_lowercase()).collect()))
        .collect();

    let mut report = SkillGapReport::default();
    for (i, (id, role)) in ids.into_iter().zip(roles).enumerate() {
        let employee_id = id.unwrap_or_else(|| format!("row-{i}"));
        let job_role = role.unwrap_or_default();

        let mut known: BTreeSet<String> = BTreeSet::new();
        if let Some(text) = resume_texts.get(&employee_id) {
            let text = text.to_lowercase();
            known.extend(
                patterns
                    .iter()
                    .filter(|(_, re)| re.is_match(&text))
                    .map(|(skill, _)| skill.to_string()),
            );
        }
        if let Some(tokens) = transcripts.get(&employee_id) {
            known.extend(tokens.iter().map(|t| t.trim().to_lowercase()));
        }

        let missing_skills: Vec<String> = required_by_role
            .get(job_role.as_str())
            .map(|required| required.difference(&known).cloned().collect())
            .unwrap_or_default();
        let mut recommendations: Vec<String> = missing_skills
            .iter()
            .filter_map(|skill| courses.get(skill).map(|c| c.to_string()))
            .collect();
        if recommendations.is_empty() {
            recommendations.push(config.fallback_recommendation.clone());
        }

        report
            .missing_skills
            .insert(employee_id.clone(), missing_skills.clone());
        report
            .training_recommendations
            .insert(employee_id.clone(), recommendations.clone());
        report.recommendations.push(EmployeeSkillGap {
            employee_id,
            job_role,
            missing_skills,
            recommendations,
        });
    }
    Ok(report)
}

#[derive(Debug, Clone, Default)]
pub struct SkillGapAgent {
    config: SkillsConfig,
}

impl SkillGapAgent {
    pub fn new(config: SkillsConfig) -> Self {
        Self { config }
    }

    pub fn required_skills(&self) -> &BTreeMap<String, Vec<String>> {
        &self.config.role_skills
    }
}

impl Agent for SkillGapAgent {
    type Request = SkillGapRequest;
    type Report = SkillGapReport;

    fn name(&self) -> &'static str {
        "skill_gap"
    }

    fn description(&self) -> &'static str {
        "Missing role skills per employee with course recommendations"
    }

    fn run(&self, request: &SkillGapRequest) -> Result<SkillGapReport> {
        let course_map = request
            .skill_course_map
            .as_ref()
            .unwrap_or(&self.config.course_map);
        analyze_skill_gap(
            &request.employees,
            &request.resume_texts,
            &request.transcripts,
            course_map,
            &self.config,
        )
    }
}
