//! Seeded generator of synthetic HR tables

use crate::error::{Result, WorkforceError};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use rand::distributions::{WeightedError, WeightedIndex};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

const DEPARTMENT_ROLES: [(&str, f64, &[&str]); 8] = [
    ("IT", 0.25, &["Developer", "Engineer", "System Administrator", "IT Manager", "Technical Specialist"]),
    ("HR", 0.15, &["HR Manager", "HR Specialist", "Recruiter", "HR Director"]),
    ("Finance", 0.1, &["Financial Analyst", "Accountant", "Finance Manager", "Controller"]),
    ("Marketing", 0.1, &["Marketing Specialist", "Marketing Manager", "Brand Manager", "Marketing Director"]),
    ("Operations", 0.1, &["Operations Manager", "Operations Specialist", "Supply Chain Manager"]),
    ("Sales", 0.1, &["Sales Representative", "Sales Manager", "Account Executive", "Sales Director"]),
    ("Research", 0.1, &["Research Scientist", "Research Analyst", "Research Director"]),
    ("Engineering", 0.1, &["Engineer", "Senior Engineer", "Engineering Manager", "Technical Director"]),
];

fn salary_range(role: &str) -> (i64, i64) {
    match role {
        "Developer" => (60_000, 120_000),
        "Engineer" => (65_000, 130_000),
        "System Administrator" => (55_000, 110_000),
        "IT Manager" | "Controller" | "Sales Director" | "Engineering Manager" => (80_000, 150_000),
        "Technical Specialist" | "Research Scientist" => (70_000, 130_000),
        "HR Manager" | "Marketing Manager" | "Supply Chain Manager" => (70_000, 130_000),
        "HR Specialist" | "Operations Specialist" => (50_000, 90_000),
        "Recruiter" | "Sales Representative" => (45_000, 85_000),
        "HR Director" | "Technical Director" => (90_000, 160_000),
        "Financial Analyst" | "Research Analyst" => (55_000, 100_000),
        "Accountant" | "Marketing Specialist" => (50_000, 95_000),
        "Finance Manager" | "Senior Engineer" => (75_000, 140_000),
        "Brand Manager" | "Operations Manager" | "Sales Manager" => (65_000, 120_000),
        "Marketing Director" | "Research Director" => (85_000, 150_000),
        "Account Executive" => (55_000, 110_000),
        _ => (50_000, 100_000),
    }
}

fn education_fields(department: &str) -> &'static [(&'static str, f64)] {
    match department {
        "IT" => &[("Technical Degree", 0.6), ("Life Sciences", 0.2), ("Other", 0.2)],
        "HR" => &[("Human Resources", 0.5), ("Life Sciences", 0.2), ("Other", 0.3)],
        "Finance" => &[("Life Sciences", 0.3), ("Marketing", 0.2), ("Other", 0.5)],
        "Marketing" => &[("Marketing", 0.6), ("Life Sciences", 0.2), ("Other", 0.2)],
        "Operations" => &[("Technical Degree", 0.4), ("Life Sciences", 0.3), ("Other", 0.3)],
        "Sales" => &[("Marketing", 0.4), ("Life Sciences", 0.2), ("Other", 0.4)],
        "Research" => &[("Life Sciences", 0.7), ("Medical", 0.2), ("Other", 0.1)],
        _ => &[("Technical Degree", 0.7), ("Life Sciences", 0.2), ("Other", 0.1)],
    }
}

/// Generates employee tables that satisfy the HR schema.
///
/// Attrition is drawn from a probability that rises with low satisfaction,
/// poor work-life balance, low performance, a stalled promotion and tenure
/// outside the one-to-five year band, so a model has signal to learn.
/// Output depends only on the seed and the configured dates.
#[derive(Debug, Clone)]
pub struct HrDataGenerator {
    seed: u64,
    start_date: NaiveDate,
    as_of: NaiveDate,
}

impl HrDataGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            start_date: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default(),
            as_of: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
        }
    }

    /// Earliest possible hire date; hires spread over the following ten years
    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = date;
        self
    }

    /// Date tenure is measured against
    pub fn with_as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = date;
        self
    }

    pub fn generate(&self, n_employees: usize) -> Result<DataFrame> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let n = n_employees;

        let dept_dist = WeightedIndex::new(DEPARTMENT_ROLES.iter().map(|d| d.1))
            .map_err(|e| invalid_weights("department", e))?;
        let gender_dist = WeightedIndex::new([0.6, 0.4])
            .map_err(|e| invalid_weights("gender", e))?;
        let marital_dist = WeightedIndex::new([0.3, 0.5, 0.2])
            .map_err(|e| invalid_weights("marital_status", e))?;

        let ages: Vec<i64> = (0..n)
            .map(|_| (35.0 + 8.0 * standard_normal(&mut rng)).clamp(18.0, 65.0) as i64)
            .collect();
        let departments: Vec<usize> = (0..n).map(|_| dept_dist.sample(&mut rng)).collect();
        let job_satisfaction: Vec<i64> = (0..n).map(|_| rng.gen_range(1..6)).collect();
        let work_life_balance: Vec<i64> = (0..n).map(|_| rng.gen_range(1..6)).collect();
        let performance: Vec<i64> = (0..n).map(|_| rng.gen_range(1..6)).collect();
        let education: Vec<i64> = (0..n).map(|_| rng.gen_range(1..6)).collect();
        let genders: Vec<&str> = (0..n)
            .map(|_| ["Male", "Female"][gender_dist.sample(&mut rng)])
            .collect();
        let marital: Vec<&str> = (0..n)
            .map(|_| ["Single", "Married", "Divorced"][marital_dist.sample(&mut rng)])
            .collect();
        let companies: Vec<i64> = (0..n).map(|_| rng.gen_range(0..11)).collect();
        let trainings: Vec<i64> = (0..n).map(|_| rng.gen_range(0..7)).collect();

        // hire dates are assigned to employee numbers in chronological order
        let mut hire_days: Vec<i32> = (0..n)
            .map(|_| epoch_days(self.start_date) + rng.gen_range(0..3650))
            .collect();
        hire_days.sort_unstable();

        let mut roles = Vec::with_capacity(n);
        let mut salaries = Vec::with_capacity(n);
        let mut fields = Vec::with_capacity(n);
        for &dept in &departments {
            let (name, _, dept_roles) = DEPARTMENT_ROLES[dept];
            let role = dept_roles[rng.gen_range(0..dept_roles.len())];
            let (lo, hi) = salary_range(role);
            roles.push(role);
            salaries.push(rng.gen_range(lo..hi));

            let choices = education_fields(name);
            let field_dist = WeightedIndex::new(choices.iter().map(|c| c.1))
                .map_err(|e| invalid_weights("education_field", e))?;
            fields.push(choices[field_dist.sample(&mut rng)].0);
        }

        let as_of = epoch_days(self.as_of);
        let years_at_company: Vec<i64> = hire_days
            .iter()
            .map(|&d| ((as_of - d).max(0) as f64 / 365.25) as i64)
            .collect();
        let total_working: Vec<i64> = years_at_company
            .iter()
            .map(|&y| y + rng.gen_range(0..10))
            .collect();
        let in_role: Vec<i64> = years_at_company
            .iter()
            .map(|&y| y.min(rng.gen_range(1..=(2 * y).max(1))))
            .collect();
        let since_promotion: Vec<i64> = in_role
            .iter()
            .map(|&y| y.min(rng.gen_range(0..=(y as f64 * 1.5) as i64)))
            .collect();
        let with_manager: Vec<i64> = years_at_company
            .iter()
            .map(|&y| y.min(rng.gen_range(1..=((y as f64 * 1.5) as i64).max(1))))
            .collect();

        let mut attrition = Vec::with_capacity(n);
        let mut termination: Vec<Option<i32>> = Vec::with_capacity(n);
        for i in 0..n {
            let p = attrition_probability(
                years_at_company[i],
                job_satisfaction[i],
                work_life_balance[i],
                performance[i],
                since_promotion[i],
            );
            if rng.gen::<f64>() < p {
                attrition.push("Yes");
                termination.push(Some(hire_days[i] + rng.gen_range(365..3650)));
            } else {
                attrition.push("No");
                termination.push(None);
            }
        }

        let hire_dates = Series::new("HireDate".into(), hire_days).cast(&DataType::Date)?;
        let termination_dates =
            Series::new("TerminationDate".into(), termination).cast(&DataType::Date)?;
        let department_names: Vec<&str> = departments.iter().map(|&d| DEPARTMENT_ROLES[d].0).collect();

        let columns = vec![
            Column::new("EmployeeNumber".into(), (1..=n as i64).collect::<Vec<_>>()),
            Column::new("Age".into(), ages),
            Column::new("Department".into(), department_names),
            Column::new("JobRole".into(), roles),
            Column::new("Salary".into(), salaries),
            Column::new("YearsAtCompany".into(), years_at_company),
            Column::new("JobSatisfaction".into(), job_satisfaction),
            Column::new("WorkLifeBalance".into(), work_life_balance),
            Column::new("PerformanceRating".into(), performance),
            Column::new("Education".into(), education),
            Column::new("EducationField".into(), fields),
            Column::new("Gender".into(), genders),
            Column::new("MaritalStatus".into(), marital),
            Column::new("NumCompaniesWorked".into(), companies),
            Column::new("TotalWorkingYears".into(), total_working),
            Column::new("TrainingTimesLastYear".into(), trainings),
            Column::new("YearsInCurrentRole".into(), in_role),
            Column::new("YearsSinceLastPromotion".into(), since_promotion),
            Column::new("YearsWithCurrManager".into(), with_manager),
            hire_dates.into(),
            termination_dates.into(),
            Column::new("Attrition".into(), attrition),
        ];
        Ok(DataFrame::new(columns)?)
    }
}

/// Probability that an employee with these attributes has left
pub fn attrition_probability(
    years_at_company: i64,
    job_satisfaction: i64,
    work_life_balance: i64,
    performance_rating: i64,
    years_since_promotion: i64,
) -> f64 {
    let mut p = 0.1;
    if years_at_company < 1 {
        p += 0.2;
    } else if years_at_company > 5 {
        p += 0.1;
    }
    p += (5 - job_satisfaction) as f64 * 0.05;
    p += (5 - work_life_balance) as f64 * 0.05;
    if performance_rating < 3 {
        p += 0.1;
    }
    if years_since_promotion > 3 {
        p += 0.1;
    }
    p.clamp(0.0, 1.0)
}

fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - NaiveDate::default().num_days_from_ce()
}

fn invalid_weights(name: &str, e: WeightedError) -> WorkforceError {
    WorkforceError::InvalidParameter {
        name: format!("{name}_weights"),
        value: "invalid".to_string(),
        reason: e.to_string(),
    }
}

/// Box-Muller draw from N(0, 1)
fn standard_normal(rng: &mut impl Rng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::hr_schema;

    #[test]
    fn test_bad_weights_are_invalid_parameters() {
        let err = invalid_weights("gender", WeightedError::AllWeightsZero);
        assert!(err.is_client_error());
        assert!(err.to_string().contains("gender_weights"));
        assert!(WeightedIndex::new([0.0, 0.0]).map_err(|e| invalid_weights("gender", e)).is_err());
    }

    #[test]
    fn test_generated_table_is_schema_valid() {
        let df = HrDataGenerator::new(42).generate(200).unwrap();
        assert_eq!(df.height(), 200);
        assert_eq!(df.width(), 22);
        hr_schema().validate(&df).unwrap();
    }

    #[test]
    fn test_same_seed_same_table() {
        let a = HrDataGenerator::new(7).generate(50).unwrap();
        let b = HrDataGenerator::new(7).generate(50).unwrap();
        let c = HrDataGenerator::new(8).generate(50).unwrap();
        assert!(a.equals_missing(&b));
        assert!(!a.equals_missing(&c));
    }

    #[test]
    fn test_both_labels_and_termination_dates() {
        let df = HrDataGenerator::new(42).generate(200).unwrap();
        let labels = df.column("Attrition").unwrap().as_materialized_series().clone();
        let leavers = labels
            .str()
            .unwrap()
            .into_iter()
            .filter(|v| *v == Some("Yes"))
            .count();
        assert!(leavers > 0 && leavers < 200);

        let terminated = df.column("TerminationDate").unwrap().null_count();
        assert_eq!(200 - terminated, leavers);
    }

    #[test]
    fn test_attrition_probability() {
        assert!((attrition_probability(3, 5, 5, 5, 0) - 0.1).abs() < 1e-12);
        assert!((attrition_probability(0, 1, 1, 1, 4) - 0.9).abs() < 1e-12);
        assert!((attrition_probability(6, 4, 4, 3, 0) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_empty_table() {
        let df = HrDataGenerator::new(1).generate(0).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 22);
    }
}
