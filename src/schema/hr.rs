//! The default HR dataset schema

use super::{ColumnDefinition, ColumnType, DataSchema};

pub const DEPARTMENTS: [&str; 8] = [
    "IT",
    "HR",
    "Finance",
    "Marketing",
    "Operations",
    "Sales",
    "Research",
    "Engineering",
];

pub const JOB_ROLES: [&str; 30] = [
    "Developer",
    "Engineer",
    "System Administrator",
    "IT Manager",
    "Technical Specialist",
    "HR Manager",
    "HR Specialist",
    "Recruiter",
    "HR Director",
    "Financial Analyst",
    "Accountant",
    "Finance Manager",
    "Controller",
    "Marketing Specialist",
    "Marketing Manager",
    "Brand Manager",
    "Marketing Director",
    "Operations Manager",
    "Operations Specialist",
    "Supply Chain Manager",
    "Sales Representative",
    "Sales Manager",
    "Account Executive",
    "Sales Director",
    "Research Scientist",
    "Research Analyst",
    "Research Director",
    "Senior Engineer",
    "Engineering Manager",
    "Technical Director",
];

pub const EDUCATION_FIELDS: [&str; 6] = [
    "Life Sciences",
    "Medical",
    "Marketing",
    "Technical Degree",
    "Other",
    "Human Resources",
];

/// Schema of the employee table consumed by the attrition agent
pub fn hr_schema() -> DataSchema {
    use ColumnType::{DateTime, Integer};

    let rating = |name: &str, description: &str| {
        ColumnDefinition::new(name, Integer)
            .with_description(description)
            .with_range(1.0, 5.0)
    };
    let years = |name: &str, description: &str| {
        ColumnDefinition::new(name, Integer)
            .with_description(description)
            .with_range(0.0, 50.0)
    };

    DataSchema::new(vec![
        ColumnDefinition::new("EmployeeNumber", Integer)
            .with_description("Unique identifier for each employee")
            .with_min(1.0),
        ColumnDefinition::new("Age", Integer)
            .with_description("Employee age")
            .with_range(18.0, 100.0),
        ColumnDefinition::new("Department", ColumnType::String)
            .with_description("Employee department")
            .with_allowed(&DEPARTMENTS),
        ColumnDefinition::new("JobRole", ColumnType::String)
            .with_description("Employee job role")
            .with_allowed(&JOB_ROLES),
        ColumnDefinition::new("Salary", Integer)
            .with_description("Annual salary")
            .with_min(0.0),
        years("YearsAtCompany", "Years of employment"),
        rating("JobSatisfaction", "Job satisfaction score"),
        rating("WorkLifeBalance", "Work-life balance score"),
        rating("PerformanceRating", "Performance rating"),
        ColumnDefinition::new("Attrition", ColumnType::String)
            .with_description("Whether the employee left the company")
            .with_allowed(&["Yes", "No"]),
        ColumnDefinition::new("HireDate", DateTime).with_description("Employee hire date"),
        ColumnDefinition::new("TerminationDate", DateTime)
            .optional()
            .with_description("Employee termination date"),
        rating("Education", "Education level"),
        ColumnDefinition::new("EducationField", ColumnType::String)
            .with_description("Field of education")
            .with_allowed(&EDUCATION_FIELDS),
        ColumnDefinition::new("Gender", ColumnType::String)
            .with_description("Employee gender")
            .with_allowed(&["Male", "Female"]),
        ColumnDefinition::new("MaritalStatus", ColumnType::String)
            .with_description("Employee marital status")
            .with_allowed(&["Single", "Married", "Divorced"]),
        ColumnDefinition::new("NumCompaniesWorked", Integer)
            .with_description("Number of companies worked at")
            .with_range(0.0, 20.0),
        years("TotalWorkingYears", "Total years of work experience"),
        ColumnDefinition::new("TrainingTimesLastYear", Integer)
            .with_description("Number of training sessions attended last year")
            .with_range(0.0, 10.0),
        years("YearsInCurrentRole", "Years in current role"),
        years("YearsSinceLastPromotion", "Years since last promotion"),
        years("YearsWithCurrManager", "Years with current manager"),
    ])
    .with_primary_key("EmployeeNumber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hr_schema_shape() {
        let schema = hr_schema();
        assert_eq!(schema.columns.len(), 22);
        assert_eq!(schema.primary_key.as_deref(), Some("EmployeeNumber"));
        assert!(!schema.column("TerminationDate").unwrap().required);
        assert_eq!(schema.required_columns().count(), 21);
    }

    #[test]
    fn test_date_columns() {
        let schema = hr_schema();
        assert_eq!(
            schema.columns_of_type(ColumnType::DateTime),
            vec!["HireDate".to_string(), "TerminationDate".to_string()]
        );
    }
}
