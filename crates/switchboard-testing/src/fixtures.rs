//! Test data builders and fixtures for deterministic testing.
//!
//! Provides builders for employee records and directories with sensible
//! defaults, plus a small sample company used across the integration tests.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use switchboard_core::{Directory, EmployeeId, EmployeeRecord};

/// Builder for test employee records.
#[derive(Debug, Clone)]
pub struct EmployeeBuilder {
    id: u64,
    name: String,
    department: String,
    phone: String,
    email: String,
}

impl EmployeeBuilder {
    /// Creates a routable employee with placeholder details.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            name: format!("Employee {id}"),
            department: "General".to_string(),
            phone: format!("+1555000{id:04}"),
            email: format!("employee{id}@example.com"),
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the department.
    #[must_use]
    pub fn department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    /// Sets the phone number.
    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    /// Clears the phone number so the employee cannot take calls.
    #[must_use]
    pub fn unreachable(mut self) -> Self {
        self.phone.clear();
        self
    }

    /// Sets the email address.
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Builds the record.
    pub fn build(self) -> EmployeeRecord {
        EmployeeRecord {
            id: EmployeeId(self.id),
            name: self.name,
            department: self.department,
            phone: self.phone,
            email: self.email,
        }
    }
}

/// Builder for test directories.
#[derive(Debug, Clone, Default)]
pub struct DirectoryBuilder {
    employees: Vec<EmployeeRecord>,
}

impl DirectoryBuilder {
    /// Creates an empty directory builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the sample company.
    pub fn sample() -> Self {
        Self { employees: sample_employees() }
    }

    /// Adds an employee.
    #[must_use]
    pub fn employee(mut self, employee: EmployeeBuilder) -> Self {
        self.employees.push(employee.build());
        self
    }

    /// Adds an already-built record.
    #[must_use]
    pub fn record(mut self, record: EmployeeRecord) -> Self {
        self.employees.push(record);
        self
    }

    /// Records added so far, in order.
    pub fn records(&self) -> &[EmployeeRecord] {
        &self.employees
    }

    /// Builds the directory.
    ///
    /// # Errors
    ///
    /// Fails on duplicate ids.
    pub fn build(self) -> Result<Directory> {
        Directory::from_records(self.employees).context("Failed to build test directory")
    }

    /// Serializes the records into the `{"employees": [...]}` file format.
    pub fn to_json(&self) -> Result<String> {
        let document = serde_json::json!({ "employees": self.employees });
        serde_json::to_string_pretty(&document).context("Failed to serialize test directory")
    }

    /// Writes the directory file into `dir` and returns its path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join("company_directory.json");
        std::fs::write(&path, self.to_json()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

/// The sample company.
///
/// - 1 Alice Smith, Sales, `+15551234567`
/// - 2 Bob Jones, Support, `+15559876543`
/// - 3 Carol White, Sales, no phone
/// - 4 Dan Brown, Sales, `+15555550104`
/// - 5 Erin Green, Engineering, `+15555550105`
pub fn sample_employees() -> Vec<EmployeeRecord> {
    vec![
        EmployeeBuilder::new(1)
            .name("Alice Smith")
            .department("Sales")
            .phone("+15551234567")
            .email("alice.smith@example.com")
            .build(),
        EmployeeBuilder::new(2)
            .name("Bob Jones")
            .department("Support")
            .phone("+15559876543")
            .email("bob.jones@example.com")
            .build(),
        EmployeeBuilder::new(3)
            .name("Carol White")
            .department("Sales")
            .unreachable()
            .email("carol.white@example.com")
            .build(),
        EmployeeBuilder::new(4)
            .name("Dan Brown")
            .department("Sales")
            .phone("+15555550104")
            .email("dan.brown@example.com")
            .build(),
        EmployeeBuilder::new(5)
            .name("Erin Green")
            .department("Engineering")
            .phone("+15555550105")
            .email("erin.green@example.com")
            .build(),
    ]
}

/// The sample company as a directory.
pub fn sample_directory() -> Result<Directory> {
    DirectoryBuilder::sample().build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_are_routable() {
        let employee = EmployeeBuilder::new(7).build();

        assert!(employee.is_routable());
        assert_eq!(employee.phone, "+15550000007");
    }

    #[test]
    fn sample_directory_has_one_unreachable_employee() {
        let directory = sample_directory().unwrap();

        assert_eq!(directory.len(), 5);
        assert_eq!(directory.routable_count(), 4);
    }

    #[test]
    fn written_directory_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = DirectoryBuilder::sample().write_to(dir.path()).unwrap();

        let directory = Directory::load(&path).unwrap();

        assert_eq!(directory.len(), 5);
    }
}
