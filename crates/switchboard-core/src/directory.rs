//! Read-only employee directory.
//!
//! The directory is loaded once at startup from a JSON document and never
//! mutated afterwards. Records keep their file order; id and department
//! indexes are derived at load time so per-request lookups do not scan.

use std::{collections::HashMap, path::Path};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    error::{Result, RouterError},
    models::{EmployeeId, EmployeeRecord},
};

/// Wrapped on-disk layout, `{"employees": [...]}`.
#[derive(Debug, Deserialize)]
struct DirectoryDocument {
    employees: Vec<EmployeeRecord>,
}

/// Serialized form written by [`Directory::to_json`].
#[derive(Debug, Serialize)]
struct DirectoryDocumentRef<'a> {
    employees: &'a [EmployeeRecord],
}

/// Immutable, indexed employee directory.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    employees: Vec<EmployeeRecord>,
    by_id: HashMap<EmployeeId, usize>,
    /// First routable record per department, in file order.
    by_department: HashMap<String, usize>,
}

impl Directory {
    /// Loads the directory from a JSON file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read, is not a directory document, or
    /// repeats an employee id. All of these are fatal at startup.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path).map_err(|source| RouterError::DirectoryUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let directory = Self::from_slice(&raw)?;
        info!(
            path = %path.display(),
            employees = directory.len(),
            routable = directory.routable_count(),
            "Loaded employee directory"
        );
        Ok(directory)
    }

    /// Parses a directory document from bytes.
    ///
    /// A document starting with `[` is a bare record array; anything else is
    /// read as the wrapped form, so parse errors point at the failing field.
    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        let bare = raw.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'[');
        let employees = if bare {
            serde_json::from_slice::<Vec<EmployeeRecord>>(raw)?
        } else {
            serde_json::from_slice::<DirectoryDocument>(raw)?.employees
        };
        Self::from_records(employees)
    }

    /// Builds the directory and its indexes from records in order.
    pub fn from_records(employees: Vec<EmployeeRecord>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(employees.len());
        let mut by_department = HashMap::new();

        for (position, employee) in employees.iter().enumerate() {
            if employee.id.0 == 0 {
                return Err(RouterError::DirectoryInvalid(serde::de::Error::custom(format!(
                    "employee at position {position} has id 0, ids must be positive"
                ))));
            }

            if by_id.insert(employee.id, position).is_some() {
                return Err(RouterError::DuplicateEmployee { id: employee.id });
            }

            if !employee.is_routable() {
                warn!(employee_id = %employee.id, "Directory entry has no phone number, it will never be routed to");
                continue;
            }

            by_department.entry(employee.department.clone()).or_insert(position);
        }

        debug!(departments = by_department.len(), "Directory indexes built");
        Ok(Self { employees, by_id, by_department })
    }

    /// Looks up a record by id, routable or not.
    pub fn get(&self, id: EmployeeId) -> Option<&EmployeeRecord> {
        self.by_id.get(&id).map(|&position| &self.employees[position])
    }

    /// Routable record with the given id.
    pub fn routable(&self, id: EmployeeId) -> Option<&EmployeeRecord> {
        self.get(id).filter(|e| e.is_routable())
    }

    /// First routable record in `department`, matched exactly.
    pub fn first_in_department(&self, department: &str) -> Option<&EmployeeRecord> {
        self.by_department.get(department).map(|&position| &self.employees[position])
    }

    /// First routable record whose name is exactly `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&EmployeeRecord> {
        self.employees.iter().find(|e| e.is_routable() && e.name == name)
    }

    /// First routable record whose name matches, ignoring case and
    /// surrounding whitespace. Used for assistant contact lookups.
    pub fn find_by_name_ignore_case(&self, name: &str) -> Option<&EmployeeRecord> {
        let wanted = name.trim().to_lowercase();
        self.employees.iter().find(|e| e.is_routable() && e.name.to_lowercase() == wanted)
    }

    /// Records in file order.
    pub fn iter(&self) -> impl Iterator<Item = &EmployeeRecord> {
        self.employees.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.employees.len()
    }

    /// Whether the directory has no records.
    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    /// Number of records that can receive calls.
    pub fn routable_count(&self) -> usize {
        self.employees.iter().filter(|e| e.is_routable()).count()
    }

    /// Serializes the directory in the wrapped `{"employees": [...]}` form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&DirectoryDocumentRef { employees: &self.employees })?)
    }
}
