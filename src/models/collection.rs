use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Key of the single business-profile record inside the settings collection.
pub const SETTINGS_KEY: &str = "business_profile";

/// Collections managed by the backup subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Students,
    Invoices,
    MonthlyAttendance,
    Settings,
}

impl Collection {
    /// Bulk collections in the fixed order used by export and import.
    pub const BULK: [Collection; 3] = [
        Collection::Students,
        Collection::Invoices,
        Collection::MonthlyAttendance,
    ];

    /// Every managed collection, in the order `clear` processes them.
    pub const ALL: [Collection; 4] = [
        Collection::Students,
        Collection::Invoices,
        Collection::MonthlyAttendance,
        Collection::Settings,
    ];

    /// Returns the storage name of this collection.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Students => "students",
            Collection::Invoices => "invoices",
            Collection::MonthlyAttendance => "monthly_attendance",
            Collection::Settings => "settings",
        }
    }

    /// Returns the field that holds this collection inside a backup artifact.
    pub fn snapshot_field(&self) -> &'static str {
        match self {
            Collection::Students => "students",
            Collection::Invoices => "invoices",
            Collection::MonthlyAttendance => "attendance",
            Collection::Settings => "settings",
        }
    }

    /// True for the singleton-style settings collection.
    pub fn is_singleton(&self) -> bool {
        matches!(self, Collection::Settings)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "students" => Ok(Collection::Students),
            "invoices" => Ok(Collection::Invoices),
            "monthly_attendance" | "attendance" => Ok(Collection::MonthlyAttendance),
            "settings" => Ok(Collection::Settings),
            _ => Err(format!(
                "Invalid collection '{}'. Valid options: students, invoices, monthly_attendance, settings",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_names() {
        assert_eq!(Collection::Students.name(), "students");
        assert_eq!(Collection::Invoices.name(), "invoices");
        assert_eq!(Collection::MonthlyAttendance.name(), "monthly_attendance");
        assert_eq!(Collection::Settings.name(), "settings");
    }

    #[test]
    fn test_attendance_uses_short_snapshot_field() {
        assert_eq!(Collection::MonthlyAttendance.snapshot_field(), "attendance");
        assert_eq!(Collection::Students.snapshot_field(), "students");
    }

    #[test]
    fn test_collection_from_str() {
        assert_eq!(
            Collection::from_str("students").unwrap(),
            Collection::Students
        );
        assert_eq!(
            Collection::from_str("Monthly-Attendance").unwrap(),
            Collection::MonthlyAttendance
        );
        assert_eq!(
            Collection::from_str("attendance").unwrap(),
            Collection::MonthlyAttendance
        );
        assert_eq!(
            Collection::from_str("SETTINGS").unwrap(),
            Collection::Settings
        );
    }

    #[test]
    fn test_collection_from_str_invalid() {
        let err = Collection::from_str("teachers").unwrap_err();
        assert!(err.contains("Invalid collection 'teachers'"));
    }

    #[test]
    fn test_bulk_excludes_settings() {
        assert!(!Collection::BULK.contains(&Collection::Settings));
        assert!(Collection::ALL.contains(&Collection::Settings));
        assert!(Collection::Settings.is_singleton());
    }
}
