use serde::{Deserialize, Serialize};
use std::fmt;

/// Tables owned by the reseed run, in foreign-key-safe insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeedTable {
    Team,
    User,
    Project,
    ProjectTeam,
    Task,
    Attachment,
    Comment,
    TaskAssignment,
}

impl SeedTable {
    /// Every table, parents before children. Inserts must follow this order.
    pub const ALL: [SeedTable; 8] = [
        SeedTable::Team,
        SeedTable::User,
        SeedTable::Project,
        SeedTable::ProjectTeam,
        SeedTable::Task,
        SeedTable::Attachment,
        SeedTable::Comment,
        SeedTable::TaskAssignment,
    ];

    /// Unquoted table name as created by the application schema
    pub fn name(&self) -> &'static str {
        match self {
            SeedTable::Team => "Team",
            SeedTable::User => "User",
            SeedTable::Project => "Project",
            SeedTable::ProjectTeam => "ProjectTeam",
            SeedTable::Task => "Task",
            SeedTable::Attachment => "Attachment",
            SeedTable::Comment => "Comment",
            SeedTable::TaskAssignment => "TaskAssignment",
        }
    }

    /// Quoted identifier, safe to splice into SQL
    pub fn table_name(&self) -> String {
        format!("\"{}\"", self.name())
    }

    /// Fixture file holding the rows for this table
    pub fn fixture_file(&self) -> &'static str {
        match self {
            SeedTable::Team => "team.json",
            SeedTable::User => "user.json",
            SeedTable::Project => "project.json",
            SeedTable::ProjectTeam => "projectTeam.json",
            SeedTable::Task => "task.json",
            SeedTable::Attachment => "attachment.json",
            SeedTable::Comment => "comment.json",
            SeedTable::TaskAssignment => "taskAssignment.json",
        }
    }

    /// Position in the insertion order
    pub fn position(&self) -> usize {
        SeedTable::ALL
            .iter()
            .position(|table| table == self)
            .unwrap_or(SeedTable::ALL.len())
    }

    /// Whether this table's fixture rows get their date fields shifted
    pub fn is_date_shifted(&self) -> bool {
        matches!(self, SeedTable::Project | SeedTable::Task)
    }

    /// Primary key column of the table
    pub fn primary_key(&self) -> &'static str {
        match self {
            SeedTable::User => "userId",
            _ => "id",
        }
    }

    /// Foreign-key columns and the table each one references
    pub fn foreign_keys(&self) -> &'static [(&'static str, SeedTable)] {
        match self {
            SeedTable::Team | SeedTable::Project => &[],
            SeedTable::User => &[("teamId", SeedTable::Team)],
            SeedTable::ProjectTeam => &[
                ("teamId", SeedTable::Team),
                ("projectId", SeedTable::Project),
            ],
            SeedTable::Task => &[
                ("projectId", SeedTable::Project),
                ("authorUserId", SeedTable::User),
                ("assignedUserId", SeedTable::User),
            ],
            SeedTable::Attachment => &[
                ("taskId", SeedTable::Task),
                ("uploadedById", SeedTable::User),
            ],
            SeedTable::Comment => &[("taskId", SeedTable::Task), ("userId", SeedTable::User)],
            SeedTable::TaskAssignment => &[("userId", SeedTable::User), ("taskId", SeedTable::Task)],
        }
    }
}

impl fmt::Display for SeedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
