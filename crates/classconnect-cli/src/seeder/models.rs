//! Seeding configuration and summary.

/// How much fake data `seed` generates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedConfig {
    pub teachers: usize,
    /// Classes per teacher.
    pub classes_per_teacher: usize,
    /// Size of the student pool. Every student joins every seeded class.
    pub students: usize,
    /// Assignments per class.
    pub assignments_per_class: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            teachers: 3,
            classes_per_teacher: 2,
            students: 30,
            assignments_per_class: 4,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub teachers: usize,
    pub students: usize,
    pub classes: usize,
    pub enrollments: usize,
    pub assignments: usize,
}
