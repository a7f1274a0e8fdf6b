//! Allocation helpers over already-imported students.
//!
//! An empty school reference and the "Não alocada" sentinel both mean
//! unallocated; every function here treats them the same way. Nothing is
//! mutated in place, callers get copies to hand back to a store.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{EnrollmentStatus, School, Student, UNALLOCATED_SCHOOL};

/// Student counts for a dataset.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllocationStats {
    pub total: usize,
    pub unallocated: usize,
    /// School name → student count; unallocated students under "Não alocada".
    pub by_school: BTreeMap<String, usize>,
}

/// Students per school name, with unallocated students folded together.
pub fn school_stats(students: &[Student]) -> BTreeMap<String, usize> {
    let mut stats = BTreeMap::new();
    for student in students {
        let key = if student.is_unallocated() {
            UNALLOCATED_SCHOOL
        } else {
            student.school.trim()
        };
        *stats.entry(key.to_string()).or_insert(0) += 1;
    }
    stats
}

pub fn unallocated_count(students: &[Student]) -> usize {
    students.iter().filter(|s| s.is_unallocated()).count()
}

pub fn allocation_stats(students: &[Student]) -> AllocationStats {
    AllocationStats {
        total: students.len(),
        unallocated: unallocated_count(students),
        by_school: school_stats(students),
    }
}

/// Sorted, de-duplicated, non-empty class names.
pub fn class_names(students: &[Student]) -> Vec<String> {
    students
        .iter()
        .map(|s| s.class_name.trim())
        .filter(|c| !c.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Copies of every unallocated student, assigned to `school` and enrolled.
pub fn allocate_unallocated(students: &[Student], school: &School) -> Vec<Student> {
    students
        .iter()
        .filter(|s| s.is_unallocated())
        .map(|s| Student {
            school: school.name.clone(),
            status: EnrollmentStatus::Enrolled,
            ..s.clone()
        })
        .collect()
}
