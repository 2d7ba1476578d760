// src/engine/window.rs

//! Access-window gating for a week.
//!
//! All predicates take `now` as an explicit parameter; nothing here reads
//! the clock, which keeps the boundary cases testable to the millisecond.

use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{registration::Role, week::Week},
};

/// The window-relevant facts about a requester.
#[derive(Debug, Clone, Copy)]
pub struct Requester {
    pub role: Role,
    pub has_accommodation: bool,
}

/// Whether the week's content may be shown at all. Staff see unreleased
/// weeks; students do not.
pub fn is_visible(week: &Week, role: Role, now: DateTime<Utc>) -> bool {
    now >= week.start_date || role.is_staff()
}

/// Whether state-mutating operations (starting a quiz, submitting) are still
/// accepted from this requester.
pub fn accepts_submissions(week: &Week, requester: Requester, now: DateTime<Utc>) -> bool {
    if now < week.start_date {
        return requester.role.is_staff();
    }
    if now < week.end_date {
        return true;
    }
    requester.has_accommodation && now < week.end_date_extra_time
}

/// Looser, informational predicate: once the extended deadline has fully
/// elapsed, correct answers and full exercise text are revealed to everyone,
/// accommodated or not. Never denies access by itself.
pub fn solution_shown(week: &Week, now: DateTime<Utc>) -> bool {
    now >= week.end_date_extra_time
}

pub fn ensure_visible(week: &Week, role: Role, now: DateTime<Utc>) -> Result<(), AppError> {
    if is_visible(week, role, now) {
        Ok(())
    } else {
        Err(AppError::AccessWindowClosed(
            "This week is not yet open".to_string(),
        ))
    }
}

pub fn ensure_accepts_submissions(
    week: &Week,
    requester: Requester,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if accepts_submissions(week, requester, now) {
        Ok(())
    } else if now < week.start_date {
        Err(AppError::AccessWindowClosed(
            "This week is not yet open".to_string(),
        ))
    } else {
        Err(AppError::AccessWindowClosed(
            "The submission deadline for this week has passed".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn week() -> Week {
        Week {
            id: "w1".to_string(),
            course_id: "course".to_string(),
            title: "Week 1".to_string(),
            start_date: Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2026, 1, 12, 8, 0, 0).unwrap(),
            end_date_extra_time: Utc.with_ymd_and_hms(2026, 1, 14, 8, 0, 0).unwrap(),
        }
    }

    fn student(has_accommodation: bool) -> Requester {
        Requester {
            role: Role::Student,
            has_accommodation,
        }
    }

    #[test]
    fn denied_just_before_start_allowed_at_start() {
        let w = week();
        let before = w.start_date - Duration::milliseconds(1);
        assert!(!accepts_submissions(&w, student(false), before));
        assert!(!is_visible(&w, Role::Student, before));
        assert!(accepts_submissions(&w, student(false), w.start_date));
        assert!(is_visible(&w, Role::Student, w.start_date));
    }

    #[test]
    fn staff_bypass_the_not_yet_open_gate() {
        let w = week();
        let before = w.start_date - Duration::days(3);
        assert!(is_visible(&w, Role::Ta, before));
        assert!(is_visible(&w, Role::Admin, before));
        assert!(accepts_submissions(
            &w,
            Requester {
                role: Role::Ta,
                has_accommodation: false
            },
            before
        ));
    }

    #[test]
    fn past_due_denied_without_accommodation() {
        let w = week();
        assert!(accepts_submissions(
            &w,
            student(false),
            w.end_date - Duration::milliseconds(1)
        ));
        assert!(!accepts_submissions(&w, student(false), w.end_date));
    }

    #[test]
    fn accommodation_extends_to_extra_time() {
        let w = week();
        assert!(accepts_submissions(&w, student(true), w.end_date));
        assert!(accepts_submissions(
            &w,
            student(true),
            w.end_date_extra_time - Duration::milliseconds(1)
        ));
        assert!(!accepts_submissions(&w, student(true), w.end_date_extra_time));
    }

    #[test]
    fn solutions_shown_to_everyone_after_extra_time() {
        let w = week();
        assert!(!solution_shown(&w, w.end_date));
        assert!(!solution_shown(
            &w,
            w.end_date_extra_time - Duration::milliseconds(1)
        ));
        assert!(solution_shown(&w, w.end_date_extra_time));
    }

    #[test]
    fn ensure_variants_map_to_access_window_closed() {
        let w = week();
        let before = w.start_date - Duration::days(1);
        assert!(matches!(
            ensure_visible(&w, Role::Student, before),
            Err(AppError::AccessWindowClosed(_))
        ));
        assert!(matches!(
            ensure_accepts_submissions(&w, student(false), w.end_date),
            Err(AppError::AccessWindowClosed(_))
        ));
    }
}
