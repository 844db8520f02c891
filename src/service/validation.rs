//! Request validation. Rejected before any SQL runs.

use crate::error::AppError;
use crate::models::device::{CreateDevice, UpdateDevice};
use crate::models::problem::{CreateProblem, UpdateProblem};
use crate::models::session::CreateSession;
use crate::models::step::{CreateStep, UpdateStep};
use crate::models::tv_interface::{CreateMark, CreateTvInterface, UpdateMark, UpdateTvInterface};

pub const DEVICE_STATUSES: &[&str] = &["active", "inactive", "maintenance"];
pub const PROBLEM_CATEGORIES: &[&str] = &["critical", "moderate", "minor", "other"];
pub const PROBLEM_DIFFICULTIES: &[&str] = &["beginner", "intermediate", "advanced"];
pub const PROBLEM_STATUSES: &[&str] = &["draft", "published", "archived"];
pub const TV_INTERFACE_KINDS: &[&str] = &[
    "home", "settings", "channels", "apps", "guide", "no_signal", "error", "custom",
];
pub const MARK_SHAPES: &[&str] = &["rectangle", "circle", "arrow", "highlight"];

const NAME_MAX: usize = 200;
const TEXT_MAX: usize = 5000;

fn non_blank(field: &'static str, v: &str) -> Result<(), AppError> {
    if v.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn max_len(field: &'static str, v: &str, max: usize) -> Result<(), AppError> {
    if v.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

fn opt_max_len(field: &'static str, v: Option<&str>, max: usize) -> Result<(), AppError> {
    if let Some(s) = v {
        max_len(field, s, max)?;
    }
    Ok(())
}

fn one_of(field: &'static str, v: &str, allowed: &[&str]) -> Result<(), AppError> {
    if !allowed.contains(&v) {
        return Err(AppError::Validation(format!(
            "{field} must be one of: {}",
            allowed.join(", ")
        )));
    }
    Ok(())
}

fn opt_one_of(field: &'static str, v: Option<&str>, allowed: &[&str]) -> Result<(), AppError> {
    if let Some(s) = v {
        one_of(field, s, allowed)?;
    }
    Ok(())
}

fn opt_range(field: &'static str, v: Option<i32>, min: i32, max: i32) -> Result<(), AppError> {
    if let Some(n) = v {
        if n < min || n > max {
            return Err(AppError::Validation(format!(
                "{field} must be between {min} and {max}"
            )));
        }
    }
    Ok(())
}

pub fn validate_device_create(p: &CreateDevice) -> Result<(), AppError> {
    non_blank("name", &p.name)?;
    max_len("name", &p.name, NAME_MAX)?;
    opt_max_len("description", p.description.as_deref(), TEXT_MAX)?;
    opt_one_of("status", p.status.as_deref(), DEVICE_STATUSES)?;
    Ok(())
}

pub fn validate_device_update(p: &UpdateDevice) -> Result<(), AppError> {
    if let Some(name) = p.name.as_deref() {
        non_blank("name", name)?;
        max_len("name", name, NAME_MAX)?;
    }
    opt_max_len("description", p.description.as_deref(), TEXT_MAX)?;
    opt_one_of("status", p.status.as_deref(), DEVICE_STATUSES)?;
    Ok(())
}

pub fn validate_problem_create(p: &CreateProblem) -> Result<(), AppError> {
    non_blank("title", &p.title)?;
    max_len("title", &p.title, NAME_MAX)?;
    opt_max_len("description", p.description.as_deref(), TEXT_MAX)?;
    opt_one_of("category", p.category.as_deref(), PROBLEM_CATEGORIES)?;
    opt_one_of("difficulty", p.difficulty.as_deref(), PROBLEM_DIFFICULTIES)?;
    opt_one_of("status", p.status.as_deref(), PROBLEM_STATUSES)?;
    opt_range("priority", p.priority, 0, 10)?;
    opt_range("success_rate", p.success_rate, 0, 100)?;
    if let Some(tags) = &p.tags {
        if !tags.is_array() {
            return Err(AppError::Validation("tags must be an array".into()));
        }
    }
    Ok(())
}

pub fn validate_problem_update(p: &UpdateProblem) -> Result<(), AppError> {
    if let Some(title) = p.title.as_deref() {
        non_blank("title", title)?;
        max_len("title", title, NAME_MAX)?;
    }
    opt_max_len("description", p.description.as_deref(), TEXT_MAX)?;
    opt_one_of("category", p.category.as_deref(), PROBLEM_CATEGORIES)?;
    opt_one_of("difficulty", p.difficulty.as_deref(), PROBLEM_DIFFICULTIES)?;
    opt_one_of("status", p.status.as_deref(), PROBLEM_STATUSES)?;
    opt_range("priority", p.priority, 0, 10)?;
    opt_range("success_rate", p.success_rate, 0, 100)?;
    if let Some(tags) = &p.tags {
        if !tags.is_array() {
            return Err(AppError::Validation("tags must be an array".into()));
        }
    }
    Ok(())
}

pub fn validate_step_create(p: &CreateStep) -> Result<(), AppError> {
    non_blank("title", &p.title)?;
    max_len("title", &p.title, NAME_MAX)?;
    opt_max_len("description", p.description.as_deref(), TEXT_MAX)?;
    opt_max_len("instruction", p.instruction.as_deref(), TEXT_MAX)?;
    opt_range("estimated_time", p.estimated_time, 0, 24 * 60)?;
    Ok(())
}

pub fn validate_step_update(p: &UpdateStep) -> Result<(), AppError> {
    if let Some(title) = p.title.as_deref() {
        non_blank("title", title)?;
        max_len("title", title, NAME_MAX)?;
    }
    opt_max_len("description", p.description.as_deref(), TEXT_MAX)?;
    opt_max_len("instruction", p.instruction.as_deref(), TEXT_MAX)?;
    opt_range("estimated_time", p.estimated_time, 0, 24 * 60)?;
    Ok(())
}

pub fn validate_session_create(p: &CreateSession) -> Result<(), AppError> {
    opt_range("total_steps", p.total_steps, 0, 1000)?;
    Ok(())
}

pub fn validate_tv_interface_create(p: &CreateTvInterface) -> Result<(), AppError> {
    non_blank("name", &p.name)?;
    max_len("name", &p.name, NAME_MAX)?;
    opt_max_len("description", p.description.as_deref(), TEXT_MAX)?;
    opt_one_of("type", p.kind.as_deref(), TV_INTERFACE_KINDS)?;
    Ok(())
}

pub fn validate_tv_interface_update(p: &UpdateTvInterface) -> Result<(), AppError> {
    if let Some(name) = p.name.as_deref() {
        non_blank("name", name)?;
        max_len("name", name, NAME_MAX)?;
    }
    opt_max_len("description", p.description.as_deref(), TEXT_MAX)?;
    opt_one_of("type", p.kind.as_deref(), TV_INTERFACE_KINDS)?;
    Ok(())
}

pub fn validate_mark_create(p: &CreateMark) -> Result<(), AppError> {
    non_blank("name", &p.name)?;
    max_len("name", &p.name, NAME_MAX)?;
    opt_one_of("shape", p.shape.as_deref(), MARK_SHAPES)?;
    opt_range("position_x", p.position_x, 0, 10_000)?;
    opt_range("position_y", p.position_y, 0, 10_000)?;
    Ok(())
}

pub fn validate_mark_update(p: &UpdateMark) -> Result<(), AppError> {
    if let Some(name) = p.name.as_deref() {
        non_blank("name", name)?;
        max_len("name", name, NAME_MAX)?;
    }
    opt_one_of("shape", p.shape.as_deref(), MARK_SHAPES)?;
    opt_range("position_x", p.position_x, 0, 10_000)?;
    opt_range("position_y", p.position_y, 0, 10_000)?;
    Ok(())
}

/// Search terms shorter than two characters are rejected rather than run.
pub fn validate_search_term(term: &str) -> Result<(), AppError> {
    if term.trim().chars().count() < 2 {
        return Err(AppError::Validation(
            "Search term must contain at least 2 characters".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: &str) -> CreateDevice {
        CreateDevice {
            name: name.into(),
            brand: None,
            model: None,
            description: None,
            image_url: None,
            order_index: None,
            status: None,
        }
    }

    #[test]
    fn blank_device_name_is_rejected() {
        let err = validate_device_create(&device("  ")).unwrap_err();
        assert_eq!(err.error_type(), "VALIDATION_ERROR");
    }

    #[test]
    fn valid_device_passes() {
        assert!(validate_device_create(&device("Openbox")).is_ok());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut p = device("Openbox");
        p.status = Some("broken".into());
        assert!(validate_device_create(&p).is_err());
    }

    #[test]
    fn problem_category_and_priority_bounds() {
        let mut p = CreateProblem {
            device_id: 1,
            title: "No signal".into(),
            description: None,
            category: Some("critical".into()),
            icon: None,
            color: None,
            tags: None,
            priority: Some(5),
            estimated_time: None,
            difficulty: None,
            success_rate: None,
            status: None,
        };
        assert!(validate_problem_create(&p).is_ok());
        p.category = Some("catastrophic".into());
        assert!(validate_problem_create(&p).is_err());
        p.category = Some("critical".into());
        p.priority = Some(11);
        assert!(validate_problem_create(&p).is_err());
    }

    #[test]
    fn tags_must_be_an_array() {
        let p = CreateProblem {
            device_id: 1,
            title: "No sound".into(),
            description: None,
            category: None,
            icon: None,
            color: None,
            tags: Some(serde_json::json!({"not": "an array"})),
            priority: None,
            estimated_time: None,
            difficulty: None,
            success_rate: None,
            status: None,
        };
        assert!(validate_problem_create(&p).is_err());
    }

    #[test]
    fn short_search_terms_are_rejected() {
        assert!(validate_search_term("a").is_err());
        assert!(validate_search_term(" a ").is_err());
        assert!(validate_search_term("tv").is_ok());
    }
}
