//! Input validation for campus records
//!
//! The schema enforces NOT NULL and foreign keys; these checks cover what
//! the schema cannot express. Nothing here cross-checks records against
//! each other (a room's floor is not compared with its building's floor
//! count, and outlines may self-intersect).

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{
    Announcement, AppSettings, Building, Event, Floor, Hallway, Room, Shape, Staff,
};

fn invalid(message: impl Into<String>) -> Error {
    Error::Validation(message.into())
}

fn require_text(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn require_id(id: Uuid, field: &str) -> Result<()> {
    if id.is_nil() {
        return Err(invalid(format!("{} must not be nil", field)));
    }
    Ok(())
}

/// Check a `#rgb` or `#rrggbb` color literal
pub fn validate_color(color: &str) -> Result<()> {
    let hex = color
        .strip_prefix('#')
        .ok_or_else(|| invalid(format!("Color {:?} must start with '#'", color)))?;
    if !matches!(hex.len(), 3 | 6) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid(format!("Color {:?} is not a hex color", color)));
    }
    Ok(())
}

fn validate_email(email: Option<&str>) -> Result<()> {
    match email {
        Some(e) if !e.contains('@') || e.trim() != e => {
            Err(invalid(format!("Email {:?} is not valid", e)))
        }
        _ => Ok(()),
    }
}

fn require_finite(value: f64, field: &str) -> Result<()> {
    if !value.is_finite() {
        return Err(invalid(format!("{} must be a finite number", field)));
    }
    Ok(())
}

pub fn validate_building(building: &Building) -> Result<()> {
    require_text(&building.code, "Building code")?;
    if building.name.is_blank() {
        return Err(invalid("Building name must be given in at least one locale"));
    }
    if building.floors == 0 {
        return Err(invalid("Building must have at least one floor"));
    }
    validate_color(&building.color)?;
    require_finite(building.position.x, "Building position")?;
    require_finite(building.position.y, "Building position")
}

pub fn validate_floor(floor: &Floor) -> Result<()> {
    require_id(floor.building_id, "Floor building")
}

pub fn validate_room(room: &Room) -> Result<()> {
    require_id(room.building_id, "Room building")?;
    require_text(&room.room_number, "Room number")?;
    if room.size.width <= 0.0 || room.size.height <= 0.0 {
        return Err(invalid("Room size must be positive"));
    }
    if room.equipment.iter().any(|item| item.trim().is_empty()) {
        return Err(invalid("Room equipment entries must not be empty"));
    }
    Ok(())
}

pub fn validate_hallway(hallway: &Hallway) -> Result<()> {
    require_id(hallway.building_id, "Hallway building")?;
    require_id(hallway.floor_id, "Hallway floor")?;
    for value in [hallway.start.x, hallway.start.y, hallway.end.x, hallway.end.y] {
        require_finite(value, "Hallway coordinate")?;
    }
    if hallway.width.is_nan() || hallway.width <= 0.0 {
        return Err(invalid("Hallway width must be positive"));
    }
    Ok(())
}

pub fn validate_staff(staff: &Staff) -> Result<()> {
    require_text(&staff.name, "Staff name")?;
    require_text(&staff.position, "Staff position")?;
    require_text(&staff.department, "Staff department")?;
    validate_email(staff.email.as_deref())
}

pub fn validate_announcement(announcement: &Announcement) -> Result<()> {
    if announcement.title.is_blank() {
        return Err(invalid("Announcement title must be given in at least one locale"));
    }
    if announcement.content.is_blank() {
        return Err(invalid("Announcement content must be given in at least one locale"));
    }
    if let Some(expires_at) = announcement.expires_at {
        if expires_at <= announcement.published_at {
            return Err(invalid("Announcement must expire after it is published"));
        }
    }
    Ok(())
}

pub fn validate_event(event: &Event) -> Result<()> {
    if event.title.is_blank() {
        return Err(invalid("Event title must be given in at least one locale"));
    }
    if event.ends_at < event.starts_at {
        return Err(invalid("Event must not end before it starts"));
    }
    Ok(())
}

pub fn validate_settings(settings: &AppSettings) -> Result<()> {
    require_text(&settings.app_name, "App name")?;
    validate_color(&settings.primary_color)?;
    validate_color(&settings.secondary_color)?;
    validate_email(settings.contact_email.as_deref())
}

/// A persisted outline needs at least two points. Auto-closed outlines may
/// be closed with two points, so `closed` does not raise the minimum here.
pub fn validate_shape(shape: &Shape) -> Result<()> {
    require_text(&shape.label, "Shape label")?;
    validate_color(&shape.color)?;
    if shape.points.len() < 2 {
        return Err(invalid("Shape needs at least 2 points"));
    }
    for point in &shape.points {
        require_finite(point.x, "Shape point")?;
        require_finite(point.y, "Shape point")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::{Outline, Point};
    use crate::models::{LocalizedText, ShapeKind, ShapeMeta};
    use chrono::{Duration, Utc};

    fn building() -> Building {
        Building::new("M".to_string(), LocalizedText::new("Main", "Päärakennus"))
    }

    #[test]
    fn test_valid_building() {
        assert!(validate_building(&building()).is_ok());
    }

    #[test]
    fn test_building_rejects_bad_fields() {
        assert!(validate_building(&building().with_floors(0)).is_err());
        assert!(validate_building(&building().with_color("blue")).is_err());
        assert!(validate_building(&building().with_color("#12345G")).is_err());
        assert!(validate_building(&Building {
            code: " ".to_string(),
            ..building()
        })
        .is_err());
    }

    #[test]
    fn test_short_color_allowed() {
        assert!(validate_color("#fff").is_ok());
        assert!(validate_color("#ffff").is_err());
    }

    #[test]
    fn test_staff_email() {
        let mut staff = Staff::new(
            "Maija Meikäläinen".to_string(),
            "Teacher".to_string(),
            "Mathematics".to_string(),
        );
        assert!(validate_staff(&staff).is_ok());
        staff.email = Some("not-an-email".to_string());
        assert!(validate_staff(&staff).is_err());
        staff.email = Some("maija@ksyk.fi".to_string());
        assert!(validate_staff(&staff).is_ok());
    }

    #[test]
    fn test_announcement_expiry_after_publish() {
        let mut a = Announcement::new(LocalizedText::new("Hi", ""), LocalizedText::new("", "Moi"));
        assert!(validate_announcement(&a).is_ok());
        a.expires_at = Some(a.published_at - Duration::minutes(1));
        assert!(validate_announcement(&a).is_err());
    }

    #[test]
    fn test_event_ordering() {
        let now = Utc::now();
        let event = Event::new(LocalizedText::new("Open day", "Avoimet ovet"), now, now);
        assert!(validate_event(&event).is_ok());
        let backwards = Event::new(event.title.clone(), now, now - Duration::hours(1));
        assert!(validate_event(&backwards).is_err());
    }

    #[test]
    fn test_two_point_closed_shape_allowed() {
        let shape = Shape::from_outline(
            Outline {
                points: vec![Point::new(20.0, 20.0), Point::new(100.0, 0.0)],
                closed: true,
            },
            ShapeMeta {
                kind: ShapeKind::Building,
                label: "Gym".to_string(),
                color: "#10B981".to_string(),
                building_id: None,
                floor: None,
            },
        );
        assert!(validate_shape(&shape).is_ok());

        let single = Shape {
            points: vec![Point::new(0.0, 0.0)],
            ..shape
        };
        assert!(validate_shape(&single).is_err());
    }
}
