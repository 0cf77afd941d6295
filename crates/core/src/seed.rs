//! Sample campus used to populate an empty database

use chrono::{Duration, Utc};
use tracing::{info, instrument};

use crate::error::Result;
use crate::models::{
    Accessibility, Announcement, Building, Event, Floor, Hallway, LocalizedText, Position,
    Priority, Room, RoomType, Staff,
};
use crate::storage::Database;

struct SampleBuilding {
    code: &'static str,
    en: &'static str,
    fi: &'static str,
    floors: u32,
    color: &'static str,
    x: f64,
    y: f64,
}

const BUILDINGS: &[SampleBuilding] = &[
    SampleBuilding {
        code: "M",
        en: "Main Building",
        fi: "Päärakennus",
        floors: 3,
        color: "#3B82F6",
        x: 200.0,
        y: 160.0,
    },
    SampleBuilding {
        code: "U",
        en: "New Building",
        fi: "Uusi rakennus",
        floors: 2,
        color: "#10B981",
        x: 420.0,
        y: 160.0,
    },
    SampleBuilding {
        code: "K",
        en: "Kitchen and Cafeteria",
        fi: "Keittiö ja ruokala",
        floors: 1,
        color: "#F59E0B",
        x: 200.0,
        y: 360.0,
    },
    SampleBuilding {
        code: "L",
        en: "Gym",
        fi: "Liikuntasali",
        floors: 1,
        color: "#EF4444",
        x: 420.0,
        y: 360.0,
    },
];

/// (building code, floor, room number, en, fi, type, capacity)
const ROOMS: &[(&str, i32, &str, &str, &str, RoomType, u32)] = &[
    ("M", 1, "M101", "Lobby", "Aula", RoomType::Other, 120),
    ("M", 1, "M110", "Principal's Office", "Rehtorin kanslia", RoomType::Office, 4),
    ("M", 2, "M201", "Physics Lab", "Fysiikan laboratorio", RoomType::Laboratory, 24),
    ("M", 2, "M210", "Library", "Kirjasto", RoomType::Library, 40),
    ("M", 3, "M301", "Auditorium", "Auditorio", RoomType::Auditorium, 180),
    ("U", 1, "U101", "Language Classroom", "Kieliluokka", RoomType::Classroom, 30),
    ("U", 2, "U201", "Computer Lab", "Tietokoneluokka", RoomType::Laboratory, 28),
    ("K", 1, "K101", "Cafeteria", "Ruokala", RoomType::Cafeteria, 250),
    ("L", 1, "L101", "Main Gym", "Pääsali", RoomType::Gym, 200),
];

/// Populate the sample campus when the database has no buildings.
///
/// Returns whether anything was written.
#[instrument(skip(db))]
pub fn seed_sample_campus(db: &Database) -> Result<bool> {
    if !db.buildings().list()?.is_empty() {
        return Ok(false);
    }

    db.in_transaction(|db| {
        let mut buildings = Vec::new();
        for sample in BUILDINGS {
            let building = Building::new(
                sample.code.to_string(),
                LocalizedText::new(sample.en, sample.fi),
            )
            .with_floors(sample.floors)
            .with_color(sample.color)
            .with_position(Position::new(sample.x, sample.y));
            db.buildings().create(&building)?;

            let mut floors = Vec::new();
            for number in 1..=sample.floors as i32 {
                let floor = Floor::new(building.id, number).with_name(LocalizedText::new(
                    format!("Floor {}", number),
                    format!("{}. kerros", number),
                ));
                db.floors().create(&floor)?;
                floors.push(floor);
            }

            if let Some(ground) = floors.first() {
                let mut corridor = Hallway::new(
                    building.id,
                    ground.id,
                    Position::new(sample.x - 60.0, sample.y),
                    Position::new(sample.x + 60.0, sample.y),
                );
                corridor.name = Some(format!("{} corridor", sample.code));
                corridor.emergency_route = true;
                db.hallways().create(&corridor)?;
            }
            buildings.push(building);
        }

        let mut rooms = Vec::new();
        for (index, (code, floor, number, en, fi, room_type, capacity)) in
            ROOMS.iter().enumerate()
        {
            let Some(building) = buildings.iter().find(|b| b.code == *code) else {
                continue;
            };
            let mut room = Room::new(building.id, *floor, number.to_string(), *room_type);
            room.name = Some(LocalizedText::new(*en, *fi));
            room.capacity = Some(*capacity);
            room.position = Position::new(
                building.position.x + (index % 3) as f64 * 45.0,
                building.position.y + 40.0,
            );
            room.accessibility = Accessibility {
                wheelchair: *floor == 1,
                hearing_loop: matches!(room_type, RoomType::Auditorium),
                elevator_access: building.floors > 1,
            };
            if matches!(room_type, RoomType::Laboratory | RoomType::Classroom) {
                room.equipment = vec!["Projector".to_string(), "Whiteboard".to_string()];
            }
            db.rooms().create(&room)?;
            rooms.push(room);
        }

        let office = rooms.iter().find(|r| r.room_number == "M110");
        let lab = rooms.iter().find(|r| r.room_number == "M201");
        let mut principal = Staff::new(
            "Anna Virtanen".to_string(),
            "Principal".to_string(),
            "Administration".to_string(),
        );
        principal.email = Some("anna.virtanen@ksyk.fi".to_string());
        principal.office_room_id = office.map(|r| r.id);
        let mut teacher = Staff::new(
            "Mikko Nieminen".to_string(),
            "Physics Teacher".to_string(),
            "Science".to_string(),
        );
        teacher.office_room_id = lab.map(|r| r.id);
        db.staff().create(&principal)?;
        db.staff().create(&teacher)?;

        let mut welcome = Announcement::new(
            LocalizedText::new("Welcome to KSYK", "Tervetuloa KSYK:hon"),
            LocalizedText::new(
                "Use the map to find rooms and staff.",
                "Löydät kartalta luokat ja henkilökunnan.",
            ),
        );
        welcome.priority = Priority::High;
        db.announcements().create(&welcome)?;

        let start = Utc::now() + Duration::days(7);
        let mut open_day = Event::new(
            LocalizedText::new("Open Day", "Avoimet ovet"),
            start,
            start + Duration::hours(4),
        );
        open_day.room_id = rooms.iter().find(|r| r.room_number == "M301").map(|r| r.id);
        db.events().create(&open_day)?;

        info!(
            buildings = buildings.len(),
            rooms = rooms.len(),
            "Seeded sample campus"
        );
        Ok(true)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_populates_once() {
        let db = Database::open_in_memory().unwrap();
        assert!(seed_sample_campus(&db).unwrap());
        let building_count = db.buildings().list().unwrap().len();
        assert_eq!(building_count, BUILDINGS.len());
        assert_eq!(db.rooms().list().unwrap().len(), ROOMS.len());
        assert_eq!(db.floors().list().unwrap().len(), 7);

        assert!(!seed_sample_campus(&db).unwrap());
        assert_eq!(db.buildings().list().unwrap().len(), building_count);
    }

    #[test]
    fn test_seeded_directory_is_searchable() {
        let db = Database::open_in_memory().unwrap();
        seed_sample_campus(&db).unwrap();
        let results = db.search("kirjasto", 10).unwrap();
        assert_eq!(results.rooms.len(), 1);
        assert_eq!(results.rooms[0].room_number, "M210");
        assert_eq!(db.announcements().list_active(Utc::now()).unwrap().len(), 1);
    }
}
