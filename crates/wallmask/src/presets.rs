//! Built-in sample rooms with pre-masked walls, so a visitor can try
//! patterns without uploading a photo.

use serde::Serialize;
use strum::{Display, EnumString};

use crate::types::{Point, Wall};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RoomCategory {
    LivingRoom,
    Bedroom,
    Office,
    Dining,
    Kids,
    TvRoom,
    Balcony,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresetWall {
    pub id: &'static str,
    pub name: &'static str,
    /// Rectangle as `(left, top, right, bottom)` in photo pixels.
    pub rect: (f32, f32, f32, f32),
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomPreset {
    pub id: &'static str,
    pub label: &'static str,
    pub category: RoomCategory,
    pub image_url: &'static str,
    pub walls: &'static [PresetWall],
}

impl RoomPreset {
    /// Fresh wall state for this room.
    pub fn walls(&self) -> Vec<Wall> {
        self.walls
            .iter()
            .map(|w| {
                let (l, t, r, b) = w.rect;
                Wall::new(w.id, w.name).with_polygon(vec![
                    Point::new(l, t),
                    Point::new(r, t),
                    Point::new(r, b),
                    Point::new(l, b),
                ])
            })
            .collect()
    }
}

pub const ROOM_PRESETS: &[RoomPreset] = &[
    RoomPreset {
        id: "room-living-modern",
        label: "Modern Living Room",
        category: RoomCategory::LivingRoom,
        image_url: "https://images.unsplash.com/photo-1618221195710-dd6b41faaea6?q=80&w=2000&auto=format&fit=crop",
        walls: &[PresetWall {
            id: "living-1-back",
            name: "Back wall",
            rect: (0.0, 0.0, 1300.0, 750.0),
        }],
    },
    RoomPreset {
        id: "room-dining",
        label: "Dining Room",
        category: RoomCategory::Dining,
        image_url: "https://images.unsplash.com/photo-1617806118233-18e1de247200?q=80&w=2000&auto=format&fit=crop",
        walls: &[PresetWall {
            id: "dining-1-side",
            name: "Side wall",
            rect: (200.0, 100.0, 1800.0, 900.0),
        }],
    },
    RoomPreset {
        id: "room-bedroom",
        label: "Bedroom",
        category: RoomCategory::Bedroom,
        image_url: "https://images.unsplash.com/photo-1616486338812-3dadae4b4ace?q=80&w=2000&auto=format&fit=crop",
        walls: &[PresetWall {
            id: "bedroom-1-headboard",
            name: "Headboard wall",
            rect: (280.0, 200.0, 1720.0, 850.0),
        }],
    },
    RoomPreset {
        id: "room-office-executive",
        label: "Executive Office",
        category: RoomCategory::Office,
        image_url: "https://images.unsplash.com/photo-1524758631624-e2822e304c36?q=80&w=2000&auto=format&fit=crop",
        walls: &[PresetWall {
            id: "office-1-main",
            name: "Main wall",
            rect: (100.0, 100.0, 1900.0, 800.0),
        }],
    },
    RoomPreset {
        id: "room-office-home",
        label: "Home Office",
        category: RoomCategory::Office,
        image_url: "https://images.unsplash.com/photo-1593642532400-2682810df593?q=80&w=2000&auto=format&fit=crop",
        walls: &[PresetWall {
            id: "office-2-back",
            name: "Back wall",
            rect: (400.0, 0.0, 1600.0, 600.0),
        }],
    },
    RoomPreset {
        id: "room-tv",
        label: "TV Room",
        category: RoomCategory::TvRoom,
        image_url: "https://images.unsplash.com/photo-1593359677879-a4bb92f829d1?q=80&w=2000&auto=format&fit=crop",
        walls: &[PresetWall {
            id: "tv-1-panel",
            name: "Panel wall",
            rect: (200.0, 100.0, 1800.0, 800.0),
        }],
    },
    RoomPreset {
        id: "room-balcony",
        label: "Balcony",
        category: RoomCategory::Balcony,
        image_url: "https://images.unsplash.com/photo-1560185127-6ed189bf02f4?q=80&w=2000&auto=format&fit=crop",
        walls: &[PresetWall {
            id: "balcony-1-outer",
            name: "Outer wall",
            rect: (500.0, 100.0, 1500.0, 900.0),
        }],
    },
    RoomPreset {
        id: "room-kids",
        label: "Kids Room",
        category: RoomCategory::Kids,
        image_url: "https://images.unsplash.com/photo-1519643381401-22c77e60520e?q=80&w=2000&auto=format&fit=crop",
        walls: &[PresetWall {
            id: "kids-1-main",
            name: "Main wall",
            rect: (130.0, 130.0, 1870.0, 900.0),
        }],
    },
];

pub fn find_preset(id: &str) -> Option<&'static RoomPreset> {
    ROOM_PRESETS.iter().find(|p| p.id == id)
}

pub fn presets_in(category: RoomCategory) -> impl Iterator<Item = &'static RoomPreset> {
    ROOM_PRESETS.iter().filter(move |p| p.category == category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::SimulatorConfig, session::SessionState};

    #[test]
    fn presets_have_unique_ids_and_complete_walls() {
        let mut ids: Vec<&str> = ROOM_PRESETS.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ROOM_PRESETS.len());
        for preset in ROOM_PRESETS {
            assert!(preset.walls().iter().all(|w| w.polygon.is_complete()));
        }
    }

    #[test]
    fn loading_a_preset_replaces_session_walls() {
        let mut session = SessionState::new(&SimulatorConfig::default());
        let preset = find_preset("room-living-modern").unwrap();
        session.load_preset(preset, 2000, 1333);
        assert_eq!(session.walls().len(), 1);
        assert_eq!(session.walls()[0].name, "Back wall");
        assert_eq!(session.walls()[0].polygon.area(), 1300.0 * 750.0);
        assert_eq!(session.photo().map(|p| p.width), Some(2000));
    }

    #[test]
    fn category_filter() {
        assert_eq!(presets_in(RoomCategory::Office).count(), 2);
    }
}
