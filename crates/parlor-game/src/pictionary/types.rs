use parlor_protocol::PeerId;
use serde::{Deserialize, Serialize};

/// One participant. The id is the participant's peer id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PeerId,
    pub name: String,
    pub score: u32,
    /// Rounds this player has drawn; feeds drawer selection.
    pub draw_count: u32,
    pub is_ready: bool,
}

impl Player {
    /// A fresh player with no score and no rounds drawn.
    pub fn new(id: PeerId, name: impl Into<String>, is_ready: bool) -> Self {
        Self {
            id,
            name: name.into(),
            score: 0,
            draw_count: 0,
            is_ready,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// One entry in a round's drawing log, produced by the drawer's canvas
/// and replayed verbatim by everyone else's.
///
/// ```json
/// {"type":"stroke","points":[{"x":1,"y":2}],"color":"#000","brushSize":4,"timestamp":17}
/// {"type":"clear","timestamp":18}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum DrawingEvent {
    Stroke {
        points: Vec<Point>,
        color: String,
        brush_size: f64,
        timestamp: u64,
    },
    Clear {
        timestamp: u64,
    },
}
