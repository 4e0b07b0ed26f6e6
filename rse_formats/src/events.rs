use serde::Serialize;

use crate::geometry::ModelKind;
use crate::material::GameVersion;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DecodeEvent {
    HeaderRead {
        kind: ModelKind,
        message: String,
    },
    MaterialListRead {
        count: usize,
    },
    CxpRecordsAvailable {
        count: usize,
    },
    MaterialRead {
        index: usize,
        name: String,
        texture: String,
        game_version: GameVersion,
    },
    CxpResolved {
        matched: usize,
        materials: usize,
    },
    GeometryListRead {
        count: usize,
    },
    GeometryObjectRead {
        index: usize,
        name: String,
        vertices: usize,
        meshes: usize,
    },
    FooterRead {
        message: String,
    },
}

pub trait DecodeSink {
    fn event(&mut self, event: DecodeEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DecodeSink for NullSink {
    fn event(&mut self, _event: DecodeEvent) {}
}

/// Forwards events to the `log` facade. The footer is reported at info
/// level, everything else at debug.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DecodeSink for LogSink {
    fn event(&mut self, event: DecodeEvent) {
        match event {
            DecodeEvent::HeaderRead { kind, message } => {
                log::debug!("{kind:?} header read: {message}")
            }
            DecodeEvent::MaterialListRead { count } => {
                log::debug!("material list read (count: {count})")
            }
            DecodeEvent::CxpRecordsAvailable { count } => {
                log::debug!("{count} CXP records available")
            }
            DecodeEvent::MaterialRead {
                index,
                name,
                texture,
                game_version,
            } => log::debug!("material {index} {name:?} ({texture}) uses {game_version:?} layout"),
            DecodeEvent::CxpResolved { matched, materials } => {
                log::debug!("{matched} of {materials} materials matched a CXP record")
            }
            DecodeEvent::GeometryListRead { count } => {
                log::debug!("geometry list read (count: {count})")
            }
            DecodeEvent::GeometryObjectRead {
                index,
                name,
                vertices,
                meshes,
            } => log::debug!("geometry object {index} {name:?}: {vertices} vertices, {meshes} meshes"),
            DecodeEvent::FooterRead { message } => log::info!("model decoded, footer: {message}"),
        }
    }
}

impl DecodeSink for Vec<DecodeEvent> {
    fn event(&mut self, event: DecodeEvent) {
        self.push(event);
    }
}
