pub mod color;
pub mod cursor;
pub mod cxp;
pub mod error;
pub mod events;
pub mod flags;
pub mod geometry;
pub mod material;
pub mod model;
pub mod name;
pub mod paths;
pub mod renderable;

pub use color::MaterialColor;
pub use cursor::{ByteCursor, SizedString};
pub use cxp::{CxpRecord, CxpSource, CxpStore};
pub use error::{AssembleError, DecodeError, LoadError, TextError};
pub use events::{DecodeEvent, DecodeSink, LogSink, NullSink};
pub use flags::GeometryFlags;
pub use geometry::{
    Face, GeometryBody, GeometryListHeader, GeometryObject, ModelKind, NO_MATERIAL, QobGeometry,
    QobMesh, SobGeometry, SobMesh, VertexParam,
};
pub use material::{AlphaMethod, GameVersion, MaterialListHeader, MaterialRecord};
pub use model::{ModelFile, UnevaluatedFlags};
pub use name::VersionedName;
pub use paths::{DataPaths, gather_model_files};
pub use renderable::{RenderableArray, assemble_object, assemble_qob_mesh, assemble_sob_mesh};
