//! Render pipelines of the viewer.
//!
//! `scene` builds the single textured/flat-colour pipeline every draw entry goes
//! through, together with the bind group layouts it expects.

pub mod scene;
