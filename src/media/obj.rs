//! Wavefront OBJ meshes.
//!
//! Supports the geometry subset node models use: `v`, `vt`, `vn` and `f` statements.
//! Faces may reference `v`, `v/vt`, `v//vn` or `v/vt/vn`, with negative indices
//! counting back from the latest element. Polygons are triangulated as fans. Every
//! other statement (groups, materials, smoothing) is ignored.

use std::str::SplitWhitespace;

use thiserror::Error;

/// A mesh vertex, laid out for direct upload to a vertex buffer.
///
/// # Memory Layout
/// - Position: [f32; 3] (12 bytes)
/// - Texture Coordinates: [f32; 2] (8 bytes)
/// - Normal: [f32; 3] (12 bytes)
///
/// Total size: 32 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// Model-space position
    pub position: [f32; 3],
    /// UV texture coordinates, zero when the face has none
    pub tex_coords: [f32; 2],
    /// Vertex normal, zero when the face has none
    pub normal: [f32; 3],
}

/// A triangle list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    /// Three vertices per triangle
    pub vertices: Vec<MeshVertex>,
}

impl Mesh {
    /// The number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Returns true if the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The vertex data as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// A malformed OBJ statement.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line}: {reason}")]
pub struct ObjParseError {
    /// 1-based line number
    pub line: usize,
    /// What is wrong with the line
    pub reason: String,
}

#[derive(Default)]
struct ObjParser {
    positions: Vec<[f32; 3]>,
    tex_coords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
    mesh: Mesh,
}

/// Parses OBJ source text into a triangle list.
pub fn parse_obj(source: &str) -> Result<Mesh, ObjParseError> {
    let mut parser = ObjParser::default();

    for (index, line) in source.lines().enumerate() {
        parser
            .parse_line(line)
            .map_err(|reason| ObjParseError {
                line: index + 1,
                reason,
            })?;
    }

    Ok(parser.mesh)
}

impl ObjParser {
    fn parse_line(&mut self, line: &str) -> Result<(), String> {
        let line = line.split('#').next().unwrap_or_default();
        let mut parts = line.split_whitespace();

        match parts.next() {
            Some("v") => {
                let [x, y, z] = parse_floats::<3>(&mut parts, 3, "v")?;
                self.positions.push([x, y, z]);
            }
            Some("vt") => {
                let [u, v] = parse_floats::<2>(&mut parts, 1, "vt")?;
                self.tex_coords.push([u, v]);
            }
            Some("vn") => {
                let normal = parse_floats::<3>(&mut parts, 3, "vn")?;
                self.normals.push(normal);
            }
            Some("f") => self.parse_face(parts)?,
            _ => {}
        }

        Ok(())
    }

    fn parse_face(&mut self, parts: SplitWhitespace<'_>) -> Result<(), String> {
        let corners = parts
            .map(|corner| self.parse_corner(corner))
            .collect::<Result<Vec<MeshVertex>, String>>()?;

        if corners.len() < 3 {
            return Err(format!("face has {} vertices, need at least 3", corners.len()));
        }

        for i in 1..corners.len() - 1 {
            self.mesh
                .vertices
                .extend_from_slice(&[corners[0], corners[i], corners[i + 1]]);
        }

        Ok(())
    }

    fn parse_corner(&self, corner: &str) -> Result<MeshVertex, String> {
        let mut refs = corner.split('/');

        let position = match refs.next() {
            Some(reference) if !reference.is_empty() => {
                self.positions[resolve_index(reference, self.positions.len(), "v")?]
            }
            _ => return Err(format!("face vertex {:?} has no position", corner)),
        };

        let tex_coords = match refs.next() {
            Some(reference) if !reference.is_empty() => {
                self.tex_coords[resolve_index(reference, self.tex_coords.len(), "vt")?]
            }
            _ => [0.0; 2],
        };

        let normal = match refs.next() {
            Some(reference) if !reference.is_empty() => {
                self.normals[resolve_index(reference, self.normals.len(), "vn")?]
            }
            _ => [0.0; 3],
        };

        Ok(MeshVertex {
            position,
            tex_coords,
            normal,
        })
    }
}

/// Reads up to `N` floats, requiring at least `required`; missing ones are zero and
/// extra ones are ignored.
fn parse_floats<const N: usize>(
    parts: &mut SplitWhitespace<'_>,
    required: usize,
    statement: &str,
) -> Result<[f32; N], String> {
    let mut values = [0.0; N];
    for (i, value) in values.iter_mut().enumerate() {
        match parts.next() {
            Some(part) => {
                *value = part
                    .parse()
                    .map_err(|_| format!("invalid number {:?} in {} statement", part, statement))?;
            }
            None if i < required => {
                return Err(format!("{} statement needs {} values", statement, required));
            }
            None => break,
        }
    }
    Ok(values)
}

/// Turns a 1-based or negative relative OBJ index into a 0-based one.
fn resolve_index(reference: &str, len: usize, kind: &str) -> Result<usize, String> {
    let index: i64 = reference
        .parse()
        .map_err(|_| format!("invalid {} index {:?}", kind, reference))?;

    let resolved = match index {
        i if i > 0 => i - 1,
        i if i < 0 => len as i64 + i,
        _ => return Err(format!("{} index 0 is not allowed", kind)),
    };

    if resolved < 0 || resolved >= len as i64 {
        return Err(format!(
            "{} index {} out of range, {} defined",
            kind, index, len
        ));
    }
    Ok(resolved as usize)
}
