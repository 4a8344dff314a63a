//! General Stanford PLY mesh writer.
//!
//! Vertices always carry `x y z` floats; normals (`nx ny nz`), texture
//! coordinates (`s t`) and RGBA colors (`red green blue alpha`, uchar) are
//! emitted when enabled in [`PlyOptions`] and present on every vertex. Faces
//! are written as a `uchar` count followed by `uint` indices. Output is ASCII
//! or binary little-endian.
//!
//! The colored point cloud export uses its own fixed layout, see
//! [`crate::pointcloud`].
use crate::error::{Error, Result};
use crate::image::io::write_atomic;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlyFormat {
    Ascii,
    #[default]
    BinaryLittleEndian,
}

impl PlyFormat {
    fn header_name(&self) -> &'static str {
        match self {
            PlyFormat::Ascii => "ascii",
            PlyFormat::BinaryLittleEndian => "binary_little_endian",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlyOptions {
    pub format: PlyFormat,
    pub normals: bool,
    pub uv_coords: bool,
    pub colors: bool,
}

impl Default for PlyOptions {
    fn default() -> Self {
        Self {
            format: PlyFormat::BinaryLittleEndian,
            normals: true,
            uv_coords: true,
            colors: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: Option<[f32; 3]>,
    pub uv: Option<[f32; 2]>,
    pub color: Option<[u8; 4]>,
}

impl MeshVertex {
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub faces: Vec<Vec<u32>>,
}

impl Mesh {
    /// Check face indices and arity before writing.
    pub fn validate(&self) -> Result<()> {
        let n = self.vertices.len();
        for (i, face) in self.faces.iter().enumerate() {
            if face.len() > u8::MAX as usize {
                return Err(Error::Format(format!(
                    "face {i} has {} vertices, PLY uchar count allows 255",
                    face.len()
                )));
            }
            if let Some(&bad) = face.iter().find(|&&idx| idx as usize >= n) {
                return Err(Error::Format(format!(
                    "face {i} references vertex {bad}, mesh has {n}"
                )));
            }
        }
        Ok(())
    }
}

/// Properties actually written: an option is kept only if every vertex
/// provides the attribute.
fn effective_options(mesh: &Mesh, options: &PlyOptions) -> PlyOptions {
    let all = |f: fn(&MeshVertex) -> bool| mesh.vertices.iter().all(f);
    PlyOptions {
        format: options.format,
        normals: options.normals && all(|v| v.normal.is_some()),
        uv_coords: options.uv_coords && all(|v| v.uv.is_some()),
        colors: options.colors && all(|v| v.color.is_some()),
    }
}

/// Write `mesh` to `path`.
pub fn write_mesh(mesh: &Mesh, path: &Path, options: &PlyOptions) -> Result<()> {
    mesh.validate()?;
    write_atomic(path, |w| write_mesh_to(w, mesh, options))?;
    log::info!(
        "wrote PLY mesh {} ({} vertices, {} faces)",
        path.display(),
        mesh.vertices.len(),
        mesh.faces.len()
    );
    Ok(())
}

/// Encode `mesh` into `w`. A mesh failing [`Mesh::validate`] is rejected
/// with `InvalidData` before anything is written.
pub fn write_mesh_to<W: Write + ?Sized>(
    w: &mut W,
    mesh: &Mesh,
    options: &PlyOptions,
) -> std::io::Result<()> {
    mesh.validate()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
    let opts = effective_options(mesh, options);

    writeln!(w, "ply")?;
    writeln!(w, "format {} 1.0", opts.format.header_name())?;
    writeln!(w, "element vertex {}", mesh.vertices.len())?;
    for axis in ["x", "y", "z"] {
        writeln!(w, "property float {axis}")?;
    }
    if opts.normals {
        for axis in ["nx", "ny", "nz"] {
            writeln!(w, "property float {axis}")?;
        }
    }
    if opts.uv_coords {
        writeln!(w, "property float s")?;
        writeln!(w, "property float t")?;
    }
    if opts.colors {
        for channel in ["red", "green", "blue", "alpha"] {
            writeln!(w, "property uchar {channel}")?;
        }
    }
    writeln!(w, "element face {}", mesh.faces.len())?;
    writeln!(w, "property list uchar uint vertex_indices")?;
    writeln!(w, "end_header")?;

    match opts.format {
        PlyFormat::Ascii => write_ascii_body(w, mesh, &opts),
        PlyFormat::BinaryLittleEndian => write_binary_body(w, mesh, &opts),
    }
}

fn write_ascii_body<W: Write + ?Sized>(
    w: &mut W,
    mesh: &Mesh,
    opts: &PlyOptions,
) -> std::io::Result<()> {
    for v in &mesh.vertices {
        let [x, y, z] = v.position;
        write!(w, "{x:.6} {y:.6} {z:.6}")?;
        if let (true, Some([nx, ny, nz])) = (opts.normals, v.normal) {
            write!(w, " {nx:.6} {ny:.6} {nz:.6}")?;
        }
        if let (true, Some([s, t])) = (opts.uv_coords, v.uv) {
            write!(w, " {s:.6} {t:.6}")?;
        }
        if let (true, Some([r, g, b, a])) = (opts.colors, v.color) {
            write!(w, " {r} {g} {b} {a}")?;
        }
        writeln!(w)?;
    }
    for face in &mesh.faces {
        write!(w, "{}", face.len())?;
        for idx in face {
            write!(w, " {idx}")?;
        }
        writeln!(w)?;
    }
    Ok(())
}

fn write_binary_body<W: Write + ?Sized>(
    w: &mut W,
    mesh: &Mesh,
    opts: &PlyOptions,
) -> std::io::Result<()> {
    let mut buf = Vec::with_capacity(48);
    for v in &mesh.vertices {
        buf.clear();
        extend_f32(&mut buf, &v.position);
        if let (true, Some(n)) = (opts.normals, v.normal) {
            extend_f32(&mut buf, &n);
        }
        if let (true, Some(uv)) = (opts.uv_coords, v.uv) {
            extend_f32(&mut buf, &uv);
        }
        if let (true, Some(c)) = (opts.colors, v.color) {
            buf.extend_from_slice(&c);
        }
        w.write_all(&buf)?;
    }
    for face in &mesh.faces {
        buf.clear();
        buf.push(face.len() as u8);
        for idx in face {
            buf.extend_from_slice(&idx.to_le_bytes());
        }
        w.write_all(&buf)?;
    }
    Ok(())
}

fn extend_f32(buf: &mut Vec<u8>, values: &[f32]) {
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
}
