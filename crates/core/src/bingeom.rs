//! Binary terrain geometry (`.bingeom`)
//!
//! Little-endian, no record markers:
//!
//! ```text
//! i32  geometry kind (2 = terrain)
//! i32  n_verts,  f64 x 3 * n_verts   (x, y, z interleaved)
//! i32  n_faces,  i32 x 3 * n_faces   (1-based vertex indices)
//! i32  n_surf,   i32 x n_faces       (1-based surface index per face)
//! i32  n_volu (0 for terrain)
//! ```

use crate::core_types::Point3;
use crate::error::{ExportError, Result};
use crate::io::write_atomically;
use crate::terrain::TerrainMesh;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Geometry kind tag of terrain files.
pub const TERRAIN_KIND: i32 = 2;

/// Decoded bingeom content, indices 0-based.
#[derive(Debug, Clone, PartialEq)]
pub struct BinGeom {
    pub kind: i32,
    pub vertices: Vec<Point3>,
    pub faces: Vec<[usize; 3]>,
    pub surface_count: usize,
    pub face_surfaces: Vec<usize>,
    pub volu_count: usize,
}

impl BinGeom {
    /// Mesh view of the decoded geometry.
    ///
    /// # Errors
    /// Propagates [`TerrainMesh::new`] validation.
    pub fn into_mesh(self) -> Result<TerrainMesh> {
        TerrainMesh::new(self.vertices, self.faces, self.face_surfaces)
    }
}

fn count_i32(what: &str, n: usize) -> Result<i32> {
    i32::try_from(n)
        .map_err(|_| ExportError::Serialization(format!("{what} count {n} exceeds i32")))
}

fn index_i32(what: &str, zero_based: usize) -> Result<i32> {
    i32::try_from(zero_based + 1)
        .map_err(|_| ExportError::Serialization(format!("{what} index {zero_based} exceeds i32")))
}

/// Encode `mesh` against a catalog of `surface_count` surfaces.
///
/// # Errors
/// `Serialization` if a face surface is outside the catalog or a count
/// does not fit in `i32`.
pub fn encode(mesh: &TerrainMesh, surface_count: usize) -> Result<Vec<u8>> {
    if let Some(&bad) = mesh.face_surfaces().iter().find(|&&s| s >= surface_count) {
        return Err(ExportError::Serialization(format!(
            "face surface {bad} outside catalog of {surface_count}"
        )));
    }

    let n_verts = mesh.vertex_count();
    let n_faces = mesh.face_count();
    let mut buf = Vec::with_capacity(20 + 24 * n_verts + 16 * n_faces);
    let wire = |e: std::io::Error| ExportError::Serialization(e.to_string());

    buf.write_i32::<LittleEndian>(TERRAIN_KIND).map_err(wire)?;

    buf.write_i32::<LittleEndian>(count_i32("vertex", n_verts)?).map_err(wire)?;
    for v in mesh.vertices() {
        for c in [v.x, v.y, v.z] {
            buf.write_f64::<LittleEndian>(c).map_err(wire)?;
        }
    }

    buf.write_i32::<LittleEndian>(count_i32("face", n_faces)?).map_err(wire)?;
    for face in mesh.faces() {
        for &v in face {
            buf.write_i32::<LittleEndian>(index_i32("vertex", v)?).map_err(wire)?;
        }
    }

    buf.write_i32::<LittleEndian>(count_i32("surface", surface_count)?).map_err(wire)?;
    for &s in mesh.face_surfaces() {
        buf.write_i32::<LittleEndian>(index_i32("surface", s)?).map_err(wire)?;
    }

    buf.write_i32::<LittleEndian>(0).map_err(wire)?;
    Ok(buf)
}

struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
    len: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(bytes),
            len: bytes.len(),
        }
    }

    fn remaining(&self) -> usize {
        self.len.saturating_sub(self.cursor.position() as usize)
    }

    fn i32(&mut self, what: &str) -> Result<i32> {
        self.cursor
            .read_i32::<LittleEndian>()
            .map_err(|_| truncated(what))
    }

    fn f64(&mut self, what: &str) -> Result<f64> {
        self.cursor
            .read_f64::<LittleEndian>()
            .map_err(|_| truncated(what))
    }

    /// A count whose items take `item_size` bytes each, checked against the
    /// remaining input before anything is allocated.
    fn count(&mut self, what: &str, item_size: usize) -> Result<usize> {
        let raw = self.i32(what)?;
        let n = usize::try_from(raw)
            .map_err(|_| ExportError::Serialization(format!("negative {what} {raw}")))?;
        if n.saturating_mul(item_size) > self.remaining() {
            return Err(truncated(what));
        }
        Ok(n)
    }

    /// A 1-based index, returned 0-based.
    fn index(&mut self, what: &str, bound: usize) -> Result<usize> {
        let raw = self.i32(what)?;
        match usize::try_from(raw) {
            Ok(i) if (1..=bound).contains(&i) => Ok(i - 1),
            _ => Err(ExportError::Serialization(format!(
                "{what} {raw} outside 1..={bound}"
            ))),
        }
    }
}

fn truncated(what: &str) -> ExportError {
    ExportError::Serialization(format!("input truncated while reading {what}"))
}

/// Decode a terrain bingeom.
///
/// # Errors
/// `Serialization` on truncated input, out-of-range indices, a non-zero
/// volume count or trailing bytes.
pub fn decode(bytes: &[u8]) -> Result<BinGeom> {
    let mut r = Reader::new(bytes);

    let kind = r.i32("geometry kind")?;
    if kind != TERRAIN_KIND {
        return Err(ExportError::Serialization(format!(
            "geometry kind {kind} is not terrain ({TERRAIN_KIND})"
        )));
    }

    let n_verts = r.count("vertex count", 24)?;
    let mut vertices = Vec::with_capacity(n_verts);
    for _ in 0..n_verts {
        vertices.push(Point3::new(
            r.f64("vertex x")?,
            r.f64("vertex y")?,
            r.f64("vertex z")?,
        ));
    }

    let n_faces = r.count("face count", 12)?;
    let mut faces = Vec::with_capacity(n_faces);
    for _ in 0..n_faces {
        faces.push([
            r.index("face vertex", n_verts)?,
            r.index("face vertex", n_verts)?,
            r.index("face vertex", n_verts)?,
        ]);
    }

    let surface_count = r.count("surface count", 0)?;
    if n_faces.saturating_mul(4) > r.remaining() {
        return Err(truncated("face surfaces"));
    }
    let mut face_surfaces = Vec::with_capacity(n_faces);
    for _ in 0..n_faces {
        face_surfaces.push(r.index("face surface", surface_count)?);
    }

    let volu_count = r.count("volume count", 0)?;
    if volu_count != 0 {
        return Err(ExportError::Serialization(format!(
            "terrain geometry has {volu_count} volumes"
        )));
    }
    if r.remaining() > 0 {
        return Err(ExportError::Serialization(format!(
            "{} trailing bytes",
            r.remaining()
        )));
    }

    Ok(BinGeom {
        kind,
        vertices,
        faces,
        surface_count,
        face_surfaces,
        volu_count,
    })
}

/// Encode and write `mesh` atomically.
///
/// Returns the number of bytes written.
///
/// # Errors
/// `Serialization` from [`encode`], `Io` from the write; no file is left
/// on failure.
pub fn write(path: &Path, mesh: &TerrainMesh, surface_count: usize) -> Result<usize> {
    let bytes = encode(mesh, surface_count)?;
    write_atomically(path, &bytes)?;
    Ok(bytes.len())
}

/// Read and decode a bingeom file.
///
/// # Errors
/// `Io` if the file cannot be read, otherwise as [`decode`].
pub fn read(path: &Path) -> Result<BinGeom> {
    let bytes = fs::read(path).map_err(|e| ExportError::io(path, e))?;
    decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles() -> TerrainMesh {
        TerrainMesh::new(
            vec![
                Point3::new(0.0, 0.0, 10.0),
                Point3::new(10.0, 0.0, 11.5),
                Point3::new(10.0, 10.0, 12.25),
                Point3::new(0.0, 10.0, -3.0e-7),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
            vec![4, 0],
        )
        .unwrap()
    }

    #[test]
    fn test_layout() {
        let bytes = encode(&two_triangles(), 5).unwrap();
        // 4 + (4 + 4*24) + (4 + 2*12) + (4 + 2*4) + 4
        assert_eq!(bytes.len(), 148);
        assert_eq!(&bytes[0..4], &2i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &4i32.to_le_bytes());
        assert_eq!(&bytes[8..16], &0.0f64.to_le_bytes());
        assert_eq!(&bytes[24..32], &10.0f64.to_le_bytes());
        assert_eq!(&bytes[104..108], &2i32.to_le_bytes());
        // First face, 1-based
        assert_eq!(&bytes[108..112], &1i32.to_le_bytes());
        assert_eq!(&bytes[112..116], &2i32.to_le_bytes());
        assert_eq!(&bytes[128..132], &4i32.to_le_bytes());
        // Surface count then per-face surfaces, 1-based
        assert_eq!(&bytes[132..136], &5i32.to_le_bytes());
        assert_eq!(&bytes[136..140], &5i32.to_le_bytes());
        assert_eq!(&bytes[140..144], &1i32.to_le_bytes());
        assert_eq!(&bytes[144..148], &0i32.to_le_bytes());
    }

    #[test]
    fn test_decode_recovers_mesh_exactly() {
        let mesh = two_triangles();
        let decoded = decode(&encode(&mesh, 5).unwrap()).unwrap();
        assert_eq!(decoded.surface_count, 5);
        assert_eq!(decoded.volu_count, 0);
        let vertex_bits = |vs: &[Point3]| -> Vec<u64> {
            vs.iter().flat_map(|v| [v.x, v.y, v.z]).map(f64::to_bits).collect()
        };
        assert_eq!(vertex_bits(decoded.vertices.as_slice()), vertex_bits(mesh.vertices()));
        assert_eq!(decoded.into_mesh().unwrap(), mesh);
    }

    #[test]
    fn test_surface_outside_catalog_rejected() {
        let err = encode(&two_triangles(), 4).unwrap_err();
        assert!(matches!(err, ExportError::Serialization(_)));
    }

    #[test]
    fn test_decode_rejects_damaged_input() {
        let bytes = encode(&two_triangles(), 5).unwrap();
        assert!(decode(&bytes[..bytes.len() - 1]).is_err());
        assert!(decode(&bytes[..30]).is_err());

        let mut trailing = bytes.clone();
        trailing.push(0);
        assert!(decode(&trailing).is_err());

        let mut zero_index = bytes.clone();
        zero_index[108..112].copy_from_slice(&0i32.to_le_bytes());
        assert!(decode(&zero_index).is_err());

        let mut huge_count = bytes;
        huge_count[4..8].copy_from_slice(&i32::MAX.to_le_bytes());
        assert!(decode(&huge_count).is_err());
    }

    #[test]
    fn test_write_and_read_file() {
        let dir =
            std::env::temp_dir().join(format!("terrain2fds_bingeom_{}", std::process::id()));
        let path = dir.join("case_terrain.bingeom");
        let written = write(&path, &two_triangles(), 5).unwrap();
        assert_eq!(written, 148);
        assert_eq!(read(&path).unwrap().into_mesh().unwrap(), two_triangles());

        // Failed encode leaves no file behind
        let bad = dir.join("bad_terrain.bingeom");
        assert!(write(&bad, &two_triangles(), 1).is_err());
        assert!(!bad.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
