//! Terrain surface built from the sampled grid

use crate::core_types::{Extent, Point2, Point3};
use crate::error::{ExportError, Result};

/// Triangulated terrain, ready for the binary serializer.
///
/// Indices are 0-based in memory; the bingeom encoder shifts them.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMesh {
    vertices: Vec<Point3>,
    faces: Vec<[usize; 3]>,
    face_surfaces: Vec<usize>,
}

impl TerrainMesh {
    /// Build a mesh, checking that every face references existing vertices
    /// and carries exactly one surface.
    ///
    /// # Errors
    /// `Serialization` describing the first broken reference.
    pub fn new(
        vertices: Vec<Point3>,
        faces: Vec<[usize; 3]>,
        face_surfaces: Vec<usize>,
    ) -> Result<Self> {
        if faces.len() != face_surfaces.len() {
            return Err(ExportError::Serialization(format!(
                "{} faces but {} face surfaces",
                faces.len(),
                face_surfaces.len()
            )));
        }
        if let Some((f, face)) = faces
            .iter()
            .enumerate()
            .find(|(_, face)| face.iter().any(|&v| v >= vertices.len()))
        {
            return Err(ExportError::Serialization(format!(
                "face {f} {face:?} references a vertex beyond {}",
                vertices.len()
            )));
        }
        Ok(Self {
            vertices,
            faces,
            face_surfaces,
        })
    }

    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    pub fn face_surfaces(&self) -> &[usize] {
        &self.face_surfaces
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Lowest and highest vertex z, `None` for an empty mesh.
    pub fn z_range(&self) -> Option<(f64, f64)> {
        self.vertices.iter().fold(None, |acc, v| match acc {
            None => Some((v.z, v.z)),
            Some((lo, hi)) => Some((lo.min(v.z), hi.max(v.z))),
        })
    }
}

/// One terrain cell as a solid block, for the OBST terrain alternative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstCell {
    /// Horizontal footprint (UTM, relative to the origin)
    pub footprint: Extent,
    /// Sampled ground height of the cell
    pub z: f64,
    /// 0-based catalog position
    pub surface: usize,
}

/// Sampled terrain on the `nx` x `ny` cell grid, in origin-relative UTM.
///
/// Corners are numbered row-major from the north-west: corner `(i, j)` is
/// `j * (nx + 1) + i`. Cell `(c, r)` is bounded by corners `(c, r)` and
/// `(c + 1, r + 1)`.
#[derive(Debug, Clone)]
pub struct TerrainGrid {
    nx: usize,
    ny: usize,
    corners: Vec<Point2>,
    center_z: Vec<f64>,
    cell_surfaces: Vec<usize>,
}

impl TerrainGrid {
    /// # Errors
    /// `Serialization` for an empty grid or if an array length does not match the grid size.
    pub fn new(
        nx: usize,
        ny: usize,
        corners: Vec<Point2>,
        center_z: Vec<f64>,
        cell_surfaces: Vec<usize>,
    ) -> Result<Self> {
        if nx == 0 || ny == 0 {
            return Err(ExportError::Serialization(format!(
                "terrain grid {nx}x{ny} has no cells"
            )));
        }
        let cells = nx * ny;
        let expected = [
            ("corners", (nx + 1) * (ny + 1), corners.len()),
            ("cell elevations", cells, center_z.len()),
            ("cell surfaces", cells, cell_surfaces.len()),
        ];
        for (what, want, got) in expected {
            if want != got {
                return Err(ExportError::Serialization(format!(
                    "terrain grid {nx}x{ny} expects {want} {what}, got {got}"
                )));
            }
        }
        Ok(Self {
            nx,
            ny,
            corners,
            center_z,
            cell_surfaces,
        })
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    #[inline]
    fn vertex(&self, i: usize, j: usize) -> usize {
        j * (self.nx + 1) + i
    }

    #[inline]
    fn cell(&self, col: usize, row: usize) -> usize {
        row * self.nx + col
    }

    /// Mean elevation of the cells touching corner `(i, j)`.
    fn corner_z(&self, i: usize, j: usize) -> f64 {
        let cols = i.saturating_sub(1)..=i.min(self.nx - 1);
        let rows = j.saturating_sub(1)..=j.min(self.ny - 1);
        let mut sum = 0.0;
        let mut count = 0.0;
        for row in rows {
            for col in cols.clone() {
                sum += self.center_z[self.cell(col, row)];
                count += 1.0;
            }
        }
        sum / count
    }

    /// Triangulate: corner vertices, two upward-facing triangles per cell.
    ///
    /// # Errors
    /// Propagates [`TerrainMesh::new`] validation.
    pub fn to_mesh(&self) -> Result<TerrainMesh> {
        let mut vertices = Vec::with_capacity(self.corners.len());
        for j in 0..=self.ny {
            for i in 0..=self.nx {
                let p = self.corners[self.vertex(i, j)];
                vertices.push(Point3::new(p.x, p.y, self.corner_z(i, j)));
            }
        }

        let mut faces = Vec::with_capacity(2 * self.nx * self.ny);
        let mut face_surfaces = Vec::with_capacity(2 * self.nx * self.ny);
        for row in 0..self.ny {
            for col in 0..self.nx {
                let nw = self.vertex(col, row);
                let ne = self.vertex(col + 1, row);
                let sw = self.vertex(col, row + 1);
                let se = self.vertex(col + 1, row + 1);
                let surface = self.cell_surfaces[self.cell(col, row)];
                // Counter-clockwise seen from above
                faces.push([sw, se, ne]);
                faces.push([sw, ne, nw]);
                face_surfaces.push(surface);
                face_surfaces.push(surface);
            }
        }
        TerrainMesh::new(vertices, faces, face_surfaces)
    }

    /// One block per cell, footprint from its four corners.
    pub fn obst_cells(&self) -> Vec<ObstCell> {
        let mut cells = Vec::with_capacity(self.nx * self.ny);
        for row in 0..self.ny {
            for col in 0..self.nx {
                let corners = [
                    self.corners[self.vertex(col, row)],
                    self.corners[self.vertex(col + 1, row)],
                    self.corners[self.vertex(col, row + 1)],
                    self.corners[self.vertex(col + 1, row + 1)],
                ];
                let Some(footprint) = Extent::from_points(corners) else {
                    continue;
                };
                let idx = self.cell(col, row);
                cells.push(ObstCell {
                    footprint,
                    z: self.center_z[idx],
                    surface: self.cell_surfaces[idx],
                });
            }
        }
        cells
    }

    /// Lowest and highest sampled cell elevation.
    pub fn z_range(&self) -> Option<(f64, f64)> {
        self.center_z.iter().fold(None, |acc, &z| match acc {
            None => Some((z, z)),
            Some((lo, hi)) => Some((lo.min(z), hi.max(z))),
        })
    }

    /// Centre of each cell as the mean of its four corners, row-major.
    pub fn cell_centers(&self) -> Vec<Point2> {
        let mut centers = Vec::with_capacity(self.nx * self.ny);
        for row in 0..self.ny {
            for col in 0..self.nx {
                let sum = self.corners[self.vertex(col, row)].coords
                    + self.corners[self.vertex(col + 1, row)].coords
                    + self.corners[self.vertex(col, row + 1)].coords
                    + self.corners[self.vertex(col + 1, row + 1)].coords;
                centers.push(Point2::from(sum / 4.0));
            }
        }
        centers
    }

    /// Longer side of the north-west cell.
    pub fn cell_spacing(&self) -> f64 {
        let nw = self.corners[self.vertex(0, 0)];
        let east = self.corners[self.vertex(1, 0)] - nw;
        let south = self.corners[self.vertex(0, 1)] - nw;
        east.norm().max(south.norm())
    }

    /// Replace the surface of every cell whose override is `Some`.
    ///
    /// Returns the number of cells changed.
    ///
    /// # Errors
    /// `Serialization` unless there is exactly one override per cell.
    pub fn apply_surface_overrides(&mut self, overrides: &[Option<usize>]) -> Result<usize> {
        if overrides.len() != self.cell_surfaces.len() {
            return Err(ExportError::Serialization(format!(
                "{} surface overrides for {} cells",
                overrides.len(),
                self.cell_surfaces.len()
            )));
        }
        let mut changed = 0;
        for (surface, forced) in self.cell_surfaces.iter_mut().zip(overrides) {
            if let Some(forced) = *forced {
                *surface = forced;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// 2x2 cells of 10 m, north-west corner at (0, 20).
    fn small_grid() -> TerrainGrid {
        let corners = (0..3)
            .flat_map(|j| (0..3).map(move |i| Point2::new(10.0 * i as f64, 20.0 - 10.0 * j as f64)))
            .collect();
        TerrainGrid::new(2, 2, corners, vec![1.0, 3.0, 5.0, 7.0], vec![0, 1, 2, 3]).unwrap()
    }

    #[test]
    fn test_mesh_counts() {
        let mesh = small_grid().to_mesh().unwrap();
        assert_eq!(mesh.vertex_count(), 9);
        assert_eq!(mesh.face_count(), 8);
        assert_eq!(mesh.face_surfaces(), &[0, 0, 1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn test_corner_elevation_is_mean_of_adjacent_cells() {
        let mesh = small_grid().to_mesh().unwrap();
        let v = mesh.vertices();
        assert_abs_diff_eq!(v[0].z, 1.0); // north-west corner, one cell
        assert_abs_diff_eq!(v[1].z, 2.0); // north edge, two cells
        assert_abs_diff_eq!(v[4].z, 4.0); // centre, four cells
        assert_abs_diff_eq!(v[8].z, 7.0);
        assert_eq!(mesh.z_range(), Some((1.0, 7.0)));
    }

    #[test]
    fn test_faces_point_upwards() {
        let mesh = small_grid().to_mesh().unwrap();
        for face in mesh.faces() {
            let [a, b, c] = face.map(|i| mesh.vertices()[i]);
            let normal = (b - a).cross(&(c - a));
            assert!(normal.z > 0.0, "face {face:?} faces down");
        }
    }

    #[test]
    fn test_obst_cells() {
        let cells = small_grid().obst_cells();
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0].footprint, Extent::new(0.0, 10.0, 10.0, 20.0));
        assert_eq!(cells[3].footprint, Extent::new(10.0, 20.0, 0.0, 10.0));
        assert_eq!(cells[3].z, 7.0);
        assert_eq!(cells[3].surface, 3);
    }

    #[test]
    fn test_cell_centers_and_spacing() {
        let grid = small_grid();
        assert_eq!(
            grid.cell_centers(),
            vec![
                Point2::new(5.0, 15.0),
                Point2::new(15.0, 15.0),
                Point2::new(5.0, 5.0),
                Point2::new(15.0, 5.0),
            ]
        );
        assert_abs_diff_eq!(grid.cell_spacing(), 10.0, epsilon = 1e-12);
        assert_eq!((grid.nx(), grid.ny()), (2, 2));
    }

    #[test]
    fn test_surface_overrides_reach_faces() {
        let mut grid = small_grid();
        let changed = grid
            .apply_surface_overrides(&[None, Some(7), None, Some(8)])
            .unwrap();
        assert_eq!(changed, 2);
        let mesh = grid.to_mesh().unwrap();
        assert_eq!(mesh.face_surfaces(), &[0, 0, 7, 7, 2, 2, 8, 8]);
        assert_eq!(grid.obst_cells()[3].surface, 8);
        assert!(grid.apply_surface_overrides(&[None; 3]).is_err());
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let short_corners = vec![Point2::origin(); 8];
        assert!(TerrainGrid::new(2, 2, short_corners, vec![0.0; 4], vec![0; 4]).is_err());
        let verts = vec![Point3::origin(); 3];
        assert!(TerrainMesh::new(verts.clone(), vec![[0, 1, 3]], vec![0]).is_err());
        assert!(TerrainMesh::new(verts, vec![[0, 1, 2]], vec![]).is_err());
    }
}
