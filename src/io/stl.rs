// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! STL export and import
//!
//! Binary layout: 80-byte header, little-endian u32 triangle count, then per
//! triangle twelve little-endian f32 (facet normal and three vertices) and a
//! u16 attribute word, 50 bytes in all. Files are written to a temporary file
//! beside the destination and renamed into place, so a failed export never
//! leaves a partial file behind.

use crate::error::{SdfError, SdfResult};
use crate::geometry::{Mesh, Triangle, Vertex};
use nalgebra::{Point3, Vector3};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use stl_io::{Normal, Triangle as StlTriangle, Vertex as StlVertex};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Size in bytes of a binary STL holding `triangles` facets
pub fn binary_size(triangles: usize) -> u64 {
    84 + 50 * triangles as u64
}

fn to_stl(mesh: &Mesh, tri: &Triangle) -> StlTriangle {
    let n = tri.face_normal(mesh);
    let [a, b, c] = tri.positions(mesh);
    let vertex = |p: Point3<f64>| StlVertex::new([p.x as f32, p.y as f32, p.z as f32]);
    StlTriangle {
        normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
        vertices: [vertex(a), vertex(b), vertex(c)],
    }
}

/// Write binary STL to any writer
pub fn write_stl<W: Write>(mesh: &Mesh, writer: &mut W) -> std::io::Result<()> {
    let triangles = mesh.triangles.iter().map(|tri| to_stl(mesh, tri));
    stl_io::write_stl(writer, triangles)
}

/// Write ASCII STL to any writer
pub fn write_stl_ascii<W: Write>(mesh: &Mesh, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "solid sdfkit")?;

    for tri in &mesh.triangles {
        let n = tri.face_normal(mesh);
        writeln!(writer, "  facet normal {:e} {:e} {:e}", n.x, n.y, n.z)?;
        writeln!(writer, "    outer loop")?;
        for p in tri.positions(mesh) {
            writeln!(writer, "      vertex {:e} {:e} {:e}", p.x, p.y, p.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }

    writeln!(writer, "endsolid sdfkit")?;
    Ok(())
}

/// Export mesh to binary STL
pub fn export_stl(mesh: &Mesh, path: impl AsRef<Path>) -> SdfResult<()> {
    write_atomically(path.as_ref(), |w| write_stl(mesh, w))?;
    info!(
        path = %path.as_ref().display(),
        triangles = mesh.triangle_count(),
        "Wrote binary STL"
    );
    Ok(())
}

/// Export mesh to ASCII STL
pub fn export_stl_ascii(mesh: &Mesh, path: impl AsRef<Path>) -> SdfResult<()> {
    write_atomically(path.as_ref(), |w| write_stl_ascii(mesh, w))?;
    info!(
        path = %path.as_ref().display(),
        triangles = mesh.triangle_count(),
        "Wrote ASCII STL"
    );
    Ok(())
}

fn write_atomically(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<&mut File>) -> std::io::Result<()>,
) -> SdfResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| SdfError::io(path, e))?;
    debug!(tmp = %tmp.path().display(), "Writing temporary file");

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer).map_err(|e| SdfError::io(path, e))?;
        writer.flush().map_err(|e| SdfError::io(path, e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| SdfError::io(path, e))?;
    tmp.persist(path).map_err(|e| SdfError::io(path, e.error))?;
    Ok(())
}

/// Read an ASCII or binary STL file into an indexed mesh.
///
/// Stored facet normals are ignored; vertex normals are rebuilt from the winding.
pub fn load_stl(path: impl AsRef<Path>) -> SdfResult<Mesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| SdfError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let indexed = stl_io::read_stl(&mut reader).map_err(|e| SdfError::io(path, e))?;

    let mut mesh = Mesh::with_capacity(indexed.vertices.len(), indexed.faces.len());
    for v in &indexed.vertices {
        mesh.add_vertex(Vertex::new(
            Point3::new(v[0] as f64, v[1] as f64, v[2] as f64),
            Vector3::zeros(),
        ));
    }
    for face in &indexed.faces {
        mesh.add_triangle(Triangle::new(face.vertices));
    }
    mesh.recompute_normals();

    debug!(
        path = %path.display(),
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "Loaded STL"
    );
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    fn triangle_mesh() -> Mesh {
        let mut mesh = Mesh::new();
        for p in [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ] {
            mesh.add_vertex(Vertex::new(p, Vector3::zeros()));
        }
        mesh.add_triangle(Triangle::new([0, 1, 2]));
        mesh
    }

    #[test]
    fn test_binary_layout() -> Result<()> {
        let mesh = triangle_mesh();
        let mut bytes = Vec::new();
        write_stl(&mesh, &mut bytes)?;

        assert_eq!(bytes.len() as u64, binary_size(1));
        assert_eq!(u32::from_le_bytes(bytes[80..84].try_into()?), 1);
        // Facet normal is +Z for a counter-clockwise triangle in the xy plane
        let nz = f32::from_le_bytes(bytes[92..96].try_into()?);
        assert_eq!(nz, 1.0);
        // Second vertex x
        let x = f32::from_le_bytes(bytes[108..112].try_into()?);
        assert_eq!(x, 1.0);
        Ok(())
    }

    #[test]
    fn test_ascii_output() -> Result<()> {
        let mut text = Vec::new();
        write_stl_ascii(&triangle_mesh(), &mut text)?;
        let text = String::from_utf8(text)?;
        assert!(text.starts_with("solid sdfkit"));
        assert_eq!(text.matches("vertex ").count(), 3);
        assert!(text.trim_end().ends_with("endsolid sdfkit"));
        Ok(())
    }

    #[test]
    fn test_export_then_load() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("tri.stl");
        export_stl(&triangle_mesh(), &path)?;

        assert_eq!(std::fs::metadata(&path)?.len(), binary_size(1));
        let loaded = load_stl(&path)?;
        assert_eq!(loaded.triangle_count(), 1);
        assert_eq!(loaded.vertex_count(), 3);
        assert!(loaded.validate());
        assert_eq!(loaded.vertices[0].normal, Vector3::z());
        Ok(())
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.stl");
        let err = export_stl(&triangle_mesh(), &path).unwrap_err();
        assert!(matches!(err, SdfError::Io { .. }));
        assert!(!path.exists());
    }
}
