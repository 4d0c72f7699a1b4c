//! Wavefront OBJ import into a single polygon [`Mesh`].
//!
//! Supported commands: `v`, `vn`, `f` (`v`, `v/vt`, `v//vn`, `v/vt/vn`, negative
//! references) and `s` smoothing. Other commands are ignored. When every face
//! corner carries a `vn` reference the normals are imported as custom split normals.

use std::path::Path;

use super::Mesh;
use crate::error::{InkError, Result};

fn parse_error(line: usize, message: impl Into<String>) -> InkError {
    InkError::ObjParse { line, message: message.into() }
}

fn parse_vec3(line: usize, parts: &mut std::str::SplitWhitespace<'_>) -> Result<[f32; 3]> {
    let mut out = [0.0f32; 3];
    for c in out.iter_mut() {
        *c = parts
            .next()
            .and_then(|s| s.parse::<f32>().ok())
            .ok_or_else(|| parse_error(line, "expected 3 floats"))?;
    }
    Ok(out)
}

/// Resolve a 1-based (or negative, relative) reference into a 0-based index.
fn resolve(line: usize, reference: &str, count: usize, kind: &str) -> Result<u32> {
    let r: i64 = reference
        .parse()
        .map_err(|_| parse_error(line, format!("bad {} reference '{}'", kind, reference)))?;
    let idx = if r > 0 { r - 1 } else { count as i64 + r };
    if r == 0 || idx < 0 || idx >= count as i64 {
        return Err(parse_error(line, format!("{} reference {} out of range ({})", kind, r, count)));
    }
    Ok(idx as u32)
}

pub fn parse(text: &str) -> Result<Mesh> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut faces: Vec<Vec<u32>> = Vec::new();
    let mut face_smooth: Vec<bool> = Vec::new();
    let mut corner_normals: Vec<Option<u32>> = Vec::new();
    let mut smooth = false;

    for (line_num, line) in text.lines().enumerate() {
        let line_num = line_num + 1;
        let line = line.split('#').next().unwrap_or_default();
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else { continue; };
        match command {
            "v" => positions.push(parse_vec3(line_num, &mut parts)?),
            "vn" => normals.push(parse_vec3(line_num, &mut parts)?),
            "s" => smooth = !matches!(parts.next(), Some("off") | Some("0") | None),
            "f" => {
                let mut face = Vec::new();
                for corner in parts {
                    let mut refs = corner.split('/');
                    let v = refs.next().unwrap_or_default();
                    face.push(resolve(line_num, v, positions.len(), "vertex")?);
                    let _vt = refs.next();
                    let vn = match refs.next() {
                        Some(n) if !n.is_empty() => Some(resolve(line_num, n, normals.len(), "normal")?),
                        _ => None,
                    };
                    corner_normals.push(vn);
                }
                if face.len() < 3 {
                    return Err(parse_error(line_num, "face needs at least 3 corners"));
                }
                faces.push(face);
                face_smooth.push(smooth);
            }
            _ => {}
        }
    }

    let mut mesh = Mesh::from_polygons(&positions, &faces, false)?;
    for (p, s) in mesh.polygons.iter_mut().zip(&face_smooth) {
        p.smooth = *s;
    }
    mesh.calc_normals();

    if !corner_normals.is_empty() && corner_normals.iter().all(Option::is_some) {
        let split: Vec<[f32; 3]> = corner_normals.iter().flatten().map(|&n| normals[n as usize]).collect();
        mesh.set_custom_normals(&split)?;
    } else if corner_normals.iter().any(Option::is_some) {
        log::warn!("obj: only some face corners carry normals; using computed normals");
    }
    Ok(mesh)
}

pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let text = std::fs::read_to_string(path)?;
    parse(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";

    #[test]
    fn parses_polygon_faces() {
        let m = parse(QUAD).unwrap();
        assert_eq!(m.vertex_count(), 4);
        assert_eq!(m.polygon_count(), 1);
        assert_eq!(m.loop_count(), 4);
        assert!(!m.custom_normals);
    }

    #[test]
    fn negative_references() {
        let m = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n").unwrap();
        assert_eq!(m.loops.iter().map(|l| l.vertex).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn imports_split_normals() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nvn 1 0 0\nf 1//1 2//2 3//1\n";
        let m = parse(text).unwrap();
        assert!(m.custom_normals);
        assert_eq!(m.loops[1].normal, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn smoothing_groups() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\ns 1\nf 1 2 3\ns off\nf 2 4 3\n";
        let m = parse(text).unwrap();
        assert!(m.polygons[0].smooth);
        assert!(!m.polygons[1].smooth);
    }

    #[test]
    fn bad_reference_reports_line() {
        let err = parse("v 0 0 0\nf 1 2 3\n").unwrap_err();
        assert!(matches!(err, InkError::ObjParse { line: 2, .. }));
    }
}
