//! Frame files: ASCII PCD and JSON point sets, JSON results and configs.
//!
//! PCD support covers the ASCII flavour written by PCL and most LiDAR tools:
//! fields `x y z` plus an optional `intensity`, any `COUNT`, any extra
//! fields (ignored). Rows with a non-finite coordinate are skipped, a
//! non-finite intensity reads as "no intensity".

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use lidar_obstacles_core::{Point, PointSet};
use log::debug;
use nalgebra::Point3;

use crate::{FrameParams, FrameResult};

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error("{path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}: unknown point cloud format (expected .pcd or .json)")]
    UnknownFormat { path: PathBuf },
    #[error("PCD header: {0}")]
    PcdHeader(String),
    #[error("PCD DATA `{0}` is not supported (only ascii)")]
    UnsupportedPcdData(String),
    #[error("PCD line {line}: {message}")]
    PcdData { line: usize, message: String },
}

/// Load one frame, choosing the format from the file extension.
pub fn load_point_set(path: impl AsRef<Path>) -> Result<PointSet, IoError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pcd") => load_pcd(path),
        Some("json") => read_json(path),
        _ => Err(IoError::UnknownFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Load an ASCII PCD file.
pub fn load_pcd(path: impl AsRef<Path>) -> Result<PointSet, IoError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| IoError::File {
        path: path.to_path_buf(),
        source,
    })?;
    // Binary payloads are rejected at the DATA line, before they are looked at.
    parse_pcd(&String::from_utf8_lossy(&bytes))
}

/// Load a JSON [`FrameParams`] file; missing fields keep their defaults.
pub fn load_frame_params(path: impl AsRef<Path>) -> Result<FrameParams, IoError> {
    read_json(path.as_ref())
}

/// Write `set` as an ASCII PCD file.
///
/// An `intensity` field is written when any point carries one; points
/// without it get `nan`.
pub fn write_pcd_ascii(path: impl AsRef<Path>, set: &PointSet) -> Result<(), IoError> {
    let path = path.as_ref();
    let file_err = |source| IoError::File {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(file_err)?;
    let mut out = BufWriter::new(file);
    write_pcd_to(&mut out, set)
        .and_then(|()| out.flush())
        .map_err(file_err)
}

/// Write a frame result as pretty-printed JSON.
pub fn save_result_json(path: impl AsRef<Path>, result: &FrameResult) -> Result<(), IoError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| IoError::File {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, result).map_err(|source| IoError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    out.flush().map_err(|source| IoError::File {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, IoError> {
    let file = File::open(path).map_err(|source| IoError::File {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(std::io::BufReader::new(file)).map_err(|source| IoError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_pcd_to<W: Write>(out: &mut W, set: &PointSet) -> std::io::Result<()> {
    let with_intensity = set.iter().any(|p| p.intensity.is_some());
    let (fields, size, ty, count) = if with_intensity {
        ("x y z intensity", "4 4 4 4", "F F F F", "1 1 1 1")
    } else {
        ("x y z", "4 4 4", "F F F", "1 1 1")
    };
    writeln!(out, "# .PCD v0.7 - Point Cloud Data file format")?;
    writeln!(out, "VERSION 0.7")?;
    writeln!(out, "FIELDS {fields}")?;
    writeln!(out, "SIZE {size}")?;
    writeln!(out, "TYPE {ty}")?;
    writeln!(out, "COUNT {count}")?;
    writeln!(out, "WIDTH {}", set.len())?;
    writeln!(out, "HEIGHT 1")?;
    writeln!(out, "VIEWPOINT 0 0 0 1 0 0 0")?;
    writeln!(out, "POINTS {}", set.len())?;
    writeln!(out, "DATA ascii")?;
    for p in set {
        let [x, y, z] = p.coords();
        if with_intensity {
            writeln!(out, "{x} {y} {z} {}", p.intensity.unwrap_or(f32::NAN))?;
        } else {
            writeln!(out, "{x} {y} {z}")?;
        }
    }
    Ok(())
}

/// Column layout of the fields we read.
struct PcdLayout {
    x: usize,
    y: usize,
    z: usize,
    intensity: Option<usize>,
    columns: usize,
    points: Option<usize>,
}

/// Parse the text of an ASCII PCD file.
pub fn parse_pcd(text: &str) -> Result<PointSet, IoError> {
    let mut fields: Option<Vec<String>> = None;
    let mut counts: Option<Vec<usize>> = None;
    let mut points: Option<usize> = None;
    let mut lines = text.lines().enumerate();

    let layout = loop {
        let Some((_, line)) = lines.next() else {
            return Err(IoError::PcdHeader("missing DATA line".into()));
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut words = line.split_whitespace();
        let key = words.next().unwrap_or_default().to_ascii_uppercase();
        let values: Vec<&str> = words.collect();
        match key.as_str() {
            "FIELDS" => fields = Some(values.iter().map(|s| s.to_ascii_lowercase()).collect()),
            "COUNT" => {
                let parsed = values
                    .iter()
                    .map(|v| v.parse::<usize>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| IoError::PcdHeader(format!("COUNT: {e}")))?;
                counts = Some(parsed);
            }
            "POINTS" => {
                let n = values
                    .first()
                    .ok_or_else(|| IoError::PcdHeader("POINTS without a value".into()))?;
                points = Some(
                    n.parse()
                        .map_err(|e| IoError::PcdHeader(format!("POINTS: {e}")))?,
                );
            }
            "DATA" => {
                let kind = values.first().copied().unwrap_or_default();
                if !kind.eq_ignore_ascii_case("ascii") {
                    return Err(IoError::UnsupportedPcdData(kind.to_string()));
                }
                break layout_from(fields.as_deref(), counts.as_deref(), points)?;
            }
            _ => {}
        }
    };

    // The header is untrusted; a row takes at least six bytes ("0 0 0\n").
    let mut set = PointSet::with_capacity(layout.points.unwrap_or(0).min(text.len() / 6));
    let mut skipped = 0usize;
    for (idx, line) in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row: Vec<&str> = line.split_whitespace().collect();
        if row.len() < layout.columns {
            return Err(IoError::PcdData {
                line: idx + 1,
                message: format!("expected {} values, found {}", layout.columns, row.len()),
            });
        }
        let value = |col: usize| -> Result<f32, IoError> {
            let word = row.get(col).ok_or_else(|| IoError::PcdData {
                line: idx + 1,
                message: format!("no value in column {col}"),
            })?;
            word.parse::<f32>().map_err(|e| IoError::PcdData {
                line: idx + 1,
                message: format!("`{word}`: {e}"),
            })
        };
        let position = Point3::new(value(layout.x)?, value(layout.y)?, value(layout.z)?);
        if !position.iter().all(|c| c.is_finite()) {
            skipped += 1;
            continue;
        }
        let intensity = match layout.intensity {
            Some(col) => Some(value(col)?).filter(|i| i.is_finite()),
            None => None,
        };
        set.push(Point {
            position,
            intensity,
        });
    }

    if let Some(expected) = layout.points {
        if set.len() + skipped != expected {
            return Err(IoError::PcdHeader(format!(
                "POINTS says {expected}, file holds {}",
                set.len() + skipped
            )));
        }
    }
    if skipped > 0 {
        debug!("pcd: skipped {skipped} rows with non-finite coordinates");
    }
    Ok(set)
}

fn layout_from(
    fields: Option<&[String]>,
    counts: Option<&[usize]>,
    points: Option<usize>,
) -> Result<PcdLayout, IoError> {
    let fields = fields.ok_or_else(|| IoError::PcdHeader("missing FIELDS line".into()))?;
    if let Some(counts) = counts {
        if counts.len() != fields.len() {
            return Err(IoError::PcdHeader(format!(
                "{} FIELDS but {} COUNT values",
                fields.len(),
                counts.len()
            )));
        }
        if let Some(i) = counts.iter().position(|&c| c == 0) {
            return Err(IoError::PcdHeader(format!(
                "COUNT of field `{}` is 0",
                fields[i]
            )));
        }
    }

    // Column of each field's first value.
    let mut offsets = Vec::with_capacity(fields.len());
    let mut columns = 0usize;
    for i in 0..fields.len() {
        offsets.push(columns);
        columns += counts.map_or(1, |c| c[i]);
    }
    let column_of = |name: &str| {
        fields
            .iter()
            .position(|f| f == name)
            .map(|i| offsets[i])
    };
    let axis = |name: &str| {
        column_of(name).ok_or_else(|| IoError::PcdHeader(format!("no `{name}` field")))
    };

    Ok(PcdLayout {
        x: axis("x")?,
        y: axis("y")?,
        z: axis("z")?,
        intensity: column_of("intensity"),
        columns,
        points,
    })
}
