//! YOLO-style label file formatting, parsing, and bounding-box rotation.
//!
//! A label file is a plain text sibling of its image (`photo.jpg` ->
//! `photo.txt`) with one whitespace-separated line per object:
//!
//! ```text
//! class_id center_x center_y width height
//! ```
//!
//! All four numeric fields are normalized to [0, 1] and printed with six
//! decimal places. Malformed lines are skipped on read, never fatal; the
//! skipped count is reported so callers can surface it.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::NormalizedBBox;

/// Contents of a parsed label file.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelFile {
    /// Successfully parsed records, in file order.
    pub records: Vec<NormalizedBBox>,
    /// Number of non-empty lines that failed to parse.
    pub skipped: usize,
}

/// The label path for an image: same stem, `.txt` extension.
pub fn label_path_for(image_path: &Path) -> PathBuf {
    image_path.with_extension("txt")
}

/// Format one record as a label line, without trailing newline.
pub fn format_label(bbox: &NormalizedBBox) -> String {
    format!(
        "{} {:.6} {:.6} {:.6} {:.6}",
        bbox.class_id, bbox.center_x, bbox.center_y, bbox.width, bbox.height
    )
}

/// Parse one label line. Returns `None` unless the line has exactly five
/// parseable fields.
pub fn parse_label_line(line: &str) -> Option<NormalizedBBox> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 5 {
        return None;
    }
    Some(NormalizedBBox {
        class_id: fields[0].parse().ok()?,
        center_x: fields[1].parse().ok()?,
        center_y: fields[2].parse().ok()?,
        width: fields[3].parse().ok()?,
        height: fields[4].parse().ok()?,
    })
}

/// Append records to a label file, creating it if absent.
pub fn append_labels(path: &Path, records: &[NormalizedBBox]) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for record in records {
        writeln!(file, "{}", format_label(record))?;
    }
    Ok(())
}

/// Read a label file, skipping malformed lines.
///
/// Blank lines are ignored silently; any other line that fails to parse
/// increments `skipped`.
pub fn read_labels(path: &Path) -> io::Result<LabelFile> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    let mut skipped = 0;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_label_line(&line) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    Ok(LabelFile { records, skipped })
}

/// Rotate a bounding box about its own center and return the enclosing
/// axis-aligned box, clamped to [0, 1].
///
/// Operates directly in normalized coordinates, so non-square images shear
/// the effective angle; this matches how existing labels in the datasets
/// were produced.
pub fn rotate_bbox(bbox: &NormalizedBBox, angle_degrees: f64) -> NormalizedBBox {
    let (cx, cy) = (bbox.center_x, bbox.center_y);
    let (hw, hh) = (bbox.width / 2.0, bbox.height / 2.0);

    let corners = [
        (cx - hw, cy - hh),
        (cx + hw, cy - hh),
        (cx + hw, cy + hh),
        (cx - hw, cy + hh),
    ];

    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for (px, py) in corners {
        let (rx, ry) = rotate_point(cx, cy, angle_degrees, px, py);
        x_min = x_min.min(rx);
        x_max = x_max.max(rx);
        y_min = y_min.min(ry);
        y_max = y_max.max(ry);
    }

    let x_min = x_min.clamp(0.0, 1.0);
    let x_max = x_max.clamp(0.0, 1.0);
    let y_min = y_min.clamp(0.0, 1.0);
    let y_max = y_max.clamp(0.0, 1.0);

    NormalizedBBox {
        class_id: bbox.class_id,
        center_x: (x_min + x_max) / 2.0,
        center_y: (y_min + y_max) / 2.0,
        width: x_max - x_min,
        height: y_max - y_min,
    }
}

/// Rotate (px, py) about (cx, cy) by the given angle in degrees.
fn rotate_point(cx: f64, cy: f64, angle_degrees: f64, px: f64, py: f64) -> (f64, f64) {
    let s = angle_degrees.to_radians().sin();
    let c = angle_degrees.to_radians().cos();

    let px = px - cx;
    let py = py - cy;

    (px * c - py * s + cx, px * s + py * c + cy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_label_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("stampkit_{}_{}.txt", name, std::process::id()))
    }

    #[test]
    fn test_label_path_for_image() {
        assert_eq!(
            label_path_for(Path::new("/data/set1/photo.jpg")),
            PathBuf::from("/data/set1/photo.txt")
        );
        assert_eq!(
            label_path_for(Path::new("stamp.png")),
            PathBuf::from("stamp.txt")
        );
    }

    #[test]
    fn test_format_label_six_decimals() {
        let bbox = NormalizedBBox::new(3, 0.5, 0.25, 0.125, 1.0);
        assert_eq!(format_label(&bbox), "3 0.500000 0.250000 0.125000 1.000000");
    }

    #[test]
    fn test_parse_label_line() {
        let bbox = parse_label_line("2 0.5 0.5 0.25 0.1").unwrap();
        assert_eq!(bbox.class_id, 2);
        assert_eq!(bbox.center_x, 0.5);
        assert_eq!(bbox.height, 0.1);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_label_line("").is_none());
        assert!(parse_label_line("1 0.5 0.5 0.25").is_none());
        assert!(parse_label_line("1 0.5 0.5 0.25 0.1 extra").is_none());
        assert!(parse_label_line("x 0.5 0.5 0.25 0.1").is_none());
        assert!(parse_label_line("1 a 0.5 0.25 0.1").is_none());
    }

    #[test]
    fn test_parse_tolerates_extra_whitespace() {
        let bbox = parse_label_line("  0   0.1  0.2\t0.3  0.4 ").unwrap();
        assert_eq!(bbox.class_id, 0);
        assert_eq!(bbox.width, 0.3);
    }

    #[test]
    fn test_append_then_read_round_trip() {
        let path = temp_label_path("round_trip");
        let _ = fs::remove_file(&path);

        let records = vec![
            NormalizedBBox::new(0, 0.5, 0.5, 0.25, 0.25),
            NormalizedBBox::new(3, 0.1, 0.9, 0.05, 0.125),
        ];
        append_labels(&path, &records[..1]).unwrap();
        append_labels(&path, &records[1..]).unwrap();

        let file = read_labels(&path).unwrap();
        assert_eq!(file.skipped, 0);
        assert_eq!(file.records.len(), 2);
        for (got, want) in file.records.iter().zip(&records) {
            assert_eq!(got.class_id, want.class_id);
            assert!((got.center_x - want.center_x).abs() < 1e-6);
            assert!((got.height - want.height).abs() < 1e-6);
        }

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_read_skips_malformed_lines() {
        let path = temp_label_path("skips");
        fs::write(
            &path,
            "0 0.5 0.5 0.25 0.25\nnot a label\n\n1 0.1 0.1 0.05 0.05\n2 0.3 broken\n",
        )
        .unwrap();

        let file = read_labels(&path).unwrap();
        assert_eq!(file.records.len(), 2);
        assert_eq!(file.skipped, 2);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_read_missing_file_is_error() {
        let path = temp_label_path("missing_never_created");
        let _ = fs::remove_file(&path);
        assert!(read_labels(&path).is_err());
    }

    #[test]
    fn test_rotate_bbox_zero_is_identity() {
        let bbox = NormalizedBBox::new(1, 0.5, 0.5, 0.2, 0.1);
        let rotated = rotate_bbox(&bbox, 0.0);
        assert!((rotated.width - 0.2).abs() < 1e-12);
        assert!((rotated.height - 0.1).abs() < 1e-12);
        assert_eq!(rotated.class_id, 1);
    }

    #[test]
    fn test_rotate_bbox_quarter_turn_swaps_extents() {
        let bbox = NormalizedBBox::new(0, 0.5, 0.5, 0.4, 0.2);
        let rotated = rotate_bbox(&bbox, 90.0);
        assert!((rotated.width - 0.2).abs() < 1e-9);
        assert!((rotated.height - 0.4).abs() < 1e-9);
        assert!((rotated.center_x - 0.5).abs() < 1e-9);
        assert!((rotated.center_y - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_bbox_45_grows_square() {
        let bbox = NormalizedBBox::new(0, 0.5, 0.5, 0.2, 0.2);
        let rotated = rotate_bbox(&bbox, 45.0);
        let expected = 0.2 * std::f64::consts::SQRT_2;
        assert!((rotated.width - expected).abs() < 1e-9);
        assert!((rotated.height - expected).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_bbox_clamps_at_border() {
        // A box hugging the right edge rotated 45 deg would spill out
        let bbox = NormalizedBBox::new(0, 0.95, 0.5, 0.1, 0.1);
        let rotated = rotate_bbox(&bbox, 45.0);
        assert!(rotated.is_normalized(), "rotated {:?}", rotated);
        assert!(rotated.center_x + rotated.width / 2.0 <= 1.0 + 1e-12);
    }
}
