//! XYZ/CSV text point clouds
//!
//! One point per line, with x, y, z required and r, g, b optional. The
//! delimiter (comma, semicolon, tab or space) and an optional header row are
//! detected from the first data line. Files without a header are read as
//! `x y z` or, with six or more columns, `x y z r g b`.
//!
//! Colors may be stored either as 0..=255 integers or as [0, 1] floats. If
//! any color value in the file exceeds 1.0 the whole file is treated as
//! 8-bit and divided by 255. Points of files without color columns are white.

use boxcrate_core::{ColoredPoint, Error, PointBuffer, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Supported column delimiters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Space,
    Tab,
    Semicolon,
}

impl Delimiter {
    /// The separator character
    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Space => ' ',
            Delimiter::Tab => '\t',
            Delimiter::Semicolon => ';',
        }
    }

    /// Detect the delimiter of a line. Explicit separators win over
    /// whitespace, since CSV rows often carry a space after each comma.
    pub fn detect_from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.contains(',') {
            Some(Delimiter::Comma)
        } else if line.contains(';') {
            Some(Delimiter::Semicolon)
        } else if line.contains('\t') {
            Some(Delimiter::Tab)
        } else if line.contains(' ') {
            Some(Delimiter::Space)
        } else {
            None
        }
    }

    /// Split a line into trimmed fields
    pub fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Delimiter::Space | Delimiter::Tab => line.split_whitespace().collect(),
            Delimiter::Comma | Delimiter::Semicolon => line.split(self.as_char()).map(str::trim).collect(),
        }
    }
}

/// Column meaning, taken from a header name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    X,
    Y,
    Z,
    Red,
    Green,
    Blue,
    Unknown,
}

impl ColumnType {
    /// Classify a header name, ignoring case and surrounding whitespace
    pub fn from_header(header: &str) -> Self {
        match header.trim().to_lowercase().as_str() {
            "x" | "px" | "pos_x" | "position_x" => ColumnType::X,
            "y" | "py" | "pos_y" | "position_y" => ColumnType::Y,
            "z" | "pz" | "pos_z" | "position_z" => ColumnType::Z,
            "r" | "red" | "color_r" => ColumnType::Red,
            "g" | "green" | "color_g" => ColumnType::Green,
            "b" | "blue" | "color_b" => ColumnType::Blue,
            _ => ColumnType::Unknown,
        }
    }
}

/// Layout of an XYZ/CSV file
#[derive(Debug, Clone, PartialEq)]
pub struct XyzSchema {
    pub delimiter: Delimiter,
    pub has_header: bool,
    position: [usize; 3],
    color: Option<[usize; 3]>,
}

impl XyzSchema {
    /// Detect the schema from the first non-comment line of a file
    pub fn detect(first_line: &str) -> Result<Self> {
        Self::detect_at(first_line, 1)
    }

    fn detect_at(first_line: &str, line_number: usize) -> Result<Self> {
        let delimiter = Delimiter::detect_from_line(first_line).ok_or_else(|| {
            Error::Decode(format!(
                "line {}: cannot detect a delimiter in {:?}",
                line_number,
                first_line.trim()
            ))
        })?;
        let fields = delimiter.split(first_line);

        let has_header = fields.iter().take(3).any(|field| field.parse::<f32>().is_err());
        if has_header {
            let columns: Vec<ColumnType> = fields.iter().map(|field| ColumnType::from_header(field)).collect();
            let find = |column: ColumnType| columns.iter().position(|&c| c == column);

            let position = match (find(ColumnType::X), find(ColumnType::Y), find(ColumnType::Z)) {
                (Some(x), Some(y), Some(z)) => [x, y, z],
                _ => {
                    return Err(Error::Decode(format!(
                        "line {}: header must name x, y and z columns",
                        line_number
                    )))
                }
            };
            let color = match (find(ColumnType::Red), find(ColumnType::Green), find(ColumnType::Blue)) {
                (Some(r), Some(g), Some(b)) => Some([r, g, b]),
                _ => None,
            };

            Ok(Self { delimiter, has_header, position, color })
        } else {
            if fields.len() < 3 {
                return Err(Error::Decode(format!(
                    "line {}: expected at least 3 columns, found {}",
                    line_number,
                    fields.len()
                )));
            }
            let color = (fields.len() >= 6).then_some([3, 4, 5]);
            Ok(Self { delimiter, has_header, position: [0, 1, 2], color })
        }
    }

    /// Whether the file carries rgb columns
    pub fn has_color(&self) -> bool {
        self.color.is_some()
    }

    fn parse_line(&self, line: &str, line_number: usize) -> Result<([f32; 3], Option<[f32; 3]>)> {
        let fields = self.delimiter.split(line);
        let field = |index: usize| -> Result<f32> {
            let text = fields.get(index).ok_or_else(|| {
                Error::Decode(format!(
                    "line {}: expected at least {} columns, found {}",
                    line_number,
                    index + 1,
                    fields.len()
                ))
            })?;
            text.parse::<f32>()
                .map_err(|_| Error::Decode(format!("line {}: invalid number {:?}", line_number, text)))
        };

        let [x, y, z] = self.position;
        let position = [field(x)?, field(y)?, field(z)?];
        let color = match self.color {
            Some([r, g, b]) => Some([field(r)?, field(g)?, field(b)?]),
            None => None,
        };
        Ok((position, color))
    }
}

fn is_skipped(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#') || line.starts_with("//")
}

fn parse_lines<I>(lines: I) -> Result<PointBuffer>
where
    I: Iterator<Item = io::Result<String>>,
{
    let mut schema: Option<XyzSchema> = None;
    let mut positions = Vec::new();
    let mut colors = Vec::new();
    let mut max_color = 0.0f32;

    for (index, line) in lines.enumerate() {
        let line = line?;
        let line_number = index + 1;
        if is_skipped(&line) {
            continue;
        }

        if schema.is_none() {
            let detected = XyzSchema::detect_at(&line, line_number)?;
            let header = detected.has_header;
            schema = Some(detected);
            if header {
                continue;
            }
        }

        let (position, color) = match &schema {
            Some(schema) => schema.parse_line(&line, line_number)?,
            None => continue,
        };
        positions.extend_from_slice(&position);
        match color {
            Some(color) => {
                if let Some(bad) = color.iter().find(|c| !c.is_finite() || **c < 0.0) {
                    return Err(Error::Decode(format!("line {}: invalid color value {}", line_number, bad)));
                }
                max_color = color.iter().fold(max_color, |m, &c| m.max(c));
                colors.extend_from_slice(&color);
            }
            None => colors.extend_from_slice(&ColoredPoint::default().color),
        }
    }

    if max_color > 1.0 {
        for c in &mut colors {
            *c = (*c / 255.0).min(1.0);
        }
    }

    PointBuffer::new(positions, colors)
}

/// Parse an XYZ/CSV point cloud held in memory
pub fn parse_xyz(text: &str) -> Result<PointBuffer> {
    parse_lines(text.lines().map(|line| Ok(line.to_string())))
}

/// Read an XYZ/CSV point cloud from disk
pub fn read_xyz<P: AsRef<Path>>(path: P) -> Result<PointBuffer> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
        _ => Error::Io(e),
    })?;
    parse_lines(BufReader::new(file).lines())
}
