//! The region parameter of an image request.
//!
//! A region selects the rectangular portion of the full image to be
//! returned: the whole image, a centered square, an absolute pixel
//! rectangle, or a rectangle in percentages of the full dimensions.

use std::fmt;

use crate::error::IiifError;

/// Rectangular portion of the full image to be returned.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageRegion {
    /// The entire image.
    Full,

    /// A square whose sides equal the shorter image dimension.
    Square,

    /// Absolute pixel rectangle.
    Pixels {
        /// Pixels from the left edge.
        x: u32,
        /// Pixels from the top edge.
        y: u32,
        /// Region width in pixels.
        w: u32,
        /// Region height in pixels.
        h: u32,
    },

    /// Rectangle in percentages of the full dimensions.
    Percent {
        /// Percent from the left edge.
        x: f32,
        /// Percent from the top edge.
        y: f32,
        /// Region width in percent.
        w: f32,
        /// Region height in percent.
        h: f32,
    },
}

impl Default for ImageRegion {
    fn default() -> Self {
        Self::Full
    }
}

impl ImageRegion {
    /// Parse a region path segment.
    ///
    /// Accepted forms: `full`, `square`, `x,y,w,h` (integers), and
    /// `pct:x,y,w,h` (numbers). Anything else is an
    /// [`IiifError::InvalidRegion`].
    pub fn parse(value: &str) -> Result<Self, IiifError> {
        let invalid = || IiifError::InvalidRegion {
            value: value.to_string(),
        };

        match value {
            "full" => return Ok(Self::Full),
            "square" => return Ok(Self::Square),
            _ => {}
        }

        if let Some(rest) = value.strip_prefix("pct:") {
            let coords = parse_coords::<f32>(rest).ok_or_else(invalid)?;
            let [x, y, w, h] = coords;
            return Ok(Self::Percent { x, y, w, h });
        }

        let coords = parse_coords::<u32>(value).ok_or_else(invalid)?;
        let [x, y, w, h] = coords;
        Ok(Self::Pixels { x, y, w, h })
    }
}

fn parse_coords<T: std::str::FromStr + Copy>(value: &str) -> Option<[T; 4]> {
    let parts: Vec<T> = value
        .split(',')
        .map(|part| part.trim().parse().ok())
        .collect::<Option<Vec<T>>>()?;
    <[T; 4]>::try_from(parts).ok()
}

impl fmt::Display for ImageRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Square => write!(f, "square"),
            Self::Pixels { x, y, w, h } => write!(f, "{x},{y},{w},{h}"),
            Self::Percent { x, y, w, h } => write!(f, "pct:{x},{y},{w},{h}"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
