//! Crop geometry for spread sheets
//!
//! All coordinates are PDF user-space units with the origin at the bottom-left
//! of the page. A spread sheet is cut horizontally into a bottom and a top half.

use crate::error::{Error, Result};

/// Axis-aligned rectangle `(x0, y0, x1, y1)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Build a rectangle from a PDF box array, normalizing swapped corners
    pub fn from_media_box(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// True when the rectangle has a positive, finite area
    pub fn is_valid(&self) -> bool {
        [self.x0, self.y0, self.x1, self.y1].iter().all(|v| v.is_finite())
            && self.x0 < self.x1
            && self.y0 < self.y1
    }

    /// Move every side inward by `amount`
    pub fn shrink(&self, amount: f64) -> Self {
        Self {
            x0: self.x0 + amount,
            y0: self.y0 + amount,
            x1: self.x1 - amount,
            y1: self.y1 - amount,
        }
    }

    /// Corners in PDF box order
    pub fn to_array(&self) -> [f64; 4] {
        [self.x0, self.y0, self.x1, self.y1]
    }
}

/// Inward shrink applied to both crop rectangles
///
/// Only constructible through [`MarginOffset::new`], which rejects negative
/// and non-finite values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarginOffset(f64);

impl MarginOffset {
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "margin offset must be a finite number, got {}",
                value
            )));
        }
        if value < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "margin offset must not be negative, got {}",
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Which half of a spread sheet an output page is cut from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Half {
    Bottom,
    Top,
}

impl Half {
    pub fn as_str(&self) -> &'static str {
        match self {
            Half::Bottom => "bottom",
            Half::Top => "top",
        }
    }
}

/// The two crop rectangles shared by every sheet of a document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadCrops {
    pub bottom: Rect,
    pub top: Rect,
}

impl SpreadCrops {
    /// Split a media box into shrunken bottom and top halves
    ///
    /// Fails with `UnsupportedDocument` if the media box itself is empty, and
    /// with `InvalidArgument` if the margin leaves nothing of either half.
    pub fn split(media_box: Rect, margin: MarginOffset) -> Result<Self> {
        if !media_box.is_valid() {
            return Err(Error::UnsupportedDocument(format!(
                "page has an empty media box {:?}",
                media_box.to_array()
            )));
        }

        let mid = media_box.y0 + media_box.height() / 2.0;
        let m = margin.value();

        let bottom = Rect::new(media_box.x0, media_box.y0, media_box.x1, mid).shrink(m);
        let top = Rect::new(media_box.x0, mid, media_box.x1, media_box.y1).shrink(m);

        if !bottom.is_valid() || !top.is_valid() {
            return Err(Error::InvalidArgument(format!(
                "margin offset {} is too large for a {} x {} page",
                m,
                media_box.width(),
                media_box.height()
            )));
        }

        Ok(Self { bottom, top })
    }

    pub fn crop(&self, half: Half) -> Rect {
        match half {
            Half::Bottom => self.bottom,
            Half::Top => self.top,
        }
    }
}
