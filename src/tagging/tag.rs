/// Tag value type, corner handles and corner-resize geometry

use crate::data::tag_file::TagRecord;
use crate::geometry::{Point, Rect};

/// Handle edge length in viewport pixels; scene size is this over the scale
pub const HANDLE_SIZE_PX: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub id: u32,
    pub bounds: Rect,
    pub label: String,
}

impl Tag {
    pub fn new(id: u32, bounds: Rect) -> Self {
        Self {
            id,
            bounds,
            label: default_label(id),
        }
    }

    pub fn from_record(id: u32, record: &TagRecord) -> Self {
        let r = Rect::from_coords(record.coords);
        // Stored negative sizes are folded back into a positive rectangle
        let bounds = if r.width < 0.0 || r.height < 0.0 {
            Rect::from_corners(Point::new(r.x, r.y), Point::new(r.right(), r.bottom()))
        } else {
            r
        };
        Self {
            id,
            bounds,
            label: record.label.clone(),
        }
    }

    pub fn to_record(&self) -> TagRecord {
        TagRecord {
            coords: self.bounds.coords(),
            label: self.label.clone(),
        }
    }
}

pub fn default_label(id: u32) -> String {
    format!("Tag-{}", id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Handle {
    /// Hit-test order
    pub const ALL: [Handle; 4] = [
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomLeft,
        Handle::BottomRight,
    ];

    /// Square of side `size` sitting inside the matching corner of `bounds`
    pub fn rect(&self, bounds: &Rect, size: f64) -> Rect {
        let (x, y) = match self {
            Handle::TopLeft => (bounds.x, bounds.y),
            Handle::TopRight => (bounds.right() - size, bounds.y),
            Handle::BottomLeft => (bounds.x, bounds.bottom() - size),
            Handle::BottomRight => (bounds.right() - size, bounds.bottom() - size),
        };
        Rect::new(x, y, size, size)
    }

    /// The two handles on the same diagonal share a cursor shape
    pub fn is_main_diagonal(&self) -> bool {
        matches!(self, Handle::TopLeft | Handle::BottomRight)
    }
}

pub fn handle_rects(bounds: &Rect, size: f64) -> [(Handle, Rect); 4] {
    Handle::ALL.map(|h| (h, h.rect(bounds, size)))
}

pub fn hit_handle(bounds: &Rect, p: Point, size: f64) -> Option<Handle> {
    Handle::ALL
        .into_iter()
        .find(|h| h.rect(bounds, size).contains(p))
}

/// Corner resize relative to the press-time rectangle.
///
/// Each axis is updated independently. An axis whose candidate size would
/// be zero or negative keeps its value from `current`, so the rectangle can
/// never invert.
pub fn resize(original: &Rect, current: &Rect, handle: Handle, dx: f64, dy: f64) -> Rect {
    let (cand_x, cand_w) = match handle {
        Handle::TopLeft | Handle::BottomLeft => (original.x + dx, original.width - dx),
        Handle::TopRight | Handle::BottomRight => (original.x, original.width + dx),
    };
    let (cand_y, cand_h) = match handle {
        Handle::TopLeft | Handle::TopRight => (original.y + dy, original.height - dy),
        Handle::BottomLeft | Handle::BottomRight => (original.y, original.height + dy),
    };

    let (x, width) = if cand_w > 0.0 {
        (cand_x, cand_w)
    } else {
        (current.x, current.width)
    };
    let (y, height) = if cand_h > 0.0 {
        (cand_y, cand_h)
    } else {
        (current.y, current.height)
    };
    Rect::new(x, y, width, height)
}
