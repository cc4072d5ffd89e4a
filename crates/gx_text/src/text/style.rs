//! Text style flags
//!
//! Two independent groups share one bitmask: horizontal justification and
//! vertical alignment. Within a group the flags are mutually exclusive.

use bitflags::bitflags;

bitflags! {
    /// Placement of a string relative to its draw origin
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextStyle: u16 {
        /// Origin is the left edge
        const JUSTIFY_LEFT = 0x0001;
        /// Origin is the horizontal center
        const JUSTIFY_CENTER = 0x0002;
        /// Origin is the right edge
        const JUSTIFY_RIGHT = 0x0004;
        /// All justification flags
        const JUSTIFY_MASK = 0x000f;

        /// Origin is the face ascender line
        const ALIGN_TOP = 0x0010;
        /// Origin is midway between ascender and descender
        const ALIGN_MIDDLE = 0x0020;
        /// Origin is the face descender line
        const ALIGN_BOTTOM = 0x0040;
        /// Origin is the baseline
        const ALIGN_BASELINE = 0x0080;
        /// Origin is the top of the tallest glyph in the string
        const ALIGN_GLYPH_TOP = 0x0100;
        /// Origin is midway between the string's glyph extremes
        const ALIGN_GLYPH_MIDDLE = 0x0200;
        /// Origin is the bottom of the lowest glyph in the string
        const ALIGN_GLYPH_BOTTOM = 0x0400;
        /// All alignment flags
        const ALIGN_MASK = 0x0ff0;
    }
}

/// Resolved horizontal justification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justify {
    /// No flag given
    None,
    /// Left edge at the origin
    Left,
    /// Centered on the origin
    Center,
    /// Right edge at the origin
    Right,
}

/// Resolved vertical alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    /// Face ascender
    Top,
    /// Between ascender and descender
    Middle,
    /// Face descender
    Bottom,
    /// Baseline
    Baseline,
    /// Highest glyph extent
    GlyphTop,
    /// Between glyph extremes
    GlyphMiddle,
    /// Lowest glyph extent
    GlyphBottom,
}

impl TextStyle {
    /// Justification flag in effect; left wins over center wins over right
    pub fn justify(self) -> Justify {
        if self.contains(Self::JUSTIFY_LEFT) {
            Justify::Left
        } else if self.contains(Self::JUSTIFY_CENTER) {
            Justify::Center
        } else if self.contains(Self::JUSTIFY_RIGHT) {
            Justify::Right
        } else {
            Justify::None
        }
    }

    /// Alignment mode in effect
    ///
    /// Anything other than exactly one alignment flag (none, or several)
    /// resolves to [`VerticalAlign::Middle`].
    pub fn vertical_align(self) -> VerticalAlign {
        let align = self.intersection(Self::ALIGN_MASK);
        if align == Self::ALIGN_TOP {
            VerticalAlign::Top
        } else if align == Self::ALIGN_BOTTOM {
            VerticalAlign::Bottom
        } else if align == Self::ALIGN_BASELINE {
            VerticalAlign::Baseline
        } else if align == Self::ALIGN_GLYPH_TOP {
            VerticalAlign::GlyphTop
        } else if align == Self::ALIGN_GLYPH_MIDDLE {
            VerticalAlign::GlyphMiddle
        } else if align == Self::ALIGN_GLYPH_BOTTOM {
            VerticalAlign::GlyphBottom
        } else {
            VerticalAlign::Middle
        }
    }

    /// Whether any justification flag is set
    pub fn has_justification(self) -> bool {
        self.intersects(Self::JUSTIFY_MASK)
    }

    /// Whether any alignment flag is set
    pub fn has_alignment(self) -> bool {
        self.intersects(Self::ALIGN_MASK)
    }
}
