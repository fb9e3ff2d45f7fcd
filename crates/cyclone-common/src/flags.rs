//! Bits of the center record flag byte.

/// Center sits at or poleward of the polar screen latitude.
pub const POLAR: u8 = 1 << 0;
/// Attribution found no grids beyond the center grid.
pub const EMPTY: u8 = 1 << 1;
/// Center shares an outer contour with at least one other center.
pub const ENTANGLED: u8 = 1 << 2;
/// Center lies equatorward of the tropical boundary.
pub const TROPICAL: u8 = 1 << 3;
/// Center lies on a troubled (high or steep terrain) grid.
pub const TROUBLED: u8 = 1 << 4;

/// Returns true when `bit` is set in `flags`.
#[inline]
pub fn has(flags: u8, bit: u8) -> bool {
    flags & bit != 0
}
