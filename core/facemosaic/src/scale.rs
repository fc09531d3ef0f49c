/// A size reduced to fit a height budget, together with the integer
/// factor relating it back to the original size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetedSize {
    /// Reduced width in pixels.
    pub width: u32,
    /// Reduced height in pixels, guaranteed ≤ the budget.
    pub height: u32,
    /// Power-of-two factor such that the original size is approximately
    /// the reduced size multiplied by it (integer truncation during
    /// halving makes this inexact).
    pub scale: u32,
}

/// Halve a size until its height fits within `max_height`.
///
/// Starting from a scale of 1, both dimensions are halved (integer
/// division) and the scale doubled until the height is at most
/// `max_height`. A size that already fits is returned unchanged with
/// scale 1. The returned scale is the smallest power of two that
/// satisfies the bound.
///
/// Pure and deterministic; never fails.
pub fn size_at_most(width: u32, height: u32, max_height: u32) -> BudgetedSize {
    let (mut w, mut h) = (width, height);
    let mut scale = 1;
    while h > max_height {
        w /= 2;
        h /= 2;
        scale *= 2;
    }
    BudgetedSize {
        width: w,
        height: h,
        scale,
    }
}
