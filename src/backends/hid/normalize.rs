//! Value normalization for HID axes and hat switches.

/// Scale a raw axis reading into `[-1, 1]` given its logical range.
///
/// Odd-width ranges are widened by one so the midpoint lands on a whole step.
/// With `invert`, a Y axis is negated (zero stays zero).
pub fn axis_value(value: i64, min: i32, max: i32, is_y: bool, invert: bool) -> f64 {
    let mut range = i64::from(max) - i64::from(min);
    let mut val = value - i64::from(min);
    if range % 2 != 0 {
        range += 1;
        val += 1;
    }
    if range == 0 {
        return 0.0;
    }
    let mut out = val as f64 / range as f64 * 2.0 - 1.0;
    if is_y && invert && out != 0.0 {
        out = -out;
    }
    out.clamp(-1.0, 1.0)
}

/// Hat reading to an 8-way clock value `0..=7`, or `-1` when the logical
/// range is neither 4 nor 8 wide.
pub fn hat_clock(value: i64, min: i32, max: i32) -> i64 {
    match i64::from(max) - i64::from(min) + 1 {
        4 => value * 2,
        8 => value,
        _ => -1,
    }
}

/// Hat reading to `(x, y)` in `{-1, 0, 1}`. Up is `y = -1`.
pub fn hat_axes(value: i64, min: i32, max: i32) -> (i8, i8) {
    let d = hat_clock(value, min, max);
    let x = match d {
        5..=7 => -1,
        1..=3 => 1,
        _ => 0,
    };
    let y = match d {
        3..=5 => 1,
        0 | 1 | 7 => -1,
        _ => 0,
    };
    (x, y)
}
