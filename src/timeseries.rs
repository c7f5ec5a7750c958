use log::warn;

/// Direction of a threshold crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossDirection {
    FromAbove,
    FromBelow,
    #[default]
    Any,
}

impl CrossDirection {
    fn includes_from_above(&self) -> bool {
        matches!(self, CrossDirection::FromAbove | CrossDirection::Any)
    }

    fn includes_from_below(&self) -> bool {
        matches!(self, CrossDirection::FromBelow | CrossDirection::Any)
    }
}

/// Value of a year-indexed series at `year`, by exact lookup or linear
/// interpolation between the bracketing years. `None` outside the observed
/// range. NaN entries are ignored.
pub fn fill_series(series: &[(i32, f64)], year: i32) -> Option<f64> {
    let clean: Vec<(i32, f64)> = series.iter().copied().filter(|(_, v)| !v.is_nan()).collect();
    if let Some((_, v)) = clean.iter().find(|(y, _)| *y == year) {
        return Some(*v);
    }
    let prev = clean.iter().filter(|(y, _)| *y < year).max_by_key(|(y, _)| *y)?;
    let next = clean.iter().filter(|(y, _)| *y > year).min_by_key(|(y, _)| *y)?;
    let (p, vp) = *prev;
    let (n, vn) = *next;
    Some(((n - year) as f64 * vp + (year - p) as f64 * vn) / (n - p) as f64)
}

/// Cumulative sum of a year-indexed series over `[first_year, last_year]`
/// (inclusive), linearly interpolating between observed years so that every
/// calendar year contributes once.
///
/// Logs a warning and returns `None` when the series does not cover the
/// requested range, to avoid erroneous aggregation.
pub fn cumulative(series: &[(i32, f64)], first_year: i32, last_year: i32) -> Option<f64> {
    let mut clean: Vec<(i32, f64)> = series.iter().copied().filter(|(_, v)| !v.is_nan()).collect();
    clean.sort_by_key(|(y, _)| *y);
    let min = clean.first().map(|(y, _)| *y)?;
    let max = clean.last().map(|(y, _)| *y)?;

    if min > first_year {
        warn!("the timeseries does not start by {first_year}");
        return None;
    }
    if max < last_year {
        warn!("the timeseries does not extend until {last_year}");
        return None;
    }

    let first_value = fill_series(&clean, first_year)?;
    let last_value = fill_series(&clean, last_year)?;
    let mut points: Vec<(i32, f64)> = clean
        .iter()
        .copied()
        .filter(|(y, _)| *y > first_year && *y < last_year)
        .collect();
    points.insert(0, (first_year, first_value));
    points.push((last_year, last_value));

    // the summation is shifted to include the first year fully in the sum,
    // otherwise it would be a weighted average of `yr` and `next_yr`
    let mut value = 0.0;
    for window in points.windows(2) {
        let (yr, v) = window[0];
        let (next_yr, next_v) = window[1];
        value += ((next_yr - yr - 1) as f64 * next_v + (next_yr - yr + 1) as f64 * v) / 2.0;
    }
    // the loop does not include the last year itself
    value += last_value;
    Some(value)
}

/// Years in which a year-indexed series crosses `threshold`, optionally
/// restricted to one crossing direction. NaN entries are skipped.
pub fn cross_threshold(series: &[(i32, f64)], threshold: f64, direction: CrossDirection) -> Vec<i32> {
    fn sign(x: f64) -> i8 {
        if x > 0.0 {
            1
        } else if x < 0.0 {
            -1
        } else {
            0
        }
    }

    let mut years = Vec::new();
    let mut prev: Option<(i32, f64)> = None;
    for &(yr, val) in series {
        if val.is_nan() {
            continue;
        }
        if let Some((prev_yr, prev_val)) = prev {
            if sign(prev_val - threshold) != sign(val - threshold) {
                let from_above = prev_val > val && direction.includes_from_above();
                let from_below = prev_val < val && direction.includes_from_below();
                if from_above || from_below {
                    let change = (val - prev_val) / (yr - prev_yr) as f64;
                    // add one because integer conversion rounds down
                    let cross_yr = prev_yr + ((threshold - prev_val) / change) as i32 + 1;
                    years.push(cross_yr);
                }
            }
        }
        prev = Some((yr, val));
    }
    years
}
