//! Fixed numeric precisions of the deck fields

/// Geographic coordinates (`ORIGIN_LAT`, `ORIGIN_LON`, header origin)
pub const GEO_DECIMALS: usize = 7;
/// Physical lengths (XB, DX, DY, XYZ, PBX)
pub const LENGTH_DECIMALS: usize = 3;
/// Ramp values (wind speed, direction)
pub const RAMP_DECIMALS: usize = 1;
/// Ramp times
pub const RAMP_TIME_DECIMALS: usize = 0;
/// Simulation start and end times
pub const TIME_DECIMALS: usize = 1;
/// UTM coordinates in header comments
pub const COMMENT_DECIMALS: usize = 1;

/// Chrono pattern of the header date.
pub const DATE_FORMAT: &str = "%a, %d %b %Y, %H:%M:%S";

/// `value` with `decimals` fixed decimals; negative zero prints as zero.
pub fn num(value: f64, decimals: usize) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    let s = format!("{value:.decimals$}");
    // A value that rounds to zero keeps its sign in `format!`
    match s.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => s,
    }
}

/// Comma separated values with the same precision.
pub fn list(values: &[f64], decimals: usize) -> String {
    values
        .iter()
        .map(|&v| num(v, decimals))
        .collect::<Vec<_>>()
        .join(",")
}

/// Bounding box `[xmin, xmax, ymin, ymax, zmin, zmax]` as lengths.
pub fn xb(bounds: &[f64; 6]) -> String {
    list(bounds, LENGTH_DECIMALS)
}

/// Quoted, comma separated identifiers.
pub fn quoted<'a, I: IntoIterator<Item = &'a str>>(ids: I) -> String {
    ids.into_iter()
        .map(|id| format!("'{id}'"))
        .collect::<Vec<_>>()
        .join(",")
}
