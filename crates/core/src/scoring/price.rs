/// Parses a loose price string such as `"$150.00"` or `"150,5"`.
///
/// `$` is dropped and every `,` is read as a decimal separator, so
/// thousands-separated input like `"$1,500.50"` does not parse. Anything that
/// fails to parse (or parses to a non-finite value) yields `0.0`.
pub fn parse_price(s: &str) -> f64 {
    let normalized = s.replace('$', "").replace(',', ".");
    match normalized.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
