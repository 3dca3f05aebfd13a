//! Display formatting for numeric market fields.
//!
//! These rules are shared by every numeric source shape and must stay
//! byte-compatible with the dashboard front end:
//!
//! | Field            | Rule                                                        |
//! |------------------|-------------------------------------------------------------|
//! | price            | `<0.01` → 6 dp, `<1` → 4 dp, `<100` → 2 dp, else 2 dp + `,` |
//! | percentage       | 2 dp, `+` prefix when `>= 0`, `%` suffix                    |
//! | volume / mkt cap | `T` / `B` / `M` / `K` buckets with 2 dp, `$` prefix         |
//!
//! Missing or non-finite inputs never fail; they map to [`DEFAULT_PRICE`],
//! [`DEFAULT_PERCENTAGE`] and [`DEFAULT_AMOUNT`].
//!
//! Fixed-point rounding follows JavaScript semantics: [`to_fixed`] rounds the
//! exact binary value with ties going away from zero, while the thousands
//! grouped price rounds the shortest round-trip decimal (what `Intl` does).

/// Price shown when the source value is missing.
pub const DEFAULT_PRICE: &str = "0";
/// Percentage shown when the source value is missing.
pub const DEFAULT_PERCENTAGE: &str = "0.00%";
/// Volume / market cap shown when the source value is missing.
pub const DEFAULT_AMOUNT: &str = "$0";

/// Extra decimals used to capture the exact expansion before rounding.
const EXTRA_EXPANSION_DIGITS: usize = 30;

/// Smallest magnitude JavaScript prints in exponent notation.
const EXPONENT_THRESHOLD: f64 = 1e21;

const BUCKETS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

/// Format a price: `$` prefix, precision depending on magnitude.
pub fn format_price(price: Option<f64>) -> String {
    let Some(price) = finite(price) else {
        return DEFAULT_PRICE.to_string();
    };

    if price < 0.01 {
        format!("${}", to_fixed(price, 6))
    } else if price < 1.0 {
        format!("${}", to_fixed(price, 4))
    } else if price < 100.0 {
        format!("${}", to_fixed(price, 2))
    } else {
        format!("${}", to_grouped_fixed2(price))
    }
}

/// Format a 24h change: `+1.23%` / `-3.46%`.
pub fn format_percentage(percentage: Option<f64>) -> String {
    let Some(percentage) = finite(percentage) else {
        return DEFAULT_PERCENTAGE.to_string();
    };

    let sign = if percentage >= 0.0 { "+" } else { "" };
    format!("{sign}{}%", to_fixed(percentage, 2))
}

/// Format a volume or market cap with a magnitude suffix (`$2.50B`).
pub fn format_abbreviated(amount: Option<f64>) -> String {
    let Some(amount) = finite(amount) else {
        return DEFAULT_AMOUNT.to_string();
    };

    for (threshold, suffix) in BUCKETS {
        if amount >= threshold {
            return format!("${}{suffix}", to_fixed(amount / threshold, 2));
        }
    }
    format!("${}", to_fixed(amount, 2))
}

/// JavaScript `Number.prototype.toFixed` for finite values.
///
/// Rounds the exact binary value to `digits` decimals; an exact tie rounds
/// away from zero (`0.125` → `"0.13"`), which differs from Rust's `{:.2}`.
/// Magnitudes of `1e21` and above come back in exponent form (`"1e+21"`).
pub fn to_fixed(value: f64, digits: usize) -> String {
    if value.abs() >= EXPONENT_THRESHOLD {
        return js_exponent(value);
    }
    let exact = format!("{:.*}", digits + EXTRA_EXPANSION_DIGITS, value.abs());
    with_sign(value, round_half_up(&exact, digits))
}

/// Two decimals with `,` thousands separators (`en-US` locale style).
fn to_grouped_fixed2(value: f64) -> String {
    // `Display` yields the shortest round-trip decimal, never exponent form.
    let shortest = format!("{}", value.abs());
    with_sign(value, group_thousands(&round_half_up(&shortest, 2)))
}

/// Insert `,` every three digits of the integer part.
pub fn group_thousands(repr: &str) -> String {
    let (int_part, frac_part) = match repr.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (repr, None),
    };

    let len = int_part.len();
    let mut out = String::with_capacity(repr.len() + len / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Shortest exponent form with an explicit `+` on positive exponents.
fn js_exponent(value: f64) -> String {
    let repr = format!("{value:e}");
    match repr.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => repr,
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn with_sign(value: f64, magnitude: String) -> String {
    if value < 0.0 { format!("-{magnitude}") } else { magnitude }
}

/// Round an unsigned plain decimal string to `digits` decimals, half up.
fn round_half_up(repr: &str, digits: usize) -> String {
    let (int_part, frac_part) = repr.split_once('.').unwrap_or((repr, ""));
    let frac: String = frac_part.chars().chain(std::iter::repeat('0')).take(digits).collect();
    let round_up = frac_part.chars().nth(digits).is_some_and(|c| c >= '5');

    let truncated = if digits == 0 { int_part.to_string() } else { format!("{int_part}.{frac}") };
    if round_up { increment_last_digit(&truncated) } else { truncated }
}

/// Add one unit in the last place, carrying through `9`s (`9.99` → `10.00`).
fn increment_last_digit(repr: &str) -> String {
    let mut chars: Vec<char> = repr.chars().collect();
    for c in chars.iter_mut().rev() {
        match *c {
            '.' => continue,
            '9' => *c = '0',
            d => {
                *c = char::from(d as u8 + 1);
                return chars.into_iter().collect();
            }
        }
    }
    std::iter::once('1').chain(chars).collect()
}
