//! Stateless helper utilities shared by the reader, converter and writer.

use std::borrow::Cow;

use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL};

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Integral floats below this magnitude render without a fractional part.
const N_INTEGRAL_TEXT_ABS_MAX: f64 = 1e15;

/// Render a number the way a spreadsheet user would type it.
///
/// `12.0` becomes `"12"`; non-finite values use `NaN`/`Inf`/`-Inf`.
pub fn convert_number_to_text(x: f64) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x.is_sign_positive() { "Inf" } else { "-Inf" }.to_string();
    }
    if x.fract() == 0.0 && x.abs() < N_INTEGRAL_TEXT_ABS_MAX {
        return format!("{}", x as i64);
    }
    x.to_string()
}

/// Length of one `_xHHHH_` escape.
const N_LEN_OOXML_ESCAPE: usize = 7;

/// Decode OOXML `_xHHHH_` escapes in shared/inline string text.
///
/// Writers store control characters (`\r` -> `_x000D_`) and literal escape-like
/// text (`_x0041_` -> `_x005F_x0041_`) this way. Sequences that do not name a
/// valid scalar value are kept verbatim.
pub fn decode_ooxml_escapes(s: &str) -> Cow<'_, str> {
    if !s.contains("_x") {
        return Cow::Borrowed(s);
    }

    let mut c_out = String::with_capacity(s.len());
    let mut c_rest = s;
    while let Some(n_pos) = c_rest.find("_x") {
        c_out.push_str(&c_rest[..n_pos]);
        let c_tail = &c_rest[n_pos..];
        match parse_ooxml_escape(c_tail) {
            Some(chr) => {
                c_out.push(chr);
                c_rest = &c_tail[N_LEN_OOXML_ESCAPE..];
            }
            None => {
                c_out.push_str("_x");
                c_rest = &c_tail[2..];
            }
        }
    }
    c_out.push_str(c_rest);
    Cow::Owned(c_out)
}

fn parse_ooxml_escape(s: &str) -> Option<char> {
    let bytes = s.as_bytes();
    if bytes.len() < N_LEN_OOXML_ESCAPE || bytes[N_LEN_OOXML_ESCAPE - 1] != b'_' {
        return None;
    }
    let c_hex = s.get(2..N_LEN_OOXML_ESCAPE - 1)?;
    if !c_hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(c_hex, 16).ok().and_then(char::from_u32)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Autofit

/// Approximate display width; non-ASCII glyphs count as 1.6 units.
pub fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

/// Width of the widest line in a possibly multi-line cell.
pub fn estimate_cell_text_width(s: &str) -> usize {
    s.lines()
        .map(estimate_unicode_string_width)
        .max()
        .unwrap_or(0)
}

/// Clamp a recorded width into `[min, max]` after padding.
pub fn calculate_column_width(
    n_width_recorded: usize,
    n_min: usize,
    n_max: usize,
    n_pad: usize,
) -> usize {
    let n_min = usize::max(1, n_min);
    let n_max = usize::min(255, usize::max(n_min, n_max));
    usize::min(n_max, usize::max(n_min, n_width_recorded + n_pad))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
