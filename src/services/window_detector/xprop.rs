//! Разбор вывода `xprop`.
//!
//! Форматы, которые здесь встречаются:
//! `WM_CLASS(STRING) = "Navigator", "firefox"`,
//! `WM_NAME(UTF8_STRING) = "title"`,
//! `_NET_ACTIVE_WINDOW(WINDOW): window id # 0x3a00007`,
//! `_NET_CLIENT_LIST(WINDOW): window id # 0x1e00003, 0x2200007`,
//! `_NET_WM_PID(CARDINAL) = 1234`.

/// Строки в кавычках из правой части `=`, с учётом `\"`
fn quoted_values(output: &str) -> Vec<String> {
    let Some((_, value)) = output.split_once('=') else {
        return Vec::new();
    };

    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', false) => in_quotes = true,
            ('"', true) => {
                values.push(std::mem::take(&mut current));
                in_quotes = false;
            }
            ('\\', true) => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            (c, true) => current.push(c),
            _ => {}
        }
    }

    values
}

/// Класс окна: последнее значение WM_CLASS. Без `=` - пустая строка.
pub fn parse_wm_class(output: &str) -> String {
    quoted_values(output).pop().unwrap_or_default()
}

/// Строковое свойство (`WM_NAME` и т.п.). Без `=` - пустая строка.
pub fn parse_xprop_string(output: &str) -> String {
    if let Some(first) = quoted_values(output).into_iter().next() {
        return first;
    }
    output
        .split_once('=')
        .map(|(_, value)| value.trim().to_string())
        .unwrap_or_default()
}

/// Идентификатор окна: `0x...` или десятичное число (xdotool)
pub fn parse_window_id(value: &str) -> Option<u64> {
    let value = value.trim().trim_end_matches(',');
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

/// Все идентификаторы окон после `#`
fn window_ids(output: &str) -> Vec<u64> {
    let Some((_, ids)) = output.split_once('#') else {
        return Vec::new();
    };
    ids.split(',').filter_map(parse_window_id).collect()
}

/// `_NET_ACTIVE_WINDOW`; `0x0` означает, что фокуса у X-окна нет
pub fn parse_active_window_id(output: &str) -> Option<u64> {
    window_ids(output).into_iter().next().filter(|id| *id != 0)
}

pub fn parse_client_list(output: &str) -> Vec<u64> {
    window_ids(output).into_iter().filter(|id| *id != 0).collect()
}

pub fn parse_wm_pid(output: &str) -> Option<u32> {
    let (_, value) = output.split_once('=')?;
    value.trim().parse().ok()
}

pub fn format_window_id(id: u64) -> String {
    format!("0x{:x}", id)
}
