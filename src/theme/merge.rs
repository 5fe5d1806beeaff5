use toml::Value;

/// Deep merges two values while preserving precedence
///
/// We start with overlay as base, then selectively add missing
/// keys from base. This ensures overlay values always win, but we don't lose
/// base values that aren't being overridden. For non-table values, overlay
/// completely replaces base (no attempt to merge primitives or arrays).
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Table(base_table), Value::Table(overlay_table)) => {
            let mut merged_table = overlay_table;

            for (key, base_value) in base_table {
                match merged_table.remove(&key) {
                    None => {
                        merged_table.insert(key, base_value);
                    }
                    Some(overlay_value) => {
                        let merged_value = deep_merge(base_value, overlay_value);
                        merged_table.insert(key, merged_value);
                    }
                }
            }

            Value::Table(merged_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merges an optional running value with an extension.
pub fn extend(running: Option<Value>, extension: Value) -> Value {
    match running {
        Some(base) => deep_merge(base, extension),
        None => extension,
    }
}
