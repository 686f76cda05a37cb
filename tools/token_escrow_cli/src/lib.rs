//! Option parsing shared by the CLI binary and its tests.

use std::{collections::HashMap, error::Error};

/// Parse `--key value` pairs into a map. Later duplicates win.
pub fn parse_options(args: &[String]) -> Result<HashMap<String, String>, Box<dyn Error>> {
    let mut options = HashMap::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let key = arg
            .strip_prefix("--")
            .ok_or_else(|| format!("Unexpected argument: {arg}"))?;
        if key.is_empty() {
            return Err("Empty option name".into());
        }
        let value = iter
            .next()
            .ok_or_else(|| format!("Missing value for --{key}"))?;
        options.insert(key.to_string(), value.clone());
    }
    Ok(options)
}

pub fn required_option<'a>(
    options: &'a HashMap<String, String>,
    key: &str,
) -> Result<&'a str, Box<dyn Error>> {
    options
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| format!("Missing required option --{key}").into())
}

pub fn parse_u64(value: &str) -> Result<u64, Box<dyn Error>> {
    value
        .parse::<u64>()
        .map_err(|e| format!("Invalid u64 '{value}': {e}").into())
}

pub fn parse_u8(value: &str) -> Result<u8, Box<dyn Error>> {
    value
        .parse::<u8>()
        .map_err(|e| format!("Invalid u8 '{value}': {e}").into())
}
